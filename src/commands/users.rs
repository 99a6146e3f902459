//! User Commands
//!
//! 사용자 관리와 권한 조회. 역할 변경/삭제는 대상보다 높은 순위의 관리자만 가능

use serde::Serialize;

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::models::{NewUser, User, UserProfileUpdate};
use crate::rbac::{
    can_access_resource, can_modify_user_role, check_access, permissions_of, AccessContext, Actor, Permission, Role,
};

use super::{ensure, ensure_permission};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

fn owner_context(actor: &Actor, owner_id: i64) -> AccessContext {
    AccessContext {
        role: actor.role,
        user_id: actor.user_id,
        resource_owner_id: Some(owner_id),
    }
}

pub fn list_users(db_state: &DbState, actor: &Actor) -> CommandResult<Vec<User>> {
    ensure_permission(actor, Permission::ManageUsers)?;
    db_state.with(|db| db.list_users().map_err(CommandError::from))
}

pub fn create_user(db_state: &DbState, actor: &Actor, input: NewUser) -> CommandResult<User> {
    ensure_permission(actor, Permission::ManageUsers)?;
    db_state.with(|db| db.create_user(&input).map_err(CommandError::from))
}

/// 본인 또는 manage_users 보유자
pub fn get_user(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<User> {
    ensure(
        actor,
        check_access(&owner_context(actor, id), Permission::ManageUsers, true),
        "view other users",
    )?;
    db_state.with(|db| db.get_user(id).map_err(CommandError::from))
}

pub fn update_user_profile(
    db_state: &DbState,
    actor: &Actor,
    id: i64,
    update: UserProfileUpdate,
) -> CommandResult<User> {
    ensure(
        actor,
        check_access(&owner_context(actor, id), Permission::ManageUsers, true),
        "edit other users",
    )?;
    db_state.with(|db| db.update_user_profile(id, &update).map_err(CommandError::from))
}

pub fn update_user_role(db_state: &DbState, actor: &Actor, id: i64, role: Role) -> CommandResult<User> {
    ensure_permission(actor, Permission::ManageUsers)?;
    ensure(actor, actor.user_id != id, "change their own role")?;
    db_state.with(|db| {
        let target = db.get_user(id)?;
        ensure(
            actor,
            can_modify_user_role(actor.role, target.role),
            &format!("modify users with role `{}`", target.role),
        )?;
        db.update_user_role(id, role).map_err(CommandError::from)
    })
}

pub fn delete_user(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<()> {
    ensure_permission(actor, Permission::ManageUsers)?;
    ensure(actor, actor.user_id != id, "delete themselves")?;
    db_state.with(|db| {
        let target = db.get_user(id)?;
        ensure(
            actor,
            can_modify_user_role(actor.role, target.role),
            &format!("delete users with role `{}`", target.role),
        )?;
        db.delete_user(id).map_err(CommandError::from)
    })
}

/// 역할의 권한 목록 (누구나 조회 가능)
pub fn permissions_for(role: Role) -> RolePermissions {
    RolePermissions {
        role,
        permissions: permissions_of(role).to_vec(),
    }
}

/// 화면 구분 문자열(예: "translation-review") 접근 가능 여부
pub fn check_resource_access(actor: &Actor, resource_kind: &str) -> bool {
    can_access_resource(actor.role, resource_kind)
}
