//! Commands Module
//!
//! 호출자(HTTP/IPC 계층)용 명령 정의. 모든 명령은 먼저 `rbac` 판정을 거치고,
//! 거부되면 저장소에 손대지 않고 FORBIDDEN을 돌려줍니다.

pub mod glossary;
pub mod history;
pub mod progress;
pub mod sessions;
pub mod storage;
pub mod text_entries;
pub mod translations;
pub mod users;

use crate::error::{CommandError, CommandResult};
use crate::rbac::{has_permission, validate_text_operation, Actor, Permission, TextKind, TextOperation};

/// 판정 결과가 false면 FORBIDDEN
pub(crate) fn ensure(actor: &Actor, allowed: bool, action: &str) -> CommandResult<()> {
    if allowed {
        return Ok(());
    }
    tracing::warn!(user_id = actor.user_id, role = %actor.role, action, "access denied");
    Err(CommandError::forbidden(format!(
        "Role `{}` is not allowed to {}",
        actor.role, action
    )))
}

pub(crate) fn ensure_permission(actor: &Actor, permission: Permission) -> CommandResult<()> {
    ensure(
        actor,
        has_permission(actor.role, permission),
        &format!("use `{permission}`"),
    )
}

pub(crate) fn ensure_text_operation(actor: &Actor, operation: TextOperation, kind: TextKind) -> CommandResult<()> {
    let action = match (operation, kind) {
        (TextOperation::Read, _) => "read texts",
        (TextOperation::Create, TextKind::Original) => "create original texts",
        (TextOperation::Update, TextKind::Original) => "edit original texts",
        (TextOperation::Delete, TextKind::Original) => "delete original texts",
        (TextOperation::Create, TextKind::Translation) => "create translations",
        (TextOperation::Update, TextKind::Translation) => "edit translations",
        (TextOperation::Delete, TextKind::Translation) => "delete translations",
    };
    ensure(actor, validate_text_operation(actor.role, operation, kind), action)
}
