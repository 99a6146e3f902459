//! 접근 판정 엔진
//!
//! 모든 판정 함수는 부수 효과 없이 bool을 반환합니다. `false`를 "forbidden"
//! 응답으로 바꾸는 것은 호출자(commands 계층)의 책임입니다.

use serde::{Deserialize, Serialize};

use super::registry::permissions_of;
use super::{Permission, ResourceKind, Role, TextKind, TextOperation};

/// 소유자 예외 판정용 컨텍스트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessContext {
    pub role: Role,
    pub user_id: i64,
    pub resource_owner_id: Option<i64>,
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_of(role).contains(&permission)
}

pub fn has_any(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(role, *p))
}

pub fn has_all(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| has_permission(role, *p))
}

/// 리소스 구분 문자열(예: "text-entries")에 대한 접근 여부. 알 수 없는 구분은 거부
pub fn can_access_resource(role: Role, resource_kind: &str) -> bool {
    match ResourceKind::parse(resource_kind) {
        Some(kind) => has_any(role, kind.required_permissions()),
        None => false,
    }
}

/// 텍스트 연산 정책 테이블
pub fn validate_text_operation(role: Role, operation: TextOperation, kind: TextKind) -> bool {
    match (operation, kind) {
        (TextOperation::Read, _) => has_permission(role, Permission::ReadTexts),
        (TextOperation::Create | TextOperation::Update, TextKind::Original) => {
            has_permission(role, Permission::EditOriginalTexts)
        }
        (TextOperation::Create, TextKind::Translation) => {
            has_permission(role, Permission::TranslateTexts)
        }
        (TextOperation::Update, TextKind::Translation) => has_any(
            role,
            &[Permission::TranslateTexts, Permission::ReviewTranslations],
        ),
        // 삭제는 종류와 무관하게 admin_access 필요
        (TextOperation::Delete, _) => has_permission(role, Permission::AdminAccess),
    }
}

/// manage_users 보유 + 대상보다 엄격히 높은 순위일 때만 허용 (동급 불가)
pub fn can_modify_user_role(actor_role: Role, target_role: Role) -> bool {
    has_permission(actor_role, Permission::ManageUsers) && actor_role.rank() > target_role.rank()
}

/// 역할 권한이 없더라도 `allow_owner_access`이고 본인 리소스면 허용
pub fn check_access(context: &AccessContext, permission: Permission, allow_owner_access: bool) -> bool {
    if has_permission(context.role, permission) {
        return true;
    }

    allow_owner_access && context.resource_owner_id == Some(context.user_id)
}
