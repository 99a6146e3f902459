//! 역할별 권한 테이블 (정적 설정 데이터)

use std::collections::HashSet;

use super::{Permission, Role};
use Permission::*;

const ADMIN_PERMISSIONS: &[Permission] = &[
    ReadTexts,
    WriteTexts,
    EditOriginalTexts,
    TranslateTexts,
    ReviewTranslations,
    ManageCharacters,
    ManageStyles,
    ManageTags,
    ManageForbiddenWords,
    ManageProperNouns,
    ImportExportFiles,
    ViewEditHistory,
    ManageUsers,
    AdminAccess,
];

const SCENARIO_WRITER_PERMISSIONS: &[Permission] = &[
    ReadTexts,
    WriteTexts,
    EditOriginalTexts,
    ManageCharacters,
    ManageStyles,
    ManageTags,
    ManageProperNouns,
    ViewEditHistory,
];

const TRANSLATOR_PERMISSIONS: &[Permission] = &[ReadTexts, TranslateTexts, ViewEditHistory];

const REVIEWER_PERMISSIONS: &[Permission] =
    &[ReadTexts, TranslateTexts, ReviewTranslations, ViewEditHistory];

/// 역할이 보유한 권한 목록
pub fn permissions_of(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::ScenarioWriter => SCENARIO_WRITER_PERMISSIONS,
        Role::Translator => TRANSLATOR_PERMISSIONS,
        Role::Reviewer => REVIEWER_PERMISSIONS,
    }
}

pub fn permission_set(role: Role) -> HashSet<Permission> {
    permissions_of(role).iter().copied().collect()
}

/// 문자열 역할명으로 조회. 알 수 없는 역할은 빈 목록 (fail-closed)
pub fn permissions_for_role_name(name: &str) -> &'static [Permission] {
    match Role::parse(name) {
        Some(role) => permissions_of(role),
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_name_has_no_permissions() {
        assert!(permissions_for_role_name("superuser").is_empty());
        assert!(permissions_for_role_name("").is_empty());
        assert_eq!(permissions_for_role_name("translator"), TRANSLATOR_PERMISSIONS);
    }

    #[test]
    fn test_admin_holds_every_permission() {
        assert_eq!(permission_set(Role::Admin).len(), Permission::ALL.len());
    }

    #[test]
    fn test_tables_have_no_duplicates() {
        for role in Role::ALL {
            assert_eq!(permission_set(role).len(), permissions_of(role).len(), "{role}");
        }
    }
}
