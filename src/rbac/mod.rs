//! RBAC Module
//!
//! 역할(Role)과 권한(Permission) 정의, 정적 권한 테이블, 접근 판정 함수

mod engine;
mod registry;

pub use engine::{
    can_access_resource, can_modify_user_role, check_access, has_all, has_any, has_permission,
    validate_text_operation, AccessContext,
};
pub use registry::{permission_set, permissions_for_role_name, permissions_of};

use serde::{Deserialize, Serialize};

/// 협업자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ScenarioWriter,
    Translator,
    Reviewer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::ScenarioWriter,
        Role::Translator,
        Role::Reviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ScenarioWriter => "scenario_writer",
            Role::Translator => "translator",
            Role::Reviewer => "reviewer",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim() {
            "admin" => Some(Role::Admin),
            "scenario_writer" => Some(Role::ScenarioWriter),
            "translator" => Some(Role::Translator),
            "reviewer" => Some(Role::Reviewer),
            _ => None,
        }
    }

    /// 사용자 관리 계층 비교용 순위 (admin > reviewer > scenario_writer > translator)
    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 4,
            Role::Reviewer => 3,
            Role::ScenarioWriter => 2,
            Role::Translator => 1,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 역할이 보유할 수 있는 권한 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
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
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::ReadTexts,
        Permission::WriteTexts,
        Permission::EditOriginalTexts,
        Permission::TranslateTexts,
        Permission::ReviewTranslations,
        Permission::ManageCharacters,
        Permission::ManageStyles,
        Permission::ManageTags,
        Permission::ManageForbiddenWords,
        Permission::ManageProperNouns,
        Permission::ImportExportFiles,
        Permission::ViewEditHistory,
        Permission::ManageUsers,
        Permission::AdminAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadTexts => "read_texts",
            Permission::WriteTexts => "write_texts",
            Permission::EditOriginalTexts => "edit_original_texts",
            Permission::TranslateTexts => "translate_texts",
            Permission::ReviewTranslations => "review_translations",
            Permission::ManageCharacters => "manage_characters",
            Permission::ManageStyles => "manage_styles",
            Permission::ManageTags => "manage_tags",
            Permission::ManageForbiddenWords => "manage_forbidden_words",
            Permission::ManageProperNouns => "manage_proper_nouns",
            Permission::ImportExportFiles => "import_export_files",
            Permission::ViewEditHistory => "view_edit_history",
            Permission::ManageUsers => "manage_users",
            Permission::AdminAccess => "admin_access",
        }
    }

    pub fn parse(value: &str) -> Option<Permission> {
        Permission::ALL.into_iter().find(|p| p.as_str() == value.trim())
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 텍스트 대상 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperation {
    Read,
    Create,
    Update,
    Delete,
}

/// 원문 / 번역문 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Original,
    Translation,
}

/// 화면/기능 단위의 거친 리소스 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    TextEntries,
    TextEditing,
    Translations,
    TranslationReview,
    Characters,
    Styles,
    Tags,
    ForbiddenWords,
    ProperNouns,
    FileOperations,
    EditHistory,
    UserManagement,
    AdminPanel,
}

impl ResourceKind {
    pub fn parse(value: &str) -> Option<ResourceKind> {
        let kind = match value.trim() {
            "text-entries" => ResourceKind::TextEntries,
            "text-editing" => ResourceKind::TextEditing,
            "translations" => ResourceKind::Translations,
            "translation-review" => ResourceKind::TranslationReview,
            "characters" => ResourceKind::Characters,
            "styles" => ResourceKind::Styles,
            "tags" => ResourceKind::Tags,
            "forbidden-words" => ResourceKind::ForbiddenWords,
            "proper-nouns" => ResourceKind::ProperNouns,
            "file-operations" => ResourceKind::FileOperations,
            "edit-history" => ResourceKind::EditHistory,
            "user-management" => ResourceKind::UserManagement,
            "admin-panel" => ResourceKind::AdminPanel,
            _ => return None,
        };
        Some(kind)
    }

    /// 리소스 접근에 필요한 권한 집합 (하나라도 있으면 접근 가능)
    pub fn required_permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            ResourceKind::TextEntries => &[ReadTexts],
            ResourceKind::TextEditing => &[WriteTexts, EditOriginalTexts],
            ResourceKind::Translations => &[TranslateTexts],
            ResourceKind::TranslationReview => &[ReviewTranslations],
            ResourceKind::Characters => &[ManageCharacters],
            ResourceKind::Styles => &[ManageStyles],
            ResourceKind::Tags => &[ManageTags],
            ResourceKind::ForbiddenWords => &[ManageForbiddenWords],
            ResourceKind::ProperNouns => &[ManageProperNouns],
            ResourceKind::FileOperations => &[ImportExportFiles],
            ResourceKind::EditHistory => &[ViewEditHistory],
            ResourceKind::UserManagement => &[ManageUsers],
            ResourceKind::AdminPanel => &[AdminAccess],
        }
    }
}

/// 요청 주체 (인증 계층이 확인한 사용자 id와 역할)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}
