//! Forest Data Models
//!
//! 저장소 테이블과 명령 입출력에 대응하는 데이터 모델

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::rbac::Role;
use crate::status::{TextStatus, TranslationStatus};

/// 사용자 계정 (비밀번호/토큰은 인증 계층 소관)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// 원문 텍스트 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    pub id: i64,
    pub label: String,
    pub file_category: Option<String>,
    pub original_text: Option<String>,
    pub language_code: String,
    pub status: TextStatus,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TextEntry {
    /// 내용 필드의 md5 다이제스트. 낙관적 동시성 검사에 쓰임
    pub fn revision(&self) -> String {
        let content = format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.label,
            self.file_category.as_deref().unwrap_or_default(),
            self.original_text.as_deref().unwrap_or_default(),
            self.language_code,
            self.status.as_str(),
            self.max_chars.map(|n| n.to_string()).unwrap_or_default(),
            self.max_lines.map(|n| n.to_string()).unwrap_or_default(),
        );
        format!("{:x}", md5::compute(content))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTextEntry {
    pub label: String,
    pub file_category: Option<String>,
    pub original_text: Option<String>,
    /// 없으면 설정의 원문 언어
    pub language_code: Option<String>,
    pub status: Option<TextStatus>,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
}

/// 부분 업데이트. None 필드는 기존 값 유지
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextEntryUpdate {
    pub label: Option<String>,
    pub file_category: Option<String>,
    pub original_text: Option<String>,
    pub language_code: Option<String>,
    pub status: Option<TextStatus>,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
    /// 지정 시 현재 revision과 다르면 Conflict
    pub expected_revision: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextEntryFilter {
    pub search: Option<String>,
    pub status: Option<TextStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// 상세 화면용 묶음
#[derive(Debug, Clone, Serialize)]
pub struct TextEntryDetail {
    pub entry: TextEntry,
    pub translations: Vec<Translation>,
    pub history: Vec<EditHistory>,
    pub active_sessions: Vec<EditSession>,
    pub tags: Vec<crate::glossary::Tag>,
    pub revision: String,
}

/// (원문, 대상 언어)당 하나의 번역
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    pub text_entry_id: i64,
    pub language_code: String,
    pub translated_text: Option<String>,
    pub status: TranslationStatus,
    pub translator_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Create,
    Update,
    Delete,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::Create => "create",
            EditType::Update => "update",
            EditType::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<EditType> {
        match value {
            "create" => Some(EditType::Create),
            "update" => Some(EditType::Update),
            "delete" => Some(EditType::Delete),
            _ => None,
        }
    }
}

/// 편집 이력 레코드 (추가 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistory {
    pub id: i64,
    pub text_entry_id: i64,
    pub language_code: String,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
    pub edited_by: i64,
    pub edit_type: EditType,
    pub created_at: i64,
    /// users 테이블 조인 결과 (사용자가 없으면 None)
    pub editor_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub records: Vec<EditHistory>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileDirection {
    Import,
    Export,
}

impl FileDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileDirection::Import => "import",
            FileDirection::Export => "export",
        }
    }

    pub fn parse(value: &str) -> Option<FileDirection> {
        match value {
            "import" => Some(FileDirection::Import),
            "export" => Some(FileDirection::Export),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Json,
    Xml,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Xml => "xml",
        }
    }

    pub fn parse(value: &str) -> Option<FileFormat> {
        match value {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            "xml" => Some(FileFormat::Xml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Failed,
    Processing,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Success => "success",
            FileStatus::Failed => "failed",
            FileStatus::Processing => "processing",
        }
    }

    pub fn parse(value: &str) -> Option<FileStatus> {
        match value {
            "success" => Some(FileStatus::Success),
            "failed" => Some(FileStatus::Failed),
            "processing" => Some(FileStatus::Processing),
            _ => None,
        }
    }
}

/// 파일 가져오기/내보내기 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHistory {
    pub id: i64,
    pub filename: String,
    pub direction: FileDirection,
    pub format: FileFormat,
    pub record_count: Option<u32>,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub user_id: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewFileHistory {
    pub filename: String,
    pub direction: FileDirection,
    pub format: FileFormat,
    pub record_count: Option<u32>,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub user_id: i64,
}

/// "누가 편집 중" 표시용 세션 (쓰기 제어 효과 없음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub id: i64,
    pub user_id: i64,
    pub text_entry_id: i64,
    pub language_code: Option<String>,
    pub started_at: i64,
    pub last_activity: i64,
    pub is_active: bool,
    pub username: Option<String>,
}

/// CSV 한 행. 모든 셀은 원본 문자열 그대로
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    pub id: Option<String>,
    pub label: Option<String>,
    pub file_category: Option<String>,
    pub original_text: Option<String>,
    pub language_code: Option<String>,
    pub translated_text: Option<String>,
    pub status: Option<String>,
    pub max_chars: Option<String>,
    pub max_lines: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    /// 1부터 시작하는 데이터 행 번호
    pub row: usize,
    /// 헤더를 포함한 파일 내 줄 번호 (row + 1)
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ImportRowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<ImportRowError>,
    pub total_rows: u32,
}

impl ImportSummary {
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportFilter {
    pub status: Option<TextStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// 내보내기 행. 번역 포함 시 번역 하나당 한 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub label: String,
    pub file_category: String,
    pub original_text: String,
    pub language_code: String,
    pub translated_text: Option<String>,
    pub status: String,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: TextStatus,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownCount {
    /// 카테고리명 또는 언어 코드
    pub key: String,
    pub count: u64,
    pub percentage: f64,
    pub completed: u64,
    pub pending: u64,
    pub review_requested: u64,
    pub omitted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub edit_type: EditType,
    pub created_at: i64,
    pub editor_name: Option<String>,
    pub text_label: String,
}

fn enum_from_sql<T>(value: ValueRef<'_>, parse: fn(&str) -> Option<T>) -> FromSqlResult<T> {
    let text = value.as_str()?;
    parse(text).ok_or_else(|| FromSqlError::Other(format!("unexpected value `{text}`").into()))
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        enum_from_sql(value, Role::parse)
    }
}

impl ToSql for EditType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EditType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        enum_from_sql(value, EditType::parse)
    }
}

impl ToSql for FileDirection {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FileDirection {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        enum_from_sql(value, FileDirection::parse)
    }
}

impl ToSql for FileFormat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FileFormat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        enum_from_sql(value, FileFormat::parse)
    }
}

impl ToSql for FileStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FileStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        enum_from_sql(value, FileStatus::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TextEntry {
        TextEntry {
            id: 1,
            label: "EV_001".to_string(),
            file_category: None,
            original_text: Some("こんにちは".to_string()),
            language_code: "ja".to_string(),
            status: TextStatus::Pending,
            max_chars: Some(20),
            max_lines: None,
            created_by: Some(1),
            updated_by: Some(1),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_revision_tracks_content_only() {
        let a = entry();
        let mut b = entry();
        b.updated_at = 99;
        b.updated_by = Some(7);
        assert_eq!(a.revision(), b.revision());

        b.original_text = Some("さようなら".to_string());
        assert_ne!(a.revision(), b.revision());
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2], 5, 1, 2);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let last = Page::new(vec![5], 5, 3, 2);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn test_import_error_display_counts_header() {
        let err = ImportRowError {
            row: 2,
            line: 3,
            message: "Missing required fields".to_string(),
        };
        assert_eq!(err.to_string(), "Row 3: Missing required fields");
    }
}
