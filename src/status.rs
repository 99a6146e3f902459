//! Text / Translation Status
//!
//! 원문·번역 상태 값과 전이 정책

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::ForestError;

/// 원문 텍스트 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStatus {
    #[default]
    Pending,
    ReviewRequested,
    SourceConsultation,
    Completed,
    Omitted,
}

impl TextStatus {
    pub const ALL: [TextStatus; 5] = [
        TextStatus::Pending,
        TextStatus::ReviewRequested,
        TextStatus::SourceConsultation,
        TextStatus::Completed,
        TextStatus::Omitted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextStatus::Pending => "pending",
            TextStatus::ReviewRequested => "review_requested",
            TextStatus::SourceConsultation => "source_consultation",
            TextStatus::Completed => "completed",
            TextStatus::Omitted => "omitted",
        }
    }

    /// 작업 화면 표시용 라벨
    pub fn display_label(&self) -> &'static str {
        match self {
            TextStatus::Pending => "未処理",
            TextStatus::ReviewRequested => "確認依頼",
            TextStatus::SourceConsultation => "原文相談",
            TextStatus::Completed => "完了",
            TextStatus::Omitted => "オミット",
        }
    }

    /// 기계명 또는 표시 라벨 모두 허용
    pub fn parse(value: &str) -> Result<TextStatus, ForestError> {
        let value = value.trim();
        TextStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == value || s.display_label() == value)
            .ok_or_else(|| ForestError::Validation(format!("Unknown text status: {value}")))
    }
}

/// 번역 상태 (source_consultation 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    #[default]
    Pending,
    ReviewRequested,
    Completed,
    Omitted,
}

impl TranslationStatus {
    pub const ALL: [TranslationStatus; 4] = [
        TranslationStatus::Pending,
        TranslationStatus::ReviewRequested,
        TranslationStatus::Completed,
        TranslationStatus::Omitted,
    ];

    pub fn as_str(&self) -> &'static str {
        self.as_text_status().as_str()
    }

    pub fn display_label(&self) -> &'static str {
        self.as_text_status().display_label()
    }

    pub fn parse(value: &str) -> Result<TranslationStatus, ForestError> {
        TranslationStatus::try_from(TextStatus::parse(value)?)
    }

    fn as_text_status(&self) -> TextStatus {
        match self {
            TranslationStatus::Pending => TextStatus::Pending,
            TranslationStatus::ReviewRequested => TextStatus::ReviewRequested,
            TranslationStatus::Completed => TextStatus::Completed,
            TranslationStatus::Omitted => TextStatus::Omitted,
        }
    }
}

impl TryFrom<TextStatus> for TranslationStatus {
    type Error = ForestError;

    fn try_from(status: TextStatus) -> Result<Self, Self::Error> {
        match status {
            TextStatus::Pending => Ok(TranslationStatus::Pending),
            TextStatus::ReviewRequested => Ok(TranslationStatus::ReviewRequested),
            TextStatus::Completed => Ok(TranslationStatus::Completed),
            TextStatus::Omitted => Ok(TranslationStatus::Omitted),
            TextStatus::SourceConsultation => Err(ForestError::Validation(
                "source_consultation is not a valid translation status".to_string(),
            )),
        }
    }
}

/// 상태 전이 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// 쓰기 권한만 있으면 어떤 상태로든 전이 가능
    #[default]
    Permissive,
    /// pending → review_requested → completed 순방향만, omitted는 어디서든
    Strict,
}

impl TransitionPolicy {
    pub fn parse(value: &str) -> Result<TransitionPolicy, ForestError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(ForestError::Validation(format!(
                "Unknown transition policy: {other}"
            ))),
        }
    }

    pub fn allows(&self, from: TextStatus, to: TextStatus) -> bool {
        use TextStatus::*;
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                from == to
                    || to == Omitted
                    || matches!((from, to), (Pending, ReviewRequested) | (ReviewRequested, Completed))
            }
        }
    }

    pub fn allows_translation(&self, from: TranslationStatus, to: TranslationStatus) -> bool {
        self.allows(from.as_text_status(), to.as_text_status())
    }

    pub fn check(&self, from: TextStatus, to: TextStatus) -> Result<(), ForestError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(transition_error(from.as_str(), to.as_str()))
        }
    }

    pub fn check_translation(
        &self,
        from: TranslationStatus,
        to: TranslationStatus,
    ) -> Result<(), ForestError> {
        if self.allows_translation(from, to) {
            Ok(())
        } else {
            Err(transition_error(from.as_str(), to.as_str()))
        }
    }
}

fn transition_error(from: &str, to: &str) -> ForestError {
    ForestError::Validation(format!("Status transition not allowed: {from} -> {to}"))
}

impl ToSql for TextStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TextStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        TextStatus::parse(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for TranslationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TranslationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        TranslationStatus::parse(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
