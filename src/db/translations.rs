//! 번역 저장소
//!
//! (text_entry_id, language_code)당 한 행. 같은 키로 다시 쓰면 upsert

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::text_entries::find_entry;
use super::{now_millis, Database};
use crate::error::ForestError;
use crate::models::Translation;
use crate::status::TranslationStatus;

const TRANSLATION_COLUMNS: &str = "id, text_entry_id, language_code, translated_text, status,
     translator_id, reviewer_id, created_at, updated_at";

fn translation_from_row(row: &Row<'_>) -> rusqlite::Result<Translation> {
    Ok(Translation {
        id: row.get("id")?,
        text_entry_id: row.get("text_entry_id")?,
        language_code: row.get("language_code")?,
        translated_text: row.get("translated_text")?,
        status: row.get("status")?,
        translator_id: row.get("translator_id")?,
        reviewer_id: row.get("reviewer_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(super) fn find_translation(
    conn: &Connection,
    text_entry_id: i64,
    language_code: &str,
) -> Result<Option<Translation>, ForestError> {
    let found = conn
        .query_row(
            &format!(
                "SELECT {TRANSLATION_COLUMNS} FROM translations
                 WHERE text_entry_id = ?1 AND language_code = ?2"
            ),
            params![text_entry_id, language_code],
            translation_from_row,
        )
        .optional()?;
    Ok(found)
}

/// upsert 본체. 트랜잭션은 호출자 소관
pub(super) fn write_translation(
    conn: &Connection,
    text_entry_id: i64,
    language_code: &str,
    translated_text: Option<&str>,
    status: TranslationStatus,
    translator_id: i64,
) -> Result<Translation, ForestError> {
    let now = now_millis();
    conn.execute(
        "INSERT INTO translations
         (text_entry_id, language_code, translated_text, status, translator_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT (text_entry_id, language_code) DO UPDATE SET
             translated_text = excluded.translated_text,
             status = excluded.status,
             translator_id = excluded.translator_id,
             updated_at = excluded.updated_at",
        params![text_entry_id, language_code, translated_text, status, translator_id, now],
    )?;

    find_translation(conn, text_entry_id, language_code)?.ok_or_else(|| ForestError::TranslationNotFound {
        text_entry_id,
        language_code: language_code.to_string(),
    })
}

fn validate_language(language_code: &str) -> Result<(), ForestError> {
    if language_code.trim().is_empty() {
        return Err(ForestError::Validation("Language code is required".to_string()));
    }
    Ok(())
}

impl Database {
    /// 번역 생성 또는 갱신. 생략한 text/status는 기존 값 유지 (신규 status는 pending)
    pub fn upsert_translation(
        &self,
        text_entry_id: i64,
        language_code: &str,
        translated_text: Option<&str>,
        status: Option<TranslationStatus>,
        translator_id: i64,
    ) -> Result<Translation, ForestError> {
        validate_language(language_code)?;
        let language_code = language_code.trim();

        let tx = self.conn.unchecked_transaction()?;
        find_entry(&tx, text_entry_id)?;

        let existing = find_translation(&tx, text_entry_id, language_code)?;
        let status = match (&existing, status) {
            (Some(current), Some(next)) => {
                self.config.transition_policy.check_translation(current.status, next)?;
                next
            }
            (Some(current), None) => current.status,
            (None, next) => next.unwrap_or_default(),
        };

        let translated_text = translated_text.or_else(|| existing.as_ref().and_then(|t| t.translated_text.as_deref()));
        let translation = write_translation(&tx, text_entry_id, language_code, translated_text, status, translator_id)?;
        tx.commit()?;

        tracing::info!(
            text_entry_id,
            language_code,
            translator_id,
            created = existing.is_none(),
            "translation saved"
        );
        Ok(translation)
    }

    /// 검수 결과 반영 (상태 + 검수자)
    pub fn review_translation(
        &self,
        text_entry_id: i64,
        language_code: &str,
        status: TranslationStatus,
        reviewer_id: i64,
    ) -> Result<Translation, ForestError> {
        let tx = self.conn.unchecked_transaction()?;
        let current = find_translation(&tx, text_entry_id, language_code)?.ok_or_else(|| {
            ForestError::TranslationNotFound {
                text_entry_id,
                language_code: language_code.to_string(),
            }
        })?;
        self.config.transition_policy.check_translation(current.status, status)?;

        tx.execute(
            "UPDATE translations SET status = ?1, reviewer_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![status, reviewer_id, now_millis(), current.id],
        )?;
        let reviewed = find_translation(&tx, text_entry_id, language_code)?.ok_or_else(|| {
            ForestError::TranslationNotFound {
                text_entry_id,
                language_code: language_code.to_string(),
            }
        })?;
        tx.commit()?;

        tracing::info!(text_entry_id, language_code, reviewer_id, status = status.as_str(), "translation reviewed");
        Ok(reviewed)
    }

    pub fn get_translation(&self, text_entry_id: i64, language_code: &str) -> Result<Translation, ForestError> {
        find_translation(&self.conn, text_entry_id, language_code)?.ok_or_else(|| {
            ForestError::TranslationNotFound {
                text_entry_id,
                language_code: language_code.to_string(),
            }
        })
    }

    pub fn list_translations(&self, text_entry_id: i64) -> Result<Vec<Translation>, ForestError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRANSLATION_COLUMNS} FROM translations
             WHERE text_entry_id = ?1 ORDER BY language_code"
        ))?;
        let iter = stmt.query_map([text_entry_id], translation_from_row)?;
        let mut out = Vec::new();
        for translation in iter {
            out.push(translation?);
        }
        Ok(out)
    }

    pub fn delete_translation(&self, text_entry_id: i64, language_code: &str) -> Result<(), ForestError> {
        let deleted = self.conn.execute(
            "DELETE FROM translations WHERE text_entry_id = ?1 AND language_code = ?2",
            params![text_entry_id, language_code],
        )?;
        if deleted == 0 {
            return Err(ForestError::TranslationNotFound {
                text_entry_id,
                language_code: language_code.to_string(),
            });
        }
        tracing::info!(text_entry_id, language_code, "translation deleted");
        Ok(())
    }
}
