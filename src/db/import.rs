//! 일괄 가져오기 / 내보내기
//!
//! 가져오기는 배치 전체를 하나의 트랜잭션으로 묶고, 각 행은 세이브포인트
//! 안에서 처리합니다. 행 단위 오류는 해당 행만 되돌리고 배치는 계속됩니다.

use rusqlite::{params_from_iter, Connection, DropBehavior};

use super::files::record_file_history;
use super::text_entries::{apply_update, entry_from_row, filter_clause, insert_entry, ENTRY_COLUMNS};
use super::translations::write_translation;
use super::Database;
use crate::error::ForestError;
use crate::models::{
    ExportFilter, ExportRow, FileDirection, FileFormat, FileStatus, ImportRow, ImportRowError, ImportSummary,
    NewFileHistory, NewTextEntry, TextEntry, TextEntryFilter, TextEntryUpdate,
};
use crate::status::{TextStatus, TranslationStatus};

enum RowOutcome {
    Created,
    Updated,
}

/// 한 행을 검증한 결과
struct ParsedRow<'a> {
    id: Option<i64>,
    label: &'a str,
    file_category: Option<&'a str>,
    original_text: &'a str,
    language_code: &'a str,
    translated_text: Option<&'a str>,
    status: Option<TextStatus>,
    max_chars: Option<u32>,
    max_lines: Option<u32>,
}

fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(field: &str, value: &Option<String>) -> Result<Option<u32>, ForestError> {
    cell(value)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| ForestError::Validation(format!("{field} must be a non-negative integer: {raw}")))
        })
        .transpose()
}

fn parse_row<'a>(row: &'a ImportRow, source_language: &'a str) -> Result<ParsedRow<'a>, ForestError> {
    let label = cell(&row.label);
    let original_text = cell(&row.original_text);
    let (label, original_text) = match (label, original_text) {
        (Some(label), Some(text)) => (label, text),
        (None, Some(_)) => return Err(ForestError::Validation("Missing required field: label".to_string())),
        (Some(_), None) => {
            return Err(ForestError::Validation("Missing required field: original_text".to_string()))
        }
        (None, None) => {
            return Err(ForestError::Validation(
                "Missing required fields: label, original_text".to_string(),
            ))
        }
    };

    let id = cell(&row.id)
        .map(|raw| {
            raw.parse::<i64>()
                .map_err(|_| ForestError::Validation(format!("Invalid id: {raw}")))
        })
        .transpose()?;

    Ok(ParsedRow {
        id,
        label,
        file_category: cell(&row.file_category),
        original_text,
        language_code: cell(&row.language_code).unwrap_or(source_language),
        translated_text: cell(&row.translated_text),
        status: cell(&row.status).map(TextStatus::parse).transpose()?,
        max_chars: parse_count("max_chars", &row.max_chars)?,
        max_lines: parse_count("max_lines", &row.max_lines)?,
    })
}

/// 배치를 중단하지 않고 행 오류로 기록할 에러인지
fn is_row_error(error: &ForestError) -> bool {
    match error {
        ForestError::Database(rusqlite::Error::SqliteFailure(inner, _)) => {
            inner.code == rusqlite::ErrorCode::ConstraintViolation
        }
        ForestError::Database(_) | ForestError::Io(_) => false,
        _ => true,
    }
}

fn entry_exists(conn: &Connection, id: i64) -> Result<bool, ForestError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM text_entries WHERE id = ?1", [id], |row| row.get(0))?;
    Ok(count > 0)
}

impl Database {
    /// 행 목록 가져오기. 완료 후 (실패 시에도) file_history 기록
    pub fn import_batch(
        &self,
        filename: &str,
        rows: &[ImportRow],
        actor_id: i64,
        update_existing: bool,
    ) -> Result<ImportSummary, ForestError> {
        tracing::info!(filename, rows = rows.len(), update_existing, "import started");

        let summary = match self.run_import(rows, actor_id, update_existing) {
            Ok(summary) => summary,
            Err(error) => {
                tracing::error!(filename, error = %error, "import failed, batch rolled back");
                let failed = NewFileHistory {
                    filename: filename.to_string(),
                    direction: FileDirection::Import,
                    format: FileFormat::Csv,
                    record_count: None,
                    status: FileStatus::Failed,
                    error_message: Some(error.to_string()),
                    user_id: actor_id,
                };
                if let Err(log_error) = record_file_history(&self.conn, &failed) {
                    tracing::error!(filename, error = %log_error, "failed to record import failure");
                }
                return Err(error);
            }
        };

        record_file_history(
            &self.conn,
            &NewFileHistory {
                filename: filename.to_string(),
                direction: FileDirection::Import,
                format: FileFormat::Csv,
                record_count: Some(summary.created + summary.updated),
                status: FileStatus::Success,
                error_message: summary.error_message(),
                user_id: actor_id,
            },
        )?;

        tracing::info!(
            filename,
            created = summary.created,
            updated = summary.updated,
            errors = summary.errors.len(),
            "import finished"
        );
        Ok(summary)
    }

    fn run_import(&self, rows: &[ImportRow], actor_id: i64, update_existing: bool) -> Result<ImportSummary, ForestError> {
        let mut summary = ImportSummary {
            total_rows: rows.len() as u32,
            ..Default::default()
        };

        let mut tx = self.conn.unchecked_transaction()?;
        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            let mut savepoint = tx.savepoint()?;

            match self.import_row(&savepoint, row, actor_id, update_existing) {
                Ok(outcome) => {
                    savepoint.commit()?;
                    match outcome {
                        RowOutcome::Created => summary.created += 1,
                        RowOutcome::Updated => summary.updated += 1,
                    }
                }
                Err(error) if is_row_error(&error) => {
                    savepoint.set_drop_behavior(DropBehavior::Rollback);
                    savepoint.finish()?;
                    let message = match error {
                        ForestError::Validation(message) => message,
                        other => other.to_string(),
                    };
                    tracing::warn!(row = row_number, %message, "import row skipped");
                    summary.errors.push(ImportRowError {
                        row: row_number,
                        line: row_number + 1,
                        message,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        tx.commit()?;

        Ok(summary)
    }

    fn import_row(
        &self,
        conn: &Connection,
        row: &ImportRow,
        actor_id: i64,
        update_existing: bool,
    ) -> Result<RowOutcome, ForestError> {
        let parsed = parse_row(row, &self.config.source_language)?;

        if update_existing {
            if let Some(id) = parsed.id {
                if entry_exists(conn, id)? {
                    let update = TextEntryUpdate {
                        label: Some(parsed.label.to_string()),
                        file_category: parsed.file_category.map(str::to_string),
                        original_text: Some(parsed.original_text.to_string()),
                        language_code: Some(parsed.language_code.to_string()),
                        status: parsed.status,
                        max_chars: parsed.max_chars,
                        max_lines: parsed.max_lines,
                        expected_revision: None,
                    };
                    apply_update(conn, id, &update, self, actor_id)?;
                    return Ok(RowOutcome::Updated);
                }
            }
        }

        let status = parsed.status.unwrap_or_default();
        let input = NewTextEntry {
            label: parsed.label.to_string(),
            file_category: parsed.file_category.map(str::to_string),
            original_text: Some(parsed.original_text.to_string()),
            language_code: Some(parsed.language_code.to_string()),
            status: Some(status),
            max_chars: parsed.max_chars,
            max_lines: parsed.max_lines,
        };
        let entry = insert_entry(conn, &input, &self.config.source_language, actor_id)?;

        if let Some(translated) = parsed.translated_text {
            if parsed.language_code != self.config.source_language {
                let translation_status = TranslationStatus::try_from(status)?;
                write_translation(conn, entry.id, parsed.language_code, Some(translated), translation_status, actor_id)?;
            }
        }

        Ok(RowOutcome::Created)
    }

    /// 내보내기용 평탄화 행 (id 오름차순)
    pub fn export_rows(&self, filter: &ExportFilter, include_translations: bool) -> Result<Vec<ExportRow>, ForestError> {
        let (clause, values) = filter_clause(&TextEntryFilter {
            search: filter.search.clone(),
            status: filter.status,
            category: filter.category.clone(),
        });
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM text_entries {clause} ORDER BY id ASC"))?;
        let iter = stmt.query_map(params_from_iter(values.iter()), entry_from_row)?;
        let mut entries = Vec::new();
        for entry in iter {
            entries.push(entry?);
        }

        let mut rows = Vec::new();
        for entry in &entries {
            let translations = if include_translations {
                self.list_translations(entry.id)?
            } else {
                Vec::new()
            };

            if translations.is_empty() {
                rows.push(export_row(entry, &entry.language_code, None, entry.status.as_str()));
            }
            for translation in &translations {
                rows.push(export_row(
                    entry,
                    &translation.language_code,
                    Some(translation.translated_text.clone().unwrap_or_default()),
                    translation.status.as_str(),
                ));
            }
        }

        tracing::debug!(entries = entries.len(), rows = rows.len(), "export rows built");
        Ok(rows)
    }
}

fn export_row(entry: &TextEntry, language_code: &str, translated_text: Option<String>, status: &str) -> ExportRow {
    ExportRow {
        id: entry.id,
        label: entry.label.clone(),
        file_category: entry.file_category.clone().unwrap_or_default(),
        original_text: entry.original_text.clone().unwrap_or_default(),
        language_code: language_code.to_string(),
        translated_text,
        status: status.to_string(),
        max_chars: entry.max_chars,
        max_lines: entry.max_lines,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}
