//! Storage Commands
//!
//! 일괄 가져오기/내보내기, 파일 기록, DB 백업

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::DbState;
use crate::error::{CommandError, CommandResult, ForestError};
use crate::models::{
    ExportFilter, ExportRow, FileDirection, FileFormat, FileHistory, FileStatus, ImportRow, ImportSummary,
    NewFileHistory,
};
use crate::rbac::{Actor, Permission};

use super::ensure_permission;

const DEFAULT_FILE_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTextEntriesArgs {
    pub filename: String,
    pub rows: Vec<ImportRow>,
    #[serde(default)]
    pub update_existing: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTextEntriesArgs {
    #[serde(default)]
    pub filter: ExportFilter,
    pub include_translations: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub filename: String,
    pub rows: Vec<ExportRow>,
}

/// 행 목록 일괄 가져오기
pub fn import_text_entries(
    db_state: &DbState,
    actor: &Actor,
    args: ImportTextEntriesArgs,
) -> CommandResult<ImportSummary> {
    ensure_permission(actor, Permission::ImportExportFiles)?;
    if args.rows.is_empty() {
        return Err(ForestError::Validation("No rows to import".to_string()).into());
    }

    db_state.with(|db| {
        db.import_batch(&args.filename, &args.rows, actor.user_id, args.update_existing)
            .map_err(CommandError::from)
    })
}

/// 내보내기 행 생성 + export 기록. 행이 없으면 VALIDATION_ERROR
pub fn export_text_entries(
    db_state: &DbState,
    actor: &Actor,
    args: ExportTextEntriesArgs,
) -> CommandResult<ExportResult> {
    ensure_permission(actor, Permission::ImportExportFiles)?;

    db_state.with(|db| {
        let rows = db.export_rows(&args.filter, args.include_translations.unwrap_or(true))?;
        if rows.is_empty() {
            return Err(ForestError::Validation("No data to export".to_string()).into());
        }

        let filename = format!("text_entries_{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
        db.record_file_history(&NewFileHistory {
            filename: filename.clone(),
            direction: FileDirection::Export,
            format: FileFormat::Csv,
            record_count: Some(rows.len() as u32),
            status: FileStatus::Success,
            error_message: None,
            user_id: actor.user_id,
        })?;

        Ok(ExportResult { filename, rows })
    })
}

pub fn list_file_history(db_state: &DbState, actor: &Actor, limit: Option<u32>) -> CommandResult<Vec<FileHistory>> {
    ensure_permission(actor, Permission::ImportExportFiles)?;
    db_state.with(|db| {
        db.list_file_history(limit.unwrap_or(DEFAULT_FILE_HISTORY_LIMIT))
            .map_err(CommandError::from)
    })
}

/// DB 파일 백업 (admin_access 필요)
pub fn backup_database(db_state: &DbState, actor: &Actor, out_path: PathBuf) -> CommandResult<()> {
    ensure_permission(actor, Permission::AdminAccess)?;
    db_state.with(|db| db.backup_to(&out_path).map_err(CommandError::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{admin, assert_forbidden, state, writer};

    fn import_row(label: &str, text: Option<&str>) -> ImportRow {
        ImportRow {
            label: Some(label.to_string()),
            original_text: text.map(str::to_string),
            language_code: Some("ja".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_import_and_export_require_file_permission() {
        let state = state();
        assert_forbidden(import_text_entries(
            &state,
            &writer(),
            ImportTextEntriesArgs {
                filename: "a.csv".to_string(),
                rows: vec![import_row("A", Some("a"))],
                update_existing: false,
            },
        ));
        assert_forbidden(export_text_entries(&state, &writer(), ExportTextEntriesArgs::default()));
        assert_forbidden(list_file_history(&state, &writer(), None));
    }

    #[test]
    fn test_import_then_export_logs_both() {
        let state = state();
        let summary = import_text_entries(
            &state,
            &admin(),
            ImportTextEntriesArgs {
                filename: "events.csv".to_string(),
                rows: vec![
                    import_row("A", Some("a")),
                    import_row("B", None),
                    import_row("C", Some("c")),
                ],
                update_existing: false,
            },
        )
        .unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.errors[0].line, 3);

        let export = export_text_entries(&state, &admin(), ExportTextEntriesArgs::default()).unwrap();
        assert_eq!(export.rows.len(), 2);
        assert!(export.filename.starts_with("text_entries_"));
        assert!(export.filename.ends_with(".csv"));

        let log = list_file_history(&state, &admin(), None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].direction, FileDirection::Export);
        assert_eq!(log[0].record_count, Some(2));
        assert_eq!(log[1].direction, FileDirection::Import);
    }

    #[test]
    fn test_empty_export_is_validation_error() {
        let state = state();
        let err = export_text_entries(&state, &admin(), ExportTextEntriesArgs::default()).unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert!(err.message.contains("No data to export"));
        assert!(list_file_history(&state, &admin(), None).unwrap().is_empty());
    }

    #[test]
    fn test_backup_requires_admin() {
        let dir = tempfile::tempdir().unwrap();
        let state = state();
        let path = dir.path().join("backup.db");
        assert_forbidden(backup_database(&state, &writer(), path.clone()));
        backup_database(&state, &admin(), path.clone()).unwrap();
        assert!(path.exists());
    }
}
