//! 파일 가져오기/내보내기 기록

use rusqlite::{params, Connection, Row};

use super::{now_millis, Database};
use crate::error::ForestError;
use crate::models::{FileHistory, NewFileHistory};

const FILE_HISTORY_COLUMNS: &str =
    "id, filename, file_type, file_format, record_count, status, error_message, user_id, created_at";

fn file_history_from_row(row: &Row<'_>) -> rusqlite::Result<FileHistory> {
    Ok(FileHistory {
        id: row.get("id")?,
        filename: row.get("filename")?,
        direction: row.get("file_type")?,
        format: row.get("file_format")?,
        record_count: row.get("record_count")?,
        status: row.get("status")?,
        error_message: row.get("error_message")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
    })
}

pub(super) fn record_file_history(conn: &Connection, entry: &NewFileHistory) -> Result<FileHistory, ForestError> {
    conn.execute(
        "INSERT INTO file_history
         (filename, file_type, file_format, record_count, status, error_message, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.filename,
            entry.direction,
            entry.format,
            entry.record_count,
            entry.status,
            entry.error_message,
            entry.user_id,
            now_millis(),
        ],
    )?;

    let record = conn.query_row(
        &format!("SELECT {FILE_HISTORY_COLUMNS} FROM file_history WHERE id = ?1"),
        [conn.last_insert_rowid()],
        file_history_from_row,
    )?;
    Ok(record)
}

impl Database {
    pub fn record_file_history(&self, entry: &NewFileHistory) -> Result<FileHistory, ForestError> {
        let record = record_file_history(&self.conn, entry)?;
        tracing::info!(
            filename = %record.filename,
            direction = record.direction.as_str(),
            status = record.status.as_str(),
            "file history recorded"
        );
        Ok(record)
    }

    /// 최신순
    pub fn list_file_history(&self, limit: u32) -> Result<Vec<FileHistory>, ForestError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FILE_HISTORY_COLUMNS} FROM file_history ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let iter = stmt.query_map([limit.max(1)], file_history_from_row)?;
        let mut out = Vec::new();
        for record in iter {
            out.push(record?);
        }
        Ok(out)
    }
}
