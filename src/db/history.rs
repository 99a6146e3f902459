//! 편집 이력 원장
//!
//! 이력 행은 추가만 되며 수정/삭제되지 않습니다. 기록 함수는 `&Connection`을
//! 받으므로 호출자가 잡고 있는 트랜잭션/세이브포인트 안에서 실행됩니다.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_millis, Database};
use crate::error::ForestError;
use crate::models::{EditHistory, EditType, HistoryPage, TextEntry};

const HISTORY_SELECT: &str = "SELECT eh.id, eh.text_entry_id, eh.language_code, eh.old_text, eh.new_text,
            eh.edited_by, eh.edit_type, eh.created_at, u.username AS editor_name
     FROM edit_history eh
     LEFT JOIN users u ON u.id = eh.edited_by";

/// 기록할 변경 한 건
#[derive(Debug, Clone, Copy)]
pub struct HistoryEvent<'a> {
    pub text_entry_id: i64,
    pub language_code: &'a str,
    pub old_text: Option<&'a str>,
    pub new_text: Option<&'a str>,
    pub editor_id: i64,
    pub edit_type: EditType,
}

pub(super) fn history_from_row(row: &Row<'_>) -> rusqlite::Result<EditHistory> {
    Ok(EditHistory {
        id: row.get("id")?,
        text_entry_id: row.get("text_entry_id")?,
        language_code: row.get("language_code")?,
        old_text: row.get("old_text")?,
        new_text: row.get("new_text")?,
        edited_by: row.get("edited_by")?,
        edit_type: row.get("edit_type")?,
        created_at: row.get("created_at")?,
        editor_name: row.get("editor_name")?,
    })
}

/// 이력 한 건 추가
pub fn record_history(conn: &Connection, event: &HistoryEvent<'_>) -> Result<EditHistory, ForestError> {
    conn.execute(
        "INSERT INTO edit_history
         (text_entry_id, language_code, old_text, new_text, edited_by, edit_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.text_entry_id,
            event.language_code,
            event.old_text,
            event.new_text,
            event.editor_id,
            event.edit_type,
            now_millis(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    let record = conn.query_row(
        &format!("{HISTORY_SELECT} WHERE eh.id = ?1"),
        [id],
        history_from_row,
    )?;
    Ok(record)
}

/// 원문에 속한 이력 한 건. 다른 원문의 이력 id면 NotFound
fn find_history(conn: &Connection, text_entry_id: i64, history_id: i64) -> Result<EditHistory, ForestError> {
    conn.query_row(
        &format!("{HISTORY_SELECT} WHERE eh.id = ?1 AND eh.text_entry_id = ?2"),
        params![history_id, text_entry_id],
        history_from_row,
    )
    .optional()?
    .ok_or(ForestError::HistoryNotFound {
        text_entry_id,
        history_id,
    })
}

pub(super) fn recent_history(
    conn: &Connection,
    text_entry_id: i64,
    limit: u32,
) -> Result<Vec<EditHistory>, ForestError> {
    let mut stmt = conn.prepare(&format!(
        "{HISTORY_SELECT} WHERE eh.text_entry_id = ?1
         ORDER BY eh.created_at DESC, eh.id DESC LIMIT ?2"
    ))?;
    let iter = stmt.query_map(params![text_entry_id, limit], history_from_row)?;
    let mut out = Vec::new();
    for record in iter {
        out.push(record?);
    }
    Ok(out)
}

impl Database {
    /// 최신순 이력 페이지. limit은 1..=max_history_page_size 로 보정
    pub fn list_history(&self, text_entry_id: i64, limit: Option<u32>, offset: u32) -> Result<HistoryPage, ForestError> {
        let limit = limit
            .unwrap_or(self.config.history_page_size)
            .clamp(1, self.config.max_history_page_size);

        let mut stmt = self.conn.prepare(&format!(
            "{HISTORY_SELECT} WHERE eh.text_entry_id = ?1
             ORDER BY eh.created_at DESC, eh.id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let iter = stmt.query_map(params![text_entry_id, limit, offset], history_from_row)?;
        let mut records = Vec::new();
        for record in iter {
            records.push(record?);
        }

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edit_history WHERE text_entry_id = ?1",
            [text_entry_id],
            |row| row.get(0),
        )?;
        let total = total as u64;

        tracing::debug!(text_entry_id, limit, offset, total, "listed edit history");
        Ok(HistoryPage {
            records,
            total,
            limit,
            offset,
            has_more: u64::from(offset) + u64::from(limit) < total,
        })
    }

    /// 이력의 new_text로 원문을 되돌리고, 되돌림 자체를 새 update 이력으로 추가
    pub fn revert_to_history(
        &self,
        text_entry_id: i64,
        history_id: i64,
        actor_id: i64,
    ) -> Result<TextEntry, ForestError> {
        let tx = self.conn.unchecked_transaction()?;

        let target = find_history(&tx, text_entry_id, history_id)?;
        let current = super::text_entries::find_entry(&tx, text_entry_id)?;

        tx.execute(
            "UPDATE text_entries SET original_text = ?1, updated_by = ?2, updated_at = ?3 WHERE id = ?4",
            params![target.new_text, actor_id, now_millis(), text_entry_id],
        )?;

        record_history(
            &tx,
            &HistoryEvent {
                text_entry_id,
                language_code: &target.language_code,
                old_text: current.original_text.as_deref(),
                new_text: target.new_text.as_deref(),
                editor_id: actor_id,
                edit_type: EditType::Update,
            },
        )?;

        let reverted = super::text_entries::find_entry(&tx, text_entry_id)?;
        tx.commit()?;

        tracing::info!(text_entry_id, history_id, actor_id, "text entry reverted");
        Ok(reverted)
    }
}
