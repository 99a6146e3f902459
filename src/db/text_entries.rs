//! 원문 텍스트 저장소

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::history::{record_history, recent_history, HistoryEvent};
use super::{like_pattern, now_millis, Database};
use crate::error::ForestError;
use crate::glossary::{GlossaryRecord, Tag};
use crate::models::{
    EditType, NewTextEntry, Page, TextEntry, TextEntryDetail, TextEntryFilter, TextEntryUpdate,
};

pub(super) const ENTRY_COLUMNS: &str = "id, label, file_category, original_text, language_code, status,
     max_chars, max_lines, created_by, updated_by, created_at, updated_at";

const DETAIL_HISTORY_LIMIT: u32 = 100;

pub(super) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TextEntry> {
    Ok(TextEntry {
        id: row.get("id")?,
        label: row.get("label")?,
        file_category: row.get("file_category")?,
        original_text: row.get("original_text")?,
        language_code: row.get("language_code")?,
        status: row.get("status")?,
        max_chars: row.get("max_chars")?,
        max_lines: row.get("max_lines")?,
        created_by: row.get("created_by")?,
        updated_by: row.get("updated_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(super) fn find_entry(conn: &Connection, id: i64) -> Result<TextEntry, ForestError> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM text_entries WHERE id = ?1"),
        [id],
        entry_from_row,
    )
    .optional()?
    .ok_or(ForestError::TextEntryNotFound(id))
}

pub(super) fn validate_label(label: &str) -> Result<(), ForestError> {
    if label.trim().is_empty() {
        return Err(ForestError::Validation("Label is required".to_string()));
    }
    Ok(())
}

/// 원문 행 삽입 + create 이력. 트랜잭션은 호출자 소관
pub(super) fn insert_entry(
    conn: &Connection,
    input: &NewTextEntry,
    default_language: &str,
    actor_id: i64,
) -> Result<TextEntry, ForestError> {
    validate_label(&input.label)?;

    let language_code = input
        .language_code
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(default_language);
    let status = input.status.unwrap_or_default();
    let now = now_millis();

    conn.execute(
        "INSERT INTO text_entries
         (label, file_category, original_text, language_code, status, max_chars, max_lines,
          created_by, updated_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?9)",
        params![
            input.label.trim(),
            input.file_category,
            input.original_text,
            language_code,
            status,
            input.max_chars,
            input.max_lines,
            actor_id,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();

    record_history(
        conn,
        &HistoryEvent {
            text_entry_id: id,
            language_code,
            old_text: None,
            new_text: input.original_text.as_deref(),
            editor_id: actor_id,
            edit_type: EditType::Create,
        },
    )?;

    find_entry(conn, id)
}

/// 부분 업데이트 + update 이력. 트랜잭션은 호출자 소관
pub(super) fn apply_update(
    conn: &Connection,
    id: i64,
    update: &TextEntryUpdate,
    db: &Database,
    actor_id: i64,
) -> Result<TextEntry, ForestError> {
    let current = find_entry(conn, id)?;

    if let Some(expected) = update.expected_revision.as_deref() {
        if expected != current.revision() {
            return Err(ForestError::Conflict(format!(
                "Text entry {id} was modified by someone else"
            )));
        }
    }
    if let Some(label) = update.label.as_deref() {
        validate_label(label)?;
    }
    if let Some(status) = update.status {
        db.config.transition_policy.check(current.status, status)?;
    }

    let label = update.label.as_deref().map(str::trim).unwrap_or(&current.label);
    let file_category = update.file_category.as_ref().or(current.file_category.as_ref());
    let original_text = update.original_text.as_ref().or(current.original_text.as_ref());
    let language_code = update.language_code.as_deref().unwrap_or(&current.language_code);
    let status = update.status.unwrap_or(current.status);
    let max_chars = update.max_chars.or(current.max_chars);
    let max_lines = update.max_lines.or(current.max_lines);

    conn.execute(
        "UPDATE text_entries
         SET label = ?1, file_category = ?2, original_text = ?3, language_code = ?4, status = ?5,
             max_chars = ?6, max_lines = ?7, updated_by = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            label,
            file_category,
            original_text,
            language_code,
            status,
            max_chars,
            max_lines,
            actor_id,
            now_millis(),
            id,
        ],
    )?;

    record_history(
        conn,
        &HistoryEvent {
            text_entry_id: id,
            language_code,
            old_text: current.original_text.as_deref(),
            new_text: original_text.map(String::as_str),
            editor_id: actor_id,
            edit_type: EditType::Update,
        },
    )?;

    find_entry(conn, id)
}

pub(super) fn filter_clause(filter: &TextEntryFilter) -> (String, Vec<Value>) {
    let mut clause = String::from("WHERE 1=1");
    let mut values = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clause.push_str(" AND (label LIKE ? ESCAPE '\\' OR original_text LIKE ? ESCAPE '\\')");
        let pattern = like_pattern(search.trim());
        values.push(Value::from(pattern.clone()));
        values.push(Value::from(pattern));
    }
    if let Some(status) = filter.status {
        clause.push_str(" AND status = ?");
        values.push(Value::from(status.as_str().to_string()));
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        clause.push_str(" AND file_category = ?");
        values.push(Value::from(category.to_string()));
    }

    (clause, values)
}

impl Database {
    /// 원문 생성. 상태는 pending, 언어는 설정된 원문 언어가 기본값
    pub fn create_text_entry(&self, input: &NewTextEntry, actor_id: i64) -> Result<TextEntry, ForestError> {
        let tx = self.conn.unchecked_transaction()?;
        let entry = insert_entry(&tx, input, &self.config.source_language, actor_id)?;
        tx.commit()?;

        tracing::info!(id = entry.id, label = %entry.label, actor_id, "text entry created");
        Ok(entry)
    }

    pub fn get_text_entry(&self, id: i64) -> Result<TextEntry, ForestError> {
        find_entry(&self.conn, id)
    }

    pub fn update_text_entry(
        &self,
        id: i64,
        update: &TextEntryUpdate,
        actor_id: i64,
    ) -> Result<TextEntry, ForestError> {
        let tx = self.conn.unchecked_transaction()?;
        let entry = apply_update(&tx, id, update, self, actor_id)?;
        tx.commit()?;

        tracing::info!(id, actor_id, status = entry.status.as_str(), "text entry updated");
        Ok(entry)
    }

    /// 원문 삭제. 번역, 이력, 편집 세션, 태그 연결이 함께 삭제됨
    pub fn delete_text_entry(&self, id: i64) -> Result<(), ForestError> {
        let tx = self.conn.unchecked_transaction()?;
        let entry = find_entry(&tx, id)?;
        let history_rows: i64 = tx.query_row(
            "SELECT COUNT(*) FROM edit_history WHERE text_entry_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        tx.execute("DELETE FROM text_entries WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::info!(id, label = %entry.label, history_rows, "text entry deleted");
        Ok(())
    }

    /// updated_at 최신순 페이지 (page는 1부터)
    pub fn list_text_entries(
        &self,
        filter: &TextEntryFilter,
        page: u32,
        limit: u32,
    ) -> Result<Page<TextEntry>, ForestError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 500);
        let offset = i64::from(page - 1) * i64::from(limit);
        let (clause, mut values) = filter_clause(filter);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM text_entries {clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        values.push(Value::from(limit));
        values.push(Value::from(offset));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM text_entries {clause}
             ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let iter = stmt.query_map(params_from_iter(values.iter()), entry_from_row)?;
        let mut items = Vec::new();
        for entry in iter {
            items.push(entry?);
        }

        Ok(Page::new(items, total as u64, page, limit))
    }

    /// 상세 화면용: 번역, 최근 이력 100건, 활성 편집 세션, 태그
    pub fn get_text_entry_detail(&self, id: i64) -> Result<TextEntryDetail, ForestError> {
        let entry = find_entry(&self.conn, id)?;
        let translations = self.list_translations(id)?;
        let history = recent_history(&self.conn, id, DETAIL_HISTORY_LIMIT)?;
        let active_sessions = self.active_edit_sessions(id)?;
        let tags = self.tags_for_entry(id)?;
        let revision = entry.revision();

        Ok(TextEntryDetail {
            entry,
            translations,
            history,
            active_sessions,
            tags,
            revision,
        })
    }

    pub fn attach_tag(&self, text_entry_id: i64, tag_id: i64) -> Result<(), ForestError> {
        find_entry(&self.conn, text_entry_id)?;
        self.get_glossary::<Tag>(tag_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO text_entry_tags (text_entry_id, tag_id) VALUES (?1, ?2)",
            params![text_entry_id, tag_id],
        )?;
        Ok(())
    }

    pub fn detach_tag(&self, text_entry_id: i64, tag_id: i64) -> Result<(), ForestError> {
        self.conn.execute(
            "DELETE FROM text_entry_tags WHERE text_entry_id = ?1 AND tag_id = ?2",
            params![text_entry_id, tag_id],
        )?;
        Ok(())
    }

    pub fn tags_for_entry(&self, text_entry_id: i64) -> Result<Vec<Tag>, ForestError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.* FROM tags t
             INNER JOIN text_entry_tags tt ON tt.tag_id = t.id
             WHERE tt.text_entry_id = ?1
             ORDER BY t.name",
        )?;
        let iter = stmt.query_map([text_entry_id], Tag::from_row)?;
        let mut out = Vec::new();
        for tag in iter {
            out.push(tag?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::db::test_support::{entry, memory_db, memory_db_with};
    use crate::glossary::TagInput;
    use crate::status::{TextStatus, TransitionPolicy};

    #[test]
    fn test_create_applies_defaults_and_records_history() {
        let db = memory_db();
        let e = db
            .create_text_entry(
                &NewTextEntry {
                    label: "  EV_010 ".to_string(),
                    original_text: Some("おはよう".to_string()),
                    max_chars: Some(16),
                    ..Default::default()
                },
                3,
            )
            .unwrap();

        assert_eq!(e.label, "EV_010");
        assert_eq!(e.language_code, "ja");
        assert_eq!(e.status, TextStatus::Pending);
        assert_eq!(e.created_by, Some(3));
        assert_eq!(e.max_chars, Some(16));

        let history = db.list_history(e.id, None, 0).unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.records[0].edit_type, EditType::Create);
        assert_eq!(history.records[0].new_text.as_deref(), Some("おはよう"));
    }

    #[test]
    fn test_create_requires_label() {
        let db = memory_db();
        let err = db
            .create_text_entry(
                &NewTextEntry {
                    label: "   ".to_string(),
                    ..Default::default()
                },
                1,
            )
            .unwrap_err();
        assert!(matches!(err, ForestError::Validation(_)));
        assert_eq!(db.list_text_entries(&TextEntryFilter::default(), 1, 10).unwrap().total, 0);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let db = memory_db();
        let e = entry(&db, "EV_011", "before", 1);
        let updated = db
            .update_text_entry(
                e.id,
                &TextEntryUpdate {
                    status: Some(TextStatus::ReviewRequested),
                    ..Default::default()
                },
                2,
            )
            .unwrap();

        assert_eq!(updated.status, TextStatus::ReviewRequested);
        assert_eq!(updated.original_text.as_deref(), Some("before"));
        assert_eq!(updated.updated_by, Some(2));

        let history = db.list_history(e.id, None, 0).unwrap();
        assert_eq!(history.total, 2);
        assert_eq!(history.records[0].old_text.as_deref(), Some("before"));
        assert_eq!(history.records[0].new_text.as_deref(), Some("before"));
    }

    #[test]
    fn test_update_missing_entry_is_not_found() {
        let db = memory_db();
        let err = db
            .update_text_entry(42, &TextEntryUpdate::default(), 1)
            .unwrap_err();
        assert!(matches!(err, ForestError::TextEntryNotFound(42)));
    }

    #[test]
    fn test_update_rejects_empty_label() {
        let db = memory_db();
        let e = entry(&db, "EV_012", "x", 1);
        let err = db
            .update_text_entry(
                e.id,
                &TextEntryUpdate {
                    label: Some(String::new()),
                    ..Default::default()
                },
                1,
            )
            .unwrap_err();
        assert!(matches!(err, ForestError::Validation(_)));
        assert_eq!(db.list_history(e.id, None, 0).unwrap().total, 1);
    }

    #[test]
    fn test_stale_revision_is_conflict() {
        let db = memory_db();
        let e = entry(&db, "EV_013", "v1", 1);
        let stale = e.revision();

        db.update_text_entry(
            e.id,
            &TextEntryUpdate {
                original_text: Some("v2".to_string()),
                expected_revision: Some(stale.clone()),
                ..Default::default()
            },
            1,
        )
        .unwrap();

        let err = db
            .update_text_entry(
                e.id,
                &TextEntryUpdate {
                    original_text: Some("v3".to_string()),
                    expected_revision: Some(stale),
                    ..Default::default()
                },
                2,
            )
            .unwrap_err();
        assert!(matches!(err, ForestError::Conflict(_)));
        assert_eq!(db.get_text_entry(e.id).unwrap().original_text.as_deref(), Some("v2"));
    }

    #[test]
    fn test_strict_policy_blocks_skipping_review() {
        let db = memory_db_with(ForestConfig {
            transition_policy: TransitionPolicy::Strict,
            ..Default::default()
        });
        let e = entry(&db, "EV_014", "x", 1);
        let skip = TextEntryUpdate {
            status: Some(TextStatus::Completed),
            ..Default::default()
        };
        assert!(matches!(
            db.update_text_entry(e.id, &skip, 1).unwrap_err(),
            ForestError::Validation(_)
        ));

        let review = TextEntryUpdate {
            status: Some(TextStatus::ReviewRequested),
            ..Default::default()
        };
        db.update_text_entry(e.id, &review, 1).unwrap();
        db.update_text_entry(e.id, &skip, 1).unwrap();
        assert_eq!(db.get_text_entry(e.id).unwrap().status, TextStatus::Completed);
    }

    #[test]
    fn test_delete_cascades() {
        let db = memory_db();
        let e = entry(&db, "EV_015", "x", 1);
        db.upsert_translation(e.id, "en", Some("x-en"), None, 2).unwrap();
        db.touch_edit_session(2, e.id, Some("en")).unwrap();
        let tag = db
            .create_glossary::<Tag>(
                &TagInput {
                    name: "voice".to_string(),
                    ..Default::default()
                },
                1,
            )
            .unwrap();
        db.attach_tag(e.id, tag.id).unwrap();

        db.delete_text_entry(e.id).unwrap();

        assert!(matches!(db.get_text_entry(e.id), Err(ForestError::TextEntryNotFound(_))));
        assert!(db.list_translations(e.id).unwrap().is_empty());
        assert_eq!(db.list_history(e.id, None, 0).unwrap().total, 0);
        assert!(db.active_edit_sessions(e.id).unwrap().is_empty());
        // 태그 자체는 남음
        assert!(db.get_glossary::<Tag>(tag.id).is_ok());
        assert!(matches!(db.delete_text_entry(e.id), Err(ForestError::TextEntryNotFound(_))));
    }

    #[test]
    fn test_list_filters_and_paginates() {
        let db = memory_db();
        for i in 0..5 {
            entry(&db, &format!("EV_{i:03}"), &format!("line {i}"), 1);
        }
        let e = entry(&db, "SYS_100%", "menu", 1);
        db.update_text_entry(
            e.id,
            &TextEntryUpdate {
                file_category: Some("system".to_string()),
                status: Some(TextStatus::Completed),
                ..Default::default()
            },
            1,
        )
        .unwrap();

        let all = db.list_text_entries(&TextEntryFilter::default(), 1, 4).unwrap();
        assert_eq!(all.total, 6);
        assert_eq!(all.items.len(), 4);
        assert_eq!(all.total_pages, 2);
        assert!(all.has_next);
        assert_eq!(all.items[0].id, e.id);

        let search = TextEntryFilter {
            search: Some("line 3".to_string()),
            ..Default::default()
        };
        assert_eq!(db.list_text_entries(&search, 1, 10).unwrap().total, 1);

        let percent = TextEntryFilter {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        assert_eq!(db.list_text_entries(&percent, 1, 10).unwrap().total, 1);

        let combined = TextEntryFilter {
            status: Some(TextStatus::Completed),
            category: Some("system".to_string()),
            ..Default::default()
        };
        let page = db.list_text_entries(&combined, 1, 10).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].label, "SYS_100%");
    }

    #[test]
    fn test_page_far_past_end_is_empty() {
        let db = memory_db();
        entry(&db, "EV_900", "x", 1);

        let page = db.list_text_entries(&TextEntryFilter::default(), u32::MAX, 500).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, u32::MAX);
        assert!(!page.has_next);
    }

    #[test]
    fn test_detail_bundles_related_rows() {
        let db = memory_db();
        let e = entry(&db, "EV_016", "x", 1);
        db.upsert_translation(e.id, "en", Some("x-en"), None, 2).unwrap();
        db.touch_edit_session(2, e.id, None).unwrap();

        let detail = db.get_text_entry_detail(e.id).unwrap();
        assert_eq!(detail.translations.len(), 1);
        assert_eq!(detail.history.len(), 1);
        assert_eq!(detail.active_sessions.len(), 1);
        assert_eq!(detail.revision, e.revision());
    }
}
