//! 진행 현황 통계

use rusqlite::types::Value;
use rusqlite::params_from_iter;

use super::Database;
use crate::error::ForestError;
use crate::models::{ActivityRecord, BreakdownCount, StatusCount};
use crate::status::TextStatus;

/// file_category가 없는 원문의 집계 키
const UNCATEGORIZED: &str = "その他";

const BREAKDOWN_COLUMNS: &str = "COUNT(*) AS entry_count,
     SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed,
     SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END) AS pending,
     SUM(CASE WHEN status = 'review_requested' THEN 1 ELSE 0 END) AS review_requested,
     SUM(CASE WHEN status = 'omitted' THEN 1 ELSE 0 END) AS omitted";

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

impl Database {
    /// 상태별 원문 수. 다섯 상태 모두 고정 순서로 반환
    pub fn progress_by_status(&self, category: Option<&str>) -> Result<Vec<StatusCount>, ForestError> {
        let mut sql = String::from("SELECT status, COUNT(*) FROM text_entries");
        let mut values = Vec::new();
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            sql.push_str(" WHERE file_category = ?");
            values.push(Value::from(category.to_string()));
        }
        sql.push_str(" GROUP BY status");

        let mut stmt = self.conn.prepare(&sql)?;
        let iter = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, TextStatus>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = Vec::new();
        for item in iter {
            counts.push(item?);
        }

        let total: u64 = counts.iter().map(|(_, n)| *n as u64).sum();
        Ok(TextStatus::ALL
            .iter()
            .map(|status| {
                let count = counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map(|(_, n)| *n as u64)
                    .unwrap_or(0);
                StatusCount {
                    status: *status,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect())
    }

    /// 카테고리별 원문 수 (많은 순)
    pub fn progress_by_category(&self) -> Result<Vec<BreakdownCount>, ForestError> {
        self.breakdown(&format!(
            "SELECT COALESCE(file_category, '{UNCATEGORIZED}') AS bucket, {BREAKDOWN_COLUMNS}
             FROM text_entries
             GROUP BY COALESCE(file_category, '{UNCATEGORIZED}')
             ORDER BY entry_count DESC, bucket"
        ))
    }

    /// 언어별 번역 수 (많은 순)
    pub fn progress_by_language(&self) -> Result<Vec<BreakdownCount>, ForestError> {
        self.breakdown(&format!(
            "SELECT language_code AS bucket, {BREAKDOWN_COLUMNS}
             FROM translations
             GROUP BY language_code
             ORDER BY entry_count DESC, bucket"
        ))
    }

    fn breakdown(&self, sql: &str) -> Result<Vec<BreakdownCount>, ForestError> {
        let mut stmt = self.conn.prepare(sql)?;
        let iter = stmt.query_map([], |row| {
            Ok(BreakdownCount {
                key: row.get("bucket")?,
                count: row.get::<_, i64>("entry_count")? as u64,
                percentage: 0.0,
                completed: row.get::<_, i64>("completed")? as u64,
                pending: row.get::<_, i64>("pending")? as u64,
                review_requested: row.get::<_, i64>("review_requested")? as u64,
                omitted: row.get::<_, i64>("omitted")? as u64,
            })
        })?;
        let mut out = Vec::new();
        for item in iter {
            out.push(item?);
        }

        let total: u64 = out.iter().map(|b| b.count).sum();
        for item in &mut out {
            item.percentage = percentage(item.count, total);
        }
        Ok(out)
    }

    /// 최근 편집 활동 (원문 라벨, 편집자 이름 포함)
    pub fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityRecord>, ForestError> {
        let mut stmt = self.conn.prepare(
            "SELECT eh.edit_type, eh.created_at, u.username AS editor_name, te.label AS text_label
             FROM edit_history eh
             INNER JOIN text_entries te ON te.id = eh.text_entry_id
             LEFT JOIN users u ON u.id = eh.edited_by
             ORDER BY eh.created_at DESC, eh.id DESC
             LIMIT ?1",
        )?;
        let iter = stmt.query_map([limit.clamp(1, 100)], |row| {
            Ok(ActivityRecord {
                edit_type: row.get("edit_type")?,
                created_at: row.get("created_at")?,
                editor_name: row.get("editor_name")?,
                text_label: row.get("text_label")?,
            })
        })?;
        let mut out = Vec::new();
        for item in iter {
            out.push(item?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{entry, memory_db, user};
    use crate::models::{EditType, NewTextEntry, TextEntryUpdate};
    use crate::rbac::Role;
    use crate::status::TranslationStatus;

    fn categorized(db: &Database, label: &str, category: Option<&str>) -> i64 {
        db.create_text_entry(
            &NewTextEntry {
                label: label.to_string(),
                original_text: Some("x".to_string()),
                file_category: category.map(str::to_string),
                ..Default::default()
            },
            1,
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_progress_by_status_covers_every_status() {
        let db = memory_db();
        let a = categorized(&db, "A", Some("event"));
        categorized(&db, "B", Some("event"));
        categorized(&db, "C", Some("system"));
        db.update_text_entry(
            a,
            &TextEntryUpdate {
                status: Some(TextStatus::Completed),
                ..Default::default()
            },
            1,
        )
        .unwrap();

        let all = db.progress_by_status(None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].status, TextStatus::Pending);
        assert_eq!(all[0].count, 2);
        let completed = all.iter().find(|s| s.status == TextStatus::Completed).unwrap();
        assert_eq!(completed.count, 1);

        let events = db.progress_by_status(Some("event")).unwrap();
        assert_eq!(events[0].count, 1);
        assert!((events[0].percentage - 50.0).abs() < f64::EPSILON);

        assert!(memory_db().progress_by_status(None).unwrap().iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn test_progress_by_category_groups_uncategorized() {
        let db = memory_db();
        categorized(&db, "A", Some("event"));
        categorized(&db, "B", Some("event"));
        categorized(&db, "C", None);

        let rows = db.progress_by_category().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "event");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].pending, 2);
        assert_eq!(rows[1].key, UNCATEGORIZED);
    }

    #[test]
    fn test_progress_by_language() {
        let db = memory_db();
        let a = entry(&db, "A", "x", 1);
        let b = entry(&db, "B", "y", 1);
        db.upsert_translation(a.id, "en", Some("x"), Some(TranslationStatus::Completed), 2).unwrap();
        db.upsert_translation(b.id, "en", Some("y"), None, 2).unwrap();
        db.upsert_translation(a.id, "ko", Some("x"), None, 2).unwrap();

        let rows = db.progress_by_language().unwrap();
        assert_eq!(rows[0].key, "en");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].completed, 1);
        assert_eq!(rows[0].pending, 1);
        assert_eq!(rows[1].key, "ko");
    }

    #[test]
    fn test_recent_activity_joins_label_and_editor() {
        let db = memory_db();
        let writer = user(&db, "kaede", Role::ScenarioWriter);
        entry(&db, "EV_150", "x", writer);
        entry(&db, "EV_151", "y", 999);

        let activity = db.recent_activity(10).unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].text_label, "EV_151");
        assert_eq!(activity[0].editor_name, None);
        assert_eq!(activity[1].editor_name.as_deref(), Some("kaede"));
        assert_eq!(activity[1].edit_type, EditType::Create);
        assert_eq!(db.recent_activity(1).unwrap().len(), 1);
    }
}
