//! 편집 세션 (표시 전용)
//!
//! 누가 어떤 원문을 보고 있는지 보여주기 위한 기록. 쓰기를 막지 않습니다.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::text_entries::find_entry;
use super::{now_millis, Database};
use crate::error::ForestError;
use crate::models::EditSession;

const SESSION_SELECT: &str = "SELECT es.id, es.user_id, es.text_entry_id, es.language_code, es.started_at,
            es.last_activity, es.is_active, u.username
     FROM edit_sessions es
     LEFT JOIN users u ON u.id = es.user_id";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<EditSession> {
    Ok(EditSession {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        text_entry_id: row.get("text_entry_id")?,
        language_code: row.get("language_code")?,
        started_at: row.get("started_at")?,
        last_activity: row.get("last_activity")?,
        is_active: row.get("is_active")?,
        username: row.get("username")?,
    })
}

fn find_session(conn: &Connection, id: i64) -> Result<EditSession, ForestError> {
    let session = conn.query_row(&format!("{SESSION_SELECT} WHERE es.id = ?1"), [id], session_from_row)?;
    Ok(session)
}

impl Database {
    /// 활성 세션이 있으면 last_activity만 갱신, 없으면 새로 시작
    pub fn touch_edit_session(
        &self,
        user_id: i64,
        text_entry_id: i64,
        language_code: Option<&str>,
    ) -> Result<EditSession, ForestError> {
        let tx = self.conn.unchecked_transaction()?;
        find_entry(&tx, text_entry_id)?;
        let now = now_millis();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM edit_sessions
                 WHERE user_id = ?1 AND text_entry_id = ?2 AND language_code IS ?3 AND is_active = 1
                 ORDER BY last_activity DESC LIMIT 1",
                params![user_id, text_entry_id, language_code],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE edit_sessions SET last_activity = ?1 WHERE id = ?2",
                    params![now, id],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO edit_sessions
                     (user_id, text_entry_id, language_code, started_at, last_activity, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?4, 1)",
                    params![user_id, text_entry_id, language_code, now],
                )?;
                tx.last_insert_rowid()
            }
        };

        let session = find_session(&tx, id)?;
        tx.commit()?;
        tracing::debug!(user_id, text_entry_id, session_id = id, "edit session touched");
        Ok(session)
    }

    /// 해당 사용자의 이 원문에 대한 세션 모두 종료. 종료된 수 반환
    pub fn end_edit_session(&self, user_id: i64, text_entry_id: i64) -> Result<usize, ForestError> {
        let ended = self.conn.execute(
            "UPDATE edit_sessions SET is_active = 0, last_activity = ?1
             WHERE user_id = ?2 AND text_entry_id = ?3 AND is_active = 1",
            params![now_millis(), user_id, text_entry_id],
        )?;
        tracing::debug!(user_id, text_entry_id, ended, "edit session ended");
        Ok(ended)
    }

    /// TTL 안에 활동이 있었던 활성 세션 목록
    pub fn active_edit_sessions(&self, text_entry_id: i64) -> Result<Vec<EditSession>, ForestError> {
        let ttl_millis = i64::try_from(self.config.edit_session_ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_millis().saturating_sub(ttl_millis);

        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT}
             WHERE es.text_entry_id = ?1 AND es.is_active = 1 AND es.last_activity > ?2
             ORDER BY es.last_activity DESC"
        ))?;
        let iter = stmt.query_map(params![text_entry_id, cutoff], session_from_row)?;
        let mut out = Vec::new();
        for session in iter {
            out.push(session?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ForestConfig;
    use crate::db::test_support::{entry, memory_db, memory_db_with, user};
    use crate::rbac::Role;

    #[test]
    fn test_touch_reuses_active_session() {
        let db = memory_db();
        let translator = user(&db, "mika", Role::Translator);
        let e = entry(&db, "EV_030", "x", 1);

        let first = db.touch_edit_session(translator, e.id, Some("en")).unwrap();
        let second = db.touch_edit_session(translator, e.id, Some("en")).unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.last_activity >= first.last_activity);
        assert_eq!(second.username.as_deref(), Some("mika"));

        let other_language = db.touch_edit_session(translator, e.id, None).unwrap();
        assert_ne!(other_language.id, first.id);
        assert_eq!(db.active_edit_sessions(e.id).unwrap().len(), 2);
    }

    #[test]
    fn test_end_session_hides_it() {
        let db = memory_db();
        let e = entry(&db, "EV_031", "x", 1);
        db.touch_edit_session(7, e.id, Some("en")).unwrap();

        assert_eq!(db.end_edit_session(7, e.id).unwrap(), 1);
        assert!(db.active_edit_sessions(e.id).unwrap().is_empty());
        assert_eq!(db.end_edit_session(7, e.id).unwrap(), 0);
    }

    #[test]
    fn test_expired_sessions_are_not_active() {
        let db = memory_db_with(ForestConfig {
            edit_session_ttl: Duration::ZERO,
            ..Default::default()
        });
        let e = entry(&db, "EV_032", "x", 1);
        db.touch_edit_session(7, e.id, None).unwrap();
        assert!(db.active_edit_sessions(e.id).unwrap().is_empty());
    }

    #[test]
    fn test_touch_missing_entry_is_not_found() {
        let db = memory_db();
        assert!(matches!(
            db.touch_edit_session(1, 404, None),
            Err(ForestError::TextEntryNotFound(404))
        ));
    }
}
