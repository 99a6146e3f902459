//! 용어집 저장소
//!
//! `GlossaryRecord` 구현 타입 하나로 테이블별 CRUD를 모두 처리합니다.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use super::{like_pattern, now_millis, Database};
use crate::error::ForestError;
use crate::glossary::{GlossaryInput, GlossaryRecord};

fn find_record<R: GlossaryRecord>(conn: &Connection, id: i64) -> Result<R, ForestError> {
    conn.query_row(
        &format!("SELECT * FROM {} WHERE id = ?1", R::TABLE),
        [id],
        R::from_row,
    )
    .optional()?
    .ok_or(ForestError::GlossaryNotFound { kind: R::KIND, id })
}

impl Database {
    pub fn create_glossary<R: GlossaryRecord>(&self, input: &R::Input, actor_id: i64) -> Result<R, ForestError> {
        input.validate()?;

        let mut columns: Vec<&str> = R::COLUMNS.to_vec();
        let mut values = input.values()?;
        let now = now_millis();
        if R::TRACKS_AUTHOR {
            columns.extend(["created_by", "updated_by"]);
            values.extend([Value::from(actor_id), Value::from(actor_id)]);
        }
        columns.extend(["created_at", "updated_at"]);
        values.extend([Value::from(now), Value::from(now)]);

        let placeholders = vec!["?"; columns.len()].join(", ");
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                R::TABLE,
                columns.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(kind = R::KIND, id, actor_id, "glossary record created");
        find_record(&self.conn, id)
    }

    pub fn get_glossary<R: GlossaryRecord>(&self, id: i64) -> Result<R, ForestError> {
        find_record(&self.conn, id)
    }

    /// 키 컬럼 기준 정렬. search가 있으면 키 컬럼 부분 일치
    pub fn list_glossary<R: GlossaryRecord>(&self, search: Option<&str>) -> Result<Vec<R>, ForestError> {
        let mut sql = format!("SELECT * FROM {}", R::TABLE);
        let mut values = Vec::new();
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(&format!(" WHERE {} LIKE ? ESCAPE '\\'", R::KEY_COLUMN));
            values.push(Value::from(like_pattern(search)));
        }
        sql.push_str(&format!(" ORDER BY {}, id", R::KEY_COLUMN));

        let mut stmt = self.conn.prepare(&sql)?;
        let iter = stmt.query_map(params_from_iter(values.iter()), R::from_row)?;
        let mut out = Vec::new();
        for record in iter {
            out.push(record?);
        }
        Ok(out)
    }

    /// 편집 가능한 컬럼 전체 교체
    pub fn update_glossary<R: GlossaryRecord>(
        &self,
        id: i64,
        input: &R::Input,
        actor_id: i64,
    ) -> Result<R, ForestError> {
        input.validate()?;
        find_record::<R>(&self.conn, id)?;

        let mut assignments: Vec<String> = R::COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
        let mut values = input.values()?;
        if R::TRACKS_AUTHOR {
            assignments.push("updated_by = ?".to_string());
            values.push(Value::from(actor_id));
        }
        assignments.push("updated_at = ?".to_string());
        values.push(Value::from(now_millis()));
        values.push(Value::from(id));

        self.conn.execute(
            &format!("UPDATE {} SET {} WHERE id = ?", R::TABLE, assignments.join(", ")),
            params_from_iter(values.iter()),
        )?;

        tracing::info!(kind = R::KIND, id, actor_id, "glossary record updated");
        find_record(&self.conn, id)
    }

    pub fn delete_glossary<R: GlossaryRecord>(&self, id: i64) -> Result<(), ForestError> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", R::TABLE), [id])?;
        if deleted == 0 {
            return Err(ForestError::GlossaryNotFound { kind: R::KIND, id });
        }
        tracing::info!(kind = R::KIND, id, "glossary record deleted");
        Ok(())
    }
}
