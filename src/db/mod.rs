//! Database Module
//!
//! SQLite 저장소 관리. `Database`는 프로세스 시작 시 한 번 만들어져
//! 필요한 곳에 명시적으로 전달됩니다.

mod files;
mod glossary;
mod history;
mod import;
mod progress;
mod schema;
mod sessions;
mod text_entries;
mod translations;
mod users;

pub use history::{record_history, HistoryEvent};

use std::path::Path;
use std::sync::Mutex;

use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::config::ForestConfig;
use crate::error::{CommandError, CommandResult, ForestError};

/// 멀티스레드 호출자용 공유 핸들
pub struct DbState(pub Mutex<Database>);

impl DbState {
    pub fn new(db: Database) -> Self {
        Self(Mutex::new(db))
    }

    /// 잠금을 잡고 클로저 실행. 잠금 오염 시 LOCK_ERROR
    pub fn with<T, F>(&self, f: F) -> CommandResult<T>
    where
        F: FnOnce(&mut Database) -> CommandResult<T>,
    {
        let mut db = self.0.lock().map_err(|e| CommandError {
            code: "LOCK_ERROR".to_string(),
            message: format!("Failed to acquire database lock: {}", e),
            details: None,
        })?;
        f(&mut db)
    }
}

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
    config: ForestConfig,
}

impl Database {
    /// 설정된 경로의 데이터베이스 열기 (스키마 초기화 포함)
    pub fn open(config: &ForestConfig) -> Result<Self, ForestError> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.database_path)?;
        Self::from_connection(conn, config)
    }

    /// 메모리 DB (테스트 및 임시 작업용)
    pub fn open_in_memory(config: &ForestConfig) -> Result<Self, ForestError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &ForestConfig) -> Result<Self, ForestError> {
        conn.execute_batch(schema::CONNECTION_PRAGMAS)?;
        let db = Self {
            conn,
            config: config.clone(),
        };
        db.initialize()?;
        tracing::debug!(path = %config.database_path.display(), "database opened");
        Ok(db)
    }

    /// 스키마 생성 (여러 번 호출해도 안전)
    pub fn initialize(&self) -> Result<(), ForestError> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// 현재 DB를 파일로 백업
    pub fn backup_to(&self, out_path: &Path) -> Result<(), ForestError> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out_conn = Connection::open(out_path)?;
        let backup = Backup::new(&self.conn, &mut out_conn)?;
        backup.run_to_completion(5, std::time::Duration::from_millis(10), None)?;
        tracing::info!(path = %out_path.display(), "database backup written");
        Ok(())
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// LIKE 검색용 패턴 (와일드카드 문자 이스케이프)
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{NewTextEntry, NewUser, TextEntry};
    use crate::rbac::Role;

    pub fn memory_db() -> Database {
        Database::open_in_memory(&ForestConfig::default()).unwrap()
    }

    pub fn memory_db_with(config: ForestConfig) -> Database {
        Database::open_in_memory(&config).unwrap()
    }

    pub fn user(db: &Database, username: &str, role: Role) -> i64 {
        db.create_user(&NewUser {
            username: username.to_string(),
            email: format!("{username}@forest.test"),
            role,
        })
        .unwrap()
        .id
    }

    pub fn entry(db: &Database, label: &str, text: &str, actor_id: i64) -> TextEntry {
        db.create_text_entry(
            &NewTextEntry {
                label: label.to_string(),
                original_text: Some(text.to_string()),
                ..Default::default()
            },
            actor_id,
        )
        .unwrap()
    }
}
