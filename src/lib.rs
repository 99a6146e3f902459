//! Project Forest - Localization Core Library
//!
//! 게임 시나리오 현지화 도구의 코어. 역할 기반 권한 판정, 원문/번역 상태 관리,
//! 편집 이력 원장, CSV 일괄 가져오기를 담당합니다. HTTP/UI 계층은 포함하지 않습니다.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod glossary;
pub mod models;
pub mod rbac;
pub mod status;

use crate::config::ForestConfig;
use crate::db::{Database, DbState};
use crate::error::ForestError;

/// 환경 설정을 읽어 데이터베이스를 열고 공유 핸들 반환
///
/// 프로세스 시작 시 한 번 호출하고, 결과를 명령 호출부에 전달합니다.
pub fn init() -> Result<DbState, ForestError> {
    let config = ForestConfig::from_env()?;
    init_with(&config)
}

pub fn init_with(config: &ForestConfig) -> Result<DbState, ForestError> {
    tracing::info!(
        path = %config.database_path.display(),
        source_language = %config.source_language,
        policy = ?config.transition_policy,
        "initializing forest core"
    );
    let db = Database::open(config)?;
    Ok(DbState::new(db))
}
