//! Configuration
//!
//! `.env` / `.env.local` 파일과 환경 변수에서 설정을 읽습니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ForestError;
use crate::status::TransitionPolicy;

const DEFAULT_DB_PATH: &str = "forest.db";
const DEFAULT_SOURCE_LANGUAGE: &str = "ja";
const DEFAULT_EDIT_SESSION_TTL_SECS: u64 = 300;
const DEFAULT_HISTORY_PAGE_SIZE: u32 = 50;
const DEFAULT_MAX_HISTORY_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub database_path: PathBuf,
    /// 원문 언어 코드
    pub source_language: String,
    pub transition_policy: TransitionPolicy,
    /// 편집 세션을 "활성"으로 보는 마지막 활동 이후 시간
    pub edit_session_ttl: Duration,
    pub history_page_size: u32,
    pub max_history_page_size: u32,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            transition_policy: TransitionPolicy::Permissive,
            edit_session_ttl: Duration::from_secs(DEFAULT_EDIT_SESSION_TTL_SECS),
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            max_history_page_size: DEFAULT_MAX_HISTORY_PAGE_SIZE,
        }
    }
}

impl ForestConfig {
    /// env 파일을 로드한 뒤 환경 변수로 설정 구성
    pub fn from_env() -> Result<Self, ForestError> {
        load_env_files();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 key → value 조회 함수로 설정 구성 (빈 값은 미설정으로 취급)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = ForestConfig::default();

        if let Some(path) = get("FOREST_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(lang) = get("FOREST_SOURCE_LANGUAGE") {
            config.source_language = lang;
        }
        if let Some(policy) = get("FOREST_TRANSITION_POLICY") {
            config.transition_policy = TransitionPolicy::parse(&policy)?;
        }
        if let Some(ttl) = get("FOREST_EDIT_SESSION_TTL_SECS") {
            config.edit_session_ttl = Duration::from_secs(parse_number("FOREST_EDIT_SESSION_TTL_SECS", &ttl)?);
        }
        if let Some(size) = get("FOREST_HISTORY_PAGE_SIZE") {
            config.history_page_size = parse_number("FOREST_HISTORY_PAGE_SIZE", &size)?;
        }
        if let Some(size) = get("FOREST_MAX_HISTORY_PAGE_SIZE") {
            config.max_history_page_size = parse_number("FOREST_MAX_HISTORY_PAGE_SIZE", &size)?;
        }

        if config.max_history_page_size == 0 {
            return Err(ForestError::Validation(
                "FOREST_MAX_HISTORY_PAGE_SIZE must be greater than 0".to_string(),
            ));
        }
        config.history_page_size = config.history_page_size.clamp(1, config.max_history_page_size);

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ForestError> {
    value
        .parse()
        .map_err(|_| ForestError::Validation(format!("{key} must be a non-negative integer, got `{value}`")))
}

fn is_valid_env_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// KEY=VALUE 라인만 골라 읽는 관대한 로더. 이미 값이 있는 키는 덮어쓰지 않음
fn try_load_env_lenient(path: &Path) -> std::io::Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let mut loaded = 0usize;

    for (key, value) in parse_env_lines(&text) {
        if let Ok(existing) = std::env::var(&key) {
            if !existing.trim().is_empty() {
                continue;
            }
        }
        std::env::set_var(key, value);
        loaded += 1;
    }

    Ok(loaded)
}

fn parse_env_lines(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        // 주석, 코드펜스 등은 무시
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if !is_valid_env_key(key) {
            continue;
        }

        let mut value = v.trim().to_string();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = value[1..value.len() - 1].to_string();
        }

        pairs.push((key.to_string(), value));
    }

    pairs
}

fn find_upwards(start: PathBuf, filename: &str, max_hops: usize) -> Option<PathBuf> {
    let mut cur = start;
    for _ in 0..=max_hops {
        let candidate = cur.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        if !cur.pop() {
            break;
        }
    }
    None
}

fn load_env_files() {
    let mut candidates: Vec<PathBuf> = vec![];
    if let Ok(cwd) = std::env::current_dir() {
        for filename in [".env.local", ".env"] {
            if let Some(p) = find_upwards(cwd.clone(), filename, 6) {
                candidates.push(p);
            }
        }
    }

    for p in candidates {
        load_env_file(&p);
    }
}

/// strict 파서 우선, 실패하면 lenient 로더로 보강
fn load_env_file(path: &Path) {
    if dotenvy::from_path(path).is_ok() {
        tracing::debug!(path = %path.display(), "loaded env file");
        return;
    }
    match try_load_env_lenient(path) {
        Ok(loaded) => tracing::debug!(path = %path.display(), loaded, "loaded env file (lenient)"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to read env file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ForestConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ForestConfig::default());
        assert_eq!(config.source_language, "ja");
        assert_eq!(config.edit_session_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = ForestConfig::from_lookup(lookup(&[
            ("FOREST_DB_PATH", "/tmp/forest-test.db"),
            ("FOREST_SOURCE_LANGUAGE", "en"),
            ("FOREST_TRANSITION_POLICY", "Strict"),
            ("FOREST_EDIT_SESSION_TTL_SECS", "60"),
            ("FOREST_HISTORY_PAGE_SIZE", "500"),
            ("FOREST_MAX_HISTORY_PAGE_SIZE", "100"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/forest-test.db"));
        assert_eq!(config.source_language, "en");
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.edit_session_ttl, Duration::from_secs(60));
        assert_eq!(config.history_page_size, 100);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ForestConfig::from_lookup(lookup(&[("FOREST_TRANSITION_POLICY", "loose")])).is_err());
        assert!(ForestConfig::from_lookup(lookup(&[("FOREST_EDIT_SESSION_TTL_SECS", "-1")])).is_err());
        assert!(ForestConfig::from_lookup(lookup(&[("FOREST_MAX_HISTORY_PAGE_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = ForestConfig::from_lookup(lookup(&[("FOREST_SOURCE_LANGUAGE", "  ")])).unwrap();
        assert_eq!(config.source_language, "ja");
    }

    #[test]
    fn test_parse_env_lines_skips_noise() {
        let text = "# comment\n```\nexport FOREST_DB_PATH=\"/data/forest.db\"\nnot a pair\nlower=x\nFOREST_SOURCE_LANGUAGE='ko'\n";
        let pairs = parse_env_lines(text);
        assert_eq!(
            pairs,
            vec![
                ("FOREST_DB_PATH".to_string(), "/data/forest.db".to_string()),
                ("FOREST_SOURCE_LANGUAGE".to_string(), "ko".to_string()),
            ]
        );
    }

    #[test]
    fn test_env_file_with_noise_loads_through_lenient_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "```\nFOREST_ENVTEST_DB=/tmp/forest.db\nnot a pair\nexport FOREST_ENVTEST_LANG='ko'\nFOREST_ENVTEST_KEPT=file\n",
        )
        .unwrap();
        std::env::set_var("FOREST_ENVTEST_KEPT", "process");

        load_env_file(&path);

        assert_eq!(std::env::var("FOREST_ENVTEST_DB").unwrap(), "/tmp/forest.db");
        assert_eq!(std::env::var("FOREST_ENVTEST_LANG").unwrap(), "ko");
        // 이미 설정된 값은 유지
        assert_eq!(std::env::var("FOREST_ENVTEST_KEPT").unwrap(), "process");
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        load_env_file(&dir.path().join(".env.local"));
        assert!(std::env::var("FOREST_ENVTEST_MISSING").is_err());
    }
}
