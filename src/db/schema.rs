//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 연결마다 적용할 PRAGMA (CASCADE 동작에 foreign_keys 필요)
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
"#;

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 사용자 테이블
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('admin', 'scenario_writer', 'translator', 'reviewer')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 원문 텍스트 테이블
CREATE TABLE IF NOT EXISTS text_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL CHECK (length(trim(label)) > 0),
    file_category TEXT,
    original_text TEXT,
    language_code TEXT NOT NULL DEFAULT 'ja',
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'review_requested', 'source_consultation', 'completed', 'omitted')),
    max_chars INTEGER,
    max_lines INTEGER,
    created_by INTEGER,
    updated_by INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_text_entries_status ON text_entries(status);
CREATE INDEX IF NOT EXISTS idx_text_entries_category ON text_entries(file_category);
CREATE INDEX IF NOT EXISTS idx_text_entries_updated ON text_entries(updated_at);

-- 번역 테이블 (원문 + 언어당 1건)
CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text_entry_id INTEGER NOT NULL,
    language_code TEXT NOT NULL,
    translated_text TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'review_requested', 'completed', 'omitted')),
    translator_id INTEGER,
    reviewer_id INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (text_entry_id, language_code),
    FOREIGN KEY (text_entry_id) REFERENCES text_entries(id) ON DELETE CASCADE
);

-- 편집 이력 테이블 (추가 전용)
CREATE TABLE IF NOT EXISTS edit_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text_entry_id INTEGER NOT NULL,
    language_code TEXT NOT NULL,
    old_text TEXT,
    new_text TEXT,
    edited_by INTEGER NOT NULL,
    edit_type TEXT NOT NULL CHECK (edit_type IN ('create', 'update', 'delete')),
    created_at INTEGER NOT NULL,
    FOREIGN KEY (text_entry_id) REFERENCES text_entries(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_edit_history_entry ON edit_history(text_entry_id, created_at);

-- 이력 행은 수정 불가
CREATE TRIGGER IF NOT EXISTS trg_edit_history_immutable
BEFORE UPDATE ON edit_history
BEGIN
    SELECT RAISE(ABORT, 'edit_history rows are append-only');
END;

-- 파일 가져오기/내보내기 기록
CREATE TABLE IF NOT EXISTS file_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    file_type TEXT NOT NULL CHECK (file_type IN ('import', 'export')),
    file_format TEXT NOT NULL CHECK (file_format IN ('csv', 'json', 'xml')),
    record_count INTEGER,
    status TEXT NOT NULL CHECK (status IN ('success', 'failed', 'processing')),
    error_message TEXT,
    user_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

-- 편집 세션 (표시 전용)
CREATE TABLE IF NOT EXISTS edit_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    text_entry_id INTEGER NOT NULL,
    language_code TEXT,
    started_at INTEGER NOT NULL,
    last_activity INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    FOREIGN KEY (text_entry_id) REFERENCES text_entries(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_edit_sessions_entry ON edit_sessions(text_entry_id, is_active);

-- 용어집 테이블
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    pronoun_first TEXT,
    pronoun_second TEXT,
    face_graphic TEXT,
    description TEXT,
    traits TEXT,
    favorites TEXT,
    dislikes TEXT,
    special_reactions TEXT,
    created_by INTEGER,
    updated_by INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    display_text TEXT,
    icon TEXT,
    description TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS text_entry_tags (
    text_entry_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (text_entry_id, tag_id),
    FOREIGN KEY (text_entry_id) REFERENCES text_entries(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS forbidden_words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word TEXT NOT NULL,
    replacement TEXT,
    reason TEXT,
    category TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS proper_nouns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL,
    reading TEXT,
    translation TEXT,
    category TEXT,
    description TEXT,
    style_guide_ref TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS styles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    font TEXT,
    max_chars INTEGER,
    max_lines INTEGER,
    font_size INTEGER,
    auto_format_rules TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
