//! Glossary Records
//!
//! 캐릭터, 태그, 금지어, 고유명사, 스타일 참조 테이블. 저장소 접근은
//! `GlossaryRecord` 하나로 통일되어 있습니다 (`db::glossary` 참고).

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::error::ForestError;
use crate::rbac::Permission;

/// 용어집 테이블 공통 계약
pub trait GlossaryRecord: Sized {
    /// 에러 메시지용 이름
    const KIND: &'static str;
    const TABLE: &'static str;
    /// 편집 가능한 컬럼 (id, 작성자, 타임스탬프 제외). `Input::values` 순서와 일치
    const COLUMNS: &'static [&'static str];
    /// 정렬 및 검색 기준 컬럼
    const KEY_COLUMN: &'static str;
    /// created_by / updated_by 컬럼 보유 여부
    const TRACKS_AUTHOR: bool = false;
    const PERMISSION: Permission;

    type Input: GlossaryInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub trait GlossaryInput {
    fn validate(&self) -> Result<(), ForestError>;
    fn values(&self) -> Result<Vec<Value>, ForestError>;
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ForestError> {
    if value.trim().is_empty() {
        return Err(ForestError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub pronoun_first: Option<String>,
    pub pronoun_second: Option<String>,
    pub face_graphic: Option<String>,
    pub description: Option<String>,
    pub traits: Option<String>,
    pub favorites: Option<String>,
    pub dislikes: Option<String>,
    pub special_reactions: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterInput {
    pub name: String,
    pub pronoun_first: Option<String>,
    pub pronoun_second: Option<String>,
    pub face_graphic: Option<String>,
    pub description: Option<String>,
    pub traits: Option<String>,
    pub favorites: Option<String>,
    pub dislikes: Option<String>,
    pub special_reactions: Option<String>,
}

impl GlossaryInput for CharacterInput {
    fn validate(&self) -> Result<(), ForestError> {
        require_non_empty("name", &self.name)
    }

    fn values(&self) -> Result<Vec<Value>, ForestError> {
        Ok(vec![
            Value::from(self.name.trim().to_string()),
            Value::from(self.pronoun_first.clone()),
            Value::from(self.pronoun_second.clone()),
            Value::from(self.face_graphic.clone()),
            Value::from(self.description.clone()),
            Value::from(self.traits.clone()),
            Value::from(self.favorites.clone()),
            Value::from(self.dislikes.clone()),
            Value::from(self.special_reactions.clone()),
        ])
    }
}

impl GlossaryRecord for Character {
    const KIND: &'static str = "Character";
    const TABLE: &'static str = "characters";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "pronoun_first",
        "pronoun_second",
        "face_graphic",
        "description",
        "traits",
        "favorites",
        "dislikes",
        "special_reactions",
    ];
    const KEY_COLUMN: &'static str = "name";
    const TRACKS_AUTHOR: bool = true;
    const PERMISSION: Permission = Permission::ManageCharacters;

    type Input = CharacterInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Character {
            id: row.get("id")?,
            name: row.get("name")?,
            pronoun_first: row.get("pronoun_first")?,
            pronoun_second: row.get("pronoun_second")?,
            face_graphic: row.get("face_graphic")?,
            description: row.get("description")?,
            traits: row.get("traits")?,
            favorites: row.get("favorites")?,
            dislikes: row.get("dislikes")?,
            special_reactions: row.get("special_reactions")?,
            created_by: row.get("created_by")?,
            updated_by: row.get("updated_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// 표시 태그 (아이콘 등)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub display_text: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub display_text: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

impl GlossaryInput for TagInput {
    fn validate(&self) -> Result<(), ForestError> {
        require_non_empty("name", &self.name)
    }

    fn values(&self) -> Result<Vec<Value>, ForestError> {
        Ok(vec![
            Value::from(self.name.trim().to_string()),
            Value::from(self.display_text.clone()),
            Value::from(self.icon.clone()),
            Value::from(self.description.clone()),
        ])
    }
}

impl GlossaryRecord for Tag {
    const KIND: &'static str = "Tag";
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["name", "display_text", "icon", "description"];
    const KEY_COLUMN: &'static str = "name";
    const PERMISSION: Permission = Permission::ManageTags;

    type Input = TagInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            display_text: row.get("display_text")?,
            icon: row.get("icon")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenWord {
    pub id: i64,
    pub word: String,
    pub replacement: Option<String>,
    pub reason: Option<String>,
    pub category: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForbiddenWordInput {
    pub word: String,
    pub replacement: Option<String>,
    pub reason: Option<String>,
    pub category: Option<String>,
}

impl GlossaryInput for ForbiddenWordInput {
    fn validate(&self) -> Result<(), ForestError> {
        require_non_empty("word", &self.word)
    }

    fn values(&self) -> Result<Vec<Value>, ForestError> {
        Ok(vec![
            Value::from(self.word.trim().to_string()),
            Value::from(self.replacement.clone()),
            Value::from(self.reason.clone()),
            Value::from(self.category.clone()),
        ])
    }
}

impl GlossaryRecord for ForbiddenWord {
    const KIND: &'static str = "Forbidden word";
    const TABLE: &'static str = "forbidden_words";
    const COLUMNS: &'static [&'static str] = &["word", "replacement", "reason", "category"];
    const KEY_COLUMN: &'static str = "word";
    const PERMISSION: Permission = Permission::ManageForbiddenWords;

    type Input = ForbiddenWordInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ForbiddenWord {
            id: row.get("id")?,
            word: row.get("word")?,
            replacement: row.get("replacement")?,
            reason: row.get("reason")?,
            category: row.get("category")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProperNoun {
    pub id: i64,
    pub term: String,
    pub reading: Option<String>,
    pub translation: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub style_guide_ref: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProperNounInput {
    pub term: String,
    pub reading: Option<String>,
    pub translation: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub style_guide_ref: Option<String>,
}

impl GlossaryInput for ProperNounInput {
    fn validate(&self) -> Result<(), ForestError> {
        require_non_empty("term", &self.term)
    }

    fn values(&self) -> Result<Vec<Value>, ForestError> {
        Ok(vec![
            Value::from(self.term.trim().to_string()),
            Value::from(self.reading.clone()),
            Value::from(self.translation.clone()),
            Value::from(self.category.clone()),
            Value::from(self.description.clone()),
            Value::from(self.style_guide_ref.clone()),
        ])
    }
}

impl GlossaryRecord for ProperNoun {
    const KIND: &'static str = "Proper noun";
    const TABLE: &'static str = "proper_nouns";
    const COLUMNS: &'static [&'static str] = &[
        "term",
        "reading",
        "translation",
        "category",
        "description",
        "style_guide_ref",
    ];
    const KEY_COLUMN: &'static str = "term";
    const PERMISSION: Permission = Permission::ManageProperNouns;

    type Input = ProperNounInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ProperNoun {
            id: row.get("id")?,
            term: row.get("term")?,
            reading: row.get("reading")?,
            translation: row.get("translation")?,
            category: row.get("category")?,
            description: row.get("description")?,
            style_guide_ref: row.get("style_guide_ref")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// 텍스트 표시 스타일 (폰트, 글자/줄 제한, 자동 서식 규칙)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub id: i64,
    pub name: String,
    pub font: Option<String>,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
    pub font_size: Option<u32>,
    pub auto_format_rules: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Style {
    /// 기존 줄마다 max_chars 글자 단위로 줄바꿈하고 max_lines 줄까지만 남김
    pub fn auto_format(&self, text: &str) -> String {
        let Some(max_chars) = self.max_chars.filter(|n| *n > 0) else {
            return text.to_string();
        };
        let max_chars = max_chars as usize;
        let max_lines = self.max_lines.map(|n| n as usize).unwrap_or(usize::MAX);

        let mut lines = Vec::new();
        for line in text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                lines.push(String::new());
                continue;
            }
            lines.extend(chars.chunks(max_chars).map(|chunk| chunk.iter().collect::<String>()));
        }
        lines.truncate(max_lines);
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleInput {
    pub name: String,
    pub font: Option<String>,
    pub max_chars: Option<u32>,
    pub max_lines: Option<u32>,
    pub font_size: Option<u32>,
    pub auto_format_rules: Option<serde_json::Value>,
}

impl GlossaryInput for StyleInput {
    fn validate(&self) -> Result<(), ForestError> {
        require_non_empty("name", &self.name)
    }

    fn values(&self) -> Result<Vec<Value>, ForestError> {
        let rules = match &self.auto_format_rules {
            Some(rules) => Some(serde_json::to_string(rules)?),
            None => None,
        };
        Ok(vec![
            Value::from(self.name.trim().to_string()),
            Value::from(self.font.clone()),
            Value::from(self.max_chars),
            Value::from(self.max_lines),
            Value::from(self.font_size),
            Value::from(rules),
        ])
    }
}

impl GlossaryRecord for Style {
    const KIND: &'static str = "Style";
    const TABLE: &'static str = "styles";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "font",
        "max_chars",
        "max_lines",
        "font_size",
        "auto_format_rules",
    ];
    const KEY_COLUMN: &'static str = "name";
    const PERMISSION: Permission = Permission::ManageStyles;

    type Input = StyleInput;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let rules: Option<String> = row.get("auto_format_rules")?;
        let auto_format_rules = match rules {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                let idx = row.as_ref().column_index("auto_format_rules").unwrap_or(0);
                rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
            })?),
            None => None,
        };
        Ok(Style {
            id: row.get("id")?,
            name: row.get("name")?,
            font: row.get("font")?,
            max_chars: row.get("max_chars")?,
            max_lines: row.get("max_lines")?,
            font_size: row.get("font_size")?,
            auto_format_rules,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForbiddenWordReport {
    pub text: String,
    /// 치환된 금지어
    pub replaced: Vec<String>,
    /// 치환어가 없어 그대로 남은 금지어
    pub flagged: Vec<String>,
}

/// 텍스트에 포함된 금지어를 치환. 긴 단어부터 처리해 부분 일치 충돌을 피함
pub fn apply_forbidden_words(text: &str, words: &[ForbiddenWord]) -> ForbiddenWordReport {
    let mut sorted: Vec<&ForbiddenWord> = words.iter().filter(|w| !w.word.is_empty()).collect();
    sorted.sort_by(|a, b| b.word.chars().count().cmp(&a.word.chars().count()));

    let mut out = text.to_string();
    let mut replaced = Vec::new();
    let mut flagged = Vec::new();

    for word in sorted {
        if !out.contains(word.word.as_str()) {
            continue;
        }
        match word.replacement.as_deref().filter(|r| !r.is_empty()) {
            Some(replacement) => {
                out = out.replace(word.word.as_str(), replacement);
                replaced.push(word.word.clone());
            }
            None => flagged.push(word.word.clone()),
        }
    }

    ForbiddenWordReport {
        text: out,
        replaced,
        flagged,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthCheck {
    /// 줄바꿈을 제외한 글자 수
    pub chars: usize,
    pub lines: usize,
    pub over_chars: bool,
    pub over_lines: bool,
}

pub fn check_length(text: &str, max_chars: Option<u32>, max_lines: Option<u32>) -> LengthCheck {
    let chars = text.chars().filter(|c| *c != '\n').count();
    let lines = if text.is_empty() { 0 } else { text.split('\n').count() };
    LengthCheck {
        chars,
        lines,
        over_chars: max_chars.is_some_and(|max| chars > max as usize),
        over_lines: max_lines.is_some_and(|max| lines > max as usize),
    }
}
