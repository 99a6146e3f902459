//! Glossary Commands
//!
//! 캐릭터/태그/금지어/고유명사/스타일 관리. 조회는 read_texts, 수정은
//! 레코드 종류별 관리 권한 (`GlossaryRecord::PERMISSION`)

use serde::Serialize;

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::glossary::{
    apply_forbidden_words, check_length, ForbiddenWord, ForbiddenWordReport, GlossaryRecord, LengthCheck, Style,
};
use crate::rbac::{Actor, Permission};

use super::ensure_permission;

pub fn list_glossary<R: GlossaryRecord>(
    db_state: &DbState,
    actor: &Actor,
    search: Option<String>,
) -> CommandResult<Vec<R>> {
    ensure_permission(actor, Permission::ReadTexts)?;
    db_state.with(|db| db.list_glossary::<R>(search.as_deref()).map_err(CommandError::from))
}

pub fn get_glossary<R: GlossaryRecord>(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<R> {
    ensure_permission(actor, Permission::ReadTexts)?;
    db_state.with(|db| db.get_glossary::<R>(id).map_err(CommandError::from))
}

pub fn create_glossary<R: GlossaryRecord>(db_state: &DbState, actor: &Actor, input: R::Input) -> CommandResult<R> {
    ensure_permission(actor, R::PERMISSION)?;
    db_state.with(|db| db.create_glossary::<R>(&input, actor.user_id).map_err(CommandError::from))
}

pub fn update_glossary<R: GlossaryRecord>(
    db_state: &DbState,
    actor: &Actor,
    id: i64,
    input: R::Input,
) -> CommandResult<R> {
    ensure_permission(actor, R::PERMISSION)?;
    db_state.with(|db| {
        db.update_glossary::<R>(id, &input, actor.user_id)
            .map_err(CommandError::from)
    })
}

pub fn delete_glossary<R: GlossaryRecord>(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<()> {
    ensure_permission(actor, R::PERMISSION)?;
    db_state.with(|db| db.delete_glossary::<R>(id).map_err(CommandError::from))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLintReport {
    pub forbidden_words: ForbiddenWordReport,
    pub length: LengthCheck,
    /// 스타일 지정 시 자동 서식 결과
    pub formatted: Option<String>,
}

/// 금지어 치환, 글자/줄 수 검사, 스타일 자동 서식을 한 번에 적용
///
/// 글자/줄 제한은 스타일 값이 있으면 스타일, 없으면 원문 설정을 따릅니다.
pub fn lint_text(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    text: String,
    style_id: Option<i64>,
) -> CommandResult<TextLintReport> {
    ensure_permission(actor, Permission::ReadTexts)?;
    db_state.with(|db| {
        let entry = db.get_text_entry(text_entry_id)?;
        let style = style_id.map(|id| db.get_glossary::<Style>(id)).transpose()?;
        let words = db.list_glossary::<ForbiddenWord>(None)?;

        let forbidden_words = apply_forbidden_words(&text, &words);
        let max_chars = style.as_ref().and_then(|s| s.max_chars).or(entry.max_chars);
        let max_lines = style.as_ref().and_then(|s| s.max_lines).or(entry.max_lines);
        let length = check_length(&forbidden_words.text, max_chars, max_lines);
        let formatted = style.as_ref().map(|s| s.auto_format(&forbidden_words.text));

        Ok(TextLintReport {
            forbidden_words,
            length,
            formatted,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{admin, assert_forbidden, state, translator, writer};
    use crate::db::test_support::entry;
    use crate::glossary::{Character, CharacterInput, ForbiddenWordInput, StyleInput, Tag, TagInput};

    #[test]
    fn test_manage_permission_per_kind() {
        let state = state();
        let character = create_glossary::<Character>(
            &state,
            &writer(),
            CharacterInput {
                name: "リナ".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(character.created_by, Some(writer().user_id));

        // scenario_writer는 금지어 관리 권한 없음
        assert_forbidden(create_glossary::<ForbiddenWord>(
            &state,
            &writer(),
            ForbiddenWordInput {
                word: "x".to_string(),
                ..Default::default()
            },
        ));
        assert_forbidden(create_glossary::<Tag>(
            &state,
            &translator(),
            TagInput {
                name: "x".to_string(),
                ..Default::default()
            },
        ));

        let listed = list_glossary::<Character>(&state, &translator(), None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_forbidden(delete_glossary::<Character>(&state, &translator(), character.id));
        delete_glossary::<Character>(&state, &admin(), character.id).unwrap();
        assert_eq!(
            get_glossary::<Character>(&state, &admin(), character.id).unwrap_err().code,
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_lint_text() {
        let state = state();
        let id = state.with(|db| Ok(entry(db, "EV_700", "x", 2).id)).unwrap();
        create_glossary::<ForbiddenWord>(
            &state,
            &admin(),
            ForbiddenWordInput {
                word: "バカ".to_string(),
                replacement: Some("ばか".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let style = create_glossary::<Style>(
            &state,
            &admin(),
            StyleInput {
                name: "balloon".to_string(),
                max_chars: Some(3),
                max_lines: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

        let report = lint_text(&state, &translator(), id, "バカなやつ".to_string(), Some(style.id)).unwrap();
        assert_eq!(report.forbidden_words.text, "ばかなやつ");
        assert!(report.length.over_chars);
        assert_eq!(report.formatted.as_deref(), Some("ばかな"));

        let plain = lint_text(&state, &translator(), id, "ok".to_string(), None).unwrap();
        assert!(!plain.length.over_chars);
        assert!(plain.formatted.is_none());
    }
}
