//! Translation Commands
//!
//! 신규 번역은 translate_texts, 기존 번역 수정은 translate_texts 또는
//! review_translations, 검수는 review_translations, 삭제는 admin_access

use serde::Deserialize;

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::models::Translation;
use crate::rbac::{Actor, Permission, TextKind, TextOperation};
use crate::status::TranslationStatus;

use super::{ensure_permission, ensure_text_operation};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTranslationArgs {
    pub text_entry_id: i64,
    pub language_code: String,
    pub translated_text: Option<String>,
    pub status: Option<TranslationStatus>,
}

/// 번역 저장. 기존 번역 유무에 따라 create/update 권한을 구분
pub fn save_translation(db_state: &DbState, actor: &Actor, args: SaveTranslationArgs) -> CommandResult<Translation> {
    db_state.with(|db| {
        let exists = match db.get_translation(args.text_entry_id, &args.language_code) {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e.into()),
        };
        let operation = if exists {
            TextOperation::Update
        } else {
            TextOperation::Create
        };
        ensure_text_operation(actor, operation, TextKind::Translation)?;

        db.upsert_translation(
            args.text_entry_id,
            &args.language_code,
            args.translated_text.as_deref(),
            args.status,
            actor.user_id,
        )
        .map_err(CommandError::from)
    })
}

pub fn review_translation(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    language_code: String,
    status: TranslationStatus,
) -> CommandResult<Translation> {
    ensure_permission(actor, Permission::ReviewTranslations)?;
    db_state.with(|db| {
        db.review_translation(text_entry_id, &language_code, status, actor.user_id)
            .map_err(CommandError::from)
    })
}

pub fn list_translations(db_state: &DbState, actor: &Actor, text_entry_id: i64) -> CommandResult<Vec<Translation>> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Translation)?;
    db_state.with(|db| db.list_translations(text_entry_id).map_err(CommandError::from))
}

pub fn delete_translation(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    language_code: String,
) -> CommandResult<()> {
    ensure_text_operation(actor, TextOperation::Delete, TextKind::Translation)?;
    db_state.with(|db| {
        db.delete_translation(text_entry_id, &language_code)
            .map_err(CommandError::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{admin, assert_forbidden, reviewer, state, translator, writer};
    use crate::db::test_support::entry;

    fn args(text_entry_id: i64, text: &str) -> SaveTranslationArgs {
        SaveTranslationArgs {
            text_entry_id,
            language_code: "en".to_string(),
            translated_text: Some(text.to_string()),
            status: None,
        }
    }

    fn seeded() -> (DbState, i64) {
        let state = state();
        let id = state.with(|db| Ok(entry(db, "EV_300", "こんばんは", 2).id)).unwrap();
        (state, id)
    }

    #[test]
    fn test_translator_creates_and_updates() {
        let (state, id) = seeded();
        let created = save_translation(&state, &translator(), args(id, "Good evening")).unwrap();
        assert_eq!(created.translator_id, Some(translator().user_id));
        let updated = save_translation(&state, &translator(), args(id, "Evening!")).unwrap();
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn test_status_only_save_keeps_text() {
        let (state, id) = seeded();
        save_translation(&state, &translator(), args(id, "Hello")).unwrap();

        let saved = save_translation(
            &state,
            &translator(),
            SaveTranslationArgs {
                translated_text: None,
                status: Some(TranslationStatus::ReviewRequested),
                ..args(id, "")
            },
        )
        .unwrap();
        assert_eq!(saved.translated_text.as_deref(), Some("Hello"));
        assert_eq!(saved.status, TranslationStatus::ReviewRequested);
    }

    #[test]
    fn test_writer_cannot_translate() {
        let (state, id) = seeded();
        assert_forbidden(save_translation(&state, &writer(), args(id, "x")));
    }

    #[test]
    fn test_review_requires_review_permission() {
        let (state, id) = seeded();
        save_translation(&state, &translator(), args(id, "Good evening")).unwrap();

        assert_forbidden(review_translation(
            &state,
            &translator(),
            id,
            "en".to_string(),
            TranslationStatus::Completed,
        ));
        let reviewed =
            review_translation(&state, &reviewer(), id, "en".to_string(), TranslationStatus::Completed).unwrap();
        assert_eq!(reviewed.reviewer_id, Some(reviewer().user_id));
    }

    #[test]
    fn test_delete_translation_is_admin_only() {
        let (state, id) = seeded();
        save_translation(&state, &translator(), args(id, "x")).unwrap();
        assert_forbidden(delete_translation(&state, &reviewer(), id, "en".to_string()));
        delete_translation(&state, &admin(), id, "en".to_string()).unwrap();
        assert!(list_translations(&state, &translator(), id).unwrap().is_empty());
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let state = state();
        let err = save_translation(&state, &translator(), args(77, "x")).unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
    }
}
