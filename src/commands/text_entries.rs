//! Text Entry Commands
//!
//! 원문 조회/생성/수정/삭제 및 태그 연결

use serde::Deserialize;

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::models::{NewTextEntry, Page, TextEntry, TextEntryDetail, TextEntryFilter, TextEntryUpdate};
use crate::rbac::{Actor, TextKind, TextOperation};
use crate::status::TextStatus;

use super::ensure_text_operation;

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTextEntriesArgs {
    pub search: Option<String>,
    /// 기계명 또는 표시 라벨
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// 원문 목록 (updated_at 최신순)
pub fn list_text_entries(
    db_state: &DbState,
    actor: &Actor,
    args: ListTextEntriesArgs,
) -> CommandResult<Page<TextEntry>> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Original)?;

    let status = args
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(TextStatus::parse)
        .transpose()?;
    let filter = TextEntryFilter {
        search: args.search,
        status,
        category: args.category,
    };

    db_state.with(|db| {
        db.list_text_entries(
            &filter,
            args.page.unwrap_or(1),
            args.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .map_err(CommandError::from)
    })
}

pub fn get_text_entry(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<TextEntry> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Original)?;
    db_state.with(|db| db.get_text_entry(id).map_err(CommandError::from))
}

/// 상세 화면 (번역, 최근 이력, 편집 중인 사용자, 태그 포함)
pub fn get_text_entry_detail(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<TextEntryDetail> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Original)?;
    db_state.with(|db| db.get_text_entry_detail(id).map_err(CommandError::from))
}

pub fn create_text_entry(db_state: &DbState, actor: &Actor, input: NewTextEntry) -> CommandResult<TextEntry> {
    ensure_text_operation(actor, TextOperation::Create, TextKind::Original)?;
    db_state.with(|db| db.create_text_entry(&input, actor.user_id).map_err(CommandError::from))
}

pub fn update_text_entry(
    db_state: &DbState,
    actor: &Actor,
    id: i64,
    update: TextEntryUpdate,
) -> CommandResult<TextEntry> {
    ensure_text_operation(actor, TextOperation::Update, TextKind::Original)?;
    db_state.with(|db| db.update_text_entry(id, &update, actor.user_id).map_err(CommandError::from))
}

/// 원문 삭제 (admin_access 필요)
pub fn delete_text_entry(db_state: &DbState, actor: &Actor, id: i64) -> CommandResult<()> {
    ensure_text_operation(actor, TextOperation::Delete, TextKind::Original)?;
    db_state.with(|db| db.delete_text_entry(id).map_err(CommandError::from))
}

pub fn attach_tag(db_state: &DbState, actor: &Actor, text_entry_id: i64, tag_id: i64) -> CommandResult<()> {
    ensure_text_operation(actor, TextOperation::Update, TextKind::Original)?;
    db_state.with(|db| db.attach_tag(text_entry_id, tag_id).map_err(CommandError::from))
}

pub fn detach_tag(db_state: &DbState, actor: &Actor, text_entry_id: i64, tag_id: i64) -> CommandResult<()> {
    ensure_text_operation(actor, TextOperation::Update, TextKind::Original)?;
    db_state.with(|db| db.detach_tag(text_entry_id, tag_id).map_err(CommandError::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{admin, assert_forbidden, reviewer, state, translator, writer};

    fn new_entry(label: &str) -> NewTextEntry {
        NewTextEntry {
            label: label.to_string(),
            original_text: Some("テスト".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_writer_creates_and_updates() {
        let state = state();
        let created = create_text_entry(&state, &writer(), new_entry("EV_200")).unwrap();
        assert_eq!(created.created_by, Some(writer().user_id));

        let updated = update_text_entry(
            &state,
            &writer(),
            created.id,
            TextEntryUpdate {
                original_text: Some("改稿".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.original_text.as_deref(), Some("改稿"));
    }

    #[test]
    fn test_translators_cannot_touch_originals() {
        let state = state();
        assert_forbidden(create_text_entry(&state, &translator(), new_entry("EV_201")));
        assert_forbidden(create_text_entry(&state, &reviewer(), new_entry("EV_201")));

        let e = create_text_entry(&state, &admin(), new_entry("EV_201")).unwrap();
        assert_forbidden(update_text_entry(&state, &translator(), e.id, TextEntryUpdate::default()));
        // 읽기는 모든 역할 가능
        assert!(get_text_entry(&state, &translator(), e.id).is_ok());
    }

    #[test]
    fn test_delete_is_admin_only() {
        let state = state();
        let e = create_text_entry(&state, &writer(), new_entry("EV_202")).unwrap();
        assert_forbidden(delete_text_entry(&state, &writer(), e.id));
        assert!(get_text_entry(&state, &admin(), e.id).is_ok());

        delete_text_entry(&state, &admin(), e.id).unwrap();
        assert_eq!(get_text_entry(&state, &admin(), e.id).unwrap_err().code, "NOT_FOUND");
        assert_eq!(delete_text_entry(&state, &admin(), e.id).unwrap_err().code, "NOT_FOUND");
    }

    #[test]
    fn test_list_with_huge_page_does_not_poison_state() {
        let state = state();
        create_text_entry(&state, &writer(), new_entry("EV_205")).unwrap();

        let page = list_text_entries(
            &state,
            &translator(),
            ListTextEntriesArgs {
                page: Some(u32::MAX),
                limit: Some(50),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(page.items.is_empty());
        // 잠금이 살아 있어야 이후 명령이 통과
        assert!(list_text_entries(&state, &translator(), ListTextEntriesArgs::default()).is_ok());
    }

    #[test]
    fn test_list_accepts_display_label_status() {
        let state = state();
        let e = create_text_entry(&state, &writer(), new_entry("EV_203")).unwrap();
        create_text_entry(&state, &writer(), new_entry("EV_204")).unwrap();
        update_text_entry(
            &state,
            &writer(),
            e.id,
            TextEntryUpdate {
                status: Some(TextStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

        let page = list_text_entries(
            &state,
            &translator(),
            ListTextEntriesArgs {
                status: Some("完了".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, e.id);

        let err = list_text_entries(
            &state,
            &translator(),
            ListTextEntriesArgs {
                status: Some("done-ish".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }
}
