//! History Commands
//!
//! 편집 이력 조회와 되돌리기

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::models::{HistoryPage, TextEntry};
use crate::rbac::{Actor, Permission, TextKind, TextOperation};

use super::{ensure_permission, ensure_text_operation};

/// 이력 목록 (최신순)
pub fn list_history(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    limit: Option<u32>,
    offset: Option<u32>,
) -> CommandResult<HistoryPage> {
    ensure_permission(actor, Permission::ViewEditHistory)?;
    db_state.with(|db| {
        db.list_history(text_entry_id, limit, offset.unwrap_or(0))
            .map_err(CommandError::from)
    })
}

/// 이력 시점의 원문으로 되돌리기 (원문 수정 권한 필요)
pub fn revert_to_history(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    history_id: i64,
) -> CommandResult<TextEntry> {
    ensure_text_operation(actor, TextOperation::Update, TextKind::Original)?;
    db_state.with(|db| {
        db.revert_to_history(text_entry_id, history_id, actor.user_id)
            .map_err(CommandError::from)
    })
}
