//! Edit Session Commands
//!
//! "편집 중" 표시용. 쓰기 권한과 무관하게 읽기 권한만 있으면 사용 가능

use crate::db::DbState;
use crate::error::{CommandError, CommandResult};
use crate::models::EditSession;
use crate::rbac::{Actor, TextKind, TextOperation};

use super::ensure_text_operation;

pub fn touch_edit_session(
    db_state: &DbState,
    actor: &Actor,
    text_entry_id: i64,
    language_code: Option<String>,
) -> CommandResult<EditSession> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Original)?;
    db_state.with(|db| {
        db.touch_edit_session(actor.user_id, text_entry_id, language_code.as_deref())
            .map_err(CommandError::from)
    })
}

pub fn end_edit_session(db_state: &DbState, actor: &Actor, text_entry_id: i64) -> CommandResult<()> {
    db_state.with(|db| {
        db.end_edit_session(actor.user_id, text_entry_id)
            .map(|_| ())
            .map_err(CommandError::from)
    })
}

pub fn active_edit_sessions(db_state: &DbState, actor: &Actor, text_entry_id: i64) -> CommandResult<Vec<EditSession>> {
    ensure_text_operation(actor, TextOperation::Read, TextKind::Original)?;
    db_state.with(|db| db.active_edit_sessions(text_entry_id).map_err(CommandError::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{reviewer, state, translator};
    use crate::db::test_support::entry;

    #[test]
    fn test_sessions_are_per_actor() {
        let state = state();
        let id = state.with(|db| Ok(entry(db, "EV_500", "x", 2).id)).unwrap();

        touch_edit_session(&state, &translator(), id, Some("en".to_string())).unwrap();
        touch_edit_session(&state, &reviewer(), id, Some("en".to_string())).unwrap();
        assert_eq!(active_edit_sessions(&state, &translator(), id).unwrap().len(), 2);

        end_edit_session(&state, &translator(), id).unwrap();
        let active = active_edit_sessions(&state, &translator(), id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, reviewer().user_id);
    }
}
