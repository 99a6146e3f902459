//! Progress Commands

use serde::{Deserialize, Serialize};

use crate::db::DbState;
use crate::error::CommandResult;
use crate::models::{ActivityRecord, BreakdownCount, StatusCount};
use crate::rbac::{Actor, Permission};

use super::ensure_permission;

const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressArgs {
    /// 상태별 집계를 이 카테고리로 한정
    pub category: Option<String>,
    pub activity_limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub by_status: Vec<StatusCount>,
    pub by_category: Vec<BreakdownCount>,
    pub by_language: Vec<BreakdownCount>,
    pub recent_activity: Vec<ActivityRecord>,
}

/// 대시보드용 진행 현황
pub fn get_progress(db_state: &DbState, actor: &Actor, args: ProgressArgs) -> CommandResult<ProgressReport> {
    ensure_permission(actor, Permission::ReadTexts)?;
    db_state.with(|db| {
        let report = ProgressReport {
            by_status: db.progress_by_status(args.category.as_deref())?,
            by_category: db.progress_by_category()?,
            by_language: db.progress_by_language()?,
            recent_activity: db.recent_activity(args.activity_limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))?,
        };
        Ok(report)
    })
}
