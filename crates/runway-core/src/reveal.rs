use crate::campaign::RoadmapStage;
use crate::progress::ProgressState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Stage index whose completion fills the mannequin's head.
const HEAD_STAGE: usize = 3;
/// Completed milestones needed before the mannequin's body fills.
const BODY_THRESHOLD: usize = 2;

/// A stage is revealed once progress reaches its threshold. Stateless: a
/// stage un-reveals when progress drops back below it.
pub fn is_revealed(stage: &RoadmapStage, percentage: u8) -> bool {
    u32::from(percentage) >= stage.target_percentage
}

// ---------------------------------------------------------------------------
// Silhouette
// ---------------------------------------------------------------------------

/// Fill state of the two mannequin regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Silhouette {
    pub head: bool,
    pub body: bool,
}

impl Silhouette {
    pub fn of(progress: &ProgressState) -> Self {
        Self {
            head: progress.is_completed(HEAD_STAGE),
            body: progress.completed.len() >= BODY_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// Whole days left until `target_date` (`YYYY-MM-DD`, read as UTC midnight),
/// rounded up and floored at zero. Unparseable dates count as zero.
pub fn countdown_days(target_date: &str, now: DateTime<Utc>) -> u32 {
    let Ok(date) = NaiveDate::parse_from_str(target_date.trim(), "%Y-%m-%d") else {
        return 0;
    };
    let target = date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    let Some(target) = target else {
        return 0;
    };
    let secs = (target - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    let days = (secs + 86_399) / 86_400;
    u32::try_from(days).unwrap_or(u32::MAX)
}
