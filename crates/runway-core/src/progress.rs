use crate::campaign::CampaignId;
use crate::error::{Result, RunwayError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-text note slots shown on the dashboard. Fixed, independent of the
/// roadmap length.
pub const NOTE_SLOTS: usize = 4;

// ---------------------------------------------------------------------------
// Progress Calculator
// ---------------------------------------------------------------------------

/// Percentage of the roadmap that is complete, in `0..=100`.
///
/// `round(100 * |completed| / roadmap_len)` with halves rounded up, clamped to
/// 100. Returns 0 for an empty roadmap or an empty set. A set larger than the
/// roadmap is tolerated and clamps.
pub fn compute(completed: &BTreeSet<usize>, roadmap_len: usize) -> u8 {
    ratio_percent(completed.len(), roadmap_len)
}

fn ratio_percent(done: usize, total: usize) -> u8 {
    if done == 0 || total == 0 {
        return 0;
    }
    // floor(100*done/total + 1/2) in integers
    let rounded = (200 * done as u128 + total as u128) / (2 * total as u128);
    rounded.min(100) as u8
}

// ---------------------------------------------------------------------------
// ProgressState
// ---------------------------------------------------------------------------

/// Client-owned state for the active campaign. Persisted as one document so
/// every logical update is a single write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub campaign_id: CampaignId,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub target_date: String,
    #[serde(default)]
    pub completed: BTreeSet<usize>,
    #[serde(default)]
    pub notes: [String; NOTE_SLOTS],
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
}

impl ProgressState {
    pub fn new(
        campaign_id: CampaignId,
        goal: impl Into<String>,
        target_date: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id,
            goal: goal.into(),
            target_date: target_date.into(),
            completed: BTreeSet::new(),
            notes: Default::default(),
            started_at: Utc::now(),
        }
    }

    pub fn percentage(&self, roadmap_len: usize) -> u8 {
        compute(&self.completed, roadmap_len)
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    /// Flip membership of `index`. Returns `None` when `index` is outside
    /// `0..roadmap_len`; the receiver is never modified.
    pub fn toggled(&self, index: usize, roadmap_len: usize) -> Option<Self> {
        if index >= roadmap_len {
            return None;
        }
        let mut next = self.clone();
        if !next.completed.remove(&index) {
            next.completed.insert(index);
        }
        Some(next)
    }

    pub fn with_note(&self, slot: usize, text: impl Into<String>) -> Result<Self> {
        if slot >= NOTE_SLOTS {
            return Err(RunwayError::InvalidNoteSlot {
                slot,
                slots: NOTE_SLOTS,
            });
        }
        let mut next = self.clone();
        next.notes[slot] = text.into();
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
