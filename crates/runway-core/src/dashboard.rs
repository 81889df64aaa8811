use crate::api::ApiError;
use crate::campaign::{Campaign, CampaignId, ImageSlot, RoadmapStage};
use crate::error::{Result, RunwayError};
use crate::finale::{Finale, FinalePhase, Settled, SynthesisTicket};
use crate::progress::ProgressState;
use crate::reveal::{countdown_days, is_revealed, Silhouette};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Tickets and outcomes
// ---------------------------------------------------------------------------

/// Identifies the campaign context a fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub campaign_id: CampaignId,
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    Applied,
    /// Failed; previously known campaign data (if any) is kept.
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Marked,
    Unmarked,
    /// Index outside the roadmap; nothing changed.
    Ignored,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Reconciles client-held progress with server-held campaign data and owns
/// the finale orchestrator. Synchronous; network work is described by
/// tickets and executed by the caller.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    progress: Option<ProgressState>,
    campaign: Option<Campaign>,
    finale: Finale,
    epoch: u64,
}

impl Dashboard {
    pub fn new(progress: Option<ProgressState>) -> Self {
        Self {
            progress,
            ..Self::default()
        }
    }

    pub fn progress(&self) -> Option<&ProgressState> {
        self.progress.as_ref()
    }

    pub fn campaign(&self) -> Option<&Campaign> {
        self.campaign.as_ref()
    }

    pub fn finale(&self) -> &Finale {
        &self.finale
    }

    pub fn campaign_id(&self) -> Option<&CampaignId> {
        self.progress.as_ref().map(|p| &p.campaign_id)
    }

    /// Derived every time from the completed set and the roadmap length.
    pub fn percentage(&self) -> u8 {
        let len = self.campaign.as_ref().map_or(0, Campaign::len);
        self.progress.as_ref().map_or(0, |p| p.percentage(len))
    }

    // -----------------------------------------------------------------------
    // Campaign lifecycle
    // -----------------------------------------------------------------------

    /// Replace the active campaign. Any in-flight fetch or synthesis issued
    /// for the previous context becomes stale.
    pub fn start_campaign(&mut self, progress: ProgressState, campaign: Option<Campaign>) {
        self.epoch += 1;
        self.finale.reset();
        self.progress = Some(progress);
        self.campaign = campaign;
    }

    pub fn clear(&mut self) {
        self.epoch += 1;
        self.finale.reset();
        self.progress = None;
        self.campaign = None;
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    pub fn begin_fetch(&self) -> Option<FetchTicket> {
        self.campaign_id().map(|id| FetchTicket {
            campaign_id: id.clone(),
            epoch: self.epoch,
        })
    }

    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        outcome: std::result::Result<Campaign, ApiError>,
    ) -> FetchApplied {
        if ticket.epoch != self.epoch || self.campaign_id() != Some(&ticket.campaign_id) {
            tracing::debug!(campaign = %ticket.campaign_id, "discarding stale campaign fetch");
            return FetchApplied::Stale;
        }
        match outcome {
            Ok(campaign) => {
                self.campaign = Some(campaign);
                FetchApplied::Applied
            }
            Err(e) => {
                tracing::warn!(
                    campaign = %ticket.campaign_id,
                    error = %e,
                    stale_data = self.campaign.is_some(),
                    "failed to fetch campaign"
                );
                FetchApplied::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Progress edits
    // -----------------------------------------------------------------------

    /// Compute the state a toggle of `index` would produce, without applying
    /// it. `Ok(None)` means the index is out of range and is ignored.
    pub fn plan_toggle(&self, index: usize) -> Result<Option<(ProgressState, ToggleOutcome)>> {
        let progress = self.progress.as_ref().ok_or(RunwayError::NoActiveCampaign)?;
        let campaign = self.campaign.as_ref().ok_or(RunwayError::CampaignNotLoaded)?;
        let Some(next) = progress.toggled(index, campaign.len()) else {
            tracing::debug!(index, roadmap_len = campaign.len(), "ignoring out-of-range toggle");
            return Ok(None);
        };
        let outcome = if next.is_completed(index) {
            ToggleOutcome::Marked
        } else {
            ToggleOutcome::Unmarked
        };
        Ok(Some((next, outcome)))
    }

    pub fn plan_note(&self, slot: usize, text: impl Into<String>) -> Result<ProgressState> {
        let progress = self.progress.as_ref().ok_or(RunwayError::NoActiveCampaign)?;
        progress.with_note(slot, text)
    }

    /// Install a state that has already been persisted.
    pub fn commit(&mut self, progress: ProgressState) {
        self.progress = Some(progress);
    }

    // -----------------------------------------------------------------------
    // Finale
    // -----------------------------------------------------------------------

    /// Re-evaluate finale eligibility. Returns a ticket when exactly now a
    /// synthesis request must be issued. Does nothing until campaign data has
    /// been loaded, so an unloaded roadmap never reads as 0%.
    pub fn reconcile(&mut self) -> Option<SynthesisTicket> {
        self.campaign.as_ref()?;
        let percentage = self.percentage();
        let id = self.progress.as_ref()?.campaign_id.clone();
        let ticket = self.finale.observe(&id, percentage);
        if let Some(t) = &ticket {
            tracing::info!(campaign = %t.campaign_id, "requesting final look synthesis");
        }
        ticket
    }

    pub fn complete_synthesis(
        &mut self,
        ticket: &SynthesisTicket,
        outcome: std::result::Result<String, ApiError>,
    ) -> Settled {
        if self.campaign_id() != Some(&ticket.campaign_id) {
            tracing::debug!(campaign = %ticket.campaign_id, "discarding synthesis for replaced campaign");
            return Settled::Stale;
        }
        self.finale.complete(ticket, outcome)
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    /// Render-ready snapshot, or `None` for the "no active campaign" state
    /// (no campaign, empty goal, or no roadmap loaded).
    pub fn view(&self, now: DateTime<Utc>) -> Option<CampaignView<'_>> {
        let progress = self.progress.as_ref()?;
        let campaign = self.campaign.as_ref()?;
        if progress.goal.is_empty() || campaign.is_empty() {
            return None;
        }
        let percentage = self.percentage();
        let items = campaign
            .roadmap
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                let image = campaign.image(index);
                ItemView {
                    index,
                    stage,
                    completed: progress.is_completed(index),
                    revealed: is_revealed(stage, percentage),
                    image_ready: image.is_ready(),
                    image,
                }
            })
            .collect();
        let has_final_image = self.finale.image().is_some();
        Some(CampaignView {
            campaign_id: progress.campaign_id.as_str(),
            goal: &progress.goal,
            target_date: &progress.target_date,
            countdown_days: countdown_days(&progress.target_date, now),
            percentage,
            completed_count: progress.completed.len(),
            roadmap_len: campaign.len(),
            items,
            notes: &progress.notes,
            silhouette: (!has_final_image).then(|| Silhouette::of(progress)),
            awaiting_assets: campaign.awaiting_assets(),
            finale: self.finale.phase(),
            has_final_image,
        })
    }
}

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ItemView<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub stage: &'a RoadmapStage,
    pub completed: bool,
    pub revealed: bool,
    pub image_ready: bool,
    #[serde(skip)]
    pub image: ImageSlot<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignView<'a> {
    pub campaign_id: &'a str,
    pub goal: &'a str,
    pub target_date: &'a str,
    pub countdown_days: u32,
    pub percentage: u8,
    pub completed_count: usize,
    pub roadmap_len: usize,
    pub items: Vec<ItemView<'a>>,
    pub notes: &'a [String],
    /// Absent once a final image replaces the mannequin.
    pub silhouette: Option<Silhouette>,
    pub awaiting_assets: bool,
    pub finale: FinalePhase,
    pub has_final_image: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
