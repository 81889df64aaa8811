//! Single-threaded driver around [`Dashboard`].
//!
//! Local edits (toggle, notes) are synchronous and persisted before they are
//! applied. Network work is queued as futures and only makes progress while
//! the caller awaits [`Session::next_event`] or [`Session::settle`], so
//! completions interleave with edits exactly like UI events would.
//!
//! At most one final-look request is outstanding: the in-flight request is
//! aborted as soon as the finale leaves `Synthesizing` for any reason other
//! than its own completion.
//!
//! ```rust,ignore
//! let mut session = Session::open(HttpApi::from_config(&config)?, FileStore::new(root))?;
//! session.refresh();
//! session.settle().await;
//! session.toggle(2)?;
//! session.settle().await; // awaits a final-look request if one was issued
//! ```

use crate::api::{ApiError, RunwayApi, RunwayRequest};
use crate::campaign::{Campaign, CampaignId};
use crate::dashboard::{CampaignView, Dashboard, FetchApplied, FetchTicket, ToggleOutcome};
use crate::error::{Result, RunwayError};
use crate::finale::{FinalePhase, Settled, SynthesisTicket};
use crate::progress::ProgressState;
use crate::store::{self, ProgressStore};
use chrono::{DateTime, Utc};
use futures::future::{abortable, AbortHandle, BoxFuture};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

enum Completion {
    Fetched {
        ticket: FetchTicket,
        outcome: std::result::Result<Campaign, ApiError>,
    },
    Synthesized {
        ticket: SynthesisTicket,
        outcome: std::result::Result<String, ApiError>,
    },
}

/// Result of applying one network completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CampaignLoaded,
    FetchFailed,
    FinaleReady,
    FinaleFailed,
    /// The completion targeted a context that no longer exists.
    Discarded,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session<A: RunwayApi, S: ProgressStore> {
    api: A,
    store: S,
    dashboard: Dashboard,
    /// `None` items are aborted requests.
    pending: FuturesUnordered<BoxFuture<'static, Option<Completion>>>,
    synthesis: Option<AbortHandle>,
}

impl<A: RunwayApi, S: ProgressStore> Session<A, S> {
    /// Rebuild the session from the store. Campaign data is not cached
    /// locally; call [`Session::refresh`] to fetch it. An unreadable state
    /// document opens as "no active campaign" so it can be overwritten.
    pub fn open(api: A, store: S) -> Result<Self> {
        let progress = store::load_or_discard(&store)?;
        Ok(Self {
            api,
            store,
            dashboard: Dashboard::new(progress),
            pending: FuturesUnordered::new(),
            synthesis: None,
        })
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn view(&self, now: DateTime<Utc>) -> Option<CampaignView<'_>> {
        self.dashboard.view(now)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // -----------------------------------------------------------------------
    // Campaign lifecycle
    // -----------------------------------------------------------------------

    /// Persist a fresh progress state for `campaign_id`, replacing whatever
    /// campaign was active. `seed` installs campaign data already in hand.
    pub fn start_campaign(
        &mut self,
        campaign_id: CampaignId,
        goal: impl Into<String>,
        target_date: impl Into<String>,
        seed: Option<Campaign>,
    ) -> Result<()> {
        let progress = ProgressState::new(campaign_id, goal, target_date);
        self.store.save(&progress)?;
        self.dashboard.start_campaign(progress, seed);
        self.release_synthesis();
        if self.dashboard.campaign().is_some() {
            self.reconcile();
        }
        Ok(())
    }

    /// Create a campaign on the backend and make it the active one.
    pub async fn create_campaign(&mut self, request: RunwayRequest) -> Result<CampaignId> {
        let created = self.api.generate_runway(&request).await?;
        let id = created.campaign_id.clone();
        self.start_campaign(
            id.clone(),
            request.goal,
            request.target_date,
            created.campaign(),
        )?;
        Ok(id)
    }

    /// Forget the active campaign entirely.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        self.dashboard.clear();
        self.release_synthesis();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a campaign fetch. Returns `false` when there is no campaign.
    pub fn refresh(&mut self) -> bool {
        let Some(ticket) = self.dashboard.begin_fetch() else {
            return false;
        };
        let api = self.api.clone();
        self.pending.push(
            async move {
                let outcome = api.fetch_campaign(&ticket.campaign_id).await;
                Some(Completion::Fetched { ticket, outcome })
            }
            .boxed(),
        );
        true
    }

    /// Flip milestone `index`. The new completed set is persisted before it
    /// becomes visible; a failed write leaves the session unchanged.
    pub fn toggle(&mut self, index: usize) -> Result<ToggleOutcome> {
        let Some((next, outcome)) = self.dashboard.plan_toggle(index)? else {
            return Ok(ToggleOutcome::Ignored);
        };
        self.store.save(&next)?;
        self.dashboard.commit(next);
        self.reconcile();
        Ok(outcome)
    }

    pub fn set_note(&mut self, slot: usize, text: impl Into<String>) -> Result<()> {
        let next = self.dashboard.plan_note(slot, text)?;
        self.store.save(&next)?;
        self.dashboard.commit(next);
        Ok(())
    }

    /// The final image, when the finale is ready to play.
    pub fn play_finale(&self) -> Option<&str> {
        self.dashboard.finale().play()
    }

    /// Re-evaluate finale eligibility and issue a synthesis request if one is
    /// due. Called after every committed toggle and applied fetch.
    pub fn reconcile(&mut self) {
        let ticket = self.dashboard.reconcile();
        self.release_synthesis();
        let Some(ticket) = ticket else {
            return;
        };
        let api = self.api.clone();
        let (request, handle) = abortable(async move {
            let outcome = api.generate_final_look(&ticket.campaign_id).await;
            Completion::Synthesized { ticket, outcome }
        });
        self.synthesis = Some(handle);
        self.pending.push(request.map(|r| r.ok()).boxed());
    }

    /// Abort the outstanding final-look request once the finale is no longer
    /// waiting for it. Dropping the future drops its connection.
    fn release_synthesis(&mut self) {
        if self.dashboard.finale().phase() == FinalePhase::Synthesizing {
            return;
        }
        if let Some(handle) = self.synthesis.take() {
            handle.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Wait for the next network completion and apply it. Returns `None`
    /// when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Event> {
        while let Some(item) = self.pending.next().await {
            if let Some(completion) = item {
                return Some(self.apply(completion));
            }
        }
        None
    }

    /// Apply completions until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    /// Fetch the campaign and wait for everything that follows from it.
    pub async fn load(&mut self) -> Result<Vec<Event>> {
        if !self.refresh() {
            return Err(RunwayError::NoActiveCampaign);
        }
        Ok(self.settle().await)
    }

    /// Fetch the campaign and apply it without waiting for a final-look
    /// request the fetch may trigger.
    pub async fn fetch(&mut self) -> Result<Event> {
        if !self.refresh() {
            return Err(RunwayError::NoActiveCampaign);
        }
        while let Some(event) = self.next_event().await {
            if matches!(event, Event::CampaignLoaded | Event::FetchFailed) {
                return Ok(event);
            }
        }
        Ok(Event::Discarded)
    }

    fn apply(&mut self, completion: Completion) -> Event {
        match completion {
            Completion::Fetched { ticket, outcome } => {
                match self.dashboard.apply_fetch(&ticket, outcome) {
                    FetchApplied::Applied => {
                        self.reconcile();
                        Event::CampaignLoaded
                    }
                    FetchApplied::Failed => Event::FetchFailed,
                    FetchApplied::Stale => Event::Discarded,
                }
            }
            Completion::Synthesized { ticket, outcome } => {
                let settled = self.dashboard.complete_synthesis(&ticket, outcome);
                self.release_synthesis();
                match settled {
                    Settled::Ready => Event::FinaleReady,
                    Settled::Failed => Event::FinaleFailed,
                    Settled::Stale => Event::Discarded,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CreatedCampaign;
    use crate::campaign::RoadmapStage;
    use crate::finale::FinalePhase;
    use crate::store::MemoryStore;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Backend {
        campaign: Option<Campaign>,
        final_image: Option<String>,
        hang_synthesis: bool,
        fetches: usize,
        syntheses: usize,
        in_flight: usize,
    }

    /// Counts a final-look request as outstanding until its future is
    /// dropped, whether it completed or was aborted.
    struct InFlight(Arc<Mutex<Backend>>);

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.lock().unwrap().in_flight -= 1;
        }
    }

    #[derive(Clone, Default)]
    struct FakeApi {
        backend: Arc<Mutex<Backend>>,
    }

    impl FakeApi {
        fn with_campaign(thresholds: &[u32]) -> Self {
            let api = Self::default();
            {
                let mut b = api.backend.lock().unwrap();
                b.campaign = Some(Campaign {
                    roadmap: thresholds
                        .iter()
                        .map(|&t| RoadmapStage {
                            target_percentage: t,
                            milestone_task: format!("reach {t}"),
                            clothing_item: format!("look {t}"),
                        })
                        .collect(),
                    images: Vec::new(),
                });
                b.final_image = Some("data:image/jpeg;base64,FINAL".to_string());
            }
            api
        }

        fn fail_synthesis(&self) {
            self.backend.lock().unwrap().final_image = None;
        }

        fn hang_synthesis(&self) {
            self.backend.lock().unwrap().hang_synthesis = true;
        }

        fn in_flight(&self) -> usize {
            self.backend.lock().unwrap().in_flight
        }

        fn go_offline(&self) {
            self.backend.lock().unwrap().campaign = None;
        }

        fn fetches(&self) -> usize {
            self.backend.lock().unwrap().fetches
        }

        fn syntheses(&self) -> usize {
            self.backend.lock().unwrap().syntheses
        }
    }

    impl RunwayApi for FakeApi {
        fn fetch_campaign(
            &self,
            _id: &CampaignId,
        ) -> impl Future<Output = std::result::Result<Campaign, ApiError>> + Send {
            let mut b = self.backend.lock().unwrap();
            b.fetches += 1;
            let result = b.campaign.clone().ok_or(ApiError::Status {
                status: 503,
                body: "offline".into(),
            });
            async move { result }
        }

        fn generate_final_look(
            &self,
            _id: &CampaignId,
        ) -> impl Future<Output = std::result::Result<String, ApiError>> + Send {
            let mut b = self.backend.lock().unwrap();
            b.syntheses += 1;
            b.in_flight += 1;
            let hang = b.hang_synthesis;
            let result = b.final_image.clone().ok_or(ApiError::EmptyImage);
            drop(b);
            let guard = InFlight(self.backend.clone());
            async move {
                let _guard = guard;
                if hang {
                    futures::future::pending::<()>().await;
                }
                result
            }
        }

        fn generate_runway(
            &self,
            _request: &RunwayRequest,
        ) -> impl Future<Output = std::result::Result<CreatedCampaign, ApiError>> + Send {
            let b = self.backend.lock().unwrap();
            let result = Ok(CreatedCampaign {
                campaign_id: CampaignId::parse("fresh").unwrap(),
                roadmap: b.campaign.as_ref().map(|c| c.roadmap.clone()),
                images: None,
            });
            async move { result }
        }
    }

    fn stored(completed: &[usize]) -> MemoryStore {
        let mut progress =
            ProgressState::new(CampaignId::parse("camp").unwrap(), "Ship v1", "2031-01-01");
        progress.completed.extend(completed.iter().copied());
        MemoryStore::with_state(progress)
    }

    #[tokio::test]
    async fn empty_store_has_no_campaign() {
        let mut session = Session::open(FakeApi::default(), MemoryStore::default()).unwrap();
        assert!(!session.refresh());
        assert!(matches!(session.load().await, Err(RunwayError::NoActiveCampaign)));
        assert!(session.view(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn scenario_four_stages() {
        let api = FakeApi::with_campaign(&[25, 50, 75, 100]);
        let mut session = Session::open(api.clone(), stored(&[])).unwrap();
        assert_eq!(session.load().await.unwrap(), vec![Event::CampaignLoaded]);

        session.toggle(0).unwrap();
        session.toggle(1).unwrap();
        assert_eq!(session.dashboard().percentage(), 50);
        assert!(!session.has_pending());

        session.toggle(2).unwrap();
        session.toggle(3).unwrap();
        assert_eq!(session.dashboard().percentage(), 100);
        assert_eq!(session.settle().await, vec![Event::FinaleReady]);
        assert_eq!(api.syntheses(), 1);
        assert!(session.play_finale().is_some());

        assert_eq!(session.toggle(3).unwrap(), ToggleOutcome::Unmarked);
        assert_eq!(session.dashboard().percentage(), 75);
        assert!(session.play_finale().is_none());
        let view = session.view(Utc::now()).unwrap();
        assert!(!view.items[3].revealed);
    }

    #[tokio::test]
    async fn repeated_triggers_at_100_issue_one_request() {
        let api = FakeApi::with_campaign(&[50, 100]);
        let mut session = Session::open(api.clone(), stored(&[0, 1])).unwrap();

        session.refresh();
        session.next_event().await;
        assert_eq!(session.dashboard().finale().phase(), FinalePhase::Synthesizing);

        // ten refreshes and reconciliations while the request is outstanding
        for _ in 0..10 {
            session.refresh();
            session.reconcile();
        }
        session.settle().await;

        assert_eq!(api.fetches(), 11);
        assert_eq!(api.syntheses(), 1);
        assert_eq!(session.dashboard().finale().phase(), FinalePhase::Ready);
    }

    #[tokio::test]
    async fn dropping_below_100_discards_in_flight_request() {
        let api = FakeApi::with_campaign(&[50, 100]);
        let mut session = Session::open(api.clone(), stored(&[0])).unwrap();
        session.load().await.unwrap();

        session.toggle(1).unwrap();
        assert!(session.has_pending());
        session.toggle(1).unwrap();

        // aborted before it was ever sent
        assert!(session.settle().await.is_empty());
        assert_eq!(session.dashboard().finale().phase(), FinalePhase::Idle);
        assert!(session.play_finale().is_none());
        assert_eq!(api.syntheses(), 0);

        // re-completing issues a fresh request
        session.toggle(1).unwrap();
        assert_eq!(session.settle().await, vec![Event::FinaleReady]);
        assert_eq!(api.syntheses(), 1);
    }

    #[tokio::test]
    async fn flapping_around_100_keeps_one_request_outstanding() {
        let api = FakeApi::with_campaign(&[50, 100]);
        api.hang_synthesis();
        let mut session = Session::open(api.clone(), stored(&[0])).unwrap();
        session.load().await.unwrap();

        for _ in 0..5 {
            session.toggle(1).unwrap();
            let _ = session.next_event().now_or_never();
            assert_eq!(api.in_flight(), 1);
            session.toggle(1).unwrap();
            let _ = session.next_event().now_or_never();
            assert_eq!(api.in_flight(), 0);
        }
        session.toggle(1).unwrap();
        let _ = session.next_event().now_or_never();

        assert_eq!(api.syntheses(), 6);
        assert_eq!(api.in_flight(), 1);
        assert_eq!(session.pending.len(), 1);
        assert_eq!(session.dashboard().finale().phase(), FinalePhase::Synthesizing);
    }

    #[tokio::test]
    async fn new_campaign_aborts_outstanding_request() {
        let api = FakeApi::with_campaign(&[100]);
        api.hang_synthesis();
        let mut session = Session::open(api.clone(), stored(&[0])).unwrap();
        session.refresh();
        let _ = session.next_event().now_or_never();
        let _ = session.next_event().now_or_never();
        assert_eq!(api.in_flight(), 1);

        session
            .start_campaign(CampaignId::parse("other").unwrap(), "Sail", "2033-03-03", None)
            .unwrap();
        let events = tokio::time::timeout(Duration::from_secs(5), session.settle())
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(api.in_flight(), 0);
    }

    #[tokio::test]
    async fn untoggling_at_100_does_not_wait_for_synthesis() {
        let api = FakeApi::with_campaign(&[50, 100]);
        api.hang_synthesis();
        let mut session = Session::open(api.clone(), stored(&[0, 1])).unwrap();

        assert_eq!(session.fetch().await.unwrap(), Event::CampaignLoaded);
        assert_eq!(session.dashboard().finale().phase(), FinalePhase::Synthesizing);

        assert_eq!(session.toggle(1).unwrap(), ToggleOutcome::Unmarked);
        let events = tokio::time::timeout(Duration::from_secs(5), session.settle())
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(session.dashboard().percentage(), 50);
        assert_eq!(api.syntheses(), 0);
    }

    #[tokio::test]
    async fn unreadable_state_opens_without_campaign() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = crate::store::FileStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join(".runway")).unwrap();
        std::fs::write(store.path(), "completed: [oops\n").unwrap();

        let mut session = Session::open(FakeApi::default(), store.clone()).unwrap();
        assert!(session.dashboard().progress().is_none());

        session
            .start_campaign(CampaignId::parse("fresh").unwrap(), "Move abroad", "2032-01-01", None)
            .unwrap();
        assert_eq!(store.load().unwrap().unwrap().campaign_id.as_str(), "fresh");
    }

    #[tokio::test]
    async fn failed_synthesis_retries_on_next_trigger() {
        let api = FakeApi::with_campaign(&[100]);
        api.fail_synthesis();
        let mut session = Session::open(api.clone(), stored(&[0])).unwrap();
        let events = session.load().await.unwrap();
        assert_eq!(events, vec![Event::CampaignLoaded, Event::FinaleFailed]);
        assert_eq!(session.dashboard().percentage(), 100);
        assert_eq!(api.syntheses(), 1);

        // no automatic retry
        assert!(!session.has_pending());

        // a qualifying trigger retries
        session.load().await.unwrap();
        assert_eq!(api.syntheses(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_campaign() {
        let api = FakeApi::with_campaign(&[50, 100]);
        let mut session = Session::open(api.clone(), stored(&[0])).unwrap();
        session.load().await.unwrap();

        api.go_offline();
        assert_eq!(session.load().await.unwrap(), vec![Event::FetchFailed]);
        let view = session.view(Utc::now()).unwrap();
        assert_eq!(view.roadmap_len, 2);
        assert_eq!(view.percentage, 50);
    }

    #[tokio::test]
    async fn toggle_persists_before_commit() {
        let store = stored(&[]);
        let api = FakeApi::with_campaign(&[25, 50, 75, 100]);
        let mut session = Session::open(api, store.clone()).unwrap();
        session.load().await.unwrap();

        session.toggle(0).unwrap();
        session.toggle(2).unwrap();
        assert_eq!(store.write_count(), 2);
        let persisted = store.snapshot().unwrap();
        assert_eq!(persisted.completed, std::collections::BTreeSet::from([0, 2]));

        // reopen from the same store
        let api = FakeApi::with_campaign(&[25, 50, 75, 100]);
        let mut reopened = Session::open(api, store).unwrap();
        reopened.load().await.unwrap();
        assert_eq!(reopened.dashboard().percentage(), 50);
    }

    #[tokio::test]
    async fn failed_write_leaves_state_unchanged() {
        let store = stored(&[]).read_only();
        let api = FakeApi::with_campaign(&[100]);
        let mut session = Session::open(api.clone(), store).unwrap();
        session.load().await.unwrap();

        assert!(session.toggle(0).is_err());
        assert_eq!(session.dashboard().percentage(), 0);
        assert!(!session.has_pending());
        assert_eq!(api.syntheses(), 0);
    }

    #[tokio::test]
    async fn out_of_range_toggle_writes_nothing() {
        let store = stored(&[]);
        let api = FakeApi::with_campaign(&[100]);
        let mut session = Session::open(api, store.clone()).unwrap();
        session.load().await.unwrap();
        assert_eq!(session.toggle(5).unwrap(), ToggleOutcome::Ignored);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn new_campaign_discards_old_completions() {
        let api = FakeApi::with_campaign(&[100]);
        let store = stored(&[0]);
        let mut session = Session::open(api.clone(), store.clone()).unwrap();
        session.refresh();

        session
            .start_campaign(CampaignId::parse("next").unwrap(), "Learn piano", "2032-02-02", None)
            .unwrap();
        assert_eq!(session.settle().await, vec![Event::Discarded]);
        assert!(session.dashboard().campaign().is_none());
        assert_eq!(store.snapshot().unwrap().campaign_id.as_str(), "next");
        assert!(store.snapshot().unwrap().completed.is_empty());
        assert_eq!(api.syntheses(), 0);
    }

    #[tokio::test]
    async fn create_campaign_seeds_roadmap() {
        let api = FakeApi::with_campaign(&[50, 100]);
        let store = MemoryStore::default();
        let mut session = Session::open(api.clone(), store.clone()).unwrap();
        let id = session
            .create_campaign(RunwayRequest {
                goal: "Write a novel".into(),
                target_date: "2031-09-09".into(),
                vibe: "gothic".into(),
                color: "oxblood".into(),
                designer: "McQueen".into(),
                inspiration_image_base64: "data:image/png;base64,AAAA".into(),
            })
            .await
            .unwrap();
        assert_eq!(id.as_str(), "fresh");
        assert_eq!(session.dashboard().campaign().unwrap().len(), 2);
        assert_eq!(api.fetches(), 0);
        assert_eq!(store.snapshot().unwrap().goal, "Write a novel");
    }

    #[tokio::test]
    async fn notes_persist_and_validate_slot() {
        let store = stored(&[]);
        let mut session = Session::open(FakeApi::default(), store.clone()).unwrap();
        session.set_note(1, "book fitting").unwrap();
        assert_eq!(store.snapshot().unwrap().notes[1], "book fitting");
        assert!(matches!(
            session.set_note(9, "x"),
            Err(RunwayError::InvalidNoteSlot { .. })
        ));
    }

    #[tokio::test]
    async fn reset_clears_store() {
        let store = stored(&[0]);
        let mut session = Session::open(FakeApi::default(), store.clone()).unwrap();
        session.reset().unwrap();
        assert!(store.snapshot().is_none());
        assert!(session.dashboard().progress().is_none());
    }
}
