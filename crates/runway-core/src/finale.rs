use crate::api::ApiError;
use crate::campaign::CampaignId;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// FinalePhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalePhase {
    Idle,
    Synthesizing,
    Ready,
}

impl fmt::Display for FinalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalePhase::Idle => "idle",
            FinalePhase::Synthesizing => "synthesizing",
            FinalePhase::Ready => "ready",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// SynthesisTicket
// ---------------------------------------------------------------------------

/// Handle for one outstanding final-look request. A completion is applied
/// only if its ticket still matches the orchestrator's in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisTicket {
    pub campaign_id: CampaignId,
    token: u64,
}

/// What happened to a completion handed to [`Finale::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Ready,
    Failed,
    Stale,
}

// ---------------------------------------------------------------------------
// Finale
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Synthesizing { token: u64 },
    Ready { image: String },
}

/// Finale orchestrator: `Idle → Synthesizing → Ready`, back to `Idle` on
/// failure or whenever progress drops below 100.
///
/// At most one request is outstanding: [`Finale::observe`] hands out a ticket
/// only from `Idle`, so repeated observations at 100% while a request is in
/// flight (or after it succeeded) issue nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finale {
    state: State,
    next_token: u64,
}

impl Default for Finale {
    fn default() -> Self {
        Self::new()
    }
}

impl Finale {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            next_token: 1,
        }
    }

    pub fn phase(&self) -> FinalePhase {
        match self.state {
            State::Idle => FinalePhase::Idle,
            State::Synthesizing { .. } => FinalePhase::Synthesizing,
            State::Ready { .. } => FinalePhase::Ready,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match &self.state {
            State::Ready { image } => Some(image),
            _ => None,
        }
    }

    /// The play affordance: the final image, available only in `Ready`.
    pub fn play(&self) -> Option<&str> {
        self.image()
    }

    /// Feed the current percentage. Returns a ticket when a synthesis request
    /// must be issued now.
    pub fn observe(&mut self, campaign_id: &CampaignId, percentage: u8) -> Option<SynthesisTicket> {
        if percentage < 100 {
            if self.state != State::Idle {
                tracing::debug!(percentage, "progress fell below 100; discarding finale");
                self.reset();
            }
            return None;
        }
        if self.state != State::Idle {
            return None;
        }
        let token = self.next_token;
        self.next_token += 1;
        self.state = State::Synthesizing { token };
        Some(SynthesisTicket {
            campaign_id: campaign_id.clone(),
            token,
        })
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn complete(&mut self, ticket: &SynthesisTicket, outcome: Result<String, ApiError>) -> Settled {
        if self.state != (State::Synthesizing { token: ticket.token }) {
            tracing::debug!(campaign = %ticket.campaign_id, "discarding stale synthesis completion");
            return Settled::Stale;
        }
        match outcome {
            Ok(image) => {
                self.state = State::Ready { image };
                Settled::Ready
            }
            Err(e) => {
                tracing::warn!(campaign = %ticket.campaign_id, error = %e, "final look synthesis failed");
                self.state = State::Idle;
                Settled::Failed
            }
        }
    }

    /// Drop any final image and forget the in-flight request. Token numbering
    /// continues, so completions for the forgotten request stay stale.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> CampaignId {
        CampaignId::parse("camp").unwrap()
    }

    #[test]
    fn below_100_issues_nothing() {
        let mut finale = Finale::new();
        for p in [0, 50, 99] {
            assert!(finale.observe(&id(), p).is_none());
        }
        assert_eq!(finale.phase(), FinalePhase::Idle);
    }

    #[test]
    fn repeated_observation_issues_one_ticket() {
        let mut finale = Finale::new();
        let tickets: Vec<_> = (0..10).filter_map(|_| finale.observe(&id(), 100)).collect();
        assert_eq!(tickets.len(), 1);
        assert_eq!(finale.phase(), FinalePhase::Synthesizing);
    }

    #[test]
    fn success_moves_to_ready_and_stays() {
        let mut finale = Finale::new();
        let ticket = finale.observe(&id(), 100).unwrap();
        assert_eq!(finale.complete(&ticket, Ok("img".into())), Settled::Ready);
        assert_eq!(finale.play(), Some("img"));
        assert!(finale.observe(&id(), 100).is_none());
        assert_eq!(finale.phase(), FinalePhase::Ready);
    }

    #[test]
    fn failure_returns_to_idle_and_allows_retry() {
        let mut finale = Finale::new();
        let ticket = finale.observe(&id(), 100).unwrap();
        assert_eq!(finale.complete(&ticket, Err(ApiError::EmptyImage)), Settled::Failed);
        assert_eq!(finale.phase(), FinalePhase::Idle);
        assert!(finale.play().is_none());

        let retry = finale.observe(&id(), 100).unwrap();
        assert_ne!(retry, ticket);
    }

    #[test]
    fn dropping_below_100_clears_image() {
        let mut finale = Finale::new();
        let ticket = finale.observe(&id(), 100).unwrap();
        finale.complete(&ticket, Ok("img".into()));
        assert!(finale.observe(&id(), 75).is_none());
        assert_eq!(finale.phase(), FinalePhase::Idle);
        assert!(finale.image().is_none());

        // re-completion synthesizes afresh
        assert!(finale.observe(&id(), 100).is_some());
    }

    #[test]
    fn completion_after_drop_is_stale() {
        let mut finale = Finale::new();
        let first = finale.observe(&id(), 100).unwrap();
        finale.observe(&id(), 75);
        let second = finale.observe(&id(), 100).unwrap();

        assert_eq!(finale.complete(&first, Ok("old".into())), Settled::Stale);
        assert_eq!(finale.phase(), FinalePhase::Synthesizing);
        assert_eq!(finale.complete(&second, Ok("new".into())), Settled::Ready);
        assert_eq!(finale.image(), Some("new"));
    }

    #[test]
    fn late_failure_does_not_clobber_ready() {
        let mut finale = Finale::new();
        let first = finale.observe(&id(), 100).unwrap();
        finale.reset();
        let second = finale.observe(&id(), 100).unwrap();
        finale.complete(&second, Ok("art".into()));
        assert_eq!(finale.complete(&first, Err(ApiError::EmptyImage)), Settled::Stale);
        assert_eq!(finale.image(), Some("art"));
    }
}
