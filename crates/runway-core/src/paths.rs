use crate::error::{Result, RunwayError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RUNWAY_DIR: &str = ".runway";
pub const CONFIG_FILE: &str = ".runway/config.yaml";
pub const STATE_FILE: &str = ".runway/state.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

// ---------------------------------------------------------------------------
// Campaign id validation
// ---------------------------------------------------------------------------

static CAMPAIGN_ID_RE: OnceLock<Regex> = OnceLock::new();

fn campaign_id_re() -> &'static Regex {
    CAMPAIGN_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]{1,128}$").unwrap())
}

/// Campaign ids are opaque but end up in a URL path segment.
pub fn validate_campaign_id(id: &str) -> Result<()> {
    if !campaign_id_re().is_match(id) {
        return Err(RunwayError::InvalidCampaignId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
