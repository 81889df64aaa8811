use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunwayError {
    #[error("no active campaign: run 'runway new' or 'runway use <id>'")]
    NoActiveCampaign,

    #[error("invalid campaign id '{0}': must be 1-128 characters of [A-Za-z0-9_-]")]
    InvalidCampaignId(String),

    #[error("invalid note slot {slot}: expected 0..{slots}")]
    InvalidNoteSlot { slot: usize, slots: usize },

    #[error("campaign data not loaded yet")]
    CampaignNotLoaded,

    #[error("backend request failed: {0}")]
    Api(#[from] crate::api::ApiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RunwayError>;
