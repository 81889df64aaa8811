use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoded images shorter than this are placeholders, not generated art.
pub const MIN_IMAGE_LEN: usize = 50;

/// Literal the backend emits for a slot whose generation failed or is pending.
pub const NULL_IMAGE_SENTINEL: &str = "None";

// ---------------------------------------------------------------------------
// CampaignId
// ---------------------------------------------------------------------------

/// Opaque backend-assigned campaign identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CampaignId(String);

impl TryFrom<String> for CampaignId {
    type Error = crate::error::RunwayError;

    fn try_from(id: String) -> Result<Self> {
        Self::parse(id)
    }
}

impl From<CampaignId> for String {
    fn from(id: CampaignId) -> Self {
        id.0
    }
}

impl CampaignId {
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        paths::validate_campaign_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoadmapStage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStage {
    /// Reveal threshold in percent. Stages are not sorted by this.
    pub target_percentage: u32,
    pub milestone_task: String,
    pub clothing_item: String,
}

// ---------------------------------------------------------------------------
// ImageSlot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot<'a> {
    Ready(&'a str),
    Processing,
}

impl ImageSlot<'_> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ImageSlot::Ready(_))
    }
}

fn classify(raw: Option<&String>) -> ImageSlot<'_> {
    match raw {
        Some(s) if s != NULL_IMAGE_SENTINEL && s.len() > MIN_IMAGE_LEN => ImageSlot::Ready(s),
        _ => ImageSlot::Processing,
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Server-owned campaign data, as returned by `GET /api/campaign/{id}`.
///
/// `images` fills in asynchronously on the server and may be shorter than
/// `roadmap`; missing slots are reported as [`ImageSlot::Processing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default)]
    pub roadmap: Vec<RoadmapStage>,
    #[serde(default, deserialize_with = "nullable_images")]
    pub images: Vec<String>,
}

/// The backend may send `null` entries; they become the null sentinel.
fn nullable_images<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(de)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.unwrap_or_else(|| NULL_IMAGE_SENTINEL.to_string()))
        .collect())
}

impl Campaign {
    pub fn len(&self) -> usize {
        self.roadmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roadmap.is_empty()
    }

    pub fn image(&self, index: usize) -> ImageSlot<'_> {
        classify(self.images.get(index))
    }

    /// True until at least one roadmap slot has a generated image.
    pub fn awaiting_assets(&self) -> bool {
        !(0..self.roadmap.len()).any(|i| self.image(i).is_ready())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
