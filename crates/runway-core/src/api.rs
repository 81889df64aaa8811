//! Client for the campaign backend.
//!
//! Three endpoints are consumed:
//!
//! - `GET  /api/campaign/{id}`        → [`Campaign`]
//! - `POST /api/generate-runway`      → [`CreatedCampaign`]
//! - `POST /api/generate-final-look`  → final image payload
//!
//! [`RunwayApi`] is the seam the session drives; [`HttpApi`] is the reqwest
//! implementation.

use crate::campaign::{Campaign, CampaignId, RoadmapStage};
use crate::config::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response carried no image")]
    EmptyImage,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Intake request for a new campaign.
#[derive(Debug, Clone, Serialize)]
pub struct RunwayRequest {
    pub goal: String,
    pub target_date: String,
    pub vibe: String,
    pub color: String,
    pub designer: String,
    pub inspiration_image_base64: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCampaign {
    pub campaign_id: CampaignId,
    #[serde(default)]
    pub roadmap: Option<Vec<RoadmapStage>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl CreatedCampaign {
    /// Campaign data embedded in the creation response, if the backend sent
    /// a roadmap along with the id.
    pub fn campaign(&self) -> Option<Campaign> {
        self.roadmap.as_ref().map(|roadmap| Campaign {
            roadmap: roadmap.clone(),
            images: self.images.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct FinalLookRequest<'a> {
    campaign_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FinalLookResponse {
    #[serde(default)]
    image: Option<String>,
}

// ---------------------------------------------------------------------------
// RunwayApi
// ---------------------------------------------------------------------------

/// Backend operations the engine depends on. All are read-only or
/// idempotent from the client's point of view except `generate_runway`.
pub trait RunwayApi: Clone + Send + Sync + 'static {
    fn fetch_campaign(
        &self,
        id: &CampaignId,
    ) -> impl Future<Output = Result<Campaign, ApiError>> + Send;

    fn generate_final_look(
        &self,
        id: &CampaignId,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn generate_runway(
        &self,
        request: &RunwayRequest,
    ) -> impl Future<Output = Result<CreatedCampaign, ApiError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check the status and decode the body. Bodies are read as text first
    /// so a bad payload surfaces as `Decode` rather than a transport error.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl RunwayApi for HttpApi {
    async fn fetch_campaign(&self, id: &CampaignId) -> Result<Campaign, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/campaign/{id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn generate_final_look(&self, id: &CampaignId) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/generate-final-look"))
            .json(&FinalLookRequest {
                campaign_id: id.as_str(),
            })
            .send()
            .await?;
        let body: FinalLookResponse = Self::decode(response).await?;
        match body.image {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(ApiError::EmptyImage),
        }
    }

    async fn generate_runway(&self, request: &RunwayRequest) -> Result<CreatedCampaign, ApiError> {
        let response = self
            .client
            .post(self.url("/api/generate-runway"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
