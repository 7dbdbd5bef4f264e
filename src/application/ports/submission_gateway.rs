use crate::domain::entities::offline::Coordinates;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatchSubmission {
    #[serde(rename = "tripId")]
    pub trip_id: String,
    pub date: NaiveDate,
    pub catch_outcome: u8,
    pub imei: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catches: Option<Vec<CatchLine>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatchLine {
    pub fish_group: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fish_length: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    pub metadata: Value,
}

/// Body of a creation request to the remote API.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionRequest {
    Catch(CatchSubmission),
    Waypoint(WaypointRequest),
}

impl SubmissionRequest {
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            SubmissionRequest::Catch(_) => "catch",
            SubmissionRequest::Waypoint(_) => "waypoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    /// A network interceptor answered on behalf of an unreachable server.
    #[error("offline: request was queued by the network layer")]
    OfflineQueued,
    #[error("delivery attempt panicked: {0}")]
    Panicked(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// The remote submission API. Any 2xx response is success; everything else,
/// including transport failures, is a `DeliveryError`.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest)
    -> Result<DeliveryReceipt, DeliveryError>;
}
