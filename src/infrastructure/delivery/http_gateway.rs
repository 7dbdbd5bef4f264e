use crate::application::ports::submission_gateway::{
    DeliveryError, DeliveryReceipt, SubmissionGateway, SubmissionRequest,
};
use crate::shared::config::ApiConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// JSON-over-HTTP client for the remote submission API.
///
/// No per-request timeout is set; a hung request is bounded by the transport only.
#[derive(Clone)]
pub struct HttpSubmissionGateway {
    client: Client,
    base_url: String,
    catch_path: String,
    waypoint_path: String,
}

impl HttpSubmissionGateway {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.connect_timeout {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            catch_path: config.catch_path.clone(),
            waypoint_path: config.waypoint_path.clone(),
        }
    }

    fn endpoint(&self, request: &SubmissionRequest) -> String {
        let path = match request {
            SubmissionRequest::Catch(_) => &self.catch_path,
            SubmissionRequest::Waypoint(_) => &self.waypoint_path,
        };
        format!("{}{}", self.base_url, path)
    }
}

/// A service-worker style interceptor answers 503 with `{offline: true, queued: true}`
/// when the server could not be reached.
fn is_offline_marker(status: StatusCode, body: Option<&Value>) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
        && body.is_some_and(|body| {
            body.get("offline").and_then(Value::as_bool) == Some(true)
                && body.get("queued").and_then(Value::as_bool) == Some(true)
        })
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let url = self.endpoint(request);
        let builder = self.client.post(&url);
        let builder = match request {
            SubmissionRequest::Catch(body) => builder.json(body),
            SubmissionRequest::Waypoint(body) => builder.json(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        let body = serde_json::from_str::<Value>(&text).ok();

        if status.is_success() {
            tracing::debug!(
                target: "offline::sync",
                endpoint = request.endpoint_name(),
                status = status.as_u16(),
                "submission accepted"
            );
            return Ok(DeliveryReceipt {
                status: status.as_u16(),
                body,
            });
        }

        if is_offline_marker(status, body.as_ref()) {
            return Err(DeliveryError::OfflineQueued);
        }

        Err(DeliveryError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}
