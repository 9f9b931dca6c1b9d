use crate::models::{Attendee, EventConfig, Match, RoundPlan};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the participant registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Participant registry client
///
/// The registry owns everything this engine treats as external: attendee
/// records and check-in state, event configuration, and the durable store
/// for computed plans and resolved matches.
pub struct RegistryClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// Fetch the roster for an event, check-in status included
    pub async fn get_roster(&self, event_id: &str) -> Result<Vec<Attendee>, RegistryError> {
        let url = format!(
            "{}/events/{}/roster",
            self.base_url.trim_end_matches('/'),
            event_id
        );

        tracing::debug!("Fetching roster from: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let json = self.read_json(response, "roster", event_id).await?;

        let attendees = json
            .get("attendees")
            .and_then(|a| a.as_array())
            .ok_or_else(|| RegistryError::InvalidResponse("Missing attendees array".into()))?;

        let roster: Vec<Attendee> = attendees
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .collect();

        tracing::debug!("Fetched {} attendees for event {}", roster.len(), event_id);

        Ok(roster)
    }

    /// Fetch the event configuration (tables, round length, round budget)
    pub async fn get_event_config(&self, event_id: &str) -> Result<EventConfig, RegistryError> {
        let url = format!(
            "{}/events/{}/config",
            self.base_url.trim_end_matches('/'),
            event_id
        );

        tracing::debug!("Fetching event config from: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let json = self.read_json(response, "event config", event_id).await?;

        serde_json::from_value(json)
            .map_err(|e| RegistryError::InvalidResponse(format!("Failed to parse config: {e}")))
    }

    /// Push the computed plan to the registry for downstream UI
    pub async fn store_round_plan(&self, plan: &RoundPlan) -> Result<(), RegistryError> {
        let url = format!(
            "{}/events/{}/plan",
            self.base_url.trim_end_matches('/'),
            plan.event_id
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(plan)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::ApiError(format!(
                "Failed to store round plan: {}",
                response.status()
            )));
        }

        tracing::debug!("Stored round plan for event {}", plan.event_id);

        Ok(())
    }

    /// Push the resolved match list for notification and display
    pub async fn store_matches(
        &self,
        event_id: &str,
        matches: &[Match],
    ) -> Result<(), RegistryError> {
        let url = format!(
            "{}/events/{}/matches",
            self.base_url.trim_end_matches('/'),
            event_id
        );

        let payload = serde_json::json!({ "matches": matches });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::ApiError(format!(
                "Failed to store matches: {}",
                response.status()
            )));
        }

        tracing::debug!("Stored {} matches for event {}", matches.len(), event_id);

        Ok(())
    }

    async fn read_json(
        &self,
        response: reqwest::Response,
        what: &str,
        event_id: &str,
    ) -> Result<Value, RegistryError> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RegistryError::Unauthorized)
            }
            StatusCode::NOT_FOUND => {
                return Err(RegistryError::NotFound(format!(
                    "{what} for event {event_id}"
                )))
            }
            status if !status.is_success() => {
                return Err(RegistryError::ApiError(format!(
                    "Failed to fetch {what}: {status}"
                )))
            }
            _ => {}
        }

        Ok(response.json().await?)
    }
}
