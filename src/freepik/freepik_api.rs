//! Raw HTTP calls against the Freepik task endpoints.
//!
//! Creation and status queries share one response envelope, so both are
//! parsed into [`TaskData`] and converted from there.

use std::time::Instant;

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    artifact::FetchError,
    job::{Job, JobStatus, StatusError, StatusUpdate, SubmitError},
};

pub const API_KEY_HEADER: &str = "x-freepik-api-key";

#[derive(Debug, Deserialize)]
pub struct TaskEnvelope {
    pub data: TaskData,
}

#[derive(Debug, Deserialize)]
pub struct TaskData {
    pub task_id: String,
    pub status: String,
    /// Only present once results exist.
    #[serde(default)]
    pub generated: Vec<String>,
}

impl TaskData {
    pub fn into_job(self, created_at: Instant) -> Job {
        Job {
            id: self.task_id,
            status: JobStatus::from_provider(&self.status),
            created_at,
            result_urls: self.generated,
        }
    }

    pub fn into_update(self) -> StatusUpdate {
        StatusUpdate {
            status: JobStatus::from_provider(&self.status),
            result_urls: self.generated,
        }
    }
}

/// Creates a generation task. The job's clock starts right before the
/// request goes out, so the poll timeout covers submission latency too.
pub async fn create_task(
    client: &Client,
    api_key: &str,
    endpoint_url: &str,
    payload: &Value,
) -> Result<Job, SubmitError> {
    let created_at = Instant::now();
    let resp = client
        .post(endpoint_url)
        .header(API_KEY_HEADER, api_key)
        .json(payload)
        .send()
        .await
        .map_err(|e| SubmitError::Transport(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| SubmitError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(SubmitError::Rejected {
            status: status.as_u16(),
            message: provider_message(&body),
        });
    }

    let envelope: TaskEnvelope = serde_json::from_str(&body)
        .map_err(|e| SubmitError::Malformed(format!("{e}; body: {body}")))?;
    debug!("created task: {:#?}", envelope.data);
    Ok(envelope.data.into_job(created_at))
}

/// Fetches the current state of a task. All failures here are transient
/// from the caller's point of view, the next poll may well succeed.
pub async fn get_task(
    client: &Client,
    api_key: &str,
    endpoint_url: &str,
    task_id: &str,
) -> Result<StatusUpdate, StatusError> {
    let url = format!("{endpoint_url}/{task_id}");
    let resp = client
        .get(&url)
        .header(API_KEY_HEADER, api_key)
        .send()
        .await
        .map_err(|e| StatusError(e.to_string()))?;

    let status = resp.status();
    let body = resp.text().await.map_err(|e| StatusError(e.to_string()))?;
    if !status.is_success() {
        return Err(StatusError(format!(
            "HTTP {status}: {}",
            provider_message(&body)
        )));
    }

    let envelope: TaskEnvelope =
        serde_json::from_str(&body).map_err(|e| StatusError(format!("{e}; body: {body}")))?;
    debug!("task state: {:#?}", envelope.data);
    Ok(envelope.data.into_update())
}

/// Downloads a result file. Result URLs are pre-signed, no API key goes
/// along.
pub async fn download(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Transport(format!(
            "GET {url} returned {status}"
        )));
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Freepik error bodies usually carry a `message` field. If the body is
/// something else entirely, it is passed on verbatim.
fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}
