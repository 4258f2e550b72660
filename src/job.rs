//! The asynchronous job client both binaries are built on.
//!
//! Freepik's generative endpoints all speak the same protocol: a POST
//! creates a task and returns its id, a GET per task id reports progress,
//! and a completed task carries a list of result URLs. [`JobApi`] abstracts
//! that protocol, [`poll_until_terminal`] drives a submitted [`Job`] to a
//! terminal state at a fixed interval within a wall-clock budget, and
//! [`run`] ties submission, polling and download together.

use std::{
    path::Path,
    pin::Pin,
    time::{Duration, Instant},
};

use color_eyre::{Result, eyre::WrapErr as _};
use log::{info, warn};
use strum::Display;
use thiserror::Error;
use tokio::time::sleep;

use crate::artifact::{Artifact, FetchError, fetch_result};

/// A unit of remote work, from submission until its results are picked up.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Taken right before the creation request goes out, so the request
    /// itself already counts against the poll budget.
    pub created_at: Instant,
    /// Result locations, empty until the provider reports completion.
    pub result_urls: Vec<String>,
}

impl Job {
    /// Applies a fresh reading from the status endpoint. Id and creation
    /// time always stay as they were at submission.
    pub fn apply(&mut self, update: StatusUpdate) {
        self.status = update.status;
        self.result_urls = update.result_urls;
    }
}

/// Task status in the client's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    /// A label this client does not recognize. Counts as still working.
    #[strum(to_string = "{0}")]
    Other(String),
}

impl JobStatus {
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "CREATED" | "PENDING" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Statuses after which polling is pointless.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One reading from the provider's status endpoint.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub result_urls: Vec<String>,
}

/// How often to ask, and how long to keep asking. Fixed for the life of a
/// job; there is no backoff.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Errors from the task-creation request.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("task creation request failed: {0}")]
    Transport(String),

    #[error("provider rejected the task ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed task creation response: {0}")]
    Malformed(String),
}

/// A status query that failed without deciding the job's fate. The poller
/// logs these and asks again on the next tick.
#[derive(Debug, Error)]
#[error("status query failed: {0}")]
pub struct StatusError(pub String);

/// Terminal poll outcomes.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("task {task_id} still not finished after {timeout:?} (last status: {last_status})")]
    Timeout {
        task_id: String,
        timeout: Duration,
        last_status: JobStatus,
    },

    #[error("task {task_id} failed on the provider side (status: {status})")]
    ProviderFailed { task_id: String, status: JobStatus },
}

pub type ApiFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// One remote generative task: create it, watch it, download its output.
/// Endpoint URL, payload and credential live in the implementor.
pub trait JobApi {
    fn submit<'a>(&'a self) -> ApiFuture<'a, Job, SubmitError>;
    fn status<'a>(&'a self, job_id: &'a str) -> ApiFuture<'a, StatusUpdate, StatusError>;
    fn download<'a>(&'a self, url: &'a str) -> ApiFuture<'a, Vec<u8>, FetchError>;
}

/// Polls `job` until it reaches a terminal status or the budget runs out.
///
/// A job that is already terminal when it comes in returns without a single
/// network call. Failed status queries never change the job's state; they
/// are logged and retried after the same fixed interval, while the
/// wall-clock budget (measured from [`Job::created_at`]) keeps running.
pub async fn poll_until_terminal(
    api: &dyn JobApi,
    mut job: Job,
    config: &PollConfig,
) -> Result<Job, PollError> {
    loop {
        if job.status == JobStatus::Completed {
            return Ok(job);
        }
        if job.status == JobStatus::Failed {
            return Err(PollError::ProviderFailed {
                task_id: job.id,
                status: job.status,
            });
        }
        if job.created_at.elapsed() >= config.timeout {
            return Err(PollError::Timeout {
                task_id: job.id,
                timeout: config.timeout,
                last_status: job.status,
            });
        }

        info!("waiting for task {} (status: {})", job.id, job.status);
        sleep(config.interval).await;

        match api.status(&job.id).await {
            Ok(update) => job.apply(update),
            Err(e) => warn!("task {}: {e}", job.id),
        }
    }
}

/// Submits, polls to completion, downloads the result into
/// `dest_dir/file_name`. The one call a binary needs.
pub async fn run(
    api: &dyn JobApi,
    config: PollConfig,
    dest_dir: &Path,
    file_name: &str,
) -> Result<Artifact> {
    let job = api
        .submit()
        .await
        .wrap_err("could not create the generation task")?;
    info!("task {} created (status: {})", job.id, job.status);

    let job = poll_until_terminal(api, job, &config)
        .await
        .wrap_err("the task did not produce a result")?;

    let artifact = fetch_result(api, &job, dest_dir, file_name)
        .await
        .wrap_err("could not download the generated result")?;

    info!("wrote {} ({} bytes)", artifact.path.display(), artifact.len);
    Ok(artifact)
}
