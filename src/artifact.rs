//! Result selection, download and the all-or-nothing write to disk.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::job::{Job, JobApi};

/// A downloaded result, safely on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub len: u64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("the task finished without a downloadable result (locations: {0:?})")]
    NoValidResult(Vec<String>),

    #[error("result download failed: {0}")]
    Transport(String),

    #[error("could not write the artifact: {0}")]
    Write(#[from] std::io::Error),
}

/// Result lists can contain entries that are not fetchable URLs.
fn is_retrievable(url: &str) -> bool {
    url.starts_with("https://")
}

/// Downloads the first retrievable result location of a finished job and
/// writes it to `dir/file_name`.
pub async fn fetch_result(
    api: &dyn JobApi,
    job: &Job,
    dir: &Path,
    file_name: &str,
) -> Result<Artifact, FetchError> {
    let url = job
        .result_urls
        .iter()
        .find(|u| is_retrievable(u))
        .ok_or_else(|| FetchError::NoValidResult(job.result_urls.clone()))?;

    debug!("downloading result of task {} from {url}", job.id);
    let bytes = api.download(url).await?;
    if bytes.is_empty() {
        return Err(FetchError::Transport(format!(
            "empty response body from {url}"
        )));
    }

    write_artifact(&bytes, dir, file_name)
}

/// The content goes to a temp file in the target directory first and is
/// renamed over the final name once complete, so an aborted transfer leaves
/// nothing at the destination path.
pub fn write_artifact(bytes: &[u8], dir: &Path, file_name: &str) -> Result<Artifact, FetchError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;

    let path = dir.join(file_name);
    tmp.persist(&path).map_err(|e| FetchError::Write(e.error))?;
    Ok(Artifact {
        path,
        len: bytes.len() as u64,
    })
}
