//! Turning CLI image arguments into the strings the payloads need.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure},
};
use log::info;
use reqwest::Client;

/// Resolves one reference image argument. Local files are read and inlined
/// as base64, URLs pass through untouched unless `inline_remote` asks for a
/// client-side download first.
///
/// Inlining helps with hosts that refuse the provider's server-side fetch.
pub async fn resolve_image_ref(
    client: &Client,
    reference: &str,
    inline_remote: bool,
) -> Result<String> {
    if reference.starts_with("https://") || reference.starts_with("http://") {
        if inline_remote {
            fetch_reference_b64(client, reference).await
        } else {
            Ok(reference.to_string())
        }
    } else {
        let bytes = std::fs::read(reference)
            .wrap_err_with(|| format!("could not read reference image {reference}"))?;
        Ok(STANDARD.encode(bytes))
    }
}

/// Downloads an image and re-encodes it as base64.
pub async fn fetch_reference_b64(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    ensure!(
        resp.status().is_success(),
        "could not download reference image {url}: {}",
        resp.status()
    );
    let bytes = resp.bytes().await?;
    info!("downloaded reference image {url} ({} bytes)", bytes.len());
    Ok(STANDARD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_files_are_inlined_as_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let resolved = resolve_image_ref(&Client::new(), path.to_str().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(resolved, STANDARD.encode(b"jpeg bytes"));
    }

    #[tokio::test]
    async fn urls_pass_through_untouched() {
        let resolved = resolve_image_ref(&Client::new(), "https://img.example/x.jpg", false)
            .await
            .unwrap();
        assert_eq!(resolved, "https://img.example/x.jpg");
    }

    #[tokio::test]
    async fn missing_files_are_reported_by_name() {
        let err = resolve_image_ref(&Client::new(), "no-such-file.png", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-file.png"));
    }
}
