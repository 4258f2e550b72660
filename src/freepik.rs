//! Freepik's asynchronous generative-media API.
//!
//! Every model lives under its own endpoint URL but follows the same task
//! protocol: POST a payload, poll `GET <endpoint>/<task_id>`, download the
//! generated files. [`FreepikEndpoint`] bundles one such endpoint with its
//! payload and credential and exposes it as a [`JobApi`].

use nonempty::NonEmpty;
use reqwest::Client;
use serde_json::{Value, json};

use crate::{
    artifact::FetchError,
    job::{ApiFuture, Job, JobApi, StatusError, StatusUpdate, SubmitError},
};

pub mod freepik_api;
pub mod reference;

pub use reference::resolve_image_ref;

/// Image editing with Gemini 2.5 Flash image preview.
pub const IMAGE_EDIT_URL: &str = "https://api.freepik.com/v1/ai/gemini-2-5-flash-image-preview";

/// Image-to-video with MiniMax Hailuo 02 at 768p.
pub const IMAGE_TO_VIDEO_URL: &str =
    "https://api.freepik.com/v1/ai/image-to-video/minimax-hailuo-02-768p";

/// One model endpoint, ready to run a single task against.
pub struct FreepikEndpoint {
    client: Client,
    api_key: String,
    url: String,
    payload: Value,
}

impl FreepikEndpoint {
    pub fn new(api_key: String, url: impl Into<String>, payload: Value) -> Self {
        Self {
            client: Client::new(),
            api_key,
            url: url.into(),
            payload,
        }
    }
}

impl JobApi for FreepikEndpoint {
    fn submit<'a>(&'a self) -> ApiFuture<'a, Job, SubmitError> {
        Box::pin(freepik_api::create_task(
            &self.client,
            &self.api_key,
            &self.url,
            &self.payload,
        ))
    }

    fn status<'a>(&'a self, job_id: &'a str) -> ApiFuture<'a, StatusUpdate, StatusError> {
        Box::pin(freepik_api::get_task(
            &self.client,
            &self.api_key,
            &self.url,
            job_id,
        ))
    }

    fn download<'a>(&'a self, url: &'a str) -> ApiFuture<'a, Vec<u8>, FetchError> {
        Box::pin(freepik_api::download(&self.client, url))
    }
}

/// Request body for the image-edit model. Reference entries may be image
/// URLs or base64-encoded image data, the API accepts both.
pub fn edit_image_payload(prompt: &str, reference_images: &NonEmpty<String>) -> Value {
    json!({
        "prompt": prompt,
        "reference_images": reference_images,
    })
}

/// Request body for the image-to-video model. The frames bound the clip,
/// `duration` is its length in seconds ("6" or "10" for this model).
pub fn image_to_video_payload(
    prompt: &str,
    first_frame: &str,
    last_frame: &str,
    duration: &str,
    prompt_optimizer: bool,
) -> Value {
    json!({
        "first_frame_image": first_frame,
        "last_frame_image": last_frame,
        "prompt": prompt,
        "prompt_optimizer": prompt_optimizer,
        "duration": duration,
    })
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use nonempty::nonempty;

    use super::*;

    #[test]
    fn edit_image_request_serialization() {
        let references = nonempty![
            "https://img.example/portrait.jpg".to_string(),
            "aGF0LWJ5dGVz".to_string()
        ];
        let payload = edit_image_payload("put the hat on the woman's head", &references);
        let expected = expect![[
            r#"{"prompt":"put the hat on the woman's head","reference_images":["https://img.example/portrait.jpg","aGF0LWJ5dGVz"]}"#
        ]];
        expected.assert_eq(&serde_json::to_string(&payload).unwrap());
    }

    #[test]
    fn image_to_video_request_serialization() {
        let payload = image_to_video_payload(
            "the car drives into the sunset",
            "https://img.example/first.jpg",
            "https://img.example/last.jpg",
            "6",
            true,
        );
        let expected = expect![[
            r#"{"duration":"6","first_frame_image":"https://img.example/first.jpg","last_frame_image":"https://img.example/last.jpg","prompt":"the car drives into the sunset","prompt_optimizer":true}"#
        ]];
        expected.assert_eq(&serde_json::to_string(&payload).unwrap());
    }
}
