use std::{path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use freepik_gen::{
    api_key_from_env,
    freepik::{FreepikEndpoint, IMAGE_EDIT_URL, edit_image_payload, resolve_image_ref},
    job::{self, PollConfig},
};
use indoc::indoc;
use nonempty::NonEmpty;

/// Edits an image with Freepik's Gemini 2.5 Flash image model.
///
/// Needs FREEPIK_API_KEY in the environment or a .env file.
#[derive(Debug, clap::Parser)]
#[command(after_help = indoc! {r#"
    Examples:
      edit_image "put the hat on the woman's head" portrait.jpg hat.jpg
      edit_image --inline "swap the background" https://img.example/portrait.jpg
"#})]
struct Cli {
    /// Edit instruction for the model
    prompt: String,

    /// Reference images: local files are inlined as base64, URLs are passed
    /// through for the provider to fetch
    #[arg(required = true)]
    reference_images: Vec<String>,

    /// Download remote references and inline them as base64 too
    #[arg(long)]
    inline: bool,

    /// Directory the result is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Seconds between two status polls
    #[arg(long, default_value_t = 2)]
    interval_secs: u64,

    /// Seconds before the wait for the result is abandoned
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();
    let args = Cli::parse();
    let api_key = api_key_from_env()?;

    let client = reqwest::Client::new();
    let mut references = Vec::with_capacity(args.reference_images.len());
    for reference in &args.reference_images {
        references.push(resolve_image_ref(&client, reference, args.inline).await?);
    }
    let references =
        NonEmpty::from_vec(references).ok_or(eyre!("at least one reference image is required"))?;

    let endpoint = FreepikEndpoint::new(
        api_key,
        IMAGE_EDIT_URL,
        edit_image_payload(&args.prompt, &references),
    );
    let config = PollConfig {
        interval: Duration::from_secs(args.interval_secs),
        timeout: Duration::from_secs(args.timeout_secs),
    };

    let artifact = job::run(&endpoint, config, &args.out_dir, "generated_image.jpg").await?;
    println!(
        "Saved image to {} ({} bytes)",
        artifact.path.display(),
        artifact.len
    );
    Ok(())
}

fn init_logging() {
    // Info by default so poll progress is visible, RUST_LOG overrides.
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
