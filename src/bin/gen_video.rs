use std::{path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::Result;
use freepik_gen::{
    api_key_from_env,
    freepik::{FreepikEndpoint, IMAGE_TO_VIDEO_URL, image_to_video_payload, resolve_image_ref},
    job::{self, PollConfig},
};
use indoc::indoc;

/// Generates a short video clip between two frames with Freepik's MiniMax
/// Hailuo 02 model.
///
/// Needs FREEPIK_API_KEY in the environment or a .env file.
#[derive(Debug, clap::Parser)]
#[command(after_help = indoc! {r#"
    Examples:
      gen_video "the car drives off into the sunset" \
          --first-frame car.jpg --last-frame sunset.jpg
      gen_video "zoom out slowly" --duration 10 \
          --first-frame https://img.example/room.jpg \
          --last-frame https://img.example/house.jpg
"#})]
struct Cli {
    /// Motion description for the model
    prompt: String,

    /// First frame of the clip: local file or URL
    #[arg(long)]
    first_frame: String,

    /// Last frame of the clip: local file or URL
    #[arg(long)]
    last_frame: String,

    /// Clip length in seconds
    #[arg(long, default_value = "6", value_parser = ["6", "10"])]
    duration: String,

    /// Send the prompt verbatim instead of letting the provider rework it
    #[arg(long)]
    no_prompt_optimizer: bool,

    /// Download remote frames and inline them as base64
    #[arg(long)]
    inline: bool,

    /// Directory the result is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Seconds between two status polls
    #[arg(long, default_value_t = 2)]
    interval_secs: u64,

    /// Seconds before the wait for the result is abandoned
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();
    let args = Cli::parse();
    let api_key = api_key_from_env()?;

    let client = reqwest::Client::new();
    let first_frame = resolve_image_ref(&client, &args.first_frame, args.inline).await?;
    let last_frame = resolve_image_ref(&client, &args.last_frame, args.inline).await?;

    let endpoint = FreepikEndpoint::new(
        api_key,
        IMAGE_TO_VIDEO_URL,
        image_to_video_payload(
            &args.prompt,
            &first_frame,
            &last_frame,
            &args.duration,
            !args.no_prompt_optimizer,
        ),
    );
    let config = PollConfig {
        interval: Duration::from_secs(args.interval_secs),
        timeout: Duration::from_secs(args.timeout_secs),
    };

    let artifact = job::run(&endpoint, config, &args.out_dir, "generated_video.mp4").await?;
    println!(
        "Saved video to {} ({} bytes)",
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
