use color_eyre::{Result, eyre::WrapErr as _};

pub mod artifact;
pub mod freepik;
pub mod job;

/// Environment variable holding the Freepik API credential.
pub const API_KEY_VAR: &str = "FREEPIK_API_KEY";

/// Reads the API key from the environment. A `.env` file in the working
/// directory is loaded first, so the key doesn't have to live in the shell
/// profile.
pub fn api_key_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    std::env::var(API_KEY_VAR).wrap_err_with(|| {
        format!("{API_KEY_VAR} is not set (export it or put it in a .env file)")
    })
}
