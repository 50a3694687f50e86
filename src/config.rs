use std::env;

/// Provider credentials, loaded once at startup from the environment
/// (a `.env` file is honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub pexels_api_key: String,
    pub gemini_api_key: String,
    pub tts_api_url: String,
    pub tts_api_key: Option<String>,
}

/// Upload credentials are separate so a render-only run never requires them.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            pexels_api_key: require("PEXELS_API_KEY")?,
            gemini_api_key: require("GEMINI_API_KEY")?,
            tts_api_url: require("TTS_API_URL")?,
            tts_api_key: env::var("TTS_API_KEY").ok(),
        })
    }
}

impl UploadConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            client_id: require("YT_CLIENT_ID")?,
            client_secret: require("YT_CLIENT_SECRET")?,
            refresh_token: require("YT_REFRESH_TOKEN")?,
        })
    }
}

fn require(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing {} in environment or .env file", key))
}
