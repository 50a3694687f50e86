use crate::audio::wav_duration_seconds;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::scene::{NarratedScene, ResolvedScene};
use reqwest::Client;
use serde_json::json;
use std::fs;
use std::time::Duration;
use tracing::info;

/// Mandatory pause between consecutive synthesis calls after the first.
/// The provider rejects tight call sequences with 429s; this is a quota
/// requirement, not tunable throughput.
pub const CALL_PAUSE: Duration = Duration::from_secs(2);

/// Renders one scene's narration to a WAV file and measures its duration
/// from the decoded stream. Any provider or I/O failure drops the scene.
pub async fn synthesize(
    client: &Client,
    config: &Config,
    scene: ResolvedScene,
    voice: &str,
    rate: &str,
    assets_dir: &str,
) -> Result<NarratedScene> {
    info!("Scene {}: synthesizing narration", scene.index + 1);

    let body = json!({
        "text": scene.script.text,
        "voice": voice,
        "rate": rate,
        "format": "wav",
    });

    let mut request = client.post(&config.tts_api_url).json(&body);
    if let Some(key) = &config.tts_api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| PipelineError::Synthesis(e.to_string()))?
        .error_for_status()
        .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

    let audio_path = format!("{}/voice_{}.wav", assets_dir, scene.index);
    fs::write(&audio_path, &bytes).map_err(|e| PipelineError::Synthesis(e.to_string()))?;

    let audio_duration = wav_duration_seconds(&audio_path)?;
    info!(
        "Scene {}: narration is {:.2}s",
        scene.index + 1,
        audio_duration
    );

    Ok(NarratedScene {
        index: scene.index,
        script: scene.script,
        asset_path: scene.asset_path,
        audio_path,
        audio_duration,
    })
}
