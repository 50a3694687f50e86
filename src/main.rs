mod args;
mod assemble;
mod audio;
mod compose;
mod config;
mod error;
mod probe;
mod scene;
mod script;
mod stock;
mod subtitle;
mod trends;
mod tts;
mod upload;

use args::Args;
use clap::Parser;
use config::Config;
use error::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use scene::{SceneUnit, ScriptScene};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info") // set to "debug" for more logs
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    info!("Starting shorts generation pipeline");

    // Stale intermediates from prior runs are cleared exactly once here;
    // after this the assets dir is append-only for the rest of the run.
    if Path::new(&args.assets_dir).exists() {
        info!("Cleaning up old assets in '{}'", args.assets_dir);
        fs::remove_dir_all(&args.assets_dir)?;
    }
    fs::create_dir_all(&args.assets_dir)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let topic = match &args.topic {
        Some(topic) => topic.clone(),
        None => trends::discover_topic(&client, &args.region, &mut rng).await,
    };
    info!("Resolved topic: {}", topic);

    let script = script::compose(&client, &config.gemini_api_key, &topic).await?;

    // One scene at a time: the compositor needs this scene's measured audio
    // duration, and the TTS quota rules out parallel narration anyway.
    let mut units: Vec<SceneUnit> = Vec::new();
    let mut first_narration = true;
    let scene_count = script.len();
    for (index, scene) in script.into_iter().enumerate() {
        info!("Processing scene {}/{}", index + 1, scene_count);
        match process_scene(
            &client,
            &config,
            &args,
            scene,
            index,
            &mut rng,
            &mut first_narration,
        )
        .await
        {
            Ok(unit) => units.push(unit),
            Err(e) => warn!("Scene {} dropped: {}", index + 1, e),
        }
    }

    if units.len() < scene_count {
        warn!(
            "{} of {} scenes survived to assembly",
            units.len(),
            scene_count
        );
    }

    let artifact = assemble::assemble(&units, &args.assets_dir, &args.out)?;

    if args.upload {
        let upload_config = config::UploadConfig::from_env()?;
        let title = args
            .title
            .clone()
            .unwrap_or_else(|| format!("{} #Shorts", topic));
        let id = upload::upload_video(
            &client,
            &upload_config,
            &artifact,
            &title,
            &args.description,
            &["shorts", "automation"],
        )
        .await?;
        info!("Published as video {}", id);
    }

    info!("Process complete.");
    Ok(())
}

/// Runs one scene through resolve -> narrate -> compose. Any error here is
/// caught at the call site and turns into a dropped scene, never an abort.
async fn process_scene(
    client: &reqwest::Client,
    config: &Config,
    args: &Args,
    scene: ScriptScene,
    index: usize,
    rng: &mut StdRng,
    first_narration: &mut bool,
) -> Result<SceneUnit> {
    let resolved = stock::resolve(
        client,
        &config.pexels_api_key,
        scene,
        index,
        &args.assets_dir,
        rng,
    )
    .await?;

    // Mandatory pacing between narration calls after the first; the
    // provider 429s on tight sequences.
    if *first_narration {
        *first_narration = false;
    } else {
        sleep(tts::CALL_PAUSE).await;
    }

    let narrated = tts::synthesize(
        client,
        config,
        resolved,
        &args.voice,
        &args.rate,
        &args.assets_dir,
    )
    .await?;

    compose::compose(&narrated, &args.assets_dir)
}
