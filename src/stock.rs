use crate::error::{PipelineError, Result};
use crate::scene::{ResolvedScene, ScriptScene};
use rand::Rng;
use rand::rngs::StdRng;
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use tracing::{info, warn};

const SEARCH_API: &str = "https://api.pexels.com/videos/search";
const FALLBACK_QUERY: &str = "abstract background";
const POOL_SIZE: usize = 3;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub videos: Vec<VideoCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct VideoCandidate {
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    pub link: String,
    pub width: u32,
    pub height: u32,
}

/// Finds and downloads portrait footage for one scene. Empty primary search
/// retries exactly once with the fallback query; still empty means the scene
/// is dropped. Candidate choice is randomized over the pool on purpose.
pub async fn resolve(
    client: &Client,
    api_key: &str,
    scene: ScriptScene,
    index: usize,
    assets_dir: &str,
    rng: &mut StdRng,
) -> Result<ResolvedScene> {
    info!("Scene {}: searching footage for '{}'", index + 1, scene.visual_query);

    let candidates = search_with_fallback(&scene.visual_query, |q| async move {
        search(client, api_key, &q).await
    })
    .await?;

    let candidate = &candidates[rng.gen_range(0..candidates.len())];
    let file = pick_variant(&candidate.video_files).ok_or_else(|| {
        PipelineError::AssetNotFound {
            query: scene.visual_query.clone(),
        }
    })?;

    info!(
        "Scene {}: downloading {}x{} variant",
        index + 1,
        file.width,
        file.height
    );
    let bytes = client
        .get(&file.link)
        .send()
        .await
        .map_err(|e| PipelineError::Download(e.to_string()))?
        .error_for_status()
        .map_err(|e| PipelineError::Download(e.to_string()))?
        .bytes()
        .await
        .map_err(|e| PipelineError::Download(e.to_string()))?;

    let asset_path = format!(
        "{}/scene_{}_{}.mp4",
        assets_dir,
        index,
        rng.gen_range(1000..10000)
    );
    fs::write(&asset_path, &bytes).map_err(|e| PipelineError::Download(e.to_string()))?;

    Ok(ResolvedScene {
        index,
        script: scene,
        asset_path,
    })
}

/// Runs the scene's query and, when it comes back empty, exactly one
/// fallback search before giving up. Both empty means the scene is dropped
/// with `AssetNotFound` carrying the original query.
async fn search_with_fallback<F, Fut>(query: &str, search: F) -> Result<Vec<VideoCandidate>>
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<VideoCandidate>>>,
{
    let candidates = search(query.to_string()).await?;
    if !candidates.is_empty() {
        return Ok(candidates);
    }

    warn!(
        "No videos found for '{}'. Retrying with '{}'.",
        query, FALLBACK_QUERY
    );
    let fallback = search(FALLBACK_QUERY.to_string()).await?;
    if fallback.is_empty() {
        return Err(PipelineError::AssetNotFound {
            query: query.to_string(),
        });
    }
    Ok(fallback)
}

async fn search(client: &Client, api_key: &str, query: &str) -> Result<Vec<VideoCandidate>> {
    let response = client
        .get(SEARCH_API)
        .header("Authorization", api_key)
        .query(&[
            ("query", query),
            ("orientation", "portrait"),
            ("per_page", &POOL_SIZE.to_string()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let parsed: SearchResponse = response.json().await?;
    Ok(parsed.videos)
}

/// Variant policy: first file whose width lies in [720, 1080], bounding
/// bandwidth while staying usable; otherwise the first variant at all.
pub fn pick_variant(files: &[VideoFile]) -> Option<&VideoFile> {
    files
        .iter()
        .find(|f| f.width >= 720 && f.width <= 1080)
        .or_else(|| files.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn file(width: u32) -> VideoFile {
        VideoFile {
            link: format!("https://example.com/{}.mp4", width),
            width,
            height: width * 16 / 9,
        }
    }

    #[test]
    fn prefers_first_variant_in_target_band() {
        let files = vec![file(480), file(2160), file(720), file(1080)];
        assert_eq!(pick_variant(&files).unwrap().width, 720);
    }

    #[test]
    fn falls_back_to_first_variant_when_none_qualify() {
        let files = vec![file(2160), file(3840)];
        assert_eq!(pick_variant(&files).unwrap().width, 2160);
    }

    #[test]
    fn no_variants_means_no_pick() {
        assert!(pick_variant(&[]).is_none());
    }

    #[test]
    fn band_bounds_are_inclusive() {
        assert_eq!(pick_variant(&[file(640), file(1080)]).unwrap().width, 1080);
        assert_eq!(pick_variant(&[file(640), file(720)]).unwrap().width, 720);
    }

    fn candidate() -> VideoCandidate {
        VideoCandidate {
            video_files: vec![file(720)],
        }
    }

    #[tokio::test]
    async fn successful_primary_search_issues_no_fallback() {
        let queries = Mutex::new(Vec::new());
        let found = search_with_fallback("space stars", |q| {
            queries.lock().unwrap().push(q);
            async { Ok(vec![candidate()]) }
        })
        .await
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(queries.into_inner().unwrap(), vec!["space stars"]);
    }

    #[tokio::test]
    async fn empty_primary_search_retries_with_fallback_query_once() {
        let queries = Mutex::new(Vec::new());
        let found = search_with_fallback("deep sea jellyfish", |q| {
            let empty = queries.lock().unwrap().is_empty();
            queries.lock().unwrap().push(q);
            async move {
                if empty {
                    Ok(Vec::new())
                } else {
                    Ok(vec![candidate()])
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            queries.into_inner().unwrap(),
            vec!["deep sea jellyfish", FALLBACK_QUERY]
        );
    }

    #[tokio::test]
    async fn both_searches_empty_drops_scene_after_one_fallback() {
        let queries = Mutex::new(Vec::new());
        let err = search_with_fallback("deep sea jellyfish", |q| {
            queries.lock().unwrap().push(q);
            async { Ok(Vec::new()) }
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::AssetNotFound { query } if query == "deep sea jellyfish"
        ));
        // exactly one fallback attempt, never more
        assert_eq!(
            queries.into_inner().unwrap(),
            vec!["deep sea jellyfish", FALLBACK_QUERY]
        );
    }
}
