use rand::Rng;
use rand::rngs::StdRng;
use regex::Regex;
use tracing::{info, warn};

pub const FALLBACK_TOPIC: &str = "Amazing Space Facts";

/// Picks a trending topic from the regional trends RSS feed. The pipeline
/// never sees a discovery failure: any error falls back to a static topic.
pub async fn discover_topic(client: &reqwest::Client, region: &str, rng: &mut StdRng) -> String {
    match fetch_trending(client, region, rng).await {
        Ok(topic) => {
            info!("Trend found (RSS): {}", topic);
            topic
        }
        Err(e) => {
            warn!("RSS trends failed: {}. Using fallback topic.", e);
            FALLBACK_TOPIC.to_string()
        }
    }
}

async fn fetch_trending(
    client: &reqwest::Client,
    region: &str,
    rng: &mut StdRng,
) -> anyhow::Result<String> {
    let url = format!("https://trends.google.com/trending/rss?geo={}", region);
    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let titles = item_titles(&body);
    if titles.is_empty() {
        anyhow::bail!("no items found in RSS feed");
    }

    let top = &titles[..titles.len().min(10)];
    Ok(top[rng.gen_range(0..top.len())].clone())
}

/// Pulls `<title>` texts out of RSS `<item>` blocks. The feed is flat enough
/// that a regex over the raw XML is sufficient; the channel-level title is
/// skipped because it lives outside any `<item>`.
fn item_titles(xml: &str) -> Vec<String> {
    let re = Regex::new(r"(?s)<item>.*?<title>\s*(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?\s*</title>")
        .unwrap();
    re.captures_iter(xml)
        .filter_map(|cap| {
            let t = cap.get(1)?.as_str().trim();
            if t.is_empty() { None } else { Some(t.to_string()) }
        })
        .collect()
}
