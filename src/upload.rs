use crate::config::UploadConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use tracing::info;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

/// Uploads the finished short: refresh-token exchange, resumable session,
/// then a single PUT of the whole file. Returns the platform's video id.
/// Uploads start private so the result can be reviewed before going live.
pub async fn upload_video(
    client: &Client,
    config: &UploadConfig,
    file_path: &str,
    title: &str,
    description: &str,
    tags: &[&str],
) -> anyhow::Result<String> {
    let access_token = refresh_access_token(client, config).await?;

    info!("Uploading {}...", file_path);

    let body = json!({
        "snippet": {
            "title": truncate(title, 100),
            "description": truncate(description, 5000),
            "tags": tags,
            "categoryId": "22",
        },
        "status": {
            "privacyStatus": "private",
            "selfDeclaredMadeForKids": false,
        }
    });

    let session = client
        .post(UPLOAD_URL)
        .bearer_auth(&access_token)
        .header("X-Upload-Content-Type", "video/mp4")
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let upload_url = session
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("upload session response carried no location header"))?
        .to_string();

    let bytes = fs::read(file_path)?;
    let response: InsertResponse = client
        .put(&upload_url)
        .bearer_auth(&access_token)
        .header("Content-Type", "video/mp4")
        .body(bytes)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info!("Upload complete. Video ID: {}", response.id);
    Ok(response.id)
}

async fn refresh_access_token(client: &Client, config: &UploadConfig) -> anyhow::Result<String> {
    let response: TokenResponse = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("refresh_token", config.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(response.access_token)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 100), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // multi-byte chars count as one
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
