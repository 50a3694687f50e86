use crate::error::{PipelineError, Result};
use crate::scene::ScriptScene;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

const GEMINI_API: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

/// Turns a topic into an ordered scene list via the generative provider.
/// This is the one stage with no fallback: a failed or malformed script
/// aborts the whole run, because there is no scene count to degrade to.
pub async fn compose(client: &Client, api_key: &str, topic: &str) -> Result<Vec<ScriptScene>> {
    info!("Writing script for: {}", topic);

    let prompt = format!(
        "Create a dynamic YouTube Shorts script about '{}'. \
         Output strictly valid JSON. No markdown formatting. \
         Structure: a list of objects, where each object represents a scene. \
         Each object must have: \
         'text' (the spoken narration, max 20 words per scene), \
         'visual_query' (a specific, simple keyword for stock video search, e.g. 'space nebula', 'happy dog'). \
         Total duration should be under 50 seconds (approx 130 words total). \
         Ensure the visual queries match the text context perfectly. \
         Example: [{{\"text\": \"Did you know space is silent?\", \"visual_query\": \"space stars\"}}, ...]",
        topic
    );

    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    });

    let response = client
        .post(format!("{}?key={}", GEMINI_API, api_key))
        .json(&body)
        .send()
        .await
        .map_err(|e| PipelineError::Generation(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(PipelineError::Generation(format!(
            "provider returned {}: {}",
            status, text
        )));
    }

    let parsed: GenerateResponse = response
        .json()
        .await
        .map_err(|e| PipelineError::Generation(format!("unreadable response: {}", e)))?;

    let raw = parsed
        .candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .map(|p| p.text.as_str())
        .ok_or_else(|| PipelineError::Generation("empty candidate list".to_string()))?;

    let scenes = parse_script(raw)?;
    info!("Script generated with {} scenes", scenes.len());
    Ok(scenes)
}

/// Fence-strip then parse-then-validate. Fails closed on anything that is
/// not a non-empty list of `{text, visual_query}` objects.
pub fn parse_script(raw: &str) -> Result<Vec<ScriptScene>> {
    let cleaned = strip_code_fences(raw);

    let scenes: Vec<ScriptScene> = serde_json::from_str(cleaned)
        .map_err(|e| PipelineError::MalformedScript(e.to_string()))?;

    if scenes.is_empty() {
        return Err(PipelineError::MalformedScript(
            "script contains zero scenes".to_string(),
        ));
    }
    for (i, scene) in scenes.iter().enumerate() {
        if scene.text.trim().is_empty() || scene.visual_query.trim().is_empty() {
            return Err(PipelineError::MalformedScript(format!(
                "scene {} has an empty field",
                i
            )));
        }
        let words = scene.text.split_whitespace().count();
        if words > 20 {
            warn!("Scene {} narration is {} words (asked for max 20)", i, words);
        }
    }
    Ok(scenes)
}

fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"text": "Did you know space is silent?", "visual_query": "space stars"},
        {"text": "There is no air to carry sound.", "visual_query": "astronaut floating"}
    ]"#;

    #[test]
    fn parses_plain_json_array_in_order() {
        let scenes = parse_script(VALID).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].visual_query, "space stars");
        assert_eq!(scenes[1].visual_query, "astronaut floating");
    }

    #[test]
    fn strips_markdown_fences_before_parsing() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert_eq!(parse_script(&fenced).unwrap().len(), 2);

        let bare_fence = format!("```\n{}\n```", VALID);
        assert_eq!(parse_script(&bare_fence).unwrap().len(), 2);
    }

    #[test]
    fn rejects_prose_responses() {
        let err = parse_script("Sure! Here is your script: ...").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedScript(_)));
    }

    #[test]
    fn rejects_missing_fields() {
        let err = parse_script(r#"[{"text": "hello"}]"#).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedScript(_)));
    }

    #[test]
    fn rejects_empty_list_and_empty_fields() {
        assert!(matches!(
            parse_script("[]").unwrap_err(),
            PipelineError::MalformedScript(_)
        ));
        assert!(matches!(
            parse_script(r#"[{"text": " ", "visual_query": "x"}]"#).unwrap_err(),
            PipelineError::MalformedScript(_)
        ));
    }
}
