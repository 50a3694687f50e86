use thiserror::Error;

/// Pipeline error taxonomy. `Generation`, `MalformedScript`, `NoScenes` and
/// `Render` are fatal to the run; `AssetNotFound`, `Download`, `Synthesis`
/// and `Compose` are scene-local and only drop the scene they belong to.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("script generation failed: {0}")]
    Generation(String),

    #[error("script response is not a valid scene list: {0}")]
    MalformedScript(String),

    #[error("no stock footage found for '{query}' (fallback included)")]
    AssetNotFound { query: String },

    #[error("footage download failed: {0}")]
    Download(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("scene composition failed: {0}")]
    Compose(String),

    #[error("no scenes survived to assemble")]
    NoScenes,

    #[error("render failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
