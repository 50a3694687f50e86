use serde::Deserialize;

/// One scene as emitted by the script model: narration text plus the stock
/// footage search term. Order in the script is narration order.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptScene {
    pub text: String,
    pub visual_query: String,
}

/// A scene whose footage has been downloaded locally.
#[derive(Debug, Clone)]
pub struct ResolvedScene {
    pub index: usize,
    pub script: ScriptScene,
    pub asset_path: String,
}

/// A resolved scene with its narration rendered and measured. The duration
/// is always taken from the decoded audio, never estimated from word count.
#[derive(Debug, Clone)]
pub struct NarratedScene {
    pub index: usize,
    pub script: ScriptScene,
    pub asset_path: String,
    pub audio_path: String,
    pub audio_duration: f64,
}

/// A fully composed 1080x1920 segment with burned captions and attached
/// narration, ready for concatenation. Consumed exactly once by assembly.
#[derive(Debug, Clone)]
pub struct SceneUnit {
    pub index: usize,
    pub path: String,
    pub duration: f64,
}
