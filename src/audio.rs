use crate::error::{PipelineError, Result};
use hound::WavReader;

/// Measured duration of a rendered WAV file in seconds. Zero-length audio is
/// rejected here so downstream fitting never divides by it.
pub fn wav_duration_seconds(path: &str) -> Result<f64> {
    let reader = WavReader::open(path)
        .map_err(|e| PipelineError::Synthesis(format!("cannot read {}: {}", path, e)))?;
    let spec = reader.spec();
    let frames = reader.len() as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    if duration <= 0.0 {
        return Err(PipelineError::Synthesis(format!(
            "zero-duration audio in {}",
            path
        )));
    }
    Ok(duration)
}
