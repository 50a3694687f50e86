use crate::compose::FRAME_RATE;
use crate::error::{PipelineError, Result};
use crate::probe;
use crate::scene::SceneUnit;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Hard ceiling on the final artifact, in seconds.
pub const MAX_DURATION_SECS: f64 = 58.0;

/// Concatenates the surviving units in script order and writes the final
/// artifact exactly once. Zero survivors is the fatal case; a total over the
/// cap is trimmed after concatenation so scene boundaries inside the kept
/// span are untouched.
pub fn assemble(units: &[SceneUnit], assets_dir: &str, out_path: &str) -> Result<String> {
    if units.is_empty() {
        return Err(PipelineError::NoScenes);
    }

    info!("Assembling {} scene units", units.len());
    debug!(
        "Scene order: {:?}",
        units.iter().map(|u| u.index).collect::<Vec<_>>()
    );

    let concat_list = format!("{}/files.txt", assets_dir);
    {
        let mut f = File::create(&concat_list)?;
        for line in concat_list_lines(units)? {
            writeln!(f, "{}", line)?;
        }
    }

    // Re-encode on concat so per-scene fades and rounding differences never
    // glitch at boundaries. Bitstream copy is not a compose-aware join.
    let merged = "merged.mp4";
    let fps = FRAME_RATE.to_string();
    let status = Command::new("ffmpeg")
        .current_dir(assets_dir)
        .args([
            "-y", "-f", "concat", "-safe", "0", "-i", "files.txt", "-c:v", "libx264", "-c:a",
            "aac", "-r", fps.as_str(), merged,
        ])
        .status()?;
    if !status.success() {
        return Err(PipelineError::Render(
            "ffmpeg failed to concatenate scene units".to_string(),
        ));
    }

    if let Some(parent) = Path::new(out_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let merged_path = format!("{}/{}", assets_dir, merged);

    // The cap is checked against the measured duration of the merged file,
    // not the sum of narration lengths: each unit is frame-quantized at
    // encode time and the concat re-encodes audio, so the nominal sum can
    // undershoot what ffmpeg actually wrote.
    let nominal: f64 = units.iter().map(|u| u.duration).sum();
    let total = effective_total(probe::probe_video(&merged_path)?.duration, nominal);

    if needs_cap(total) {
        warn!(
            "Total duration {:.2}s exceeds {:.0}s cap. Trimming.",
            total, MAX_DURATION_SECS
        );
        let cap = format!("{}", MAX_DURATION_SECS);
        let status = Command::new("ffmpeg")
            .args([
                "-y",
                "-i",
                merged_path.as_str(),
                "-t",
                cap.as_str(),
                "-c:v",
                "libx264",
                "-c:a",
                "aac",
                out_path,
            ])
            .status()?;
        if !status.success() {
            return Err(PipelineError::Render(
                "ffmpeg failed to trim final artifact".to_string(),
            ));
        }
        fs::remove_file(&merged_path).ok();
    } else {
        // Under the cap the merged file already is the artifact; no second
        // encode pass, so the duration stays exactly the pre-cap total.
        if fs::rename(&merged_path, out_path).is_err() {
            fs::copy(&merged_path, out_path)?;
            fs::remove_file(&merged_path).ok();
        }
    }

    info!("Final artifact written to {}", out_path);
    Ok(out_path.to_string())
}

/// Concat demuxer entries, one per unit, in the order given. Units arrive
/// already in script order; any scenes dropped upstream simply do not
/// appear, so survivors keep their original relative order.
fn concat_list_lines(units: &[SceneUnit]) -> Result<Vec<String>> {
    units
        .iter()
        .map(|unit| {
            let fname = Path::new(&unit.path)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| PipelineError::Render(format!("bad unit path {}", unit.path)))?;
            Ok(format!("file '{}'", fname))
        })
        .collect()
}

/// Measured container duration when ffprobe reports one, else the nominal
/// sum of unit narration lengths.
fn effective_total(measured: f64, nominal: f64) -> f64 {
    if measured > 0.0 { measured } else { nominal }
}

fn needs_cap(total_secs: f64) -> bool {
    total_secs > MAX_DURATION_SECS
}
