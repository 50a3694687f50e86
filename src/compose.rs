use crate::error::{PipelineError, Result};
use crate::probe;
use crate::scene::{NarratedScene, SceneUnit};
use crate::subtitle;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;
pub const FADE_IN_SECS: f64 = 0.2;
pub const FRAME_RATE: u32 = 24;

/// Large bold white words with a dark outline, centered mid-screen.
/// Alignment uses the ASS numpad scheme, where 5 is middle-center.
const CAPTION_STYLE: &str =
    "Alignment=5,Fontsize=24,Bold=1,PrimaryColour=&HFFFFFF&,OutlineColour=&H000000&,Outline=3,Shadow=0";

/// Fits the footage to the narration, normalizes geometry to 1080x1920,
/// burns word captions and applies the fade-in, producing one renderable
/// unit. Failure at any step drops the scene at the caller's boundary.
pub fn compose(scene: &NarratedScene, assets_dir: &str) -> Result<SceneUnit> {
    info!("Scene {}: compositing", scene.index + 1);

    if !Path::new(&scene.asset_path).exists() {
        return Err(PipelineError::Compose(format!(
            "missing asset file {}",
            scene.asset_path
        )));
    }

    let info = probe::probe_video(&scene.asset_path)
        .map_err(|e| PipelineError::Compose(e.to_string()))?;

    let captions = subtitle::word_captions(&scene.script.text, scene.audio_duration);
    let srt_path = format!("{}/captions_{}.srt", assets_dir, scene.index);
    subtitle::write_srt(&srt_path, &captions)
        .map_err(|e| PipelineError::Compose(e.to_string()))?;

    let filter = scene_filter(info.width, info.height, &srt_path);
    debug!("Scene {} filter chain: {}", scene.index + 1, filter);

    let unit_path = format!("{}/unit_{:03}.mp4", assets_dir, scene.index);
    let duration = format!("{:.3}", scene.audio_duration);

    let mut args: Vec<String> = vec!["-y".into()];
    // Loop the source when it is shorter than the narration; the output -t
    // trims to the audio span in every case.
    if info.duration < scene.audio_duration {
        args.push("-stream_loop".into());
        args.push("-1".into());
    }
    args.extend([
        "-i".into(),
        scene.asset_path.clone(),
        "-i".into(),
        scene.audio_path.clone(),
        "-vf".into(),
        filter,
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
        "-r".into(),
        FRAME_RATE.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-t".into(),
        duration,
        unit_path.clone(),
    ]);

    let status = Command::new("ffmpeg")
        .args(&args)
        .status()
        .map_err(|e| PipelineError::Compose(e.to_string()))?;
    if !status.success() {
        return Err(PipelineError::Compose(format!(
            "ffmpeg failed for scene {}",
            scene.index + 1
        )));
    }

    Ok(SceneUnit {
        index: scene.index,
        path: unit_path,
        duration: scene.audio_duration,
    })
}

/// Crop box bringing arbitrary footage to a 9:16 frame: `(w, h, x, y)`.
/// Too-wide sources lose width from both sides, too-tall ones lose height
/// top and bottom; an already-9:16 source needs no crop. Runs before any
/// resize because it reasons about relative dimensions only.
fn crop_to_portrait(width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    // width/height vs 9/16, compared in integers
    if width * 16 > height * 9 {
        let crop_w = height * 9 / 16;
        Some((crop_w, height, (width - crop_w) / 2, 0))
    } else if width * 16 < height * 9 {
        let crop_h = width * 16 / 9;
        Some((width, crop_h, 0, (height - crop_h) / 2))
    } else {
        None
    }
}

/// Width after scaling by height to 1920, rounded to an even pixel count.
fn height_scaled_width(width: u32, height: u32) -> u32 {
    let exact = width as f64 * TARGET_HEIGHT as f64 / height as f64;
    ((exact / 2.0).round() as u32) * 2
}

/// Builds the per-scene filter chain: crop to 9:16, scale by height to 1920,
/// width-normalize to 1080 if integer rounding left it off target, then burn
/// captions and fade in. The two-step scale guarantees an exact 1080x1920
/// canvas for every source.
pub fn scene_filter(width: u32, height: u32, srt_path: &str) -> String {
    let mut stages = Vec::new();

    let (w, h) = match crop_to_portrait(width, height) {
        Some((cw, ch, x, y)) => {
            stages.push(format!("crop={}:{}:{}:{}", cw, ch, x, y));
            (cw, ch)
        }
        None => (width, height),
    };

    let scaled_w = height_scaled_width(w, h);
    stages.push(format!("scale={}:{}", scaled_w, TARGET_HEIGHT));
    if scaled_w != TARGET_WIDTH {
        stages.push(format!("scale={}:{}", TARGET_WIDTH, TARGET_HEIGHT));
    }

    stages.push(format!(
        "subtitles={}:force_style='{}'",
        srt_path, CAPTION_STYLE
    ));
    stages.push(format!("fade=t=in:st=0:d={}", FADE_IN_SECS));

    stages.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_source_is_cropped_horizontally() {
        let (w, h, x, y) = crop_to_portrait(1920, 1080).unwrap();
        assert_eq!((w, h), (607, 1080)); // 1080 * 9 / 16
        assert_eq!(y, 0);
        assert_eq!(x, (1920 - 607) / 2);
    }

    #[test]
    fn overly_tall_source_is_cropped_vertically() {
        let (w, h, x, y) = crop_to_portrait(1080, 2400).unwrap();
        assert_eq!((w, h), (1080, 1920)); // 1080 * 16 / 9
        assert_eq!(x, 0);
        assert_eq!(y, 240);
    }

    #[test]
    fn exact_portrait_needs_no_crop() {
        assert!(crop_to_portrait(1080, 1920).is_none());
        assert!(crop_to_portrait(720, 1280).is_none());
    }

    #[test]
    fn filter_always_lands_on_target_canvas() {
        // crop rounding can leave the height-scaled width a pixel or two off
        // 1080; the chain must then end on an explicit 1080x1920 scale.
        for (w, h) in [
            (1920u32, 1080u32),
            (3840, 2160),
            (1080, 1920),
            (720, 1280),
            (1900, 1070),
            (1080, 2400),
            (1366, 768),
            (901, 1603),
        ] {
            let filter = scene_filter(w, h, "assets/captions_0.srt");
            let last_scale = filter
                .split(',')
                .filter(|s| s.starts_with("scale="))
                .last()
                .unwrap()
                .to_string();
            assert_eq!(last_scale, "scale=1080:1920", "source {}x{}", w, h);
        }
    }

    #[test]
    fn already_exact_source_scales_once() {
        // 1080x1920 scales by height straight onto the canvas
        let filter = scene_filter(1080, 1920, "assets/captions_0.srt");
        assert_eq!(filter.matches("scale=").count(), 1);
    }

    #[test]
    fn off_by_rounding_source_gets_second_scale() {
        // 1900x1070 crops to 601x1070; scaling that by height lands on 1078,
        // so the width-normalizing pass must follow.
        assert_eq!(crop_to_portrait(1900, 1070).unwrap().0, 601);
        assert_eq!(height_scaled_width(601, 1070), 1078);
        let filter = scene_filter(1900, 1070, "assets/captions_0.srt");
        assert_eq!(filter.matches("scale=").count(), 2);
        assert!(filter.contains("scale=1078:1920,scale=1080:1920"));
    }

    #[test]
    fn captions_burn_before_fade() {
        let filter = scene_filter(1080, 1920, "assets/captions_3.srt");
        let subs = filter.find("subtitles=").unwrap();
        let fade = filter.find("fade=t=in").unwrap();
        assert!(subs < fade);
    }

    #[test]
    fn caption_style_centers_with_numpad_alignment() {
        // libass reads force_style alignment as ASS numpad: middle-center
        // is 5, not the legacy SSA midtitle encoding
        let filter = scene_filter(1080, 1920, "assets/captions_0.srt");
        assert!(filter.contains("Alignment=5,"));
        assert!(!filter.contains("Alignment=10"));
    }

    #[test]
    fn missing_asset_is_a_scene_local_compose_failure() {
        let scene = NarratedScene {
            index: 0,
            script: crate::scene::ScriptScene {
                text: "hello world".to_string(),
                visual_query: "abstract".to_string(),
            },
            asset_path: "assets/definitely_not_here.mp4".to_string(),
            audio_path: "assets/voice_0.wav".to_string(),
            audio_duration: 2.0,
        };
        let err = compose(&scene, "assets").unwrap_err();
        assert!(matches!(err, PipelineError::Compose(_)));
    }
}
