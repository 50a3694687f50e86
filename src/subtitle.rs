use std::fs::File;
use std::io::Write;

/// One word on screen, `[start, end)` in seconds relative to its scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Splits the narration into per-word captions over even time slots of
/// `audio_duration / word_count`. Words are uppercased for display. If
/// float accumulation pushes a start time to or past the audio end, no
/// further captions are emitted; the last emitted caption is clamped so it
/// never extends past the audio.
pub fn word_captions(text: &str, audio_duration: f64) -> Vec<Caption> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || audio_duration <= 0.0 {
        return Vec::new();
    }

    let slot = audio_duration / words.len() as f64;
    let mut captions = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let start = i as f64 * slot;
        if start >= audio_duration {
            break;
        }
        let end = ((i + 1) as f64 * slot).min(audio_duration);
        captions.push(Caption {
            word: word.to_uppercase(),
            start,
            end,
        });
    }
    captions
}

pub fn write_srt(path: &str, captions: &[Caption]) -> anyhow::Result<()> {
    let mut f = File::create(path)?;
    for (i, c) in captions.iter().enumerate() {
        writeln!(f, "{}", i + 1)?;
        writeln!(f, "{} --> {}", format_srt_time(c.start), format_srt_time(c.end))?;
        writeln!(f, "{}", c.word)?;
        writeln!(f)?;
    }
    Ok(())
}

fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
