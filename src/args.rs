use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "trendshorts", about = "Generates a narrated vertical short from a trending topic")]
pub struct Args {
    /// Topic override; skips trend discovery when set
    #[clap(long)]
    pub topic: Option<String>,

    #[clap(long, default_value = "US")]
    pub region: String,

    #[clap(long, default_value = "output/final_short.mp4")]
    pub out: String,

    #[clap(long, default_value = "assets")]
    pub assets_dir: String,

    #[clap(long, default_value = "en-US-ChristopherNeural")]
    pub voice: String,

    /// Speaking-rate multiplier passed to the TTS provider
    #[clap(long, default_value = "+25%")]
    pub rate: String,

    /// Seed for topic/clip selection; omit for a fresh draw each run
    #[clap(long)]
    pub seed: Option<u64>,

    /// Upload the finished short after rendering
    #[clap(long, default_value_t = false)]
    pub upload: bool,

    /// Upload title; defaults to the resolved topic plus #Shorts
    #[clap(long)]
    pub title: Option<String>,

    #[clap(long, default_value = "#shorts #ai")]
    pub description: String,
}
