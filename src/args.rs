use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera index (default 0, overrides config)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Initial tracking pipeline (cube, tape, none)
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Encode a JPEG preview of every captured frame onto the feed channel
    #[arg(long, default_value_t = false)]
    pub feed: bool,

    /// Per-frame position trace on stdout
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}
