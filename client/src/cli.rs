use clap::Parser;

use crate::share::DEFAULT_LINK;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Draw lotto and pension lottery numbers from a generator service")]
pub struct Cli {
    #[arg(long, help = "Generator API base URL", default_value_t = String::from("http://127.0.0.1:5000/api"))]
    pub api_base: String,
    #[arg(long, help = "Give up on a single draw request after this many seconds")]
    pub timeout_secs: Option<u64>,
    #[arg(long, help = "Application key for the share target")]
    pub share_key: Option<String>,
    #[arg(long, help = "Link attached to shared messages", default_value_t = String::from(DEFAULT_LINK))]
    pub share_link: String,
    #[arg(
        long,
        help = "Seconds a status message stays visible",
        default_value_t = 5
    )]
    pub status_secs: u64,
    #[arg(long, help = "Verbose output", default_value_t = false)]
    pub verbose: bool,
}
