use std::path::PathBuf;

use clap::Parser;

use crate::history::DEFAULT_DRAWS;

#[derive(Parser)]
#[command(name = "generator")]
#[command(about = "Serve random lotto and pension lottery numbers over HTTP")]
pub struct Cli {
    #[arg(long, help = "Address and port to listen on", default_value_t = String::from("0.0.0.0:5000"))]
    pub bind: String,
    #[arg(
        long,
        help = "JSON file of past winning draws (enables recommended lotto draws)",
        conflicts_with = "history_url"
    )]
    pub history: Option<PathBuf>,
    #[arg(
        long,
        help = "Fetch past winning draws from the official lottery site at this URL (e.g. https://www.dhlottery.co.kr)"
    )]
    pub history_url: Option<String>,
    #[arg(
        long,
        help = "Number of recent draws to fetch from the lottery site",
        default_value_t = DEFAULT_DRAWS
    )]
    pub history_draws: usize,
    #[arg(
        long,
        help = "Seconds before past draws are loaded again",
        default_value_t = 3600
    )]
    pub cache_secs: u64,
    #[arg(long, help = "Seed the generator for reproducible draws")]
    pub seed: Option<u64>,
    #[arg(long, help = "Verbose output", default_value_t = false)]
    pub verbose: bool,
}
