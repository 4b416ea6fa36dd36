use std::{io, time::Duration};

use clap::Parser;
use client::cli::Cli;
use client::session::{Session, GREETING, HELP};
use client::share::TemplateShare;
use client::status::StatusLine;
use client::{Endpoint, HttpDrawSource};
use futures::StreamExt;
use log::warn;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let endpoint: Endpoint = cli.api_base.parse()?;
    let source = HttpDrawSource::new(endpoint, cli.timeout_secs.map(Duration::from_secs));

    let mut share_target = TemplateShare::new(io::stdout());
    match &cli.share_key {
        Some(key) => {
            if let Err(e) = share_target.init(key) {
                warn!("{}", e);
            }
        }
        None => warn!("No --share-key given, sharing is disabled"),
    }

    let status = StatusLine::new(Duration::from_secs(cli.status_secs));
    let mut session = Session::new(source, share_target, cli.share_link, status.clone());

    println!("{}", GREETING);
    for line in HELP {
        println!("  {}", line);
    }

    // Lines as bytes; the session reports the ones that are not UTF-8.
    let mut lines = FramedRead::new(
        tokio::io::stdin(),
        AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec()),
    );
    while let Some(line) = lines.next().await {
        let reply = session.handle_bytes(&line?).await;
        for line in &reply.lines {
            println!("{}", line);
        }
        if let Some(status) = status.current() {
            let tag = if status.is_error { "오류" } else { "상태" };
            println!("[{}] {}", tag, status.text);
        }
        if reply.quit {
            break;
        }
    }

    Ok(())
}
