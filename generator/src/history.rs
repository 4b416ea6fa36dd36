//! Past winning draws for the recommendation strategy.
//!
//! Draws come from a [`HistorySource`]: a local JSON file, or the official
//! lottery site queried one draw at a time. [`HistoryCache`] keeps the last
//! load and its analysis until they expire.

use std::{fmt, io, path::PathBuf, time::Duration};

use async_trait::async_trait;
use log::{debug, info, warn};
use memchr::memmem;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};

use crate::analysis::{analyze, Analysis};

pub const OFFICIAL_SITE: &str = "https://www.dhlottery.co.kr";
pub const DEFAULT_DRAWS: usize = 200;

// An empty or failed load is retried after this long, or after the expiry if
// that is shorter.
pub const RETRY_AFTER: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PACE: Duration = Duration::from_millis(50);
const SPARE_DRAWS: usize = 10;
const LATEST_MARKER: &[u8] = b"id=\"lottoDrwNo\"";

/// One past official draw, in the shape the history file stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastDraw {
    #[serde(rename = "drwNo")]
    pub draw_no: u32,
    #[serde(rename = "drwNoDate", default)]
    pub draw_date: String,
    pub winning_numbers: Vec<u8>,
    #[serde(default)]
    pub bonus_number: Option<u8>,
}

#[derive(Debug)]
pub enum HistoryError {
    Io(io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    NoLatestDraw,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Io(e) => write!(f, "reading history: {e}"),
            HistoryError::Json(e) => write!(f, "parsing history: {e}"),
            HistoryError::Http(e) => write!(f, "fetching history: {e}"),
            HistoryError::NoLatestDraw => f.write_str("latest draw number not found"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<io::Error> for HistoryError {
    fn from(e: io::Error) -> Self {
        HistoryError::Io(e)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        HistoryError::Json(e)
    }
}

impl From<reqwest::Error> for HistoryError {
    fn from(e: reqwest::Error) -> Self {
        HistoryError::Http(e)
    }
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn load(&self) -> Result<Vec<PastDraw>, HistoryError>;

    // Shown in logs.
    fn origin(&self) -> &str;
}

pub struct FileHistory {
    path: PathBuf,
    origin: String,
}

impl FileHistory {
    pub fn new(path: PathBuf) -> Self {
        let origin = path.display().to_string();
        Self { path, origin }
    }
}

#[async_trait]
impl HistorySource for FileHistory {
    async fn load(&self) -> Result<Vec<PastDraw>, HistoryError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

// Answer of `common.do?method=getLottoNumber`. A missing draw comes back as
// `{"returnValue":"fail"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawResult {
    return_value: String,
    #[serde(default)]
    drw_no_date: String,
    drwt_no1: Option<u8>,
    drwt_no2: Option<u8>,
    drwt_no3: Option<u8>,
    drwt_no4: Option<u8>,
    drwt_no5: Option<u8>,
    drwt_no6: Option<u8>,
    bnus_no: Option<u8>,
}

impl DrawResult {
    fn into_past_draw(self, draw_no: u32) -> Option<PastDraw> {
        if self.return_value == "fail" {
            return None;
        }
        let mut numbers = [
            self.drwt_no1?,
            self.drwt_no2?,
            self.drwt_no3?,
            self.drwt_no4?,
            self.drwt_no5?,
            self.drwt_no6?,
        ];
        numbers.sort_unstable();
        Some(PastDraw {
            draw_no,
            draw_date: self.drw_no_date,
            winning_numbers: numbers.to_vec(),
            bonus_number: self.bnus_no,
        })
    }
}

/// Number inside the `id="lottoDrwNo"` element of the site's main page.
pub fn latest_draw_no(page: &[u8]) -> Option<u32> {
    let at = memmem::find(page, LATEST_MARKER)? + LATEST_MARKER.len();
    let rest = &page[at..];
    let text = &rest[memchr::memchr(b'>', rest)? + 1..];
    let text = &text[..memchr::memchr(b'<', text)?];
    std::str::from_utf8(text).ok()?.trim().parse().ok()
}

/// The newest `draws` draws, fetched from the official site one by one.
///
/// Draws the site reports as missing are skipped; up to ten extra draws are
/// tried to make up for them.
pub struct RemoteHistory {
    client: reqwest::Client,
    base_url: String,
    draws: usize,
    pace: Duration,
}

impl RemoteHistory {
    pub fn new(base_url: &str, draws: usize) -> Result<Self, HistoryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            draws,
            pace: PACE,
        })
    }

    /// Pause between two draw requests.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    async fn latest(&self) -> Result<u32, HistoryError> {
        let page = self
            .client
            .get(format!("{}/common.do?method=main", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        latest_draw_no(&page).ok_or(HistoryError::NoLatestDraw)
    }

    async fn fetch_draw(&self, draw_no: u32) -> Result<DrawResult, reqwest::Error> {
        self.client
            .get(format!(
                "{}/common.do?method=getLottoNumber&drwNo={}",
                self.base_url, draw_no
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn draw(&self, draw_no: u32) -> Option<PastDraw> {
        match self.fetch_draw(draw_no).await {
            Ok(result) => result.into_past_draw(draw_no),
            Err(e) => {
                debug!("Draw {}: {}", draw_no, e);
                None
            }
        }
    }
}

#[async_trait]
impl HistorySource for RemoteHistory {
    async fn load(&self) -> Result<Vec<PastDraw>, HistoryError> {
        let latest = self.latest().await?;
        let span = u32::try_from(self.draws + SPARE_DRAWS).unwrap_or(u32::MAX);
        let oldest = latest.saturating_sub(span);

        let mut draws = Vec::new();
        for draw_no in (oldest + 1..=latest).rev() {
            if draws.len() >= self.draws {
                break;
            }
            if !self.pace.is_zero() {
                sleep(self.pace).await;
            }
            match self.draw(draw_no).await {
                Some(draw) => draws.push(draw),
                None => debug!("Draw {} unavailable, skipping", draw_no),
            }
        }
        Ok(draws)
    }

    fn origin(&self) -> &str {
        &self.base_url
    }
}

/// Past draws and their analysis, loaded again once older than `expiry`.
pub struct HistoryCache {
    source: Box<dyn HistorySource>,
    expiry: Duration,
    loaded_at: Option<Instant>,
    draws: Vec<PastDraw>,
    analysis: Option<Analysis>,
}

impl HistoryCache {
    pub fn new(source: impl HistorySource + 'static, expiry: Duration) -> Self {
        Self {
            source: Box::new(source),
            expiry,
            loaded_at: None,
            draws: Vec::new(),
            analysis: None,
        }
    }

    pub async fn analysis(&mut self) -> Option<&Analysis> {
        self.refresh(Instant::now()).await;
        self.analysis.as_ref()
    }

    pub fn draws(&self) -> &[PastDraw] {
        &self.draws
    }

    fn is_fresh(&self, now: Instant) -> bool {
        let ttl = if self.draws.is_empty() {
            self.expiry.min(RETRY_AFTER)
        } else {
            self.expiry
        };
        self.loaded_at
            .is_some_and(|at| now.saturating_duration_since(at) <= ttl)
    }

    async fn refresh(&mut self, now: Instant) {
        if self.is_fresh(now) {
            return;
        }

        self.draws = match self.source.load().await {
            Ok(draws) => {
                info!("Loaded {} past draws from {}", draws.len(), self.source.origin());
                draws
            }
            Err(e) => {
                warn!("{}: {}", self.source.origin(), e);
                Vec::new()
            }
        };
        self.analysis = analyze(&self.draws);
        self.loaded_at = Some(now);
    }
}
