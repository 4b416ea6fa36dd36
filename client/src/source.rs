use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use generator::http::{parse_response, write_request};
use generator::protocol::Envelope;
use generator::{Draw, DrawKind, LottoSet, PensionCode};
use log::debug;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{FetchError, TransportError};

const UNKNOWN_FAILURE: &str = "알 수 없는 오류";

/// Something that produces one draw per call.
#[async_trait]
pub trait DrawSource: Send + Sync {
    async fn fetch(&self, kind: DrawKind) -> Result<Draw, FetchError>;
}

/// Plain `http://host[:port]/base` location of the generator API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    addr: String,
    base_path: String,
}

impl Endpoint {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_for(&self, kind: DrawKind) -> String {
        format!("{}/{}", self.base_path, kind.endpoint())
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let bad_url = || TransportError::BadUrl(url.to_string());

        let rest = url.strip_prefix("http://").ok_or_else(bad_url)?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if authority.is_empty() || authority.contains('@') {
            return Err(bad_url());
        }

        let addr = match authority.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                authority.to_string()
            }
            Some(_) => return Err(bad_url()),
            None => format!("{authority}:80"),
        };

        Ok(Self {
            host: authority.to_string(),
            addr,
            base_path: path.trim_end_matches('/').to_string(),
        })
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// `success: false` is an application failure whatever the status; otherwise
/// a non-2xx status or an unreadable body is a transport failure.
fn read_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Envelope<T>, FetchError> {
    match serde_json::from_slice::<Envelope<T>>(body) {
        Ok(envelope) if !envelope.success => Err(FetchError::Application(
            envelope
                .message
                .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
        )),
        Ok(envelope) if is_success(status) => Ok(envelope),
        Ok(_) => Err(TransportError::Status(status).into()),
        Err(_) if !is_success(status) => Err(TransportError::Status(status).into()),
        Err(e) => Err(TransportError::Json(e).into()),
    }
}

/// Turns one generator response into a draw of the requested kind.
pub fn decode_draw(kind: DrawKind, status: u16, body: &[u8]) -> Result<Draw, FetchError> {
    match kind {
        DrawKind::Lotto => {
            let envelope: Envelope<u8> = read_envelope(status, body)?;
            Ok(Draw::Lotto(LottoSet::try_from(envelope.numbers)?))
        }
        DrawKind::Pension => {
            let envelope: Envelope<String> = read_envelope(status, body)?;
            let [code]: [String; 1] = envelope
                .numbers
                .try_into()
                .map_err(|_| TransportError::Shape("expected exactly one pension code"))?;
            Ok(Draw::Pension(code.parse::<PensionCode>()?))
        }
    }
}

pub struct HttpDrawSource {
    endpoint: Endpoint,
    timeout: Option<Duration>,
}

impl HttpDrawSource {
    /// No timeout unless one is given; a stalled service then stalls the caller.
    pub fn new(endpoint: Endpoint, timeout: Option<Duration>) -> Self {
        Self { endpoint, timeout }
    }

    async fn get(&self, path: &str) -> Result<(u16, Vec<u8>), TransportError> {
        let mut stream = TcpStream::connect(&self.endpoint.addr).await?;

        let mut request = Vec::with_capacity(128);
        write_request(&mut request, &self.endpoint.host, path);
        stream.write_all(&request).await?;

        let mut raw = Vec::with_capacity(1024);
        stream.read_to_end(&mut raw).await?;

        let (status, body) = parse_response(&raw)?;
        Ok((status, body.to_vec()))
    }

    async fn fetch_once(&self, kind: DrawKind) -> Result<Draw, FetchError> {
        let path = self.endpoint.path_for(kind);
        debug!("GET {}{}", self.endpoint.host, path);
        let (status, body) = self.get(&path).await?;
        decode_draw(kind, status, &body)
    }
}

#[async_trait]
impl DrawSource for HttpDrawSource {
    async fn fetch(&self, kind: DrawKind) -> Result<Draw, FetchError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_once(kind))
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => self.fetch_once(kind).await,
        }
    }
}
