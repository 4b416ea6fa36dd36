use std::{fmt, io};

use generator::http::HttpError;
use generator::DrawError;

/// The service could not be reached or answered with something unusable.
#[derive(Debug)]
pub enum TransportError {
    Io(io::Error),
    Timeout,
    BadUrl(String),
    Status(u16),
    Http(HttpError),
    Json(serde_json::Error),
    Payload(DrawError),
    Shape(&'static str),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "i/o error: {e}"),
            TransportError::Timeout => f.write_str("request timed out"),
            TransportError::BadUrl(url) => write!(f, "unsupported url {url:?}"),
            TransportError::Status(status) => write!(f, "unexpected status {status}"),
            TransportError::Http(e) => fmt::Display::fmt(e, f),
            TransportError::Json(e) => write!(f, "malformed body: {e}"),
            TransportError::Payload(e) => write!(f, "invalid numbers: {e}"),
            TransportError::Shape(what) => write!(f, "unexpected payload: {what}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<HttpError> for TransportError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Io(e) => TransportError::Io(e),
            other => TransportError::Http(other),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Json(e)
    }
}

impl From<DrawError> for TransportError {
    fn from(e: DrawError) -> Self {
        TransportError::Payload(e)
    }
}

/// Why a single draw request produced nothing.
#[derive(Debug)]
pub enum FetchError {
    Transport(TransportError),
    /// The service answered `success: false` with this message.
    Application(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => fmt::Display::fmt(e, f),
            FetchError::Application(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        FetchError::Transport(e)
    }
}

impl From<DrawError> for FetchError {
    fn from(e: DrawError) -> Self {
        FetchError::Transport(e.into())
    }
}

/// Local input rejected before anything is sent. Displays as the message
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyPhone,
    InvalidPhone,
    NothingToSend,
    NotUtf8,
    BadArgument(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyPhone => f.write_str("휴대폰 번호를 입력해주세요! 🚨"),
            ValidationError::InvalidPhone => {
                f.write_str("유효한 휴대폰 번호를 입력해주세요! (숫자 10-11자리) 🚫")
            }
            ValidationError::NothingToSend => {
                f.write_str("생성된 번호가 없어요! 먼저 번호를 뽑아주세요! 🙏")
            }
            ValidationError::NotUtf8 => f.write_str("입력을 읽을 수 없어요. 다시 입력해주세요! 🙏"),
            ValidationError::BadArgument(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ValidationError {}
