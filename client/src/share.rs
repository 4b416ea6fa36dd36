use std::{fmt, io, io::Write};

use log::{debug, info};
use serde::Serialize;

use crate::aggregator::DrawBatch;
use crate::error::ValidationError;

pub const DEFAULT_LINK: &str = "https://ruseper.github.io/lotto-helper/";
pub const BUTTON_TITLE: &str = "웹사이트에서 더 보기";

const HEADER: &str = "💖 오늘의 추천 행운 번호! 💖";
const FOOTER: &str = "오늘의 행운을 잡으세요! 😉";

#[derive(Debug)]
pub enum ShareError {
    NotInitialized,
    InvalidKey,
    Validation(ValidationError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ShareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareError::NotInitialized => {
                f.write_str("공유 SDK 초기화가 안 되어있어요. 앱 키를 확인해주세요! 😭")
            }
            ShareError::InvalidKey => f.write_str("공유 SDK 앱 키가 비어 있어요. 😭"),
            ShareError::Validation(e) => fmt::Display::fmt(e, f),
            ShareError::Io(e) => write!(f, "공유 중 오류가 발생했어요: {e} 🥺"),
            ShareError::Json(e) => write!(f, "공유 메시지를 만들지 못했어요: {e} 🥺"),
        }
    }
}

impl std::error::Error for ShareError {}

impl From<ValidationError> for ShareError {
    fn from(e: ValidationError) -> Self {
        ShareError::Validation(e)
    }
}

impl From<io::Error> for ShareError {
    fn from(e: io::Error) -> Self {
        ShareError::Io(e)
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(e: serde_json::Error) -> Self {
        ShareError::Json(e)
    }
}

/// Where a shared message goes.
pub trait ShareTarget {
    fn send(&mut self, text: &str, link: &str) -> Result<(), ShareError>;
}

fn push_section(text: &mut String, title: &str, batch: &DrawBatch) {
    if batch.is_empty() {
        return;
    }
    text.push('\n');
    text.push_str(&format!("{} (총 {}개):\n", title, batch.len()));
    for (i, draw) in batch.draws().iter().enumerate() {
        text.push_str(&format!("  {}세트: {}\n", i + 1, draw));
    }
}

/// Message listing both batches, lotto first.
pub fn share_text(lotto: &DrawBatch, pension: &DrawBatch) -> Result<String, ValidationError> {
    if lotto.is_empty() && pension.is_empty() {
        return Err(ValidationError::NothingToSend);
    }

    let mut text = String::with_capacity(256);
    text.push_str(HEADER);
    text.push('\n');
    push_section(&mut text, "🍀 로또 번호", lotto);
    push_section(&mut text, "💰 연금복권 번호", pension);
    text.push('\n');
    text.push_str(FOOTER);
    Ok(text)
}

pub fn share<T: ShareTarget + ?Sized>(
    target: &mut T,
    lotto: &DrawBatch,
    pension: &DrawBatch,
    link: &str,
) -> Result<(), ShareError> {
    let text = share_text(lotto, pension)?;
    target.send(&text, link)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Link<'a> {
    mobile_web_url: &'a str,
    web_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextTemplate<'a> {
    object_type: &'static str,
    text: String,
    link: Link<'a>,
    button_title: &'a str,
}

/// Text-template share target in the style of a messenger SDK.
///
/// Needs an application key before it sends anything; each sent message is
/// written as one line of JSON.
pub struct TemplateShare<W> {
    app_key: Option<String>,
    out: W,
}

impl<W: Write> TemplateShare<W> {
    pub fn new(out: W) -> Self {
        Self { app_key: None, out }
    }

    pub fn init(&mut self, app_key: &str) -> Result<(), ShareError> {
        let app_key = app_key.trim();
        if app_key.is_empty() {
            return Err(ShareError::InvalidKey);
        }
        self.app_key = Some(app_key.to_string());
        info!("Share target initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.app_key.is_some()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> ShareTarget for TemplateShare<W> {
    fn send(&mut self, text: &str, link: &str) -> Result<(), ShareError> {
        if !self.is_initialized() {
            return Err(ShareError::NotInitialized);
        }

        let template = TextTemplate {
            object_type: "text",
            text: format!("{text}\n\n👉 전체 번호 보기: {link}"),
            link: Link {
                mobile_web_url: link,
                web_url: link,
            },
            button_title: BUTTON_TITLE,
        };
        serde_json::to_writer(&mut self.out, &template)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        debug!("Shared {} bytes of text", template.text.len());
        Ok(())
    }
}
