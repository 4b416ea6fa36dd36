//! SMS delivery is not available. `send_sms` runs the same checks a real
//! sender would, builds the payload, and then reports that sending is not
//! implemented.

use std::fmt;

use generator::Draw;
use log::debug;
use serde::Serialize;

use crate::aggregator::DrawBatch;
use crate::error::ValidationError;

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsError {
    Validation(ValidationError),
    NotImplemented { phone: String },
}

impl fmt::Display for SmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsError::Validation(e) => fmt::Display::fmt(e, f),
            SmsError::NotImplemented { phone } => write!(
                f,
                "{phone} (으)로 번호를 보내는 기능은 아직 준비 중이에요. (실제 발송은 백엔드 연동 후 가능)"
            ),
        }
    }
}

impl std::error::Error for SmsError {}

impl From<ValidationError> for SmsError {
    fn from(e: ValidationError) -> Self {
        SmsError::Validation(e)
    }
}

/// Trimmed phone number made of 10 or 11 ASCII digits.
pub fn validate_phone(input: &str) -> Result<&str, ValidationError> {
    let phone = input.trim();
    if phone.is_empty() {
        return Err(ValidationError::EmptyPhone);
    }
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&phone.len())
        || !phone.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(phone)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest {
    pub phone_number: String,
    pub lotto_sets: Vec<Vec<String>>,
    pub pension_sets: Vec<Vec<String>>,
}

fn as_rows(batch: &DrawBatch) -> Vec<Vec<String>> {
    batch
        .draws()
        .iter()
        .map(|draw| match draw {
            Draw::Lotto(set) => set.numbers().iter().map(u8::to_string).collect(),
            Draw::Pension(code) => vec![code.to_string()],
        })
        .collect()
}

impl SmsRequest {
    pub fn new(phone: &str, lotto: &DrawBatch, pension: &DrawBatch) -> Self {
        Self {
            phone_number: phone.to_string(),
            lotto_sets: as_rows(lotto),
            pension_sets: as_rows(pension),
        }
    }
}

/// Never succeeds: ends in `NotImplemented` once the input is valid.
pub fn send_sms(phone: &str, lotto: &DrawBatch, pension: &DrawBatch) -> Result<(), SmsError> {
    if lotto.is_empty() && pension.is_empty() {
        return Err(ValidationError::NothingToSend.into());
    }
    let phone = validate_phone(phone)?;

    let request = SmsRequest::new(phone, lotto, pension);
    match serde_json::to_string(&request) {
        Ok(payload) => debug!("SMS payload: {}", payload),
        Err(e) => debug!("SMS payload not encodable: {}", e),
    }

    Err(SmsError::NotImplemented {
        phone: phone.to_string(),
    })
}
