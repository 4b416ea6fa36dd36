use log::error;
use serde::{Deserialize, Serialize};

use crate::draw::{LottoSet, PensionCode};

pub const LOTTO_OK: &str = "로또 추천 번호를 생성했습니다.";
pub const LOTTO_FAILED: &str = "로또 번호 생성에 실패했습니다. 잠시 후 다시 시도해주세요.";
pub const PENSION_OK: &str = "연금복권 번호를 생성했습니다.";
pub const NOT_FOUND: &str = "요청한 경로를 찾을 수 없습니다.";
pub const METHOD_NOT_ALLOWED: &str = "허용되지 않은 요청 방식입니다.";
pub const BAD_REQUEST: &str = "잘못된 요청입니다.";

const FALLBACK_BODY: &[u8] = br#"{"success":false}"#;

/// JSON body of every generator response.
///
/// `{"success":true,"numbers":[...],"message":"..."}` on success,
/// `{"success":false,"message":"..."}` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub numbers: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(numbers: Vec<T>, message: &str) -> Self {
        Self {
            success: true,
            numbers,
            message: Some(message.to_string()),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            numbers: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

pub fn lotto_ok(set: LottoSet) -> Envelope<u8> {
    Envelope::ok(set.into(), LOTTO_OK)
}

/// The pension endpoint always answers with exactly one code.
pub fn pension_ok(code: PensionCode) -> Envelope<PensionCode> {
    Envelope::ok(vec![code], PENSION_OK)
}

pub fn write_envelope<T: Serialize>(buf: &mut Vec<u8>, envelope: &Envelope<T>) {
    buf.clear();
    if let Err(e) = serde_json::to_writer(&mut *buf, envelope) {
        error!("Failed to encode response: {}", e);
        buf.clear();
        buf.extend_from_slice(FALLBACK_BODY);
    }
}
