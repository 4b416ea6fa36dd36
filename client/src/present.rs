use generator::{Draw, DrawKind};

use crate::aggregator::DrawBatch;
use crate::error::FetchError;

pub const LOTTO_PLACEHOLDER: &str = "로또 번호 뽑기! 버튼을 클릭하세요";
pub const PENSION_PLACEHOLDER: &str = "연금복권 번호 뽑기! 버튼을 클릭하세요";

pub fn placeholder(kind: DrawKind) -> &'static str {
    match kind {
        DrawKind::Lotto => LOTTO_PLACEHOLDER,
        DrawKind::Pension => PENSION_PLACEHOLDER,
    }
}

fn spaced(draw: &Draw) -> String {
    match draw {
        Draw::Lotto(set) => set
            .numbers()
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        Draw::Pension(code) => code.to_string(),
    }
}

/// Numbered list of the sets in a batch, or the placeholder when it is empty.
pub fn render_batch(batch: &DrawBatch) -> Vec<String> {
    if batch.is_empty() {
        return vec![placeholder(batch.kind()).to_string()];
    }

    let mut lines: Vec<String> = batch
        .draws()
        .iter()
        .enumerate()
        .map(|(i, draw)| format!("{}번째 세트: {}", i + 1, spaced(draw)))
        .collect();
    if batch.is_partial() {
        lines.push(format!(
            "({}세트 중 {}세트만 생성되었어요)",
            batch.requested(),
            batch.len()
        ));
    }
    lines
}

pub fn fetching(kind: DrawKind) -> String {
    format!("{} 번호를 가져오는 중... 잠시만 기다려주세요! ⏳", kind.label())
}

pub fn failure_message(kind: DrawKind, error: &FetchError) -> String {
    match error {
        FetchError::Application(message) => {
            format!("{} 번호 가져오기 실패: {} 😭", kind.label(), message)
        }
        FetchError::Transport(_) => format!(
            "{} 번호 서버 호출 중 오류 발생. 서버가 실행 중인지 확인해주세요! 🚨",
            kind.label()
        ),
    }
}

/// Status after a batch finished, and whether it reads as an error.
pub fn outcome(batch: &DrawBatch) -> (String, bool) {
    let kind = batch.kind();
    if batch.is_empty() {
        return (
            format!("{} 번호 생성을 완료하지 못했습니다. 😥", kind.label()),
            true,
        );
    }

    let cheer = match kind {
        DrawKind::Lotto => "행운을 빌어요! 😄",
        DrawKind::Pension => "부자되세요~! 💰",
    };
    (
        format!(
            "{} 번호 {}세트가 생성되었어요! {}",
            kind.label(),
            batch.len(),
            cheer
        ),
        false,
    )
}
