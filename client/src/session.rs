use generator::DrawKind;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, space1},
    combinator::{all_consuming, map, map_res, opt, rest, value},
    sequence::{pair, preceded},
    IResult,
};

use crate::aggregator::{collect_batch, DrawBatch};
use crate::error::ValidationError;
use crate::present::{failure_message, fetching, outcome, render_batch};
use crate::share::{share, ShareTarget};
use crate::sms::send_sms;
use crate::source::DrawSource;
use crate::status::StatusLine;

pub const MAX_SETS: usize = 5;

pub const GREETING: &str = "안녕하세요! 행운 번호를 뽑아보세요! 😊";
const SHARED: &str = "공유 메시지를 보냈어요! 친구에게 행운을 나눠주세요! 📱";

pub const HELP: &[&str] = &[
    "lotto [1-5]     로또 번호 뽑기",
    "pension [1-5]   연금복권 번호 뽑기",
    "show            뽑은 번호 보기",
    "share           뽑은 번호 공유하기",
    "sms <번호>      휴대폰으로 보내기 (준비 중)",
    "help            도움말",
    "quit            끝내기",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Draw(DrawKind, usize),
    Show,
    Share,
    Sms(String),
    Help,
    Quit,
}

fn count(input: &str) -> IResult<&str, usize> {
    map(
        opt(preceded(space1, map_res(digit1, str::parse::<usize>))),
        |n| n.unwrap_or(1),
    )(input)
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        map(preceded(tag("lotto"), count), |n| Command::Draw(DrawKind::Lotto, n)),
        map(preceded(tag("pension"), count), |n| {
            Command::Draw(DrawKind::Pension, n)
        }),
        value(Command::Show, tag("show")),
        value(Command::Share, tag("share")),
        map(preceded(pair(tag("sms"), space1), rest), |phone: &str| {
            Command::Sms(phone.to_string())
        }),
        value(Command::Sms(String::new()), tag("sms")),
        value(Command::Help, tag("help")),
        value(Command::Quit, alt((tag("quit"), tag("exit")))),
    ))(input)
}

pub fn parse_command(line: &str) -> Result<Command, ValidationError> {
    let line = line.trim();
    all_consuming(command)(line)
        .map(|(_, command)| command)
        .map_err(|_| ValidationError::BadArgument(format!("알 수 없는 명령이에요: {line:?} (help 참고)")))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self { lines, quit: false }
    }
}

/// Command handlers over the batches drawn so far.
///
/// Each draw command replaces the previous batch of its kind.
pub struct Session<S, T> {
    source: S,
    share_target: T,
    link: String,
    status: StatusLine,
    lotto: DrawBatch,
    pension: DrawBatch,
}

impl<S: DrawSource, T: ShareTarget> Session<S, T> {
    pub fn new(source: S, share_target: T, link: String, status: StatusLine) -> Self {
        Self {
            source,
            share_target,
            link,
            status,
            lotto: DrawBatch::empty(DrawKind::Lotto),
            pension: DrawBatch::empty(DrawKind::Pension),
        }
    }

    pub fn lotto(&self) -> &DrawBatch {
        &self.lotto
    }

    pub fn pension(&self) -> &DrawBatch {
        &self.pension
    }

    pub fn share_target(&self) -> &T {
        &self.share_target
    }

    /// Raw input line; one that is not UTF-8 is reported and skipped.
    pub async fn handle_bytes(&mut self, raw: &[u8]) -> Reply {
        match std::str::from_utf8(raw) {
            Ok(line) => self.handle_line(line).await,
            Err(_) => {
                self.status.show(ValidationError::NotUtf8.to_string(), true);
                Reply::default()
            }
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Reply {
        match parse_command(line) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                self.status.show(e.to_string(), true);
                Reply::default()
            }
        }
    }

    pub async fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::Draw(kind, n) => self.draw(kind, n).await,
            Command::Show => {
                let mut lines = render_batch(&self.lotto);
                lines.extend(render_batch(&self.pension));
                Reply::lines(lines)
            }
            Command::Share => {
                match share(&mut self.share_target, &self.lotto, &self.pension, &self.link) {
                    Ok(()) => self.status.show(SHARED, false),
                    Err(e) => self.status.show(e.to_string(), true),
                }
                Reply::default()
            }
            Command::Sms(phone) => {
                if let Err(e) = send_sms(&phone, &self.lotto, &self.pension) {
                    self.status.show(e.to_string(), true);
                }
                Reply::default()
            }
            Command::Help => Reply::lines(HELP.iter().map(|l| l.to_string()).collect()),
            Command::Quit => Reply {
                lines: Vec::new(),
                quit: true,
            },
        }
    }

    async fn draw(&mut self, kind: DrawKind, n: usize) -> Reply {
        if !(1..=MAX_SETS).contains(&n) {
            let e = ValidationError::BadArgument(format!(
                "세트 수는 1에서 {MAX_SETS} 사이로 골라주세요."
            ));
            self.status.show(e.to_string(), true);
            return Reply::default();
        }

        self.status.show(fetching(kind), false);
        let batch = collect_batch(&self.source, kind, n).await;

        let mut lines = render_batch(&batch);
        if let Some(e) = batch.failure() {
            lines.push(failure_message(kind, e));
        }
        let (message, is_error) = outcome(&batch);
        self.status.show(message, is_error);

        match kind {
            DrawKind::Lotto => self.lotto = batch,
            DrawKind::Pension => self.pension = batch,
        }
        Reply::lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{lotto, pension, ScriptedSource};
    use crate::error::FetchError;
    use crate::present::LOTTO_PLACEHOLDER;
    use crate::share::{ShareError, TemplateShare};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("lotto"), Ok(Command::Draw(DrawKind::Lotto, 1)));
        assert_eq!(parse_command(" lotto 3 "), Ok(Command::Draw(DrawKind::Lotto, 3)));
        assert_eq!(parse_command("pension 5"), Ok(Command::Draw(DrawKind::Pension, 5)));
        assert_eq!(parse_command("share"), Ok(Command::Share));
        assert_eq!(
            parse_command("sms 01012345678"),
            Ok(Command::Sms(String::from("01012345678")))
        );
        assert_eq!(parse_command("sms"), Ok(Command::Sms(String::new())));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert!(parse_command("lottery").is_err());
        assert!(parse_command("lotto x").is_err());
        assert!(parse_command("").is_err());
    }

    fn session(script: Vec<Result<generator::Draw, FetchError>>) -> Session<ScriptedSource, TemplateShare<Vec<u8>>> {
        Session::new(
            ScriptedSource::new(script),
            TemplateShare::new(Vec::new()),
            String::from("https://example.com/"),
            StatusLine::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn draw_replaces_the_batch() {
        let mut session = session(vec![
            Ok(lotto([1, 2, 3, 4, 5, 6])),
            Ok(lotto([7, 8, 9, 10, 11, 12])),
            Ok(lotto([13, 14, 15, 16, 17, 18])),
        ]);

        let reply = session.handle_line("lotto 2").await;
        assert_eq!(reply.lines.len(), 2);
        assert_eq!(session.lotto().len(), 2);

        session.handle_line("lotto 1").await;
        assert_eq!(session.lotto().len(), 1);
        assert_eq!(session.lotto().draws()[0], lotto([13, 14, 15, 16, 17, 18]));

        let status = session.status.current().unwrap();
        assert!(!status.is_error);
        assert!(status.text.contains("1세트"));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_draw_reports_the_failure() {
        let mut session = session(vec![
            Ok(pension("1조 000001")),
            Err(FetchError::Application(String::from("점검 중"))),
        ]);
        let reply = session.handle_line("pension 3").await;
        assert_eq!(
            reply.lines,
            vec![
                String::from("1번째 세트: 1조 000001"),
                String::from("(3세트 중 1세트만 생성되었어요)"),
                String::from("연금복권 번호 가져오기 실패: 점검 중 😭"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_out_of_range_counts() {
        let mut session = session(vec![]);
        session.handle_line("lotto 6").await;
        session.handle_line("lotto 0").await;
        assert_eq!(session.source.calls(), 0);
        assert!(session.status.current().unwrap().is_error);
    }

    #[tokio::test(start_paused = true)]
    async fn share_needs_numbers_and_a_key() {
        let mut session = session(vec![Ok(lotto([1, 2, 3, 4, 5, 6]))]);

        session.handle_line("share").await;
        assert_eq!(
            session.status.current().unwrap().text,
            ValidationError::NothingToSend.to_string()
        );

        session.handle_line("lotto").await;
        session.handle_line("share").await;
        assert_eq!(
            session.status.current().unwrap().text,
            ShareError::NotInitialized.to_string()
        );
        assert!(session.share_target().get_ref().is_empty());

        session.share_target.init("key").unwrap();
        session.handle_line("share").await;
        assert_eq!(session.status.current().unwrap().text, SHARED);
        let written = String::from_utf8(session.share_target().get_ref().clone()).unwrap();
        assert!(written.contains("1세트: 1, 2, 3, 4, 5, 6"));
    }

    #[tokio::test(start_paused = true)]
    async fn sms_is_not_implemented() {
        let mut session = session(vec![Ok(lotto([1, 2, 3, 4, 5, 6]))]);
        session.handle_line("lotto").await;

        session.handle_line("sms 12-345").await;
        assert_eq!(
            session.status.current().unwrap().text,
            ValidationError::InvalidPhone.to_string()
        );

        session.handle_line("sms 01012345678").await;
        let status = session.status.current().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("01012345678"));
        assert!(status.text.contains("준비 중"));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_bytes_do_not_end_the_session() {
        let mut session = session(vec![Ok(lotto([1, 2, 3, 4, 5, 6]))]);

        let reply = session.handle_bytes(b"lotto \xff\xfe").await;
        assert!(!reply.quit);
        assert_eq!(
            session.status.current().unwrap().text,
            ValidationError::NotUtf8.to_string()
        );

        let reply = session.handle_bytes(b"lotto\r").await;
        assert_eq!(reply.lines, vec![String::from("1번째 세트: 1 2 3 4 5 6")]);
    }

    #[tokio::test(start_paused = true)]
    async fn show_help_and_quit() {
        let mut session = session(vec![]);
        assert_eq!(
            session.handle_line("show").await.lines[0],
            LOTTO_PLACEHOLDER
        );
        assert_eq!(session.handle_line("help").await.lines.len(), HELP.len());
        assert!(session.handle_line("quit").await.quit);
    }
}
