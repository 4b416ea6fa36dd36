use generator::{Draw, DrawKind};
use log::{debug, warn};

use crate::error::{FetchError, TransportError};
use crate::source::DrawSource;

/// Draws produced by one request for `requested` sets.
///
/// Holds only the draws that succeeded, in request order. When collection
/// stopped early the failure that stopped it is kept alongside.
#[derive(Debug)]
pub struct DrawBatch {
    kind: DrawKind,
    requested: usize,
    draws: Vec<Draw>,
    stopped_by: Option<FetchError>,
}

impl DrawBatch {
    pub fn empty(kind: DrawKind) -> Self {
        Self {
            kind,
            requested: 0,
            draws: Vec::new(),
            stopped_by: None,
        }
    }

    pub fn kind(&self) -> DrawKind {
        self.kind
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Fewer sets than requested.
    pub fn is_partial(&self) -> bool {
        self.draws.len() < self.requested
    }

    pub fn failure(&self) -> Option<&FetchError> {
        self.stopped_by.as_ref()
    }
}

/// Requests `count` draws one after another and stops at the first failure.
///
/// Each request is awaited before the next is issued. Nothing is retried;
/// whatever succeeded before the failure is returned.
pub async fn collect_batch<S>(source: &S, kind: DrawKind, count: usize) -> DrawBatch
where
    S: DrawSource + ?Sized,
{
    let mut batch = DrawBatch {
        kind,
        requested: count,
        draws: Vec::new(),
        stopped_by: None,
    };

    for i in 0..count {
        let result = match source.fetch(kind).await {
            Ok(draw) if draw.kind() != kind => {
                Err(TransportError::Shape("draw of the wrong kind").into())
            }
            other => other,
        };

        match result {
            Ok(draw) => {
                debug!("{} set {}: {}", kind.label(), i + 1, draw);
                batch.draws.push(draw);
            }
            Err(e) => {
                warn!(
                    "{} draw {} of {} failed, keeping {}: {}",
                    kind.label(),
                    i + 1,
                    count,
                    batch.draws.len(),
                    e
                );
                batch.stopped_by = Some(e);
                break;
            }
        }
    }

    batch
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use generator::{LottoSet, PensionCode};

    use super::*;

    /// Replays a fixed list of outcomes; runs dry as an application failure.
    pub(crate) struct ScriptedSource {
        script: Mutex<VecDeque<Result<Draw, FetchError>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn new(script: Vec<Result<Draw, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DrawSource for ScriptedSource {
        async fn fetch(&self, _kind: DrawKind) -> Result<Draw, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Application(String::from("script ended"))))
        }
    }

    pub(crate) fn lotto(numbers: [u8; 6]) -> Draw {
        Draw::Lotto(LottoSet::new(numbers).unwrap())
    }

    pub(crate) fn pension(code: &str) -> Draw {
        Draw::Pension(code.parse::<PensionCode>().unwrap())
    }

    fn down() -> FetchError {
        FetchError::Transport(TransportError::Status(503))
    }

    #[tokio::test]
    async fn all_successes_fill_the_batch() {
        let source = ScriptedSource::new(vec![
            Ok(lotto([1, 2, 3, 4, 5, 6])),
            Ok(lotto([7, 8, 9, 10, 11, 12])),
            Ok(lotto([13, 14, 15, 16, 17, 18])),
        ]);
        let batch = collect_batch(&source, DrawKind::Lotto, 3).await;
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.requested(), 3);
        assert!(!batch.is_partial());
        assert!(batch.failure().is_none());
        assert_eq!(batch.draws()[1], lotto([7, 8, 9, 10, 11, 12]));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn stops_at_the_first_failure() {
        let source = ScriptedSource::new(vec![
            Ok(pension("1조 000001")),
            Ok(pension("2조 000002")),
            Err(down()),
            Ok(pension("3조 000003")),
        ]);
        let batch = collect_batch(&source, DrawKind::Pension, 5).await;
        assert_eq!(batch.len(), 2);
        assert!(batch.is_partial());
        assert!(matches!(
            batch.failure(),
            Some(FetchError::Transport(TransportError::Status(503)))
        ));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn application_failure_on_the_first_call_gives_an_empty_batch() {
        let source = ScriptedSource::new(vec![Err(FetchError::Application(String::from("no")))]);
        let batch = collect_batch(&source, DrawKind::Lotto, 4).await;
        assert!(batch.is_empty());
        assert!(matches!(batch.failure(), Some(FetchError::Application(_))));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn huge_count_fails_on_the_first_call() {
        let source = ScriptedSource::new(vec![Err(FetchError::Application(String::from("no")))]);
        let batch = collect_batch(&source, DrawKind::Lotto, usize::MAX / 2).await;
        assert!(batch.is_empty());
        assert_eq!(batch.requested(), usize::MAX / 2);
        assert!(matches!(batch.failure(), Some(FetchError::Application(_))));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn zero_requests_issue_no_calls() {
        let source = ScriptedSource::new(vec![Ok(lotto([1, 2, 3, 4, 5, 6]))]);
        let batch = collect_batch(&source, DrawKind::Lotto, 0).await;
        assert!(batch.is_empty());
        assert!(!batch.is_partial());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_kind_counts_as_a_failure() {
        let source = ScriptedSource::new(vec![
            Ok(lotto([1, 2, 3, 4, 5, 6])),
            Ok(pension("1조 000001")),
        ]);
        let batch = collect_batch(&source, DrawKind::Lotto, 2).await;
        assert_eq!(batch.len(), 1);
        assert!(matches!(batch.failure(), Some(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn kth_failure_keeps_k_minus_one() {
        for n in 1..=5 {
            for k in 1..=n {
                let script = (1..=n)
                    .map(|i| if i == k { Err(down()) } else { Ok(lotto([1, 2, 3, 4, 5, 6])) })
                    .collect();
                let source = ScriptedSource::new(script);
                let batch = collect_batch(&source, DrawKind::Lotto, n).await;
                assert_eq!(batch.len(), k - 1, "n={n} k={k}");
                assert_eq!(source.calls(), k);
            }
        }
    }
}
