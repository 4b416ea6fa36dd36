use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::analysis::recommend;
use crate::draw::{DrawError, LottoSet, NumberGenerator, PensionCode};
use crate::history::HistoryCache;

/// Shared state behind the endpoints.
///
/// Without history every lotto draw is uniform and in draw order; with
/// history it is a recommended draw in ascending order.
pub struct Service {
    generator: Mutex<NumberGenerator>,
    // Held across a reload; concurrent requests wait for it.
    history: Option<tokio::sync::Mutex<HistoryCache>>,
}

impl Service {
    pub fn new(generator: NumberGenerator, history: Option<HistoryCache>) -> Self {
        Self {
            generator: Mutex::new(generator),
            history: history.map(tokio::sync::Mutex::new),
        }
    }

    pub fn recommends(&self) -> bool {
        self.history.is_some()
    }

    pub async fn lotto(&self) -> Result<LottoSet, DrawError> {
        let set = match &self.history {
            None => self
                .generator
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .generate_lotto(),
            Some(history) => {
                let analysis = history.lock().await.analysis().await.cloned();
                let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
                recommend(analysis.as_ref(), generator.rng_mut())?
            }
        };
        debug!("Lotto draw: {}", set);
        Ok(set)
    }

    pub fn pension(&self) -> PensionCode {
        let code = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate_pension();
        debug!("Pension draw: {}", code);
        code
    }
}
