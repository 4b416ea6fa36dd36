//! Statistics over past winning draws, and the recommended draw built on them.
//!
//! A recommended set mixes a few frequently drawn ("hot") numbers, one rarely
//! drawn ("cold") number and uniform picks, then keeps it only if its sum and
//! its odd/even and low/high splits look like past winning sets.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rand::{seq::IndexedRandom, Rng};

use crate::draw::{draw_lotto, DrawError, LottoSet, LOTTO_MAX, LOTTO_MIN, LOTTO_PICKS};
use crate::history::PastDraw;

pub const HOT_COUNT: usize = 10;
pub const COLD_COUNT: usize = 10;
pub const MAX_ATTEMPTS: usize = 1_000;

/// Highest number counted as "low".
pub const LOW_MAX: u8 = 22;

const DEFAULT_SUM_RANGE: (u32, u32) = (90, 160);
const DEFAULT_SPLIT: Split = (3, 3);

/// (odd, even) or (low, high) counts within one set.
pub type Split = (u8, u8);

#[derive(Debug, Clone, PartialEq)]
pub struct SumRange {
    pub avg: f64,
    pub min: u32,
    pub max: u32,
    pub p25: u32,
    pub p75: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Appearances of each number; index 0 is number 1.
    pub counts: [u32; LOTTO_MAX as usize],
    pub sums: SumRange,
    pub odd_even: Split,
    pub low_high: Split,
}

impl Analysis {
    /// Numbers ordered by descending frequency, ties by ascending number.
    pub fn by_frequency(&self) -> Vec<u8> {
        let mut numbers: Vec<u8> = (LOTTO_MIN..=LOTTO_MAX).collect();
        numbers.sort_by(|a, b| self.count(*b).cmp(&self.count(*a)));
        numbers
    }

    pub fn count(&self, n: u8) -> u32 {
        self.counts[(n - LOTTO_MIN) as usize]
    }

    pub fn hot(&self) -> Vec<u8> {
        self.by_frequency().into_iter().take(HOT_COUNT).collect()
    }

    pub fn cold(&self) -> Vec<u8> {
        let ranked = self.by_frequency();
        ranked[ranked.len() - COLD_COUNT..].to_vec()
    }
}

fn is_valid(numbers: &[u8]) -> bool {
    numbers.len() == LOTTO_PICKS && numbers.iter().all(|n| (LOTTO_MIN..=LOTTO_MAX).contains(n))
}

pub fn odd_even(numbers: &[u8]) -> Split {
    let odd = numbers.iter().filter(|&&n| n % 2 != 0).count() as u8;
    (odd, numbers.len() as u8 - odd)
}

pub fn low_high(numbers: &[u8]) -> Split {
    let low = numbers.iter().filter(|&&n| n <= LOW_MAX).count() as u8;
    (low, numbers.len() as u8 - low)
}

/// Most frequent split; the first one seen wins a tie.
fn most_common(splits: impl Iterator<Item = Split>) -> Option<Split> {
    let mut seen: Vec<(Split, usize)> = Vec::new();
    for split in splits {
        match seen.iter_mut().find(|(s, _)| *s == split) {
            Some((_, count)) => *count += 1,
            None => seen.push((split, 1)),
        }
    }

    let mut best: Option<(Split, usize)> = None;
    for (split, count) in seen {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((split, count));
        }
    }
    best.map(|(split, _)| split)
}

pub fn analyze(history: &[PastDraw]) -> Option<Analysis> {
    if history.is_empty() {
        return None;
    }

    let mut counts = [0u32; LOTTO_MAX as usize];
    for draw in history {
        for &n in &draw.winning_numbers {
            if (LOTTO_MIN..=LOTTO_MAX).contains(&n) {
                counts[(n - LOTTO_MIN) as usize] += 1;
            }
        }
    }

    let valid: Vec<&[u8]> = history
        .iter()
        .map(|d| d.winning_numbers.as_slice())
        .filter(|numbers| is_valid(numbers))
        .collect();

    if valid.is_empty() {
        warn!("No complete winning sets in history, using default ranges");
        return Some(Analysis {
            counts,
            sums: SumRange {
                avg: 0.0,
                min: 0,
                max: 0,
                p25: DEFAULT_SUM_RANGE.0,
                p75: DEFAULT_SUM_RANGE.1,
            },
            odd_even: DEFAULT_SPLIT,
            low_high: DEFAULT_SPLIT,
        });
    }

    let mut sums: Vec<u32> = valid
        .iter()
        .map(|numbers| numbers.iter().map(|&n| n as u32).sum())
        .collect();
    sums.sort_unstable();
    let len = sums.len();
    let total: u32 = sums.iter().sum();

    Some(Analysis {
        counts,
        sums: SumRange {
            avg: total as f64 / len as f64,
            min: sums[0],
            max: sums[len - 1],
            p25: sums[len / 4],
            p75: sums[len * 3 / 4],
        },
        odd_even: most_common(valid.iter().map(|n| odd_even(n))).unwrap_or(DEFAULT_SPLIT),
        low_high: most_common(valid.iter().map(|n| low_high(n))).unwrap_or(DEFAULT_SPLIT),
    })
}

fn within_one(actual: Split, target: Split) -> bool {
    actual.0.abs_diff(target.0) <= 1 && actual.1.abs_diff(target.1) <= 1
}

pub fn is_good_combination(numbers: &[u8], analysis: &Analysis) -> bool {
    let sum: u32 = numbers.iter().map(|&n| n as u32).sum();
    let SumRange { p25, p75, .. } = analysis.sums;
    if p25 <= p75 && !(p25..=p75).contains(&sum) {
        return false;
    }

    within_one(odd_even(numbers), analysis.odd_even)
        && within_one(low_high(numbers), analysis.low_high)
}

fn uniform_sorted<R: Rng>(rng: &mut R) -> LottoSet {
    draw_lotto(rng).sorted()
}

/// Recommended set in ascending order. Falls back to a uniform draw when
/// there is no analysis or no candidate passes within `MAX_ATTEMPTS`.
pub fn recommend<R: Rng>(analysis: Option<&Analysis>, rng: &mut R) -> Result<LottoSet, DrawError> {
    let Some(analysis) = analysis else {
        debug!("No history analysis, drawing uniformly");
        return Ok(uniform_sorted(rng));
    };

    let hot = analysis.hot();
    let cold = analysis.cold();
    debug!(
        "Recommending with sum {}..={}, odd/even {:?}, low/high {:?}",
        analysis.sums.p25, analysis.sums.p75, analysis.odd_even, analysis.low_high
    );

    for attempt in 1..=MAX_ATTEMPTS {
        let mut candidate = BTreeSet::new();

        let num_hot = rng.random_range(2..=3);
        candidate.extend(hot.choose_multiple(rng, num_hot).copied());

        let spare_cold: Vec<u8> = cold
            .iter()
            .copied()
            .filter(|n| !candidate.contains(n))
            .collect();
        let pick = if spare_cold.is_empty() {
            let spare: Vec<u8> = (LOTTO_MIN..=LOTTO_MAX)
                .filter(|n| !candidate.contains(n))
                .collect();
            spare.choose(rng).copied()
        } else {
            spare_cold.choose(rng).copied()
        };
        candidate.extend(pick);

        while candidate.len() < LOTTO_PICKS {
            candidate.insert(rng.random_range(LOTTO_MIN..=LOTTO_MAX));
        }

        let numbers: Vec<u8> = candidate.into_iter().collect();
        if is_good_combination(&numbers, analysis) {
            info!("Found a matching combination after {attempt} attempts");
            return LottoSet::try_from(numbers);
        }
    }

    warn!("No matching combination in {MAX_ATTEMPTS} attempts, drawing uniformly");
    Ok(uniform_sorted(rng))
}
