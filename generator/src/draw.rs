use std::{fmt, str::FromStr};

use nom::{
    bytes::complete::{tag, take_while_m_n},
    character::complete::one_of,
    combinator::{all_consuming, map_res},
    sequence::{separated_pair, terminated},
    IResult,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const LOTTO_MIN: u8 = 1;
pub const LOTTO_MAX: u8 = 45;
pub const LOTTO_PICKS: usize = 6;

pub const PENSION_GROUPS: u8 = 5;
pub const PENSION_SERIAL_WIDTH: usize = 6;
const PENSION_SERIAL_MAX: u32 = 999_999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    WrongCount(usize),
    OutOfRange(u8),
    Duplicate(u8),
    BadPensionCode(String),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::WrongCount(n) => write!(f, "expected {LOTTO_PICKS} numbers, got {n}"),
            DrawError::OutOfRange(n) => {
                write!(f, "number {n} outside {LOTTO_MIN}..={LOTTO_MAX}")
            }
            DrawError::Duplicate(n) => write!(f, "number {n} drawn twice"),
            DrawError::BadPensionCode(s) => write!(f, "malformed pension code {s:?}"),
        }
    }
}

impl std::error::Error for DrawError {}

// Six distinct numbers from 1 to 45, kept in the order they were drawn.
// Two sets compare equal when they hold the same numbers, whatever the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct LottoSet([u8; LOTTO_PICKS]);

impl LottoSet {
    pub fn new(numbers: [u8; LOTTO_PICKS]) -> Result<Self, DrawError> {
        for (i, &n) in numbers.iter().enumerate() {
            if !(LOTTO_MIN..=LOTTO_MAX).contains(&n) {
                return Err(DrawError::OutOfRange(n));
            }
            if numbers[..i].contains(&n) {
                return Err(DrawError::Duplicate(n));
            }
        }
        Ok(Self(numbers))
    }

    pub fn numbers(&self) -> &[u8] {
        &self.0
    }

    pub fn sorted(&self) -> Self {
        let mut numbers = self.0;
        numbers.sort_unstable();
        Self(numbers)
    }
}

impl PartialEq for LottoSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted().0 == other.sorted().0
    }
}

impl Eq for LottoSet {}

impl TryFrom<Vec<u8>> for LottoSet {
    type Error = DrawError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        let len = numbers.len();
        let numbers: [u8; LOTTO_PICKS] = numbers
            .try_into()
            .map_err(|_| DrawError::WrongCount(len))?;
        Self::new(numbers)
    }
}

impl From<LottoSet> for Vec<u8> {
    fn from(set: LottoSet) -> Self {
        set.0.to_vec()
    }
}

impl fmt::Display for LottoSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut itoa_buf = itoa::Buffer::new();
        for (i, &n) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(itoa_buf.format(n))?;
        }
        Ok(())
    }
}

// Pension lottery ticket, written as `3조 004512`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PensionCode {
    group: u8,
    serial: u32,
}

impl PensionCode {
    pub fn new(group: u8, serial: u32) -> Result<Self, DrawError> {
        if !(1..=PENSION_GROUPS).contains(&group) || serial > PENSION_SERIAL_MAX {
            return Err(DrawError::BadPensionCode(format!("{group}조 {serial}")));
        }
        Ok(Self { group, serial })
    }

    pub fn group(&self) -> u8 {
        self.group
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }
}

impl fmt::Display for PensionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}조 {:0width$}",
            self.group,
            self.serial,
            width = PENSION_SERIAL_WIDTH
        )
    }
}

fn parse_pension(input: &str) -> IResult<&str, (u8, u32)> {
    all_consuming(separated_pair(
        map_res(one_of("12345"), |c: char| {
            c.to_digit(10).map(|d| d as u8).ok_or("not a digit")
        }),
        terminated(tag("조"), tag(" ")),
        map_res(
            take_while_m_n(PENSION_SERIAL_WIDTH, PENSION_SERIAL_WIDTH, |c: char| {
                c.is_ascii_digit()
            }),
            str::parse::<u32>,
        ),
    ))(input)
}

impl FromStr for PensionCode {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_pension(s) {
            Ok((_, (group, serial))) => Self::new(group, serial),
            Err(_) => Err(DrawError::BadPensionCode(s.to_string())),
        }
    }
}

impl TryFrom<String> for PensionCode {
    type Error = DrawError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PensionCode> for String {
    fn from(code: PensionCode) -> Self {
        code.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Lotto,
    Pension,
}

impl DrawKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            DrawKind::Lotto => "generate-lotto",
            DrawKind::Pension => "generate-pension",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawKind::Lotto => "로또",
            DrawKind::Pension => "연금복권",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw {
    Lotto(LottoSet),
    Pension(PensionCode),
}

impl Draw {
    pub fn kind(&self) -> DrawKind {
        match self {
            Draw::Lotto(_) => DrawKind::Lotto,
            Draw::Pension(_) => DrawKind::Pension,
        }
    }
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Draw::Lotto(set) => fmt::Display::fmt(set, f),
            Draw::Pension(code) => fmt::Display::fmt(code, f),
        }
    }
}

pub struct NumberGenerator {
    rng: StdRng,
}

impl NumberGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    // Without replacement, so the result is in draw order.
    pub fn generate_lotto(&mut self) -> LottoSet {
        draw_lotto(&mut self.rng)
    }

    pub fn generate_pension(&mut self) -> PensionCode {
        let group = self.rng.random_range(1..=PENSION_GROUPS);
        let serial = self.rng.random_range(0..=PENSION_SERIAL_MAX);
        PensionCode { group, serial }
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

pub(crate) fn draw_lotto<R: Rng>(rng: &mut R) -> LottoSet {
    let mut pool: Vec<u8> = (LOTTO_MIN..=LOTTO_MAX).collect();
    let mut picks = [0u8; LOTTO_PICKS];
    for slot in picks.iter_mut() {
        let idx = rng.random_range(0..pool.len());
        *slot = pool.swap_remove(idx);
    }
    LottoSet(picks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lotto_sets_hold_six_distinct_numbers_in_range() {
        let mut generator = NumberGenerator::seeded(12345);
        for _ in 0..1_000 {
            let set = generator.generate_lotto();
            let numbers = set.numbers();
            assert_eq!(numbers.len(), LOTTO_PICKS);
            for (i, n) in numbers.iter().enumerate() {
                assert!((LOTTO_MIN..=LOTTO_MAX).contains(n));
                assert!(!numbers[i + 1..].contains(n), "duplicate in {set}");
            }
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = NumberGenerator::seeded(7);
        let mut b = NumberGenerator::seeded(7);
        for _ in 0..20 {
            assert_eq!(a.generate_lotto().numbers(), b.generate_lotto().numbers());
            assert_eq!(a.generate_pension(), b.generate_pension());
        }
    }

    #[test]
    fn draws_are_not_sorted_by_construction() {
        let mut generator = NumberGenerator::seeded(99);
        let unsorted = (0..50)
            .map(|_| generator.generate_lotto())
            .any(|set| set.numbers() != set.sorted().numbers());
        assert!(unsorted);
    }

    #[test]
    fn lotto_equality_ignores_order() {
        let a = LottoSet::new([1, 2, 3, 4, 5, 6]).unwrap();
        let b = LottoSet::new([6, 5, 4, 3, 2, 1]).unwrap();
        let c = LottoSet::new([1, 2, 3, 4, 5, 7]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(b.to_string(), "6, 5, 4, 3, 2, 1");
    }

    #[test]
    fn lotto_set_rejects_bad_numbers() {
        assert_eq!(
            LottoSet::new([0, 2, 3, 4, 5, 6]),
            Err(DrawError::OutOfRange(0))
        );
        assert_eq!(
            LottoSet::new([1, 2, 3, 4, 5, 46]),
            Err(DrawError::OutOfRange(46))
        );
        assert_eq!(
            LottoSet::new([1, 2, 3, 3, 5, 6]),
            Err(DrawError::Duplicate(3))
        );
        assert_eq!(
            LottoSet::try_from(vec![1, 2, 3]),
            Err(DrawError::WrongCount(3))
        );
    }

    #[test]
    fn pension_codes_match_the_fixed_format() {
        let mut generator = NumberGenerator::seeded(3);
        for _ in 0..1_000 {
            let code = generator.generate_pension().to_string();
            let (group, serial) = code.split_once("조 ").unwrap();
            assert!(["1", "2", "3", "4", "5"].contains(&group), "{code}");
            assert_eq!(serial.len(), PENSION_SERIAL_WIDTH, "{code}");
            assert!(serial.bytes().all(|b| b.is_ascii_digit()), "{code}");
        }
    }

    #[test]
    fn pension_code_parses_and_pads() {
        let code: PensionCode = "3조 004512".parse().unwrap();
        assert_eq!(code.group(), 3);
        assert_eq!(code.serial(), 4512);
        assert_eq!(code.to_string(), "3조 004512");

        for bad in ["", "6조 123456", "3조 12345", "3조 1234567", "3조123456", "3 123456"] {
            assert!(bad.parse::<PensionCode>().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn wire_forms() {
        let set: LottoSet = serde_json::from_str("[7, 1, 45, 13, 22, 30]").unwrap();
        assert_eq!(set.numbers(), &[7, 1, 45, 13, 22, 30]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[7,1,45,13,22,30]");
        assert!(serde_json::from_str::<LottoSet>("[1, 1, 2, 3, 4, 5]").is_err());

        let code: PensionCode = serde_json::from_str("\"1조 000001\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"1조 000001\"");
    }
}
