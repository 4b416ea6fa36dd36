pub mod analysis;
pub mod cli;
pub mod draw;
pub mod history;
pub mod http;
pub mod protocol;
pub mod server;
pub mod service;

pub use draw::{Draw, DrawError, DrawKind, LottoSet, NumberGenerator, PensionCode};
