pub mod aggregator;
pub mod cli;
pub mod error;
pub mod present;
pub mod session;
pub mod share;
pub mod sms;
pub mod source;
pub mod status;

pub use aggregator::{collect_batch, DrawBatch};
pub use error::{FetchError, TransportError, ValidationError};
pub use source::{DrawSource, Endpoint, HttpDrawSource};
