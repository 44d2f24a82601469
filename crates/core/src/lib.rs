pub mod diagnostics;
pub mod error;
pub mod genetics;
pub mod language;
pub mod ranking;
pub mod search;
pub mod types;

pub use error::{AiError, Result};
