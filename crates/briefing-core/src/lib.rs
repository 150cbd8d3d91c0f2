pub mod briefing;
pub mod config;
pub mod error;
pub mod normalize;
pub mod store;

pub use error::{BriefingError, Result};
