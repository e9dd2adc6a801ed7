//! The `logger` module needs a process-wide subscriber, so it is checked by
//! hand. See `bin/logger_demo.rs`.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
