mod tokio_clock;
mod tracing_navigator;

pub use tokio_clock::*;
pub use tracing_navigator::*;
