//! In-memory adapters for tests and demos.

mod clock_fake;
mod navigator_fake;
mod transport_fake;

pub use clock_fake::*;
pub use navigator_fake::*;
pub use transport_fake::*;
