mod clock;
mod navigator;
mod token_store;
mod transport;

pub use clock::*;
pub use navigator::*;
pub use token_store::*;
pub use transport::*;
