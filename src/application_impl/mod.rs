mod authenticated_client;
mod claims_decoder;
mod refresh_coordinator;
mod request_executor;
mod retry_policy;
mod session_sink;
mod token_store_memory;

pub use authenticated_client::*;
pub use claims_decoder::*;
pub use refresh_coordinator::*;
pub use request_executor::*;
pub use retry_policy::*;
pub use session_sink::*;
pub use token_store_memory::*;
