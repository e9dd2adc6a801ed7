mod request;
mod response;
mod session;

pub use request::*;
pub use response::*;
pub use session::*;
