use crate::domain_model::*;

/// Single source of truth for the current access token.
///
/// Reads are synchronous so the request path never yields between reading
/// the token and attaching it.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<AccessToken>;
    fn session(&self) -> Option<Session>;
    /// `None` means logged out.
    fn set(&self, token: Option<AccessToken>);
    /// Clear and return the previous session.
    fn take(&self) -> Option<Session>;
}
