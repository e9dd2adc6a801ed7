use crate::application_impl::decode_claims;
use crate::domain_model::*;
use crate::domain_port::TokenStore;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AccessToken) -> Self {
        let store = Self::new();
        store.set(Some(token));
        store
    }

    fn to_session(token: AccessToken) -> Session {
        let expires_at = match decode_claims(token.as_str()) {
            Ok(claims) => claims.expires_at(),
            Err(e) => {
                tracing::debug!(error = %e, "access token carries no readable expiry");
                None
            }
        };
        Session {
            access_token: token,
            expires_at,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: Option<AccessToken>) {
        let session = token.map(Self::to_session);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn take(&self) -> Option<Session> {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    #[test]
    fn set_and_clear() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_none());

        store.set(Some(AccessToken::new("T1")));
        assert_eq!(store.get(), Some(AccessToken::new("T1")));

        store.set(Some(AccessToken::new("T2")));
        assert_eq!(store.get(), Some(AccessToken::new("T2")));

        store.set(None);
        assert!(store.get().is_none());
        assert!(store.session().is_none());
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        let store = MemoryTokenStore::with_token(AccessToken::new("opaque"));
        let session = store.session().unwrap();
        assert_eq!(session.expires_at, None);
    }

    #[test]
    fn jwt_expiry_is_derived() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "1", "exp": 2_000_000_000i64 }),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        let store = MemoryTokenStore::with_token(AccessToken::new(token));
        let session = store.session().unwrap();
        assert_eq!(session.expires_at.unwrap().timestamp(), 2_000_000_000);
    }

    #[test]
    fn take_returns_previous_session() {
        let store = MemoryTokenStore::with_token(AccessToken::new("T1"));
        let prev = store.take().unwrap();
        assert_eq!(prev.access_token, AccessToken::new("T1"));
        assert!(store.take().is_none());
    }
}
