use async_trait::async_trait;
use http::HeaderMap;

use super::config::{PKCE_COOKIE_MAX_AGE, PKCE_COOKIE_NAME, PKCE_STORE_KEY, PKCE_STORE_PREFIX};
use super::errors::PkceError;
use super::verifier::CodeVerifier;
use crate::storage::{CacheData, SharedCacheStore};
use crate::utils::{CookieAttrs, get_cookie_from_headers, header_clear_cookie, header_set_cookie};

/// Somewhere a verifier can be parked between the sign-in redirect and the
/// callback.
#[async_trait]
pub trait VerifierTransport: Send + Sync {
    async fn store(&mut self, verifier: &CodeVerifier) -> Result<(), PkceError>;

    async fn retrieve(&self) -> Result<Option<CodeVerifier>, PkceError>;

    /// Idempotent.
    async fn clear(&mut self) -> Result<(), PkceError>;
}

/// Verifier kept in the tab-scoped ephemeral store.
#[derive(Clone)]
pub struct EphemeralTransport {
    store: SharedCacheStore,
}

impl EphemeralTransport {
    pub fn new(store: SharedCacheStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VerifierTransport for EphemeralTransport {
    async fn store(&mut self, verifier: &CodeVerifier) -> Result<(), PkceError> {
        self.store
            .lock()
            .await
            .put(
                PKCE_STORE_PREFIX,
                PKCE_STORE_KEY,
                CacheData::from(verifier.as_str()),
            )
            .await?;
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<CodeVerifier>, PkceError> {
        let stored = self
            .store
            .lock()
            .await
            .get(PKCE_STORE_PREFIX, PKCE_STORE_KEY)
            .await?;
        Ok(stored.and_then(|data| CodeVerifier::try_from(data.value).ok()))
    }

    async fn clear(&mut self) -> Result<(), PkceError> {
        self.store
            .lock()
            .await
            .remove(PKCE_STORE_PREFIX, PKCE_STORE_KEY)
            .await?;
        Ok(())
    }
}

/// Verifier carried in the `pkce_code_verifier` cookie.
///
/// Reads come from the request `Cookie` header; writes accumulate as
/// `Set-Cookie` headers for the response.
#[derive(Debug)]
pub struct CookieTransport {
    incoming: Option<String>,
    outgoing: HeaderMap,
    secure: bool,
    cleared: bool,
}

impl CookieTransport {
    /// Transport for a response that has no request cookies to read.
    pub fn new(secure: bool) -> Self {
        Self {
            incoming: None,
            outgoing: HeaderMap::new(),
            secure,
            cleared: false,
        }
    }

    pub fn from_request_headers(headers: &HeaderMap, secure: bool) -> Self {
        Self {
            incoming: get_cookie_from_headers(headers, PKCE_COOKIE_NAME),
            ..Self::new(secure)
        }
    }

    /// `Set-Cookie` headers produced so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.outgoing
    }

    pub fn into_headers(self) -> HeaderMap {
        self.outgoing
    }

    fn attrs(&self) -> CookieAttrs {
        CookieAttrs {
            http_only: true,
            secure: self.secure,
        }
    }
}

#[async_trait]
impl VerifierTransport for CookieTransport {
    async fn store(&mut self, verifier: &CodeVerifier) -> Result<(), PkceError> {
        let attrs = self.attrs();
        header_set_cookie(
            &mut self.outgoing,
            PKCE_COOKIE_NAME,
            verifier.as_str(),
            PKCE_COOKIE_MAX_AGE,
            attrs,
        )?;
        self.incoming = Some(verifier.as_str().to_string());
        self.cleared = false;
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<CodeVerifier>, PkceError> {
        let Some(raw) = self.incoming.clone() else {
            return Ok(None);
        };
        match CodeVerifier::try_from(raw) {
            Ok(verifier) => Ok(Some(verifier)),
            Err(_) => {
                tracing::warn!("Ignoring malformed {} cookie", PKCE_COOKIE_NAME);
                Ok(None)
            }
        }
    }

    async fn clear(&mut self) -> Result<(), PkceError> {
        if self.cleared {
            return Ok(());
        }
        let attrs = self.attrs();
        header_clear_cookie(&mut self.outgoing, PKCE_COOKIE_NAME, attrs)?;
        self.incoming = None;
        self.cleared = true;
        Ok(())
    }
}

/// Both verifier locations used together on the client-driven path: writes
/// and clears touch both, reads consult only the ephemeral store.
pub struct PkceStore {
    ephemeral: EphemeralTransport,
    cookie: CookieTransport,
}

impl PkceStore {
    pub fn new(ephemeral: EphemeralTransport, cookie: CookieTransport) -> Self {
        Self { ephemeral, cookie }
    }

    /// Cookie writes waiting to be applied to the browser.
    pub fn cookie_headers(&self) -> &HeaderMap {
        self.cookie.headers()
    }

    /// Hands the pending cookie writes over, leaving none behind.
    pub fn take_cookie_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.cookie.outgoing)
    }
}

#[async_trait]
impl VerifierTransport for PkceStore {
    async fn store(&mut self, verifier: &CodeVerifier) -> Result<(), PkceError> {
        self.ephemeral.store(verifier).await?;
        self.cookie.store(verifier).await?;
        tracing::debug!("Stored PKCE verifier");
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<CodeVerifier>, PkceError> {
        self.ephemeral.retrieve().await
    }

    async fn clear(&mut self) -> Result<(), PkceError> {
        self.ephemeral.clear().await?;
        self.cookie.clear().await?;
        tracing::debug!("Cleared PKCE verifier");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkce::generate_verifier;
    use crate::storage::shared_memory_store;
    use http::HeaderValue;
    use http::header::{COOKIE, SET_COOKIE};

    fn pkce_store(secure: bool) -> PkceStore {
        PkceStore::new(
            EphemeralTransport::new(shared_memory_store()),
            CookieTransport::new(secure),
        )
    }

    fn set_cookies(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_store_then_retrieve_returns_same_verifier() {
        let mut store = pkce_store(false);
        let verifier = generate_verifier();

        store.store(&verifier).await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), Some(verifier));
    }

    #[tokio::test]
    async fn test_clear_removes_verifier() {
        let mut store = pkce_store(false);
        store.store(&generate_verifier()).await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let mut store = pkce_store(false);
        store.store(&generate_verifier()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.retrieve().await.unwrap(), None);
        let expired: Vec<_> = set_cookies(store.cookie_headers())
            .into_iter()
            .filter(|c| c.contains("Max-Age=0"))
            .collect();
        assert_eq!(expired.len(), 1);
    }

    #[tokio::test]
    async fn test_store_writes_cookie_with_expected_attributes() {
        let mut store = pkce_store(true);
        let verifier = generate_verifier();

        store.store(&verifier).await.unwrap();

        let cookies = set_cookies(store.cookie_headers());
        assert_eq!(cookies.len(), 1);
        let cookie = &cookies[0];
        assert!(cookie.starts_with(&format!("{PKCE_COOKIE_NAME}={};", verifier.as_str())));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_cookie_not_secure_without_tls() {
        let mut store = pkce_store(false);
        store.store(&generate_verifier()).await.unwrap();

        let cookies = set_cookies(store.cookie_headers());
        assert!(!cookies[0].contains("Secure"));
    }

    #[tokio::test]
    async fn test_retrieve_ignores_cookie_only_verifier() {
        // A verifier that only exists in the cookie belongs to the server path.
        let verifier = generate_verifier();
        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{PKCE_COOKIE_NAME}={}", verifier.as_str())).unwrap(),
        );
        let store = PkceStore::new(
            EphemeralTransport::new(shared_memory_store()),
            CookieTransport::from_request_headers(&request, false),
        );

        assert_eq!(store.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cookie_transport_reads_request_cookie() {
        let verifier = generate_verifier();
        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{PKCE_COOKIE_NAME}={}", verifier.as_str())).unwrap(),
        );

        let transport = CookieTransport::from_request_headers(&request, false);

        assert_eq!(transport.retrieve().await.unwrap(), Some(verifier));
    }

    #[tokio::test]
    async fn test_cookie_transport_rejects_malformed_cookie() {
        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{PKCE_COOKIE_NAME}=tampered")).unwrap(),
        );

        let transport = CookieTransport::from_request_headers(&request, false);

        assert_eq!(transport.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ephemeral_stores_are_per_context() {
        let mut first = EphemeralTransport::new(shared_memory_store());
        let second = EphemeralTransport::new(shared_memory_store());

        first.store(&generate_verifier()).await.unwrap();

        assert!(first.retrieve().await.unwrap().is_some());
        assert!(second.retrieve().await.unwrap().is_none());
    }
}
