use async_trait::async_trait;
use serde_json::Value;

use super::TransportError;
use crate::auth::Session;

/// What the authenticator needs to know about an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    /// `Set-Cookie` pairs in the order the server sent them
    pub cookies: Vec<(String, String)>,
    /// Parsed JSON body; `None` when the body is empty or not JSON
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP capability used by the authenticator.
///
/// Implementations may impose their own deadlines; the authenticator itself
/// never cancels a request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a form-encoded body
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError>;

    /// GET with the session sent as request cookies
    async fn get(&self, url: &str, session: &Session) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        (**self).post_form(url, fields).await
    }

    async fn get(&self, url: &str, session: &Session) -> Result<TransportResponse, TransportError> {
        (**self).get(url, session).await
    }
}
