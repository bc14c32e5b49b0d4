//! HTTP layer: status mapping and body decoding.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes. No retries: one call, one round trip.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::SessionCredential;
use crate::error::{ServiceError, ServiceResult};
use crate::types::CurrentUser;

use super::helpers::{error_message, parse_body};

/// Outcome of the session lookup (Anonymous only for 401).
#[derive(Debug)]
pub(crate) enum UserOutcome {
    Anonymous,
    SignedIn(CurrentUser),
}

/// HTTP backend for making requests (holds reqwest client, credential, base URL).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) credential: SessionCredential,
}

impl HttpBackend {
    /// GET a JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> ServiceResult<T> {
        let response = self.request(Method::GET, url, None::<&()>).await?;
        self.read_json(response, what).await
    }

    /// POST a JSON body and decode the JSON answer.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        what: &str,
    ) -> ServiceResult<T> {
        let response = self.request(Method::POST, url, Some(body)).await?;
        self.read_json(response, what).await
    }

    /// DELETE; any 2xx is success and the body is ignored.
    pub(crate) async fn delete(&self, url: &str) -> ServiceResult<()> {
        self.request(Method::DELETE, url, None::<&()>).await?;
        Ok(())
    }

    /// GET /me; 401 => Anonymous, 200 => SignedIn.
    pub(crate) async fn fetch_user_optional(&self, url: &str) -> ServiceResult<UserOutcome> {
        match self.get_json::<CurrentUser>(url, "current user").await {
            Ok(user) => Ok(UserOutcome::SignedIn(user)),
            Err(ServiceError::Unauthorized { .. }) => {
                debug!("no active session (401)");
                Ok(UserOutcome::Anonymous)
            }
            Err(e) => Err(e),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> ServiceResult<T> {
        let body = response.text().await.map_err(|e| ServiceError::Network {
            message: format!("failed to read {} body: {}", what, e),
        })?;
        parse_body(&body, what)
    }

    /// Make a single request and map the status.
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> ServiceResult<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");

        if let Some(value) = self.credential.authorization() {
            request = request.header(AUTHORIZATION, value);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, url = %url, status = status.as_u16(), "response");

        match status.as_u16() {
            200..=299 => Ok(response),

            401 => Err(ServiceError::Unauthorized {
                message: "missing or expired session".to_string(),
            }),

            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ServiceError::Server {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                })
            }
        }
    }
}
