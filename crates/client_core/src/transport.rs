//! Remote user resource access.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{User, UserId},
    error::TransportError,
    protocol::UserPayload,
};
use url::Url;

#[async_trait]
pub trait UsersTransport: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, TransportError>;
    async fn create_user(&self, payload: &UserPayload) -> Result<User, TransportError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), TransportError>;
    async fn update_user(&self, payload: &UserPayload) -> Result<User, TransportError>;
}

/// JSON-over-HTTP access to a `/users` collection below `base_url`.
pub struct HttpUsersTransport {
    http: Client,
    base_url: Url,
}

impl HttpUsersTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid users api base url '{base_url}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "users api base url must be http or https, got '{}'",
                base_url.scheme()
            ));
        }
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("users api base url '{base_url}' cannot carry a path"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn users_url(&self, id: Option<&UserId>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: base urls here always accept path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if let Some(status) = err.status() {
        TransportError::status(status.as_u16(), err.to_string())
    } else if err.is_decode() {
        TransportError::decode(err.to_string())
    } else {
        TransportError::network(err.to_string())
    }
}

#[async_trait]
impl UsersTransport for HttpUsersTransport {
    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        self.http
            .get(self.users_url(None))
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<User, TransportError> {
        self.http
            .post(self.users_url(None))
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), TransportError> {
        self.http
            .delete(self.users_url(Some(id)))
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;
        Ok(())
    }

    async fn update_user(&self, payload: &UserPayload) -> Result<User, TransportError> {
        self.http
            .put(self.users_url(Some(&payload.id)))
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
