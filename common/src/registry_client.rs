//! Client for the service registry (section 6.1). The registry's own
//! internals are out of scope for this specification; this module only
//! needs to know its HTTP surface (`gateway_registry`) well enough to
//! register, deregister and look addresses up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Unreachable(String),
    #[error("name not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct DeregisterRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    address: String,
}

/// Capability set a component needs against the service registry.
/// Abstracted behind a trait so bank/coordinator/client tests can swap in
/// an in-memory fake without spinning up `gateway_registry` over HTTP.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn register(&self, name: &str, address: &str) -> Result<(), RegistryError>;
    async fn deregister(&self, name: &str) -> Result<(), RegistryError>;
    async fn lookup(&self, name: &str) -> Result<String, RegistryError>;
}

/// HTTP-backed registry client talking to a `gateway_registry` instance.
pub struct HttpRegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ServiceRegistry for HttpRegistryClient {
    async fn register(&self, name: &str, address: &str) -> Result<(), RegistryError> {
        self.http
            .post(format!("{}/register", self.base_url))
            .json(&RegisterRequest { name, address })
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;
        Ok(())
    }

    async fn deregister(&self, name: &str) -> Result<(), RegistryError> {
        self.http
            .post(format!("{}/deregister", self.base_url))
            .json(&DeregisterRequest { name })
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<String, RegistryError> {
        let response = self
            .http
            .get(format!("{}/lookup/{}", self.base_url, name))
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(name.to_string()));
        }

        let body: LookupResponse = response
            .error_for_status()
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;
        Ok(body.address)
    }
}
