//! Shared blocking HTTP agent.
//!
//! All network traffic goes through one lazily built `ureq` agent so the
//! CLI can configure the user agent and timeout once at startup. Requests
//! are blocking and strictly sequential; HTTP error statuses are surfaced
//! as responses rather than transport errors so callers can report them.

use std::{
    sync::{Arc, LazyLock, RwLock},
    time::Duration,
};

use ureq::{
    http::{header::AUTHORIZATION, Response},
    Agent, Body,
};

use crate::error::DownloadError;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some("depot-tools/depot".into()),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .timeout_global(self.timeout)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

struct SharedClient {
    agent: Agent,
    config: ClientConfig,
}

static SHARED_CLIENT_STATE: LazyLock<Arc<RwLock<SharedClient>>> = LazyLock::new(|| {
    let config = ClientConfig::default();
    let agent = config.build();

    Arc::new(RwLock::new(SharedClient {
        agent,
        config,
    }))
});

/// Updates the global HTTP client configuration and rebuilds the shared
/// agent from it.
pub fn configure_http_client<F>(updater: F)
where
    F: FnOnce(&mut ClientConfig),
{
    let mut state = SHARED_CLIENT_STATE.write().unwrap();
    let mut new_config = state.config.clone();
    updater(&mut new_config);
    let new_agent = new_config.build();
    state.agent = new_agent;
    state.config = new_config;
}

pub struct Http;

impl Http {
    /// Performs a GET request, returning the response whatever its status.
    pub fn get(url: &str) -> Result<Response<Body>, DownloadError> {
        let state = SHARED_CLIENT_STATE.read().unwrap();
        state.agent.get(url).call().map_err(DownloadError::from)
    }

    /// Performs a HEAD request, returning the response whatever its status.
    pub fn head(url: &str) -> Result<Response<Body>, DownloadError> {
        let state = SHARED_CLIENT_STATE.read().unwrap();
        state.agent.head(url).call().map_err(DownloadError::from)
    }

    /// Performs a GET request asking for the first byte only, for hosts
    /// that reject HEAD.
    pub fn get_range_probe(url: &str) -> Result<Response<Body>, DownloadError> {
        let state = SHARED_CLIENT_STATE.read().unwrap();
        state
            .agent
            .get(url)
            .header("Range", "bytes=0-0")
            .call()
            .map_err(DownloadError::from)
    }

    /// Fetches a JSON document, optionally with a bearer token.
    ///
    /// # Errors
    ///
    /// * [`DownloadError::HttpError`] for a non-success status.
    /// * [`DownloadError::InvalidResponse`] when the body does not decode.
    pub fn get_json<T: serde::de::DeserializeOwned>(
        url: &str,
        bearer: Option<&str>,
    ) -> Result<T, DownloadError> {
        let state = SHARED_CLIENT_STATE.read().unwrap();
        let mut req = state.agent.get(url);

        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let mut resp = req.call()?;
        let status = resp.status();

        if !status.is_success() {
            return Err(DownloadError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.body_mut()
            .read_json()
            .map_err(|_| DownloadError::InvalidResponse)
    }
}
