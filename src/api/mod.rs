//! Thin reqwest gateway over the delivery backend. Every call is a single
//! request: no retry, no backoff, no offline queue.

pub mod auth;
pub mod location;
pub mod orders;
pub mod rider;

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::observability::metrics::Metrics;
use crate::storage::SessionStore;

pub const ORDERS_TABLE: &str = "delikaquickshipper_orders_table";

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    metrics: Metrics,
}

impl BackendClient {
    pub fn new(config: &Config, session: Arc<SessionStore>, metrics: Metrics) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AppError::Config(format!("http client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
            metrics,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends with the stored bearer token, records metrics and turns any
    /// non-2xx answer into [`AppError::Backend`].
    pub(crate) async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> AppResult<Response> {
        let request = match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(response) if response.status().is_success() => {
                self.metrics.observe_request(endpoint, true, elapsed);
                debug!(endpoint, status = %response.status(), "backend call ok");
                Ok(response)
            }
            Ok(response) => {
                self.metrics.observe_request(endpoint, false, elapsed);
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(endpoint, %status, "backend rejected request");
                Err(AppError::Backend { status, body })
            }
            Err(err) => {
                self.metrics.observe_request(endpoint, false, elapsed);
                warn!(endpoint, error = %err, "backend request failed");
                Err(AppError::Http(err))
            }
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = self.send(endpoint, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Decode(format!("{endpoint}: {err}")))
    }

    pub(crate) async fn require_user_id(&self) -> AppResult<String> {
        match (self.session.token().await, self.session.user_id().await) {
            (Some(_), Some(user_id)) => Ok(user_id),
            _ => Err(AppError::Unauthenticated),
        }
    }
}
