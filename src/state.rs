use std::sync::Arc;

use crate::api::BackendClient;
use crate::config::Config;
use crate::engine::board::OrderBoard;
use crate::error::{AppError, AppResult};
use crate::observability::metrics::Metrics;
use crate::storage::SessionStore;

pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub backend: BackendClient,
    pub board: Arc<OrderBoard>,
    pub metrics: Metrics,
}

impl AppState {
    pub async fn init(config: Config) -> AppResult<Self> {
        let session = Arc::new(SessionStore::load(&config.state_path).await?);
        let metrics = Metrics::new();
        let backend = BackendClient::new(&config, session.clone(), metrics.clone())?;

        Ok(Self {
            config,
            session,
            backend,
            board: Arc::new(OrderBoard::new()),
            metrics,
        })
    }

    /// Name the backend records as `courierName` for this rider.
    pub async fn courier_name(&self) -> AppResult<String> {
        self.session
            .profile()
            .await
            .map(|profile| profile.full_name)
            .filter(|name| !name.is_empty())
            .ok_or(AppError::Unauthenticated)
    }
}
