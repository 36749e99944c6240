use reqwest::Method;
use tracing::debug;

use crate::api::BackendClient;
use crate::error::AppResult;
use crate::models::rider::{LocationSample, LocationUpdateRequest};

impl BackendClient {
    pub async fn report_location(&self, user_id: &str, sample: &LocationSample) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("locationupdate/{user_id}"))
            .json(&LocationUpdateRequest::from(sample));
        self.send("location.update", request).await?;

        debug!(
            user_id,
            lat = sample.point.lat,
            lng = sample.point.lng,
            "location reported"
        );
        Ok(())
    }
}
