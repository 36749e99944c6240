use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::api::BackendClient;
use crate::error::{AppError, AppResult};
use crate::models::rider::{Availability, ProfileUpdate, UserProfile};

#[derive(Serialize)]
struct RiderUpdateRequest<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    delikaquickshipper_user_table_id: &'a str,
}

impl BackendClient {
    /// Saves profile edits and merges them into the cached profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AppResult<UserProfile> {
        if update.is_empty() {
            return Err(AppError::Validation("nothing to update".to_string()));
        }
        let mut profile = self
            .session()
            .profile()
            .await
            .ok_or(AppError::Unauthenticated)?;

        let request = self
            .request(Method::PATCH, &format!("riderupdate/{}", profile.id))
            .json(&RiderUpdateRequest {
                update,
                delikaquickshipper_user_table_id: &profile.id,
            });
        self.send("rider.update", request).await?;

        profile.apply(update);
        self.session().set_profile(profile.clone()).await?;

        info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }

    pub async fn set_availability(&self, availability: Availability) -> AppResult<()> {
        let user_id = self.require_user_id().await?;
        let request = self
            .request(Method::PATCH, "editStatus")
            .json(&json!({ "userId": user_id, "status": availability }));
        self.send("rider.availability", request).await?;

        info!(user_id = %user_id, %availability, "availability changed");
        Ok(())
    }
}
