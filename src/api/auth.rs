use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api::BackendClient;
use crate::error::{AppError, AppResult};
use crate::models::rider::UserProfile;

pub const OTP_LENGTH: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    auth_token: String,
}

pub fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(AppError::Validation(
            "Please enter both email and password".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_otp_code(code: &str) -> AppResult<()> {
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "The code must be {OTP_LENGTH} digits"
        )));
    }
    Ok(())
}

impl BackendClient {
    /// Signs in, caches the profile and registers this device for push.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserProfile> {
        validate_credentials(email, password)?;

        let request = self
            .request(Method::POST, "auth/login")
            .json(&json!({ "email": email.trim(), "password": password }));
        let login: LoginResponse = match self.send_json("auth.login", request).await {
            Ok(login) => login,
            Err(AppError::Backend { status, .. }) if status.is_client_error() => {
                return Err(AppError::Validation("Invalid credentials".to_string()));
            }
            Err(err) => return Err(err),
        };
        self.session().set_token(login.auth_token).await?;

        let profile = self.me().await?;
        self.session().set_profile(profile.clone()).await?;

        if let Err(err) = self.register_device(&profile.id).await {
            warn!(user_id = %profile.id, error = %err, "failed to register device id");
        }

        info!(user_id = %profile.id, "signed in");
        Ok(profile)
    }

    pub async fn me(&self) -> AppResult<UserProfile> {
        let token = self.session().token().await.ok_or(AppError::Unauthenticated)?;
        let request = self
            .request(Method::GET, "auth/me")
            .header("X-Xano-Authorization", format!("Bearer {token}"))
            .header("X-Xano-Authorization-Only", "true");

        self.send_json("auth.me", request).await
    }

    pub async fn register_device(&self, user_id: &str) -> AppResult<()> {
        let device_id = self.session().device_id().await;
        let request = self
            .request(Method::PATCH, &format!("deviceID/{user_id}"))
            .json(&json!({ "deviceID": device_id }));
        self.send("auth.device", request).await?;
        Ok(())
    }

    pub async fn send_login_otp(&self, email: &str) -> AppResult<()> {
        if email.trim().is_empty() {
            return Err(AppError::Validation("email cannot be empty".to_string()));
        }
        let request = self
            .request(Method::POST, "reset/user/password/email")
            .json(&json!({ "email": email.trim() }));
        self.send("auth.send_otp", request).await?;
        Ok(())
    }

    pub async fn verify_login_otp(&self, contact: &str, code: &str) -> AppResult<()> {
        validate_otp_code(code)?;

        let request = self
            .request(Method::POST, "verify/otp/code")
            .json(&json!({ "contact": contact, "type": true, "code": code }));

        match self.send("auth.verify_otp", request).await {
            Ok(_) => {
                info!("login otp verified");
                Ok(())
            }
            Err(AppError::Backend { status, .. }) if status.is_client_error() => {
                Err(AppError::Validation("Invalid OTP code".to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Ends the session on the backend, then forgets it locally.
    pub async fn logout(&self) -> AppResult<()> {
        let user_id = self.require_user_id().await?;
        let request = self.request(Method::PATCH, &format!("logout/{user_id}"));
        self.send("auth.logout", request).await?;

        self.session().clear().await?;
        info!(user_id = %user_id, "signed out");
        Ok(())
    }
}
