use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::wire;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// The backend stores unknown coordinates as zero.
    pub fn is_set(&self) -> bool {
        self.lat != 0.0 || self.lng != 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub email: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserProfile {
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.full_name {
            self.full_name = name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(address) = &update.address {
            self.address = address.clone();
        }
        if let Some(phone) = &update.phone_number {
            self.phone_number = phone.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.phone_number.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub point: GeoPoint,
    pub taken_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn now(point: GeoPoint) -> Self {
        Self {
            point,
            taken_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub latitude: String,
    pub longitude: String,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
pub struct LocationUpdateRequest {
    pub location: LocationPayload,
}

impl From<&LocationSample> for LocationUpdateRequest {
    fn from(sample: &LocationSample) -> Self {
        Self {
            location: LocationPayload {
                latitude: sample.point.lat.to_string(),
                longitude: sample.point.lng.to_string(),
                last_updated: sample.taken_at.to_rfc3339(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Online,
    Offline,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Online => f.write_str("online"),
            Availability::Offline => f.write_str("offline"),
        }
    }
}

impl FromStr for Availability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Availability::Online),
            "offline" => Ok(Availability::Offline),
            other => Err(AppError::Validation(format!("unknown availability: {other}"))),
        }
    }
}
