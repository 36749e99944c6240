use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::rider::GeoPoint;
use crate::models::wire;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    ReadyForPickup,
    Assigned,
    Pickup,
    OnTheWay,
    Delivered,
    Cancelled,
    DeliveryFailed,
    Completed,
    /// Any status string outside the closed set, kept verbatim.
    Unrecognized(String),
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::ReadyForPickup,
        OrderStatus::Assigned,
        OrderStatus::Pickup,
        OrderStatus::OnTheWay,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::DeliveryFailed,
        OrderStatus::Completed,
    ];

    /// Total mapping from the wire string; never fails.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ReadyForPickup" => OrderStatus::ReadyForPickup,
            "Assigned" => OrderStatus::Assigned,
            "Pickup" => OrderStatus::Pickup,
            "OnTheWay" => OrderStatus::OnTheWay,
            "Delivered" => OrderStatus::Delivered,
            "Cancelled" => OrderStatus::Cancelled,
            "DeliveryFailed" => OrderStatus::DeliveryFailed,
            "Completed" => OrderStatus::Completed,
            other => OrderStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::ReadyForPickup => "ReadyForPickup",
            OrderStatus::Assigned => "Assigned",
            OrderStatus::Pickup => "Pickup",
            OrderStatus::OnTheWay => "OnTheWay",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::DeliveryFailed => "DeliveryFailed",
            OrderStatus::Completed => "Completed",
            OrderStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered
                | OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::DeliveryFailed
        )
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, OrderStatus::Unrecognized(_))
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        OrderStatus::from_wire(&raw)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input; rejects anything outside the closed set.
impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match OrderStatus::from_wire(s) {
            OrderStatus::Unrecognized(raw) => {
                Err(AppError::Validation(format!("unknown order status: {raw}")))
            }
            status => Ok(status),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    #[serde(default, deserialize_with = "wire::or_default")]
    pub from_latitude: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub from_longitude: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub from_address: String,
}

impl PickupPoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.from_latitude,
            lng: self.from_longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DropOffPoint {
    #[serde(default, deserialize_with = "wire::or_default")]
    pub to_latitude: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub to_longitude: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub to_address: String,
}

impl DropOffPoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.to_latitude,
            lng: self.to_longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(default, deserialize_with = "wire::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub quantity: u32,
    #[serde(default, with = "wire::amount")]
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub order_number: i64,
    #[serde(default)]
    pub order_status: Option<OrderStatus>,

    #[serde(default, deserialize_with = "wire::or_default")]
    pub pickup: Vec<PickupPoint>,
    #[serde(default, rename = "dropOff", deserialize_with = "wire::or_default")]
    pub drop_off: Vec<DropOffPoint>,

    #[serde(default, deserialize_with = "wire::or_default")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub customer_phone_number: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub courier_name: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub courier_phone_number: String,

    #[serde(default, with = "wire::amount")]
    pub delivery_price: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub products: Vec<Product>,
    #[serde(
        default,
        deserialize_with = "wire::optional_amount::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount: Option<f64>,
    #[serde(
        default,
        deserialize_with = "wire::optional_text::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_price: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional_text::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    #[serde(default, rename = "batchID")]
    pub batch_id: Option<String>,

    #[serde(default, rename = "created_at", with = "wire::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub assigned_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub cancelled_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "orderPickedUpTime",
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_picked_up_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "orderOnmywayTime",
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_on_my_way_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_received_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_delivered_time: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_completed_time: Option<DateTime<Utc>>,
}

impl Order {
    pub fn status(&self) -> Option<&OrderStatus> {
        self.order_status.as_ref()
    }

    pub fn first_pickup(&self) -> Option<&PickupPoint> {
        self.pickup.first()
    }

    pub fn first_drop_off(&self) -> Option<&DropOffPoint> {
        self.drop_off.first()
    }

    pub fn is_batched(&self) -> bool {
        self.batch_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn product_total(&self) -> f64 {
        self.products
            .iter()
            .map(|p| p.price * f64::from(p.quantity))
            .sum()
    }

    /// Locally records the server timestamp a status patch sets.
    pub fn stamp(&mut self, status: &OrderStatus, at: DateTime<Utc>) {
        match status {
            OrderStatus::Assigned => self.assigned_time = Some(at),
            OrderStatus::Cancelled => self.cancelled_time = Some(at),
            OrderStatus::Pickup => self.order_picked_up_time = Some(at),
            OrderStatus::OnTheWay => self.order_on_my_way_time = Some(at),
            OrderStatus::Delivered => self.delivery_time = Some(at),
            OrderStatus::Completed => self.order_completed_time = Some(at),
            OrderStatus::ReadyForPickup
            | OrderStatus::DeliveryFailed
            | OrderStatus::Unrecognized(_) => {}
        }
    }
}
