use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::api::{BackendClient, ORDERS_TABLE};
use crate::error::{AppError, AppResult};
use crate::models::order::{Order, OrderStatus};
use crate::models::wire;

/// Body of `PATCH /delikaquickshipper_orders_table/{id}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    pub order_status: OrderStatus,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub assigned_time: Option<DateTime<Utc>>,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub cancelled_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "orderPickedUpTime",
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_picked_up_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "orderOnmywayTime",
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_on_my_way_time: Option<DateTime<Utc>>,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<DateTime<Utc>>,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_received_time: Option<DateTime<Utc>>,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_delivered_time: Option<DateTime<Utc>>,
    #[serde(with = "wire::timestamp", skip_serializing_if = "Option::is_none")]
    pub order_completed_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(with = "wire::timestamp")]
    pub update_time: Option<DateTime<Utc>>,
}

impl StatusPatch {
    fn bare(status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            order_status: status,
            assigned_time: None,
            cancelled_time: None,
            order_picked_up_time: None,
            order_on_my_way_time: None,
            delivery_time: None,
            order_received_time: None,
            order_delivered_time: None,
            order_completed_time: None,
            completed: None,
            update_time: Some(at),
        }
    }

    /// Moves `order` to `status`, stamping the event field that status owns.
    /// Completion echoes the server's earlier timestamps back.
    pub fn transition(order: &Order, status: OrderStatus, at: DateTime<Utc>) -> Self {
        let mut patch = Self::bare(status, at);
        match &patch.order_status {
            OrderStatus::Assigned => patch.assigned_time = Some(at),
            OrderStatus::Cancelled => patch.cancelled_time = Some(at),
            OrderStatus::Pickup => patch.order_picked_up_time = Some(at),
            OrderStatus::OnTheWay => patch.order_on_my_way_time = Some(at),
            OrderStatus::Delivered => patch.delivery_time = Some(at),
            OrderStatus::Completed => {
                patch.order_completed_time = Some(at);
                patch.order_received_time = order.order_received_time;
                patch.order_picked_up_time = order.order_picked_up_time;
                patch.order_delivered_time = order.order_delivered_time.or(order.delivery_time);
                patch.completed = Some(true);
            }
            OrderStatus::ReadyForPickup
            | OrderStatus::DeliveryFailed
            | OrderStatus::Unrecognized(_) => {}
        }
        patch
    }

    /// Compensating patch: restores a previous status without event stamps.
    pub fn revert(status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self::bare(status, at)
    }
}

/// Keeps only orders whose `courierName` exactly matches the rider.
pub fn filter_by_courier(orders: Vec<Order>, courier_name: &str) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| order.courier_name == courier_name)
        .collect()
}

impl BackendClient {
    pub async fn fetch_orders(&self, courier_name: &str) -> AppResult<Vec<Order>> {
        let request = self.request(Method::GET, ORDERS_TABLE);
        let orders: Vec<Order> = self.send_json("orders.list", request).await?;
        let total = orders.len();
        let mine = filter_by_courier(orders, courier_name);

        info!(total, assigned = mine.len(), "orders fetched");
        Ok(mine)
    }

    pub async fn patch_order(&self, order_id: &str, patch: &StatusPatch) -> AppResult<()> {
        if order_id.trim().is_empty() {
            return Err(AppError::Validation("order id cannot be empty".to_string()));
        }

        let request = self
            .request(Method::PATCH, &format!("{ORDERS_TABLE}/{order_id}"))
            .json(patch);
        self.send("orders.patch", request).await?;

        info!(order_id, status = %patch.order_status, "order status patched");
        Ok(())
    }

    pub async fn validate_delivery_otp(&self, order_id: &str, otp: &str) -> AppResult<()> {
        let request = self
            .request(Method::POST, "validate_otp")
            .json(&json!({ "orderId": order_id, "otp": otp }));

        match self.send("orders.validate_otp", request).await {
            Ok(_) => Ok(()),
            Err(AppError::Backend { status, .. }) if status.is_client_error() => {
                Err(AppError::Validation("Invalid OTP".to_string()))
            }
            Err(err) => Err(err),
        }
    }
}
