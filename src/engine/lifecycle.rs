use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::api::auth::validate_otp_code;
use crate::api::orders::StatusPatch;
use crate::engine::projection::{offered_action, RiderAction};
use crate::error::{AppError, AppResult};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Fresh fetch of the rider's orders into the board.
pub async fn load_orders(state: &AppState) -> AppResult<usize> {
    let courier_name = state.courier_name().await?;
    let orders = state.backend.fetch_orders(&courier_name).await?;
    let count = orders.len();
    state.board.replace_all(orders);
    Ok(count)
}

pub async fn accept_order(state: &AppState, order_id: &str) -> AppResult<Order> {
    advance(state, order_id, RiderAction::AcceptOrDecline, OrderStatus::Assigned).await
}

pub async fn decline_order(state: &AppState, order_id: &str) -> AppResult<Order> {
    advance(state, order_id, RiderAction::AcceptOrDecline, OrderStatus::Cancelled).await
}

pub async fn confirm_pickup(state: &AppState, order_id: &str) -> AppResult<Order> {
    advance(state, order_id, RiderAction::ConfirmPickup, OrderStatus::Pickup).await
}

pub async fn start_delivery(state: &AppState, order_id: &str) -> AppResult<Order> {
    advance(state, order_id, RiderAction::StartDelivery, OrderStatus::OnTheWay).await
}

/// Checks the customer's code with the backend before marking the order
/// delivered.
pub async fn confirm_delivery(state: &AppState, order_id: &str, otp: &str) -> AppResult<Order> {
    validate_otp_code(otp)?;
    let order = offered(state, order_id, RiderAction::ConfirmDelivery)?;

    state.backend.validate_delivery_otp(&order.id, otp).await?;
    advance(state, order_id, RiderAction::ConfirmDelivery, OrderStatus::Delivered).await
}

pub async fn complete_order(state: &AppState, order_id: &str) -> AppResult<Order> {
    advance(state, order_id, RiderAction::CompleteOrder, OrderStatus::Completed).await
}

fn offered(state: &AppState, order_id: &str, action: RiderAction) -> AppResult<Order> {
    let order = state
        .board
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if offered_action(order.status()) != Some(action) {
        return Err(AppError::Validation(format!(
            "order {} is {} and cannot be changed this way",
            order.id,
            order
                .status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "without status".to_string())
        )));
    }
    Ok(order)
}

/// Orders a batched action applies to: the order itself plus every batch
/// sibling that offers the same action. Delivery is confirmed one order at a
/// time since each customer holds their own code.
fn targets_for(state: &AppState, order: &Order, action: RiderAction) -> Vec<Order> {
    let batch_id = match order.batch_id.as_deref() {
        Some(batch_id) if order.is_batched() && action != RiderAction::ConfirmDelivery => batch_id,
        _ => return vec![order.clone()],
    };

    let (targets, skipped): (Vec<Order>, Vec<Order>) = state
        .board
        .batch_siblings(batch_id)
        .into_iter()
        .partition(|sibling| {
            sibling.id == order.id || offered_action(sibling.status()) == Some(action)
        });
    if !skipped.is_empty() {
        debug!(
            batch_id,
            skipped = ?skipped.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            "batch siblings left as they are"
        );
    }
    targets
}

/// Moves the order, and its eligible batch siblings, to `status`. The board
/// mirrors the change first and is restored if the backend refuses.
async fn advance(
    state: &AppState,
    order_id: &str,
    action: RiderAction,
    status: OrderStatus,
) -> AppResult<Order> {
    let order = offered(state, order_id, action)?;
    let targets = targets_for(state, &order, action);
    let at = Utc::now();

    let previous: Vec<Order> = targets
        .iter()
        .filter_map(|target| state.board.mirror(&target.id, &status, at))
        .collect();

    let outcomes = join_all(targets.iter().map(|target| {
        let patch = StatusPatch::transition(target, status.clone(), at);
        async move {
            let result = state.backend.patch_order(&target.id, &patch).await;
            (target.id.clone(), result)
        }
    }))
    .await;

    let mut succeeded = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in outcomes {
        match result {
            Ok(()) => succeeded.push(id),
            Err(err) => failures.push((id, err)),
        }
    }

    if failures.is_empty() {
        info!(
            order_id = %order.id,
            status = %status,
            orders = succeeded.len(),
            "order advanced"
        );
        return state
            .board
            .get(&order.id)
            .ok_or_else(|| AppError::NotFound(format!("order {}", order.id)));
    }

    for prior in previous.iter().cloned() {
        state.board.restore(prior);
        state.metrics.optimistic_rollbacks_total.inc();
    }

    if targets.len() == 1 {
        let (_, err) = failures.remove(0);
        warn!(order_id = %order.id, error = %err, "order update rejected");
        return Err(err);
    }

    let uncompensated = compensate(state, &previous, &succeeded, at).await;
    let failed: Vec<String> = failures.into_iter().map(|(id, _)| id).collect();
    error!(
        batch_id = order.batch_id.as_deref().unwrap_or_default(),
        ?failed,
        ?uncompensated,
        "batch update incomplete"
    );

    Err(AppError::BatchIncomplete {
        failed,
        uncompensated,
    })
}

/// Reverts siblings whose patch already landed. Returns the ids that could
/// not be put back.
async fn compensate(
    state: &AppState,
    previous: &[Order],
    succeeded: &[String],
    at: DateTime<Utc>,
) -> Vec<String> {
    let reverts = previous
        .iter()
        .filter(|prior| succeeded.contains(&prior.id))
        .map(|prior| async move {
            let Some(status) = prior.order_status.clone() else {
                return Err(prior.id.clone());
            };
            state
                .backend
                .patch_order(&prior.id, &StatusPatch::revert(status, at))
                .await
                .map_err(|err| {
                    warn!(order_id = %prior.id, error = %err, "compensating update failed");
                    prior.id.clone()
                })
        });

    join_all(reverts)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect()
}
