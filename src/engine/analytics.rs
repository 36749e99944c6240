use crate::error::AppResult;
use crate::models::analytics::{AnalyticsSummary, DateWindow, StatusBreakdown};
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

fn is_finished(order: &Order) -> bool {
    matches!(
        order.status(),
        Some(OrderStatus::Delivered | OrderStatus::Completed)
    )
}

pub fn breakdown(orders: &[&Order]) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for order in orders {
        match order.status() {
            Some(OrderStatus::ReadyForPickup) => breakdown.pending += 1,
            Some(OrderStatus::Assigned | OrderStatus::Pickup | OrderStatus::OnTheWay) => {
                breakdown.active += 1
            }
            Some(OrderStatus::Delivered | OrderStatus::Completed) => breakdown.complete += 1,
            Some(OrderStatus::Cancelled | OrderStatus::DeliveryFailed) => breakdown.failed += 1,
            Some(OrderStatus::Unrecognized(_)) | None => {}
        }
    }
    breakdown
}

/// Earnings and time spent over orders created inside `window`. Orders
/// without a creation time are left out.
pub fn summarize(orders: &[Order], window: DateWindow) -> AnalyticsSummary {
    let in_window: Vec<&Order> = orders
        .iter()
        .filter(|order| order.created_at.is_some_and(|at| window.contains(at)))
        .collect();

    let finished: Vec<&Order> = in_window.iter().copied().filter(|o| is_finished(o)).collect();

    let total_earnings: f64 = finished.iter().map(|order| order.delivery_price).sum();

    let hours: f64 = finished
        .iter()
        .filter_map(|order| match (order.created_at, order.order_completed_time) {
            (Some(created), Some(completed)) if completed >= created => {
                Some((completed - created).num_milliseconds() as f64 / 3_600_000.0)
            }
            _ => None,
        })
        .sum();

    let total_orders = in_window.len();
    let average_delivery_hours = if total_orders == 0 {
        0.0
    } else {
        hours / total_orders as f64
    };

    AnalyticsSummary {
        window,
        total_earnings,
        total_orders,
        total_hours: hours.round() as i64,
        average_delivery_hours,
        breakdown: breakdown(&in_window),
    }
}

pub async fn fetch_analytics(state: &AppState, window: DateWindow) -> AppResult<AnalyticsSummary> {
    let courier_name = state.courier_name().await?;
    let orders = state.backend.fetch_orders(&courier_name).await?;
    Ok(summarize(&orders, window))
}
