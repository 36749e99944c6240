use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::engine::projection::{tab_for, ListTab};
use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TabCounts {
    pub pending: usize,
    pub active: usize,
    pub complete: usize,
    pub other: usize,
}

/// A view's local copy of the rider's orders. Status changes are mirrored
/// here ahead of the backend's answer and rolled back if it refuses.
#[derive(Default)]
pub struct OrderBoard {
    orders: DashMap<String, Order>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole board with a fresh fetch.
    pub fn replace_all(&self, orders: Vec<Order>) {
        self.orders.clear();
        for order in orders {
            self.orders.insert(order.id.clone(), order);
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.orders.get(id).map(|entry| entry.value().clone())
    }

    /// All orders by order number, then id.
    pub fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| {
            a.order_number
                .cmp(&b.order_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        orders
    }

    pub fn by_tab(&self, tab: ListTab) -> Vec<Order> {
        self.orders()
            .into_iter()
            .filter(|order| order.status().and_then(tab_for) == Some(tab))
            .collect()
    }

    pub fn tab_counts(&self) -> TabCounts {
        let mut counts = HashMap::new();
        for entry in self.orders.iter() {
            if let Some(tab) = entry.value().status().and_then(tab_for) {
                *counts.entry(tab).or_insert(0usize) += 1;
            }
        }
        let count = |tab: ListTab| counts.get(&tab).copied().unwrap_or_default();

        TabCounts {
            pending: count(ListTab::Pending),
            active: count(ListTab::Active),
            complete: count(ListTab::Complete),
            other: count(ListTab::Other),
        }
    }

    pub fn batch_siblings(&self, batch_id: &str) -> Vec<Order> {
        self.orders()
            .into_iter()
            .filter(|order| order.batch_id.as_deref() == Some(batch_id))
            .collect()
    }

    /// Applies `status` locally and returns the copy it replaced.
    pub fn mirror(&self, id: &str, status: &OrderStatus, at: DateTime<Utc>) -> Option<Order> {
        let mut entry = self.orders.get_mut(id)?;
        let previous = (*entry).clone();
        entry.order_status = Some(status.clone());
        entry.stamp(status, at);
        Some(previous)
    }

    pub fn restore(&self, previous: Order) {
        self.orders.insert(previous.id.clone(), previous);
    }
}
