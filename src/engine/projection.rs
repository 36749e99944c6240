//! Order status projection: everything the rider sees about an order is
//! derived from its status here. All functions are pure and total.

use serde::Serialize;

use crate::geo::distance_label;
use crate::models::order::{Order, OrderStatus};
use crate::models::rider::GeoPoint;

const ADDRESS_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Route {
    AcceptDeclinePrompt,
    OrderDetailsScreen,
    OrderStartScreen,
    OrderDropoffScreen,
    OrderCompleteScreen,
    OrderReceipt,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::AcceptDeclinePrompt => "AcceptDeclinePrompt",
            Route::OrderDetailsScreen => "OrderDetailsScreen",
            Route::OrderStartScreen => "OrderStartScreen",
            Route::OrderDropoffScreen => "OrderDropoffScreen",
            Route::OrderCompleteScreen => "OrderCompleteScreen",
            Route::OrderReceipt => "OrderReceipt",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum RiderAction {
    AcceptOrDecline,
    ConfirmPickup,
    StartDelivery,
    ConfirmDelivery,
    CompleteOrder,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum ListTab {
    Pending,
    Active,
    Complete,
    Other,
}

impl ListTab {
    pub const ALL: [ListTab; 4] = [
        ListTab::Pending,
        ListTab::Active,
        ListTab::Complete,
        ListTab::Other,
    ];
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub background: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Projection {
    pub route: Route,
    pub action_label: &'static str,
    pub action: Option<RiderAction>,
    pub badge: Badge,
    pub tab: Option<ListTab>,
}

pub fn project(status: Option<&OrderStatus>) -> Projection {
    Projection {
        route: route_for(status),
        action_label: action_label(status),
        action: offered_action(status),
        badge: badge_for(status),
        tab: status.and_then(tab_for),
    }
}

pub fn route_for(status: Option<&OrderStatus>) -> Route {
    match status {
        Some(OrderStatus::ReadyForPickup) => Route::AcceptDeclinePrompt,
        Some(OrderStatus::Assigned) => Route::OrderDetailsScreen,
        Some(OrderStatus::Pickup) => Route::OrderStartScreen,
        Some(OrderStatus::OnTheWay) => Route::OrderDropoffScreen,
        Some(OrderStatus::Delivered) => Route::OrderCompleteScreen,
        Some(OrderStatus::Completed) => Route::OrderReceipt,
        _ => Route::OrderDetailsScreen,
    }
}

pub fn offered_action(status: Option<&OrderStatus>) -> Option<RiderAction> {
    match status {
        Some(OrderStatus::ReadyForPickup) => Some(RiderAction::AcceptOrDecline),
        Some(OrderStatus::Assigned) => Some(RiderAction::ConfirmPickup),
        Some(OrderStatus::Pickup) => Some(RiderAction::StartDelivery),
        Some(OrderStatus::OnTheWay) => Some(RiderAction::ConfirmDelivery),
        Some(OrderStatus::Delivered) => Some(RiderAction::CompleteOrder),
        _ => None,
    }
}

pub fn action_label(status: Option<&OrderStatus>) -> &'static str {
    match offered_action(status) {
        Some(RiderAction::AcceptOrDecline) => "Accept/Decline",
        Some(RiderAction::ConfirmPickup) => "Confirm Pickup",
        Some(RiderAction::StartDelivery) => "Start Delivery",
        Some(RiderAction::ConfirmDelivery) => "Confirm Delivery",
        Some(RiderAction::CompleteOrder) => "Complete Order",
        None if matches!(status, Some(OrderStatus::Completed)) => "View Receipt",
        None => "View Details",
    }
}

fn badge_colors(status: &OrderStatus) -> (&'static str, &'static str) {
    match status {
        OrderStatus::Assigned => ("#FFFCAD", "#8B8654"),
        OrderStatus::Pickup => ("#EDEDED", "#666666"),
        OrderStatus::OnTheWay => ("#FFD9AD", "#A67B4D"),
        OrderStatus::Delivered | OrderStatus::Completed => ("#D2FFAD", "#5C8C3E"),
        OrderStatus::Cancelled => ("#FFBDAD", "#A65D45"),
        OrderStatus::DeliveryFailed => ("#000000", "#FFFFFF"),
        OrderStatus::ReadyForPickup | OrderStatus::Unrecognized(_) => ("#DEE9FF", "#4A6FA5"),
    }
}

/// Unrecognised statuses keep their own text on the ReadyForPickup colours;
/// a missing status reads as ReadyForPickup.
pub fn badge_for(status: Option<&OrderStatus>) -> Badge {
    let label = match status {
        Some(status) if !status.as_str().is_empty() => status.as_str().to_string(),
        _ => OrderStatus::ReadyForPickup.as_str().to_string(),
    };
    let (background, text) = status.map_or(("#DEE9FF", "#4A6FA5"), badge_colors);
    Badge {
        label,
        background,
        text,
    }
}

pub fn tab_for(status: &OrderStatus) -> Option<ListTab> {
    match status {
        OrderStatus::ReadyForPickup => Some(ListTab::Pending),
        OrderStatus::Assigned | OrderStatus::Pickup | OrderStatus::OnTheWay => {
            Some(ListTab::Active)
        }
        OrderStatus::Delivered | OrderStatus::Completed => Some(ListTab::Complete),
        OrderStatus::Cancelled | OrderStatus::DeliveryFailed => Some(ListTab::Other),
        OrderStatus::Unrecognized(_) => None,
    }
}

pub fn shows_distance(status: Option<&OrderStatus>) -> bool {
    matches!(
        status,
        Some(
            OrderStatus::ReadyForPickup
                | OrderStatus::Assigned
                | OrderStatus::Pickup
                | OrderStatus::OnTheWay
        )
    )
}

pub fn order_tag(order_number: i64) -> String {
    format!("#{order_number:03}")
}

pub fn truncate_address(address: &str) -> String {
    let first_line = address.split(['\n', ',']).next().unwrap_or_default();
    if first_line.chars().count() > ADDRESS_PREVIEW_CHARS {
        let cut: String = first_line.chars().take(ADDRESS_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

/// Summary line shown for an order in the list view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderCard {
    pub id: String,
    pub tag: String,
    pub customer_name: String,
    pub pickup: String,
    pub drop_off: String,
    pub delivery_price: String,
    pub distance: Option<String>,
    pub batch_id: Option<String>,
    pub projection: Projection,
}

impl OrderCard {
    pub fn from_order(order: &Order, rider_position: Option<&GeoPoint>) -> Self {
        let distance = match (rider_position, order.first_pickup()) {
            (Some(here), Some(pickup))
                if shows_distance(order.status()) && pickup.point().is_set() =>
            {
                Some(distance_label(here, &pickup.point()))
            }
            _ => None,
        };

        Self {
            id: order.id.clone(),
            tag: order_tag(order.order_number),
            customer_name: order.customer_name.clone(),
            pickup: order
                .first_pickup()
                .map(|p| truncate_address(&p.from_address))
                .unwrap_or_default(),
            drop_off: order
                .first_drop_off()
                .map(|d| truncate_address(&d.to_address))
                .unwrap_or_default(),
            delivery_price: format!("{:.2} GH₵", order.delivery_price),
            distance,
            batch_id: order.batch_id.clone(),
            projection: project(order.status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_known_status_has_route_and_label() {
        for status in OrderStatus::ALL.iter() {
            let projection = project(Some(status));
            assert!(!projection.route.name().is_empty());
            assert!(!projection.action_label.is_empty());
            assert!(!projection.badge.label.is_empty());
            assert!(projection.tab.is_some(), "{status} has no tab");
        }
    }

    #[test]
    fn routes_follow_status() {
        let route = |s: &str| route_for(Some(&OrderStatus::from_wire(s)));

        assert_eq!(route("ReadyForPickup"), Route::AcceptDeclinePrompt);
        assert_eq!(route("Assigned"), Route::OrderDetailsScreen);
        assert_eq!(route("Pickup"), Route::OrderStartScreen);
        assert_eq!(route("OnTheWay"), Route::OrderDropoffScreen);
        assert_eq!(route("Delivered"), Route::OrderCompleteScreen);
        assert_eq!(route("Completed"), Route::OrderReceipt);
        assert_eq!(route("Cancelled"), Route::OrderDetailsScreen);
        assert_eq!(route("DeliveryFailed"), Route::OrderDetailsScreen);
    }

    #[test]
    fn unknown_status_falls_back_to_details_with_ready_badge() {
        let unknown = OrderStatus::from_wire("Unknown");
        let projection = project(Some(&unknown));
        let ready = badge_for(Some(&OrderStatus::ReadyForPickup));

        assert_eq!(projection.route, Route::OrderDetailsScreen);
        assert_eq!(projection.action, None);
        assert_eq!(projection.badge.background, ready.background);
        assert_eq!(projection.badge.text, ready.text);
        assert_eq!(projection.badge.label, "Unknown");
        assert_eq!(projection.tab, None);
    }

    #[test]
    fn missing_status_reads_as_ready_for_pickup() {
        let projection = project(None);

        assert_eq!(projection.route, Route::OrderDetailsScreen);
        assert_eq!(projection.badge, badge_for(Some(&OrderStatus::ReadyForPickup)));
    }

    #[test]
    fn terminal_statuses_offer_no_mutation_except_completion() {
        assert_eq!(
            offered_action(Some(&OrderStatus::Delivered)),
            Some(RiderAction::CompleteOrder)
        );
        for status in [
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::DeliveryFailed,
        ] {
            assert_eq!(offered_action(Some(&status)), None);
        }
        assert_eq!(action_label(Some(&OrderStatus::Completed)), "View Receipt");
    }

    #[test]
    fn tags_and_addresses() {
        assert_eq!(order_tag(7), "#007");
        assert_eq!(order_tag(1234), "#1234");
        assert_eq!(truncate_address("12 Oxford St, Osu, Accra"), "12 Oxford St");
        assert_eq!(
            truncate_address("A very long street name that keeps going on"),
            "A very long street name that k..."
        );
    }

    #[test]
    fn card_shows_distance_only_for_open_orders() {
        let mut order: Order = serde_json::from_value(json!({
            "id": "o1",
            "orderNumber": 3,
            "orderStatus": "Assigned",
            "deliveryPrice": 12,
            "pickup": [{"fromLatitude": 5.6, "fromLongitude": -0.18, "fromAddress": "Osu"}],
            "dropOff": [{"toLatitude": 5.62, "toLongitude": -0.17, "toAddress": "Labone"}]
        }))
        .unwrap();
        let here = GeoPoint {
            lat: 5.6,
            lng: -0.18,
        };

        let card = OrderCard::from_order(&order, Some(&here));
        assert_eq!(card.tag, "#003");
        assert_eq!(card.distance.as_deref(), Some("0.0 km away"));
        assert_eq!(card.delivery_price, "12.00 GH₵");

        order.order_status = Some(OrderStatus::Completed);
        let card = OrderCard::from_order(&order, Some(&here));
        assert!(card.distance.is_none());
    }
}
