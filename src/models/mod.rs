pub mod analytics;
pub mod order;
pub mod rider;
pub mod wire;
