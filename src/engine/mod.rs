pub mod analytics;
pub mod board;
pub mod lifecycle;
pub mod projection;
pub mod tracking;
