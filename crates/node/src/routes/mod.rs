pub mod executor;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod payment;
