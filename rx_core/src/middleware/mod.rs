//! Middleware components for the health endpoints

pub mod authorization;
pub mod health;
pub mod logging;
