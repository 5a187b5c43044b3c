//! PostgreSQL persistence for generated study plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
