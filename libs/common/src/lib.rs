//! Common library for the clinic desk application
//!
//! This crate provides shared functionality used across the clinic services,
//! including database connectivity, error handling and the in-process event
//! broadcaster that feeds server-sent event streams.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod database;
pub mod error;
