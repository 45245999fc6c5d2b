//! Domain model for the pharmaceutical stock tracker.
//!
//! - [`drug`]: tracked batches and their expiration dates
//! - [`account`]: users, roles and notification preferences
//! - [`risk`]: expiration risk classification
//! - [`report`]: dashboard and analytics aggregates
//! - [`config`]: environment-driven configuration

pub mod account;
pub mod config;
pub mod drug;
pub mod error;
pub mod password;
pub mod report;
pub mod risk;

pub use account::*;
pub use config::Config;
pub use drug::*;
pub use error::*;
pub use risk::{classify, days_until_expiry, RiskBucket};
