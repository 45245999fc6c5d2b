//! Expiration alert scheduling.
//!
//! [`select_at_risk`] picks the drugs that warrant an alert right now.
//! [`AlertScheduler`] runs that selection on a fixed interval and sends one
//! message per opted-in account through a [`pharmatrack_notify::Notifier`].

pub mod error;
pub mod scheduler;
pub mod selection;

pub use error::AlertError;
pub use scheduler::{AlertScheduler, AlertSettings, TickReport};
pub use selection::{select_at_risk, InvalidDrug, Selection};
