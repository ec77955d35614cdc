pub mod api;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod locator;
pub mod messages;
pub mod naming;
pub mod pipeline;
pub mod session;
pub mod transport;

pub use error::{Error, Outcome, Result, Unavailability};
