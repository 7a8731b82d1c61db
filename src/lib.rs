pub mod config;
pub mod dns;
pub mod error;
pub mod ip;
pub mod retry;
pub mod secrets;
pub mod updater;

pub use error::{Error, Result};
