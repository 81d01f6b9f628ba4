pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod history;
pub mod matcher;
pub mod monitor;
pub mod notify;
pub mod scheduler;
pub mod state;

pub use error::{MonitorError, Result};
