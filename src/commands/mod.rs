//! Command implementations for the openwatch CLI

mod check;
mod misc;
mod monitor;
mod notify;

pub use check::*;
pub use misc::*;
pub use monitor::*;
pub use notify::*;
