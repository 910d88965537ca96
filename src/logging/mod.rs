//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::{Logger, Tally};
pub use subscriber::init_subscriber;
pub use types::{Log, TaskEntry, TaskStatus};
