//! `rshare` - A local ride board
//!
//! This library provides the core functionality for posting rider requests and
//! driver rides, matching them by hand, and keeping a history of completed
//! rides in a store that several processes can share.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fare;
pub mod logging;
pub mod ride;
pub mod storage;
pub mod sync;
pub mod view;

pub use board::Board;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use ride::{DriverPost, DriverProfile, HistoryEntry, RideStatus, RiderRequest};
pub use storage::{Storage, StorageStats};
