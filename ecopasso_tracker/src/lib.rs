use const_format::concatcp;

pub mod config;
pub mod error;
pub mod notify;
pub mod pending;
pub mod replay;
pub mod session;
pub mod submit;

pub use error::TrackerError;

pub const DATA_DIR: &str = "data/";
pub const PENDING_FILE: &str = "unsent_trips.json";
pub const DEFAULT_PENDING_PATH: &str = concatcp!(DATA_DIR, PENDING_FILE);
