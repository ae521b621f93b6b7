pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod locate;
pub mod pattern;

pub use error::{LocateError, Result};
