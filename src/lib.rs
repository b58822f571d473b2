//! drivepick - random media from a remote folder tree
//!
//! Picks a random photo or video below a root folder of a remote drive.
//! Top-level folders are weighted by how many files they hold, deeper
//! levels are walked uniformly, and folder listings are kept in a
//! persistent cache so most picks need no listing requests at all.

pub mod cache;
pub mod cli;
pub mod config;
pub mod downloads;
pub mod drive;
pub mod error;
pub mod history;
pub mod select;

pub use error::{DrivepickError, DrivepickResult};
