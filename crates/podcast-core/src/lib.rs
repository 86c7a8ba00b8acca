//! Shared core of the podcast client: data model, catalog access, favourites
//! persistence, the playback slot and the view-state machine that ties them
//! together.  Rendering lives in the `podcast-tui` crate.

pub mod catalog;
pub mod config;
pub mod error;
pub mod favourites;
pub mod genres;
pub mod models;
pub mod platform;
pub mod playback;
pub mod storage;
pub mod view_state;

pub use error::{Error, Result};
