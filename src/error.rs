//! # Error Types
//!
//! This module defines the error types for the hymnal crate.
//!
//! Most of the page-facing surface degrades instead of failing: malformed time
//! markers become `0`, malformed stored preferences become "nothing saved".
//! `HymnalError` is returned from the places where a caller can act on the
//! failure (loading page data, reading config, writing the preference store).
//!
//! ## Error Types
//! - `Timecode` - An authored cue time (`m:ss.s`) could not be read
//! - `Content` - Page data is not valid JSON or misses required fields
//! - `Storage` - The preference store could not be read or written
//! - `Config` - YAML configuration is invalid
//! - `NotFound` - A level/year/hymn path does not exist in the page data
//! - `Action` - A scripted page action (`font+`, `speed=1.25`) is malformed
//!
//! ## Usage
//! ```rust
//! use hymnal::{parse_timecode, HymnalError};
//!
//! match parse_timecode("1:xx") {
//!     Ok(ms) => println!("{} ms", ms),
//!     Err(HymnalError::Timecode { input, message }) => {
//!         eprintln!("bad cue time '{}': {}", input, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HymnalError {
    /// Authored cue time could not be parsed.
    ///
    /// # Example
    /// ```
    /// # use hymnal::HymnalError;
    /// let err = HymnalError::Timecode {
    ///     input: "1:xx".to_string(),
    ///     message: "invalid seconds field".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid timecode '1:xx': invalid seconds field");
    /// ```
    #[error("Invalid timecode '{input}': {message}")]
    Timecode { input: String, message: String },

    /// Page data could not be decoded.
    #[error("Invalid page data: {0}")]
    Content(String),

    /// Preference store failure.
    #[error("Preference store error: {0}")]
    Storage(String),

    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use hymnal::HymnalError;
    /// let err = HymnalError::Config("font.min must not exceed font.max".to_string());
    /// assert_eq!(err.to_string(), "Invalid config: font.min must not exceed font.max");
    /// ```
    #[error("Invalid config: {0}")]
    Config(String),

    /// Lookup of a level, year or hymn failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Scripted page action could not be read.
    #[error("Invalid page action '{0}'")]
    Action(String),
}

impl From<serde_json::Error> for HymnalError {
    fn from(e: serde_json::Error) -> Self {
        HymnalError::Content(e.to_string())
    }
}

impl From<serde_yaml::Error> for HymnalError {
    fn from(e: serde_yaml::Error) -> Self {
        HymnalError::Config(e.to_string())
    }
}

impl From<std::io::Error> for HymnalError {
    fn from(e: std::io::Error) -> Self {
        HymnalError::Storage(e.to_string())
    }
}

/// Failure reported by a playback source when asked to start playing.
///
/// The synchronizer never propagates this; it is logged and dropped so the
/// highlight keeps following the user's click.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The host refused programmatic playback (autoplay policy).
    #[error("Playback not allowed: {0}")]
    NotAllowed(String),

    /// No media is loaded into the source.
    #[error("No media loaded")]
    NoMedia,
}
