//! # CLI Module
//!
//! This module provides the command-line interface layer for SoundNext. It
//! implements all user-facing commands and wires them to the same components
//! the HTTP server uses, so a track cached from the terminal is served by the
//! running server without another download.
//!
//! ## Commands
//!
//! ### Server
//!
//! - [`serve`] - Runs the media server, optionally opening the web UI once
//!   `/health` answers
//!
//! ### Audio
//!
//! - [`download`] - Resolves a track URL and caches its audio
//!
//! ### Liked tracks
//!
//! - [`likes`] - Prints the liked-track list as a table, including whether
//!   each track is cached
//!
//! ### Cache maintenance
//!
//! - [`cache_trim`] - Deletes cached audio of tracks that are not liked. The
//!   desktop shell runs this on shutdown.
//! - [`cache_clear`] - Deletes every cached file
//! - [`cache_stats`] - Shows file count and size of the cache
//!
//! ## Output
//!
//! User-facing output goes through the colored `info!`, `success!`,
//! `warning!` and `error!` macros; `error!` terminates with exit code 1.
//! Library components below log through `tracing` instead.
//!
//! ## Usage Patterns
//!
//! ```bash
//! soundnext serve --open                                  # Start and open the UI
//! soundnext download https://soundcloud.com/artist/track  # Cache one track
//! soundnext likes                                         # List liked tracks
//! soundnext cache trim                                    # Keep liked audio only
//! ```

mod cache;
mod download;
mod likes;
mod serve;

pub use cache::{cache_clear, cache_stats, cache_trim};
pub use download::download;
pub use likes::likes;
pub use serve::serve;
