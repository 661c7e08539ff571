//! SoundNext media proxy library
//!
//! This library resolves SoundCloud track and playlist URLs, searches the
//! catalog, downloads audio into a local cache exactly once per track and
//! re-serves cached audio with HTTP range support. A small liked-tracks list
//! is persisted next to the cache and eagerly pre-cached in the background.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local media server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error type shared by every component
//! - `management` - Cache store, download coordination and the likes store
//! - `server` - Router assembly, shared state and the server loop
//! - `soundcloud` - SoundCloud client id scraping, catalog and media access
//! - `streaming` - Range-aware file responses
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use soundnext::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> soundnext::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env();
//!     server::start_api_server(settings).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod soundcloud;
pub mod streaming;
pub mod types;
pub mod utils;

pub use error::{Error, ErrorKind};

/// A convenient Result type alias for operations that may fail.
///
/// Used by the CLI and server bootstrap where failures of different origins
/// (configuration, I/O, library errors) are only reported, never matched on.
/// Library components return [`error::Result`] instead.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates in the CLI.
///
/// # Example
///
/// ```
/// info!("Serving cache from {}", dir.display());
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Cached {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Only used from the CLI for
/// failures the user has to fix before retrying.
///
/// # Example
///
/// ```
/// error!("Failed to bind {}", addr);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Liked list is empty, nothing to keep");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
