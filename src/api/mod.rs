//! # API Module
//!
//! HTTP handlers of the local media server. The web UI and the desktop shell
//! talk to these endpoints; every handler reaches the components through
//! [`crate::server::AppState`].
//!
//! ## Endpoints
//!
//! ### Catalog
//!
//! - [`search`] - `GET /search?q=&limit=`, track search
//! - [`track_info`] - `GET /track-info?url=`, metadata of one track
//! - [`playlist`] - `GET /playlist?url=`, a playlist with all its tracks
//!
//! ### Audio
//!
//! - [`stream`] - `GET /stream?url=`, cached audio served `inline`
//! - [`download`] - `GET /download?url=`, the same audio as an `attachment`
//!
//! Both honor single `Range` requests so players can seek.
//!
//! ### Likes and cache
//!
//! - [`list_likes`], [`add_like`], [`replace_likes`], [`remove_like`] -
//!   `GET`/`POST`/`PUT /likes` and `DELETE /likes/{id}`
//! - [`delete_cached`], [`clear_cache`] - `DELETE /cache/{id}` and
//!   `DELETE /cache`
//!
//! ### Monitoring
//!
//! - [`health`] - cache statistics, liked count and credential age
//! - [`root`] - version and endpoint listing
//!
//! ## Errors
//!
//! Handlers return [`ApiError`], which renders `{"detail": "<message>"}` with
//! the status derived from [`crate::ErrorKind`]. Request bodies, query strings
//! and path segments are taken through [`JsonBody`], [`QueryParams`] and
//! [`PathParam`], so a malformed request gets the same 400 shape.

mod cache;
mod error;
mod extract;
mod health;
mod likes;
mod root;
mod search;
mod tracks;

pub use cache::{clear_cache, delete_cached};
pub use error::{ApiError, status_for};
pub use extract::{JsonBody, PathParam, QueryParams};
pub use health::health;
pub use likes::{add_like, list_likes, remove_like, replace_likes};
pub use root::root;
pub use search::search;
pub use tracks::{download, playlist, stream, track_info};
