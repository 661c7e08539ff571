//! # SoundCloud Integration Module
//!
//! This module is the only part of SoundNext that talks to SoundCloud. It
//! covers three concerns:
//!
//! - [`auth`] - obtaining the anonymous `client_id` every api-v2 call needs.
//!   SoundCloud publishes no endpoint for it, so [`auth::CredentialProvider`]
//!   scans the JavaScript bundles of the landing page for the first 32
//!   character alphanumeric token holding both a digit and a letter. The
//!   heuristic is coupled to an unversioned bundle format; keeping it behind
//!   the provider lets it be replaced (or bypassed with a configured id)
//!   without touching anything else.
//! - [`catalog`] - search, URL resolution and track lookup with a single
//!   transparent retry when the upstream rejects the client id.
//! - [`media`] - turning a track's transcodings into an audio byte stream.
//!
//! ## API Coverage
//!
//! - `GET /search/tracks` - free text track search
//! - `GET /resolve` - public URL to track or playlist
//! - `GET /tracks/{id}` - single track with media transcodings
//! - `GET /tracks?ids=` - batch lookup used to hydrate playlist stubs
//! - `GET <transcoding url>` - exchange for a signed media URL
//!
//! ## Error Types
//!
//! All functions return [`crate::error::Result`]. Resolution failures are
//! folded into [`crate::Error::ResolutionFailed`], search failures surface as
//! [`crate::Error::Upstream`], and credential exhaustion after the retry is
//! reported as whatever the second attempt produced.

pub mod auth;
pub mod catalog;
pub mod media;

pub use auth::{AccessToken, CredentialProvider};
pub use catalog::CatalogClient;
pub use media::AudioStream;

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Builds the HTTP client shared by every upstream call.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()
}
