use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use unicode_normalization::UnicodeNormalization;

/// Length of a SoundCloud client id as found in the web bundle.
pub const CLIENT_ID_LEN: usize = 32;

fn script_src_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<script[^>]*\bsrc="([^"]+\.js[^"]*)""#)
            .expect("script src pattern is valid")
    })
}

fn alnum_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("alphanumeric pattern is valid"))
}

/// Collects the script URLs referenced by a landing page, in document order.
///
/// Relative and protocol-relative sources are resolved against `base`; sources
/// that cannot be turned into an absolute URL are skipped.
pub fn extract_script_urls(html: &str, base: &str) -> Vec<String> {
    let base = Url::parse(base).ok();
    script_src_regex()
        .captures_iter(html)
        .filter_map(|caps| {
            let src = caps.get(1)?.as_str();
            match Url::parse(src) {
                Ok(url) => Some(url.to_string()),
                Err(_) => base.as_ref()?.join(src).ok().map(|u| u.to_string()),
            }
        })
        .collect()
}

/// Returns true for a 32 character alphanumeric token holding at least one
/// digit and one letter.
pub fn is_client_id_candidate(token: &str) -> bool {
    token.len() == CLIENT_ID_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric())
        && token.chars().any(|c| c.is_ascii_digit())
        && token.chars().any(|c| c.is_ascii_alphabetic())
}

/// Finds the first client id candidate in a script body.
///
/// Only whole alphanumeric runs are considered, so a 32 character window
/// inside a longer hash never matches.
pub fn find_client_id(script: &str) -> Option<String> {
    alnum_run_regex()
        .find_iter(script)
        .map(|m| m.as_str())
        .find(|token| is_client_id_candidate(token))
        .map(str::to_string)
}

fn sanitize_component(value: &str, fallback: &str) -> String {
    let ascii: String = value
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let trimmed = ascii.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds an ASCII-only `"Artist - Title.mp3"` file name.
///
/// Accents are folded (`Björk` becomes `Bjork`), every other character outside
/// alphanumerics, space, `-` and `_` is dropped. Empty parts fall back to
/// `Unknown` and `Track`.
pub fn safe_filename(artist: &str, title: &str) -> String {
    format!(
        "{} - {}.mp3",
        sanitize_component(artist, "Unknown"),
        sanitize_component(title, "Track")
    )
}

/// The unsanitized `"Artist - Title.mp3"` name used for the UTF-8
/// `filename*` parameter.
pub fn display_filename(artist: &str, title: &str) -> String {
    let artist = artist.trim();
    let title = title.trim();
    format!(
        "{} - {}.mp3",
        if artist.is_empty() { "Unknown" } else { artist },
        if title.is_empty() { "Track" } else { title }
    )
}

/// Formats a `Content-Disposition` value carrying both an ASCII fallback and
/// the RFC 5987 percent-encoded UTF-8 name.
pub fn content_disposition(disposition: &str, display_name: &str, ascii_name: &str) -> String {
    format!(
        "{disposition}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}",
        encoded = urlencoding::encode(display_name)
    )
}

/// Checks that `url` lives under the SoundCloud web origin.
pub fn is_soundcloud_url(url: &str, web_url: &str) -> bool {
    let web_url = web_url.trim_end_matches('/');
    match url.strip_prefix(web_url) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Renders milliseconds as `m:ss`.
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Extracts the segment URLs of an HLS media playlist, resolving relative
/// entries against the playlist URL.
pub fn hls_segment_urls(playlist: &str, playlist_url: &str) -> Vec<String> {
    let base = Url::parse(playlist_url).ok();
    playlist
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Url::parse(line) {
            Ok(url) => Some(url.to_string()),
            Err(_) => base.as_ref()?.join(line).ok().map(|u| u.to_string()),
        })
        .collect()
}
