//! Track reference validation and normalization.
//!
//! Track descriptors arrive from clients (via metadata unfurling on their
//! side) and are untrusted. Validation checks the provider, the URL host,
//! and the descriptive fields before a `TrackRef` is allowed onto a
//! message.

use serde::Deserialize;
use url::Url;

use crate::domain::entities::{TrackProvider, TrackRef};
use crate::shared::error::AppError;

/// Maximum length for title/artist fields.
const MAX_TEXT_LEN: usize = 200;

/// Raw, unvalidated track descriptor as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRefInput {
    pub provider: String,
    pub provider_id: String,
    pub url: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

/// Hosts accepted per provider. Subdomains of these are accepted too
/// (e.g. `m.soundcloud.com`, `*.bandcamp.com` artist pages).
fn allowed_hosts(provider: TrackProvider) -> &'static [&'static str] {
    match provider {
        TrackProvider::Spotify => &["open.spotify.com"],
        TrackProvider::AppleMusic => &["music.apple.com"],
        TrackProvider::Youtube => &["youtube.com", "youtu.be", "music.youtube.com"],
        TrackProvider::Soundcloud => &["soundcloud.com"],
        TrackProvider::Bandcamp => &["bandcamp.com"],
    }
}

fn host_matches(host: &str, allowed: &str) -> bool {
    host == allowed || host.ends_with(&format!(".{}", allowed))
}

fn validate_https_url(raw: &str, field: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|_| AppError::Validation(format!("Invalid {} URL", field)))?;
    if url.scheme() != "https" {
        return Err(AppError::Validation(format!("{} URL must use https", field)));
    }
    Ok(url)
}

/// Validate and normalize a raw track descriptor.
///
/// Returns a `TrackRef` with trimmed fields, or a `Validation` error
/// naming the first offending field.
pub fn validate_track_ref(input: &TrackRefInput) -> Result<TrackRef, AppError> {
    let provider = TrackProvider::parse(input.provider.trim())
        .ok_or_else(|| AppError::Validation(format!("Unknown track provider '{}'", input.provider)))?;

    let provider_id = input.provider_id.trim();
    if provider_id.is_empty() {
        return Err(AppError::Validation("Track provider id is required".into()));
    }

    let url = validate_https_url(input.url.trim(), "track")?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::Validation("Track URL has no host".into()))?;
    if !allowed_hosts(provider).iter().any(|a| host_matches(host, a)) {
        return Err(AppError::Validation(format!(
            "Track URL host '{}' does not match provider '{}'",
            host,
            provider.as_str()
        )));
    }

    let title = input.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation("Track title must be 1-200 characters".into()));
    }

    let artist = input.artist.trim();
    if artist.is_empty() || artist.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation("Track artist must be 1-200 characters".into()));
    }

    let artwork_url = match input.artwork_url.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(raw) => Some(validate_https_url(raw, "artwork")?.to_string()),
    };

    if let Some(0) = input.duration_seconds {
        return Err(AppError::Validation("Track duration must be positive".into()));
    }

    Ok(TrackRef {
        provider,
        provider_id: provider_id.to_string(),
        url: url.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        artwork_url,
        duration_seconds: input.duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn input() -> TrackRefInput {
        TrackRefInput {
            provider: "spotify".into(),
            provider_id: "4uLU6hMCjMI75M1A2tKUQC".into(),
            url: "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC".into(),
            title: "Never Gonna Give You Up".into(),
            artist: "Rick Astley".into(),
            artwork_url: None,
            duration_seconds: Some(213),
        }
    }

    #[test]
    fn accepts_valid_descriptor() {
        let track = validate_track_ref(&input()).unwrap();
        assert_eq!(track.provider, TrackProvider::Spotify);
        assert_eq!(track.title, "Never Gonna Give You Up");
        assert_eq!(track.duration_seconds, Some(213));
    }

    #[test]
    fn trims_and_normalizes_fields() {
        let mut raw = input();
        raw.title = "  Blue Monday  ".into();
        raw.artist = " New Order ".into();
        let track = validate_track_ref(&raw).unwrap();
        assert_eq!(track.title, "Blue Monday");
        assert_eq!(track.artist, "New Order");
    }

    #[test_case("spotify", "https://open.spotify.com/track/abc" ; "spotify host")]
    #[test_case("youtube", "https://youtu.be/dQw4w9WgXcQ" ; "youtube short host")]
    #[test_case("youtube", "https://music.youtube.com/watch?v=abc" ; "youtube music host")]
    #[test_case("soundcloud", "https://m.soundcloud.com/artist/track" ; "soundcloud subdomain")]
    #[test_case("bandcamp", "https://artist.bandcamp.com/track/song" ; "bandcamp artist page")]
    fn accepts_provider_hosts(provider: &str, url: &str) {
        let mut raw = input();
        raw.provider = provider.into();
        raw.url = url.into();
        assert!(validate_track_ref(&raw).is_ok());
    }

    #[test_case("tidal" ; "unknown provider")]
    #[test_case("" ; "empty provider")]
    fn rejects_unknown_providers(provider: &str) {
        let mut raw = input();
        raw.provider = provider.into();
        assert!(matches!(
            validate_track_ref(&raw),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_host_provider_mismatch() {
        let mut raw = input();
        raw.url = "https://evil.example.com/track/abc".into();
        let err = validate_track_ref(&raw).unwrap_err();
        assert!(err.to_string().contains("does not match provider"));
    }

    #[test]
    fn rejects_plain_http() {
        let mut raw = input();
        raw.url = "http://open.spotify.com/track/abc".into();
        assert!(matches!(
            validate_track_ref(&raw),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_title_and_zero_duration() {
        let mut raw = input();
        raw.title = "   ".into();
        assert!(validate_track_ref(&raw).is_err());

        let mut raw = input();
        raw.duration_seconds = Some(0);
        assert!(validate_track_ref(&raw).is_err());
    }

    #[test]
    fn blank_artwork_is_dropped() {
        let mut raw = input();
        raw.artwork_url = Some("  ".into());
        let track = validate_track_ref(&raw).unwrap();
        assert!(track.artwork_url.is_none());
    }
}
