//! Provider-agnostic content model
//!
//! The normalized shapes every upstream payload is mapped into before it
//! crosses a crate boundary. Transformation functions live next to each
//! provider client; the types here carry no provider-specific fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Content kinds the backend can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
    Radio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Radio => "radio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a requested kind falls outside the supported set
#[derive(Debug, Clone, Error)]
#[error("unsupported media kind: {0}")]
pub struct UnsupportedMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnsupportedMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "radio" => Ok(Self::Radio),
            other => Err(UnsupportedMediaKind(other.to_string())),
        }
    }
}

/// Origin of a playable/embeddable reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceProvider {
    VideoPlatform,
    Archive,
    Custom,
}

/// Whether a source is embedded in a player or streamed directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Embed,
    Direct,
}

/// One subtitle track attached to a stream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub language: String,
    pub url: String,
}

/// One playable/embeddable reference, owned by its parent item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {
    pub provider: SourceProvider,
    pub url: String,
    pub quality: Option<String>,
    pub delivery: Delivery,
    pub language: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    pub active: bool,
}

impl StreamSource {
    /// Trailers are the embeddable references from the video platform
    pub fn is_trailer(&self) -> bool {
        self.provider == SourceProvider::VideoPlatform && self.delivery == Delivery::Embed
    }
}

/// Provider-agnostic view of a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub external_id: String,
    pub title: String,
    pub kind: MediaKind,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    pub popularity: f64,
    pub rating: f64,
    pub year: Option<i32>,
    pub overview: Option<String>,
    #[serde(default)]
    pub sources: Vec<StreamSource>,
}

impl NormalizedItem {
    pub fn has_trailer(&self) -> bool {
        self.sources.iter().any(StreamSource::is_trailer)
    }
}

/// Directory-sourced radio station, served live with short-lived caching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioStationRecord {
    pub station_id: String,
    pub name: String,
    pub stream_url: String,
    pub tags: Vec<String>,
    pub country: Option<String>,
    pub bitrate: u32,
    pub codec: Option<String>,
    pub click_count: u64,
    pub listener_count: u64,
}

impl RadioStationRecord {
    /// Popularity proxy used when stations are merged with movie/TV results
    pub fn popularity(&self) -> f64 {
        self.listener_count as f64
    }
}

impl From<RadioStationRecord> for NormalizedItem {
    /// Present a station through the unified content shape
    fn from(station: RadioStationRecord) -> Self {
        let popularity = station.popularity();
        NormalizedItem {
            external_id: station.station_id,
            title: station.name,
            kind: MediaKind::Radio,
            poster: None,
            backdrop: None,
            popularity,
            rating: 0.0,
            year: None,
            overview: None,
            sources: vec![StreamSource {
                provider: SourceProvider::Custom,
                url: station.stream_url,
                quality: station.codec,
                delivery: Delivery::Direct,
                language: None,
                subtitles: Vec::new(),
                active: true,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_round_trip() {
        for kind in ["movie", "tv", "radio"] {
            assert_eq!(MediaKind::from_str(kind).unwrap().as_str(), kind);
        }
    }

    #[test]
    fn test_unsupported_kind_is_rejected() {
        let err = MediaKind::from_str("podcast").unwrap_err();
        assert_eq!(err.0, "podcast");
    }

    #[test]
    fn test_trailer_detection() {
        let trailer = StreamSource {
            provider: SourceProvider::VideoPlatform,
            url: "https://www.youtube.com/embed/abc".to_string(),
            quality: None,
            delivery: Delivery::Embed,
            language: None,
            subtitles: Vec::new(),
            active: true,
        };
        assert!(trailer.is_trailer());

        let direct = StreamSource {
            provider: SourceProvider::Custom,
            url: "https://streams.example.org/live".to_string(),
            quality: None,
            delivery: Delivery::Direct,
            language: None,
            subtitles: Vec::new(),
            active: true,
        };
        assert!(!direct.is_trailer());
    }

    #[test]
    fn test_station_presents_as_normalized_item() {
        let station = RadioStationRecord {
            station_id: "uuid-1".to_string(),
            name: "FIP".to_string(),
            stream_url: "https://icecast.example.org/fip".to_string(),
            tags: vec!["jazz".to_string()],
            country: Some("France".to_string()),
            bitrate: 128,
            codec: Some("MP3".to_string()),
            click_count: 10,
            listener_count: 420,
        };

        let item = NormalizedItem::from(station);
        assert_eq!(item.kind, MediaKind::Radio);
        assert_eq!(item.external_id, "uuid-1");
        assert_eq!(item.popularity, 420.0);
        assert_eq!(item.year, None);
        assert_eq!(item.sources.len(), 1);
        assert_eq!(item.sources[0].delivery, Delivery::Direct);
        assert!(!item.has_trailer());
    }
}
