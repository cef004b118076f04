use serde::Deserialize;

use crate::{
    requester::RequestTransport,
    utils::{time_ranges::TimeRanges, url::Url},
};

/// Streaming protocol of the content currently loaded, as announced by the
/// streaming engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamingProtocol {
    Hls,
    Dash,
    /// Either another protocol or an unknown one.
    #[default]
    Other,
}

impl StreamingProtocol {
    /// Infer the protocol from the mime-type given to the source, e.g.
    /// `application/x-mpegURL` or `application/dash+xml`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let mime_type = mime_type.to_ascii_lowercase();
        if mime_type.contains("mpegurl") {
            StreamingProtocol::Hls
        } else if mime_type.contains("dash") {
            StreamingProtocol::Dash
        } else {
            StreamingProtocol::Other
        }
    }
}

/// A variant/representation of the content, as listed in its manifest.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Rendition {
    /// Declared bandwidth, in bits per second.
    pub bandwidth: u64,
    #[serde(default)]
    pub id: Option<String>,
}

/// A media segment of the selected media playlist.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEntry {
    /// Duration in seconds.
    pub duration: f64,
    /// URI as written in the playlist, potentially relative.
    pub uri: String,
    /// Absolute URI, when the engine already resolved it.
    #[serde(default)]
    pub resolved_uri: Option<String>,
}

impl SegmentEntry {
    /// Absolute URL of this segment, relative URIs being resolved against
    /// `base_url` when the engine did not resolve it.
    pub fn url(&self, base_url: &str) -> Url {
        match &self.resolved_uri {
            Some(resolved) => Url::from(resolved.as_str()),
            None => Url::from_relative(base_url, Url::from(self.uri.as_str())),
        }
    }
}

/// Read-only view of the player's state at the time a request is about to
/// be sent.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackSnapshot<'a> {
    /// Playback position, in seconds.
    pub current_time: f64,
    pub playback_rate: f64,
    /// `None` when the engine has no buffered information at all.
    pub buffered: Option<&'a TimeRanges>,
    /// Total duration in seconds, `f64::INFINITY` or `NaN` for live or
    /// unknown contents.
    pub duration: f64,
    pub protocol: StreamingProtocol,
    pub source_url: Option<&'a str>,
    pub selected_rendition: Option<&'a Rendition>,
    pub renditions: &'a [Rendition],
    pub segments: &'a [SegmentEntry],
    /// Last bandwidth estimate, in bits per second.
    pub throughput_estimate: Option<f64>,
}

impl<'a> PlaybackSnapshot<'a> {
    /// Snapshot of a player with nothing loaded.
    pub fn empty() -> Self {
        Self {
            current_time: 0.,
            playback_rate: 1.,
            buffered: None,
            duration: f64::NAN,
            protocol: StreamingProtocol::Other,
            source_url: None,
            selected_rendition: None,
            renditions: &[],
            segments: &[],
            throughput_estimate: None,
        }
    }

    pub fn is_vod(&self) -> bool {
        self.duration.is_finite()
    }

    /// Bandwidth of the best rendition, in bits per second.
    pub fn max_bandwidth(&self) -> Option<u64> {
        self.renditions.iter().map(|r| r.bandwidth).max()
    }

    /// Index in `segments` of the segment containing `position`, obtained by
    /// summing segment durations from the start of the playlist.
    pub fn segment_index_at(&self, position: f64) -> Option<usize> {
        if !position.is_finite() || position < 0. {
            return None;
        }
        let mut segment_end = 0.;
        for (idx, segment) in self.segments.iter().enumerate() {
            segment_end += segment.duration;
            if position < segment_end {
                return Some(idx);
            }
        }
        None
    }

    /// Index in `segments` of the segment requested through `url`.
    ///
    /// Segments resolving to that exact URL (query excluded) are looked for
    /// first, then a single segment with the same filename.
    pub fn segment_index_of(&self, url: &Url) -> Option<usize> {
        let requested = url.without_query();
        let base_url = url.directory();
        if let Some(idx) = self
            .segments
            .iter()
            .position(|s| s.url(base_url).without_query() == requested)
        {
            return Some(idx);
        }
        let filename = url.filename();
        if filename.is_empty() {
            return None;
        }
        let mut same_name = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| Url::from(s.uri.as_str()).filename() == filename)
            .map(|(idx, _)| idx);
        match (same_name.next(), same_name.next()) {
            (Some(idx), None) => Some(idx),
            _ => None,
        }
    }
}

/// Owned playback state, from which `PlaybackSnapshot`s are taken.
#[derive(Clone, Debug)]
pub struct PlaybackState {
    pub current_time: f64,
    pub playback_rate: f64,
    /// `None` until buffered ranges are known.
    pub buffered: Option<TimeRanges>,
    pub duration: f64,
    pub protocol: StreamingProtocol,
    pub source_url: Option<String>,
    pub renditions: Vec<Rendition>,
    /// Index in `renditions` of the one currently selected.
    pub selected_rendition: Option<usize>,
    pub segments: Vec<SegmentEntry>,
    pub throughput_estimate: Option<f64>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.,
            playback_rate: 1.,
            buffered: None,
            duration: f64::NAN,
            protocol: StreamingProtocol::Other,
            source_url: None,
            renditions: vec![],
            selected_rendition: None,
            segments: vec![],
            throughput_estimate: None,
        }
    }
}

impl PlaybackState {
    pub fn snapshot(&self) -> PlaybackSnapshot<'_> {
        PlaybackSnapshot {
            current_time: self.current_time,
            playback_rate: self.playback_rate,
            buffered: self.buffered.as_ref(),
            duration: self.duration,
            protocol: self.protocol,
            source_url: self.source_url.as_deref(),
            selected_rendition: self
                .selected_rendition
                .and_then(|idx| self.renditions.get(idx)),
            renditions: &self.renditions,
            segments: &self.segments,
            throughput_estimate: self.throughput_estimate,
        }
    }

    /// Go back to the state of a player with no content loaded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The streaming engine whose requests are annotated.
///
/// It exposes its current state and the transport through which its
/// requests go.
pub trait StreamingEngine {
    fn snapshot(&self) -> PlaybackSnapshot<'_>;

    /// Returns `None` when no transport is available yet, in which case
    /// requests cannot be annotated.
    fn transport_mut(&mut self) -> Option<&mut RequestTransport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(duration: f64, uri: &str) -> SegmentEntry {
        SegmentEntry {
            duration,
            uri: uri.to_owned(),
            resolved_uri: None,
        }
    }

    #[test]
    fn test_protocol_from_mime_type() {
        assert_eq!(
            StreamingProtocol::from_mime_type("application/x-mpegURL"),
            StreamingProtocol::Hls
        );
        assert_eq!(
            StreamingProtocol::from_mime_type("application/vnd.apple.mpegurl"),
            StreamingProtocol::Hls
        );
        assert_eq!(
            StreamingProtocol::from_mime_type("application/dash+xml"),
            StreamingProtocol::Dash
        );
        assert_eq!(
            StreamingProtocol::from_mime_type("video/mp4"),
            StreamingProtocol::Other
        );
    }

    #[test]
    fn test_segment_index_at() {
        let segments = [segment(4., "s0.ts"), segment(4., "s1.ts"), segment(2., "s2.ts")];
        let snapshot = PlaybackSnapshot {
            segments: &segments,
            ..PlaybackSnapshot::empty()
        };
        assert_eq!(snapshot.segment_index_at(0.), Some(0));
        assert_eq!(snapshot.segment_index_at(3.99), Some(0));
        assert_eq!(snapshot.segment_index_at(4.), Some(1));
        assert_eq!(snapshot.segment_index_at(9.5), Some(2));
        assert_eq!(snapshot.segment_index_at(10.), None);
        assert_eq!(snapshot.segment_index_at(-1.), None);
        assert_eq!(snapshot.segment_index_at(f64::NAN), None);
    }

    #[test]
    fn test_segment_index_of() {
        let mut segments = [
            segment(4., "playlist0.ts"),
            segment(6., "playlist1.ts"),
            segment(4., "../other/playlist2.ts"),
            segment(4., "a/dup.ts"),
            segment(4., "b/dup.ts"),
        ];
        segments[1].resolved_uri = Some("https://cdn.com/v/playlist1.ts".to_owned());
        segments[4].resolved_uri = Some("https://x.com/b/dup.ts".to_owned());
        let snapshot = PlaybackSnapshot {
            segments: &segments,
            ..PlaybackSnapshot::empty()
        };
        let index_of = |url: &str| snapshot.segment_index_of(&Url::from(url));
        assert_eq!(index_of("https://a.com/v/playlist0.ts?t=3"), Some(0));
        assert_eq!(index_of("https://cdn.com/v/playlist1.ts"), Some(1));
        // filename only
        assert_eq!(index_of("https://a.com/other/playlist2.ts"), Some(2));
        assert_eq!(index_of("https://b.com/x/playlist1.ts"), Some(1));
        // resolved exactly, despite the shared filename
        assert_eq!(index_of("https://x.com/b/dup.ts"), Some(4));
        // ambiguous filename
        assert_eq!(index_of("https://x.com/c/dup.ts"), None);
        assert_eq!(index_of("https://a.com/v/playlist9.ts"), None);
        assert_eq!(PlaybackSnapshot::empty().segment_index_of(&Url::from("s.ts")), None);
    }

    #[test]
    fn test_max_bandwidth_and_vod() {
        let renditions = [
            Rendition {
                bandwidth: 2_000_000,
                id: None,
            },
            Rendition {
                bandwidth: 5_000_000,
                id: Some("1080p".to_owned()),
            },
        ];
        let snapshot = PlaybackSnapshot {
            renditions: &renditions,
            duration: 60.,
            ..PlaybackSnapshot::empty()
        };
        assert_eq!(snapshot.max_bandwidth(), Some(5_000_000));
        assert!(snapshot.is_vod());
        assert!(!PlaybackSnapshot::empty().is_vod());
        assert_eq!(PlaybackSnapshot::empty().max_bandwidth(), None);
    }

    #[test]
    fn test_state_snapshot() {
        let mut state = PlaybackState {
            renditions: vec![
                Rendition {
                    bandwidth: 1_000,
                    id: None,
                },
                Rendition {
                    bandwidth: 2_000,
                    id: None,
                },
            ],
            selected_rendition: Some(1),
            source_url: Some("https://a.com/master.m3u8".to_owned()),
            ..PlaybackState::default()
        };
        let snapshot = state.snapshot();
        assert_eq!(snapshot.selected_rendition.map(|r| r.bandwidth), Some(2_000));
        assert_eq!(snapshot.source_url, Some("https://a.com/master.m3u8"));
        assert!(snapshot.buffered.is_none());

        state.selected_rendition = Some(5);
        assert!(state.snapshot().selected_rendition.is_none());
        state.reset();
        assert!(state.renditions.is_empty());
        assert_eq!(state.playback_rate, 1.);
    }

    #[test]
    fn test_segment_json() {
        let json = r#"[{"duration":4,"uri":"seg_1.ts"},{"duration":4,"uri":"seg_2.ts","resolvedUri":"https://a.com/seg_2.ts"}]"#;
        let segments: Vec<SegmentEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(segments[0].resolved_uri, None);
        assert_eq!(segments[1].resolved_uri.as_deref(), Some("https://a.com/seg_2.ts"));
    }
}
