use crate::{
    playback::{PlaybackSnapshot, SegmentEntry, StreamingProtocol},
    utils::url::Url,
};

use super::{
    field_set::{CmcdFieldSet, CmcdValue},
    keys::{CmcdKey, ObjectType, StreamType, StreamingFormat},
    session::SessionContext,
};

/// The request about to be annotated.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext<'a> {
    pub url: &'a Url,
    /// Init segment flag as communicated by the streaming engine.
    pub is_init_segment: bool,
}

/// Everything CMCD fields are derived from.
#[derive(Clone, Copy, Debug)]
pub struct DerivationContext<'a> {
    pub playback: &'a PlaybackSnapshot<'a>,
    pub request: RequestContext<'a>,
    pub session: &'a SessionContext,
    pub startup_pending: bool,
    pub buffer_starvation: bool,
    /// Index in `playback.segments` of the segment being requested, when it
    /// could be guessed.
    pub tracked_segment: Option<usize>,
}

/// Links a CMCD key to the function deriving its value.
///
/// A derivation function returns `None` when the value cannot be determined
/// or does not apply to the current request, in which case the key is
/// omitted.
pub struct FieldRule {
    pub key: CmcdKey,
    pub derive: fn(&DerivationContext<'_>) -> Option<CmcdValue>,
}

pub const RULES: [FieldRule; 16] = [
    FieldRule {
        key: CmcdKey::SessionId,
        derive: session_id,
    },
    FieldRule {
        key: CmcdKey::ContentId,
        derive: content_id,
    },
    FieldRule {
        key: CmcdKey::Version,
        derive: version,
    },
    FieldRule {
        key: CmcdKey::StreamingFormat,
        derive: streaming_format,
    },
    FieldRule {
        key: CmcdKey::StreamType,
        derive: stream_type,
    },
    FieldRule {
        key: CmcdKey::PlaybackRate,
        derive: playback_rate,
    },
    FieldRule {
        key: CmcdKey::EncodedBitrate,
        derive: encoded_bitrate,
    },
    FieldRule {
        key: CmcdKey::TopBitrate,
        derive: top_bitrate,
    },
    FieldRule {
        key: CmcdKey::ObjectType,
        derive: object_type,
    },
    FieldRule {
        key: CmcdKey::ObjectDuration,
        derive: object_duration,
    },
    FieldRule {
        key: CmcdKey::BufferLength,
        derive: buffer_length,
    },
    FieldRule {
        key: CmcdKey::Deadline,
        derive: deadline,
    },
    FieldRule {
        key: CmcdKey::MeasuredThroughput,
        derive: measured_throughput,
    },
    FieldRule {
        key: CmcdKey::NextObjectRequest,
        derive: next_object_request,
    },
    FieldRule {
        key: CmcdKey::Startup,
        derive: startup,
    },
    FieldRule {
        key: CmcdKey::BufferStarvation,
        derive: buffer_starvation,
    },
];

/// Apply every rule of `RULES` to `ctx`.
pub fn derive_fields(ctx: &DerivationContext<'_>) -> CmcdFieldSet {
    let mut fields = CmcdFieldSet::new();
    for rule in &RULES {
        if let Some(value) = (rule.derive)(ctx) {
            fields.insert(rule.key, value);
        }
    }
    fields
}

/// Guess the kind of object requested through its URL.
///
/// The query string is not considered. Anything not recognized is considered
/// to be a video segment.
pub fn classify_object_type(url: &Url, is_init_segment: bool) -> ObjectType {
    let path = url.without_query();
    if path.contains(".m3u8") || path.contains(".mpd") {
        ObjectType::Manifest
    } else if is_init_segment || path.contains("init") || path.contains("Initialization") {
        ObjectType::InitSegment
    } else if path.contains(".ts") || path.contains(".m4s") {
        ObjectType::Video
    } else if path.contains(".aac") || path.contains("audio") {
        ObjectType::Audio
    } else {
        ObjectType::Video
    }
}

fn to_kbps(bits_per_second: f64) -> Option<f64> {
    let kbps = (bits_per_second / 1000.).round();
    if kbps.is_finite() && kbps > 0. {
        Some(kbps)
    } else {
        None
    }
}

fn request_object_type(ctx: &DerivationContext<'_>) -> ObjectType {
    classify_object_type(ctx.request.url, ctx.request.is_init_segment)
}

/// Index of the segment being requested: the tracked one, else the one with
/// the requested URL, else the one at the current position.
fn requested_segment_index(ctx: &DerivationContext<'_>) -> Option<usize> {
    ctx.tracked_segment
        .or_else(|| ctx.playback.segment_index_of(ctx.request.url))
        .or_else(|| ctx.playback.segment_index_at(ctx.playback.current_time))
}

fn buffer_length_ms(ctx: &DerivationContext<'_>) -> Option<f64> {
    let buffered = ctx.playback.buffered?;
    let ahead = buffered.buffer_ahead(ctx.playback.current_time);
    Some((ahead * 1000.).round().max(0.))
}

fn session_id(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    Some(ctx.session.session_id().into())
}

fn content_id(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    ctx.session.content_id().map(CmcdValue::from)
}

fn version(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    Some(CmcdValue::Number(f64::from(ctx.session.version())))
}

fn streaming_format(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let format = match ctx.playback.protocol {
        StreamingProtocol::Hls => StreamingFormat::Hls,
        StreamingProtocol::Dash => StreamingFormat::Dash,
        StreamingProtocol::Other => match ctx.playback.source_url {
            Some(src) if src.contains(".m3u8") => StreamingFormat::Hls,
            Some(src) if src.contains(".mpd") => StreamingFormat::Dash,
            _ => StreamingFormat::Other,
        },
    };
    Some(format.token().into())
}

fn stream_type(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let stream_type = if ctx.playback.is_vod() {
        StreamType::Vod
    } else {
        StreamType::Live
    };
    Some(stream_type.token().into())
}

fn playback_rate(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let rate = ctx.playback.playback_rate;
    if rate.is_finite() && rate != 0. && rate != 1. {
        Some(rate.into())
    } else {
        None
    }
}

fn encoded_bitrate(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let rendition = ctx.playback.selected_rendition?;
    to_kbps(rendition.bandwidth as f64).map(CmcdValue::from)
}

fn top_bitrate(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let max = ctx.playback.max_bandwidth()?;
    to_kbps(max as f64).map(CmcdValue::from)
}

fn object_type(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    Some(request_object_type(ctx).token().into())
}

fn object_duration(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    if !request_object_type(ctx).is_media_segment() {
        return None;
    }
    let has_duration = |s: &&SegmentEntry| s.duration.is_finite() && s.duration > 0.;
    let segments = ctx.playback.segments;
    let segment = requested_segment_index(ctx)
        .and_then(|idx| segments.get(idx))
        .filter(has_duration)
        .or_else(|| segments.first().filter(has_duration))?;
    let duration_ms = (segment.duration * 1000.).round();
    if duration_ms > 0. {
        Some(duration_ms.into())
    } else {
        None
    }
}

fn buffer_length(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    buffer_length_ms(ctx).map(CmcdValue::from)
}

fn deadline(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let buffer_length = buffer_length_ms(ctx).filter(|bl| *bl > 0.)?;
    let rate = ctx.playback.playback_rate;
    if !rate.is_finite() || rate <= 0. {
        return None;
    }
    let deadline = (buffer_length / rate).round();
    if deadline > 0. {
        Some(deadline.into())
    } else {
        None
    }
}

fn measured_throughput(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    let estimate = ctx.playback.throughput_estimate?;
    to_kbps(estimate).map(CmcdValue::from)
}

fn next_object_request(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    if !ctx.playback.is_vod() || !request_object_type(ctx).is_media_segment() {
        return None;
    }
    let next = ctx.playback.segments.get(requested_segment_index(ctx)? + 1)?;
    let next_url = next.url(ctx.request.url.directory());
    if next_url.without_query() == ctx.request.url.without_query() {
        return None;
    }
    Some(next_url.take().into())
}

fn startup(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    ctx.startup_pending.then_some(CmcdValue::Boolean(true))
}

fn buffer_starvation(ctx: &DerivationContext<'_>) -> Option<CmcdValue> {
    ctx.buffer_starvation.then_some(CmcdValue::Boolean(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{playback::Rendition, utils::time_ranges::TimeRanges};

    fn renditions() -> Vec<Rendition> {
        vec![
            Rendition {
                bandwidth: 800_000,
                id: None,
            },
            Rendition {
                bandwidth: 2_000_000,
                id: None,
            },
            Rendition {
                bandwidth: 5_000_000,
                id: None,
            },
        ]
    }

    fn segments() -> Vec<SegmentEntry> {
        (0..4)
            .map(|i| SegmentEntry {
                duration: if i == 3 { 2.5 } else { 4. },
                uri: format!("seg_{}.ts", i + 1),
                resolved_uri: None,
            })
            .collect()
    }

    fn session() -> SessionContext {
        SessionContext::new("sess".to_owned(), Some("c2e9".to_owned()))
    }

    fn derive(
        snapshot: &PlaybackSnapshot<'_>,
        url: &str,
        tracked_segment: Option<usize>,
    ) -> CmcdFieldSet {
        let url = Url::from(url);
        let session = session();
        derive_fields(&DerivationContext {
            playback: snapshot,
            request: RequestContext {
                url: &url,
                is_init_segment: false,
            },
            session: &session,
            startup_pending: false,
            buffer_starvation: false,
            tracked_segment,
        })
    }

    fn number(fields: &CmcdFieldSet, key: CmcdKey) -> Option<f64> {
        fields.get(key).and_then(|v| v.as_number())
    }

    fn string(fields: &CmcdFieldSet, key: CmcdKey) -> Option<&str> {
        fields.get(key).and_then(|v| v.as_str())
    }

    #[test]
    fn test_vod_hls_session_and_object_fields() {
        let renditions = renditions();
        let buffered = TimeRanges::from_flat(&[0., 10.]);
        let snapshot = PlaybackSnapshot {
            current_time: 5.5,
            buffered: Some(&buffered),
            duration: 60.,
            protocol: StreamingProtocol::Hls,
            selected_rendition: Some(&renditions[1]),
            renditions: &renditions,
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "https://cdn.example.com/720p/seg_2.ts", None);
        assert_eq!(string(&fields, CmcdKey::SessionId), Some("sess"));
        assert_eq!(string(&fields, CmcdKey::ContentId), Some("c2e9"));
        assert_eq!(number(&fields, CmcdKey::Version), Some(1.));
        assert_eq!(number(&fields, CmcdKey::EncodedBitrate), Some(2000.));
        assert_eq!(number(&fields, CmcdKey::TopBitrate), Some(5000.));
        assert_eq!(string(&fields, CmcdKey::StreamingFormat), Some("h"));
        assert_eq!(string(&fields, CmcdKey::StreamType), Some("v"));
        assert_eq!(string(&fields, CmcdKey::ObjectType), Some("v"));
        assert_eq!(number(&fields, CmcdKey::BufferLength), Some(4500.));
        assert_eq!(number(&fields, CmcdKey::Deadline), Some(4500.));
        assert!(!fields.contains(CmcdKey::PlaybackRate));
        assert!(!fields.contains(CmcdKey::Startup));
        assert!(!fields.contains(CmcdKey::BufferStarvation));
        assert!(!fields.contains(CmcdKey::MeasuredThroughput));
    }

    #[test]
    fn test_streaming_format_fallback_on_source_url() {
        let mut snapshot = PlaybackSnapshot {
            source_url: Some("https://a.com/manifest.mpd"),
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "https://a.com/seg.m4s", None);
        assert_eq!(string(&fields, CmcdKey::StreamingFormat), Some("d"));
        assert_eq!(string(&fields, CmcdKey::StreamType), Some("l"));

        snapshot.source_url = Some("https://a.com/master.m3u8?token=1");
        let fields = derive(&snapshot, "https://a.com/seg.ts", None);
        assert_eq!(string(&fields, CmcdKey::StreamingFormat), Some("h"));

        snapshot.source_url = Some("https://a.com/video.mp4");
        let fields = derive(&snapshot, "https://a.com/video.mp4", None);
        assert_eq!(string(&fields, CmcdKey::StreamingFormat), Some("o"));

        snapshot.protocol = StreamingProtocol::Hls;
        let fields = derive(&snapshot, "https://a.com/video.mp4", None);
        assert_eq!(string(&fields, CmcdKey::StreamingFormat), Some("h"));
    }

    #[test]
    fn test_playback_rate() {
        let mut snapshot = PlaybackSnapshot::empty();
        for rate in [1., 0., f64::NAN, f64::INFINITY] {
            snapshot.playback_rate = rate;
            assert!(!derive(&snapshot, "s.ts", None).contains(CmcdKey::PlaybackRate));
        }
        snapshot.playback_rate = 1.5;
        let fields = derive(&snapshot, "s.ts", None);
        assert_eq!(number(&fields, CmcdKey::PlaybackRate), Some(1.5));
    }

    #[test]
    fn test_bitrates_missing() {
        let renditions = [Rendition {
            bandwidth: 0,
            id: None,
        }];
        let snapshot = PlaybackSnapshot {
            selected_rendition: Some(&renditions[0]),
            renditions: &renditions,
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "s.ts", None);
        assert!(!fields.contains(CmcdKey::EncodedBitrate));
        assert!(!fields.contains(CmcdKey::TopBitrate));
        let fields = derive(&PlaybackSnapshot::empty(), "s.ts", None);
        assert!(!fields.contains(CmcdKey::EncodedBitrate));
        assert!(!fields.contains(CmcdKey::TopBitrate));
    }

    #[test]
    fn test_object_type_classification() {
        let cases = [
            ("https://a.com/master.m3u8", false, ObjectType::Manifest),
            ("https://a.com/manifest.mpd?x=.ts", false, ObjectType::Manifest),
            ("https://a.com/720p/init.mp4", false, ObjectType::InitSegment),
            ("https://a.com/Initialization-720.mp4", false, ObjectType::InitSegment),
            ("https://a.com/720p/header.mp4", true, ObjectType::InitSegment),
            ("https://a.com/720p/seg_1.ts", false, ObjectType::Video),
            ("https://a.com/720p/seg_1.m4s", false, ObjectType::Video),
            ("https://a.com/en/seg_1.aac", false, ObjectType::Audio),
            ("https://a.com/audio/chunk_1", false, ObjectType::Audio),
            ("https://a.com/chunk_1?kind=audio", false, ObjectType::Video),
            ("https://a.com/something", false, ObjectType::Video),
        ];
        for (url, is_init, expected) in cases {
            assert_eq!(
                classify_object_type(&Url::from(url), is_init),
                expected,
                "{url}"
            );
        }
    }

    #[test]
    fn test_object_duration() {
        let segments = segments();
        let snapshot = PlaybackSnapshot {
            current_time: 13.,
            duration: 14.5,
            segments: &segments,
            ..PlaybackSnapshot::empty()
        };
        // tracked index first
        let fields = derive(&snapshot, "https://a.com/seg_4.ts", Some(3));
        assert_eq!(number(&fields, CmcdKey::ObjectDuration), Some(2500.));
        // then the segment at the current position
        let fields = derive(&snapshot, "https://a.com/seg_4.ts", None);
        assert_eq!(number(&fields, CmcdKey::ObjectDuration), Some(2500.));
        // then the first segment
        let fields = derive(&snapshot, "https://a.com/seg_9.ts", Some(42));
        assert_eq!(number(&fields, CmcdKey::ObjectDuration), Some(4000.));
        // never on something else than media segments
        let fields = derive(&snapshot, "https://a.com/init.mp4", Some(3));
        assert!(!fields.contains(CmcdKey::ObjectDuration));
        let fields = derive(&snapshot, "https://a.com/media.m3u8", Some(3));
        assert!(!fields.contains(CmcdKey::ObjectDuration));
        // nor without segments
        let fields = derive(&PlaybackSnapshot::empty(), "https://a.com/seg_1.ts", None);
        assert!(!fields.contains(CmcdKey::ObjectDuration));
    }

    #[test]
    fn test_buffer_length_and_deadline() {
        let buffered = TimeRanges::from_flat(&[0., 4., 10., 20.]);
        let mut snapshot = PlaybackSnapshot {
            current_time: 12.,
            playback_rate: 2.,
            buffered: Some(&buffered),
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "s.ts", None);
        assert_eq!(number(&fields, CmcdKey::BufferLength), Some(8000.));
        assert_eq!(number(&fields, CmcdKey::Deadline), Some(4000.));

        // outside any buffered range: zero is still sent, not the deadline
        snapshot.current_time = 6.;
        let fields = derive(&snapshot, "s.ts", None);
        assert_eq!(number(&fields, CmcdKey::BufferLength), Some(0.));
        assert!(!fields.contains(CmcdKey::Deadline));

        snapshot.current_time = 12.;
        snapshot.playback_rate = 0.;
        let fields = derive(&snapshot, "s.ts", None);
        assert_eq!(number(&fields, CmcdKey::BufferLength), Some(8000.));
        assert!(!fields.contains(CmcdKey::Deadline));

        snapshot.buffered = None;
        snapshot.playback_rate = 1.;
        let fields = derive(&snapshot, "s.ts", None);
        assert!(!fields.contains(CmcdKey::BufferLength));
        assert!(!fields.contains(CmcdKey::Deadline));
    }

    #[test]
    fn test_measured_throughput() {
        let mut snapshot = PlaybackSnapshot {
            throughput_estimate: Some(3_456_789.),
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "s.ts", None);
        assert_eq!(number(&fields, CmcdKey::MeasuredThroughput), Some(3457.));
        for estimate in [0., -5., 200., f64::NAN] {
            snapshot.throughput_estimate = Some(estimate);
            let fields = derive(&snapshot, "s.ts", None);
            assert!(!fields.contains(CmcdKey::MeasuredThroughput));
        }
    }

    #[test]
    fn test_next_object_request() {
        let mut segments = segments();
        segments[2].resolved_uri = Some("https://other.example.com/seg_3.ts".to_owned());
        let mut snapshot = PlaybackSnapshot {
            current_time: 1.,
            duration: 14.5,
            segments: &segments,
            ..PlaybackSnapshot::empty()
        };
        let fields = derive(&snapshot, "https://a.com/720p/seg_1.ts?token=x", None);
        assert_eq!(
            string(&fields, CmcdKey::NextObjectRequest),
            Some("https://a.com/720p/seg_2.ts")
        );
        let fields = derive(&snapshot, "https://a.com/720p/seg_2.ts", Some(1));
        assert_eq!(
            string(&fields, CmcdKey::NextObjectRequest),
            Some("https://other.example.com/seg_3.ts")
        );
        // last segment: no next one
        let fields = derive(&snapshot, "https://a.com/720p/seg_4.ts", Some(3));
        assert!(!fields.contains(CmcdKey::NextObjectRequest));
        // not for manifests nor init segments
        let fields = derive(&snapshot, "https://a.com/720p/media.m3u8", Some(0));
        assert!(!fields.contains(CmcdKey::NextObjectRequest));
        let fields = derive(&snapshot, "https://a.com/720p/init.mp4", Some(0));
        assert!(!fields.contains(CmcdKey::NextObjectRequest));
        // not for live contents
        snapshot.duration = f64::INFINITY;
        let fields = derive(&snapshot, "https://a.com/720p/seg_1.ts", Some(0));
        assert!(!fields.contains(CmcdKey::NextObjectRequest));
    }

    #[test]
    fn test_zero_based_segment_names() {
        let segments: Vec<SegmentEntry> = [4., 6., 4.]
            .into_iter()
            .enumerate()
            .map(|(i, duration)| SegmentEntry {
                duration,
                uri: format!("playlist{i}.ts"),
                resolved_uri: None,
            })
            .collect();
        let snapshot = PlaybackSnapshot {
            current_time: 0.,
            duration: 14.,
            segments: &segments,
            ..PlaybackSnapshot::empty()
        };
        let url = "https://a.com/v/playlist1.ts";
        let fields = derive(&snapshot, url, None);
        assert_eq!(number(&fields, CmcdKey::ObjectDuration), Some(6000.));
        assert_eq!(
            string(&fields, CmcdKey::NextObjectRequest),
            Some("https://a.com/v/playlist2.ts")
        );

        // a wrong tracked index never announces the requested URL as the next one
        let fields = derive(&snapshot, url, Some(0));
        assert_ne!(string(&fields, CmcdKey::NextObjectRequest), Some(url));
        assert!(!fields.contains(CmcdKey::NextObjectRequest));
    }

    #[test]
    fn test_flags() {
        let url = Url::from("s.ts");
        let session = session();
        let snapshot = PlaybackSnapshot::empty();
        let fields = derive_fields(&DerivationContext {
            playback: &snapshot,
            request: RequestContext {
                url: &url,
                is_init_segment: false,
            },
            session: &session,
            startup_pending: true,
            buffer_starvation: true,
            tracked_segment: None,
        });
        assert_eq!(fields.get(CmcdKey::Startup), Some(&CmcdValue::Boolean(true)));
        assert_eq!(
            fields.get(CmcdKey::BufferStarvation),
            Some(&CmcdValue::Boolean(true))
        );
    }

    #[test]
    fn test_no_content_id_without_source() {
        let url = Url::from("s.ts");
        let session = SessionContext::default();
        let snapshot = PlaybackSnapshot::empty();
        let fields = derive_fields(&DerivationContext {
            playback: &snapshot,
            request: RequestContext {
                url: &url,
                is_init_segment: false,
            },
            session: &session,
            startup_pending: false,
            buffer_starvation: false,
            tracked_segment: None,
        });
        assert!(fields.contains(CmcdKey::SessionId));
        assert!(!fields.contains(CmcdKey::ContentId));
        assert!(fields.contains(CmcdKey::Version));
    }
}
