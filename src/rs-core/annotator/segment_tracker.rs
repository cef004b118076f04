use once_cell::sync::Lazy;
use regex::Regex;

use crate::{cmcd::keys::ObjectType, playback::PlaybackSnapshot, utils::url::Url};

/// `seg12.ts`, `segment_3.m4s`, `Seg-7.ts`...
static SEGMENT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)seg(?:ment)?[_-]?(\d+)").unwrap());

/// A number right before the extension: `chunk42.ts`, `720p_5.m4s`...
static NUMBERED_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(?:ts|m4s)$").unwrap());

/// Keeps track of the index, in the selected media playlist, of the last
/// media segment requested.
#[derive(Clone, Debug, Default)]
pub(crate) struct SegmentTracker {
    last_index: Option<usize>,
}

impl SegmentTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index of the last media segment requested, if known.
    pub(crate) fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Update the tracked index from a request about to be sent.
    ///
    /// Only `.ts` and `.m4s` media segment requests move the tracked index.
    /// The requested URL is looked for in the segment list first. Failing
    /// that, its number is read from the URL when one is found (such numbers
    /// are then considered to start at `1`), or else estimated from the
    /// playback position.
    pub(crate) fn on_request(
        &mut self,
        url: &Url,
        object_type: ObjectType,
        playback: &PlaybackSnapshot<'_>,
    ) -> Option<usize> {
        if object_type == ObjectType::InitSegment || !is_segment_file(url) {
            return self.last_index;
        }
        self.last_index = playback
            .segment_index_of(url)
            .or_else(|| match segment_number(url) {
                Some(number) => number.checked_sub(1),
                None => playback.segment_index_at(playback.current_time),
            });
        self.last_index
    }

    pub(crate) fn reset(&mut self) {
        self.last_index = None;
    }
}

fn is_segment_file(url: &Url) -> bool {
    matches!(url.extension(), "ts" | "m4s")
}

/// Sequence number found in the filename of `url`, if any.
pub(crate) fn segment_number(url: &Url) -> Option<usize> {
    let filename = url.filename();
    [&SEGMENT_MARKER, &NUMBERED_FILENAME]
        .into_iter()
        .find_map(|re| re.captures(filename))
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse().ok())
}
