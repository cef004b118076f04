use thiserror::Error;

use crate::{
    playback::{PlaybackSnapshot, PlaybackState, Rendition, SegmentEntry, StreamingEngine},
    requester::{RequestOptions, RequestTransport},
    utils::time_ranges::TimeRanges,
};

/// Error encountered when updating the `EngineState` from the JavaScript-side.
#[derive(Error, Debug)]
pub enum EngineStateError {
    #[error("Could not parse renditions: {0}")]
    InvalidRenditions(serde_json::Error),
    #[error("Could not parse segments: {0}")]
    InvalidSegments(serde_json::Error),
    #[error("Selected rendition {selected} does not exist, only {len} renditions are known")]
    UnknownRendition { selected: usize, len: usize },
}

/// Mirror, on the Rust-side, of the state of the JavaScript streaming engine
/// whose requests are annotated.
#[derive(Default)]
pub(crate) struct EngineState {
    /// `None` while no engine is attached.
    transport: Option<RequestTransport>,
    playback: PlaybackState,
}

impl EngineState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub(crate) fn playback_mut(&mut self) -> &mut PlaybackState {
        &mut self.playback
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// An engine is now sending requests through us. Its previous transport,
    /// with the hooks installed on it, is kept if one was already attached.
    pub(crate) fn attach(&mut self) {
        if self.transport.is_none() {
            self.transport = Some(RequestTransport::new());
        }
    }

    /// The engine is gone: drop its transport and the state known about it.
    pub(crate) fn detach(&mut self) {
        self.transport = None;
        self.playback.reset();
    }

    /// Replace the known renditions with those described by `json`, an array
    /// of `{ "bandwidth": number, "id"?: string }` objects.
    pub(crate) fn update_renditions_json(
        &mut self,
        json: &str,
        selected: Option<usize>,
    ) -> Result<(), EngineStateError> {
        let renditions: Vec<Rendition> =
            serde_json::from_str(json).map_err(EngineStateError::InvalidRenditions)?;
        if let Some(selected) = selected {
            if selected >= renditions.len() {
                return Err(EngineStateError::UnknownRendition {
                    selected,
                    len: renditions.len(),
                });
            }
        }
        self.playback.renditions = renditions;
        self.playback.selected_rendition = selected;
        Ok(())
    }

    /// Replace the segments of the selected media playlist with those
    /// described by `json`, an array of
    /// `{ "duration": number, "uri": string, "resolvedUri"?: string }` objects.
    pub(crate) fn update_segments_json(&mut self, json: &str) -> Result<(), EngineStateError> {
        let segments: Vec<SegmentEntry> =
            serde_json::from_str(json).map_err(EngineStateError::InvalidSegments)?;
        self.playback.segments = segments;
        Ok(())
    }

    pub(crate) fn update_buffered(&mut self, flat_ranges: &[f64]) {
        self.playback.buffered = Some(TimeRanges::from_flat(flat_ranges));
    }

    /// Run a request through the hooks of the transport.
    ///
    /// The options are returned unchanged when no engine is attached.
    pub(crate) fn prepare_request(&mut self, options: RequestOptions) -> RequestOptions {
        let snapshot = self.playback.snapshot();
        match self.transport.as_mut() {
            Some(transport) => transport.prepare_request(options, &snapshot),
            None => options,
        }
    }
}

impl StreamingEngine for EngineState {
    fn snapshot(&self) -> PlaybackSnapshot<'_> {
        self.playback.snapshot()
    }

    fn transport_mut(&mut self) -> Option<&mut RequestTransport> {
        self.transport.as_mut()
    }
}
