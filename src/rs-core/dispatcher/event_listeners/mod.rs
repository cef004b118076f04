use crate::{dispatcher::Dispatcher, wasm_bindgen};

/// Methods triggered on JavaScript events by the JavaScript code.
#[wasm_bindgen]
impl Dispatcher {
    /// The JS code should call this method when the media element emits a
    /// `loadstart` event, meaning that a new content starts loading.
    ///
    /// # Arguments
    ///
    /// * `source_url` - URL of the content's manifest, if known.
    ///
    /// * `mime_type` - Mime-type announced for that source (e.g.
    ///   `application/x-mpegURL`), used to know its streaming protocol.
    pub fn on_load_start(&mut self, source_url: Option<String>, mime_type: Option<String>) {
        self.on_load_start_core(source_url, mime_type);
    }

    /// The JS code should call this method when the media element emits a
    /// `loadedmetadata` event.
    pub fn on_loaded_metadata(&mut self) {
        self.annotator.on_loaded_metadata();
    }

    /// The JS code should call this method when the media element emits a
    /// `waiting` event, meaning that playback stalled due to a lack of data.
    pub fn on_waiting(&mut self) {
        self.annotator.on_stall_begin();
    }

    /// The JS code should call this method when the media element emits a
    /// `canplay` event.
    pub fn on_can_play(&mut self) {
        self.annotator.on_stall_end();
    }

    /// The JS code should call this method when the media element emits a
    /// `seeked` event.
    pub fn on_seeked(&mut self) {
        self.annotator.on_seeked();
    }

    /// The JS code should call this method regularly and on playback events,
    /// with the latest known playback conditions.
    pub fn on_playback_tick(&mut self, observation: PlaybackObservation) {
        self.on_playback_tick_core(observation);
    }

    /// The JS code should call this method right before sending any request
    /// of the streaming engine, and send the request to the URL returned.
    ///
    /// # Arguments
    ///
    /// * `uri` - URL the engine wants to request.
    ///
    /// * `method` - HTTP method used, `GET` if not set.
    ///
    /// * `is_init_segment` - `true` if the engine knows that this is a
    ///   request for an initialization segment.
    pub fn before_request(
        &mut self,
        uri: String,
        method: Option<String>,
        is_init_segment: bool,
    ) -> String {
        self.before_request_core(uri, method, is_init_segment)
    }
}

/// Playback conditions observed on the media element.
#[wasm_bindgen]
pub struct PlaybackObservation {
    current_time: f64,
    playback_rate: f64,
    duration: f64,
    buffered: Vec<f64>,
}

#[wasm_bindgen]
impl PlaybackObservation {
    /// `buffered` is a flat list of `start, end` pairs, in seconds.
    #[wasm_bindgen(constructor)]
    pub fn new(current_time: f64, playback_rate: f64, duration: f64, buffered: &[f64]) -> Self {
        Self {
            current_time,
            playback_rate,
            duration,
            buffered: buffered.to_vec(),
        }
    }
}

impl PlaybackObservation {
    #[inline(always)]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[inline(always)]
    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    #[inline(always)]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline(always)]
    pub fn buffered(&self) -> &[f64] {
        &self.buffered
    }
}
