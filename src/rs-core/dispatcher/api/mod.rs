use crate::{
    annotator::{parse_key_list, CmcdAnnotator},
    utils::logger::LoggerLevel,
    wasm_bindgen, Logger,
};

use super::{engine_state::EngineState, Dispatcher};

/// Methods exposed to the JavaScript-side.
///
/// Note that these are not the only methods callable by JavaScript. There's
/// also "event_listeners" which as its name point at, should be called when particular
/// events happen. Such "event_listeners" are defined in its own file:
#[wasm_bindgen]
impl Dispatcher {
    /// Create a new `Dispatcher`, with no streaming engine attached yet.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let mut dispatcher = Dispatcher {
            annotator: CmcdAnnotator::new(),
            engine: EngineState::new(),
        };
        dispatcher.register_js_observers();
        dispatcher
    }

    /// Set the maximum level of logs that will be emitted, from `0` (no log)
    /// to `4` (debug logs).
    pub fn set_log_level(&self, level: u8) {
        Logger::set_logger_level(LoggerLevel::from_u8(level));
    }

    /// Set the content identifier sent with requests, instead of the one
    /// derived from the manifest's URL. `None` to go back to the latter.
    ///
    /// Taken into account from the next loaded content.
    pub fn set_content_id(&mut self, content_id: Option<String>) {
        self.annotator.config_mut().content_id = content_id;
    }

    /// Set the session identifier sent with requests for all contents, instead
    /// of one generated per content. `None` to go back to the latter.
    ///
    /// Taken into account from the next loaded content.
    pub fn set_session_id(&mut self, session_id: Option<String>) {
        self.annotator.config_mut().session_id = session_id;
    }

    /// Restrict the CMCD keys sent to the given comma-separated list, e.g.
    /// `"br,bl,su"`. `None` to send all keys.
    ///
    /// Returns `false` and keeps the previous list if it contains an unknown key.
    pub fn set_enabled_keys(&mut self, keys: Option<String>) -> bool {
        let keys = match keys.as_deref().map(parse_key_list).transpose() {
            Ok(keys) => keys,
            Err(e) => {
                Logger::warn(&format!("Disp: cannot update enabled keys: {e}"));
                return false;
            }
        };
        self.annotator.config_mut().enabled_keys = keys;
        true
    }

    /// Indicate that a streaming engine is now sending its requests through
    /// `before_request`.
    pub fn attach_engine(&mut self) {
        Logger::info("Disp: engine attached");
        self.engine.attach();
        self.annotator.install(&mut self.engine);
    }

    /// Indicate that the streaming engine was disposed.
    pub fn detach_engine(&mut self) {
        Logger::info("Disp: engine detached");
        self.engine.detach();
    }

    /// Communicate the renditions of the current content, as a JSON array of
    /// `{ "bandwidth": number, "id"?: string }` objects, with the index of the
    /// one currently selected.
    ///
    /// Returns `false` if the update could not be applied.
    pub fn update_renditions(&mut self, renditions: &str, selected: Option<u32>) -> bool {
        let selected = selected.map(|idx| idx as usize);
        match self.engine.update_renditions_json(renditions, selected) {
            Ok(()) => true,
            Err(e) => {
                Logger::error(&format!("Disp: {e}"));
                false
            }
        }
    }

    /// Communicate the segments of the selected media playlist, as a JSON
    /// array of `{ "duration": number, "uri": string, "resolvedUri"?: string }`
    /// objects.
    ///
    /// Returns `false` if the update could not be applied.
    pub fn update_segments(&mut self, segments: &str) -> bool {
        match self.engine.update_segments_json(segments) {
            Ok(()) => true,
            Err(e) => {
                Logger::error(&format!("Disp: {e}"));
                false
            }
        }
    }

    /// Communicate the last bandwidth estimate of the streaming engine, in
    /// bits per second.
    pub fn set_throughput_estimate(&mut self, bits_per_second: Option<f64>) {
        self.engine.playback_mut().throughput_estimate = bits_per_second;
    }

    /// Number of requests annotated until now.
    pub fn annotated_request_count(&self) -> f64 {
        self.annotator.request_count() as f64
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
