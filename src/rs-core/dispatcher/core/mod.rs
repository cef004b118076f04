use super::{Dispatcher, PlaybackObservation};
use crate::{
    playback::StreamingProtocol,
    requester::RequestOptions,
    utils::url::Url,
    Logger,
};

impl Dispatcher {
    /// Forward annotated requests and CMCD values to the JavaScript-side.
    #[cfg(target_arch = "wasm32")]
    pub(super) fn register_js_observers(&mut self) {
        use crate::{
            annotator::RequestLogRecord,
            bindings::{
                formatters::{format_field_set_for_js, format_request_record_for_js},
                jsLogCmcdRequest, jsUpdateCmcdValues,
            },
            cmcd::CmcdFieldSet,
        };
        self.annotator
            .set_request_log_observer(Some(Box::new(|record: &RequestLogRecord| {
                jsLogCmcdRequest(&format_request_record_for_js(record))
            })));
        self.annotator
            .set_field_set_observer(Some(Box::new(|fields: &CmcdFieldSet| {
                jsUpdateCmcdValues(&format_field_set_for_js(fields))
            })));
    }

    /// No JavaScript-side to forward to outside of a browser.
    #[cfg(not(target_arch = "wasm32"))]
    pub(super) fn register_js_observers(&mut self) {}

    pub(super) fn on_load_start_core(
        &mut self,
        source_url: Option<String>,
        mime_type: Option<String>,
    ) {
        Logger::info(&format!(
            "Disp: load start u:{}",
            source_url.as_deref().unwrap_or("unknown")
        ));
        let playback = self.engine.playback_mut();
        let throughput_estimate = playback.throughput_estimate;
        playback.reset();
        playback.throughput_estimate = throughput_estimate;
        playback.protocol = mime_type
            .as_deref()
            .map_or(StreamingProtocol::Other, StreamingProtocol::from_mime_type);
        playback.source_url = source_url;

        let source_url = self.engine.playback().source_url.clone();
        if !self
            .annotator
            .on_load_start(source_url.as_deref(), &mut self.engine)
        {
            Logger::warn("Disp: no engine attached, CMCD is disabled for this content");
        }
    }

    pub(super) fn on_playback_tick_core(&mut self, observation: PlaybackObservation) {
        let playback = self.engine.playback_mut();
        playback.current_time = observation.current_time();
        playback.playback_rate = observation.playback_rate();
        playback.duration = observation.duration();
        self.engine.update_buffered(observation.buffered());
    }

    pub(super) fn before_request_core(
        &mut self,
        uri: String,
        method: Option<String>,
        is_init_segment: bool,
    ) -> String {
        let mut options = RequestOptions::new(Url::new(uri));
        if let Some(method) = method {
            options.method = method;
        }
        options.is_init_segment = is_init_segment;
        self.engine.prepare_request(options).uri.take()
    }
}
