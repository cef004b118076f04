use std::{
    cell::{RefCell, RefMut},
    rc::Rc,
};

use crate::{
    cmcd::{
        encoder::{to_query_fragment, CMCD_QUERY_PARAM},
        rules::{classify_object_type, derive_fields, DerivationContext, RequestContext},
        session::{content_id_for, generate_session_id, SessionContext},
        CmcdFieldSet, CmcdKey, CmcdValue,
    },
    playback::{PlaybackSnapshot, StreamingEngine},
    requester::RequestOptions,
    Logger,
};

mod configuration;
mod hook;
mod observers;
mod segment_tracker;

pub use configuration::{parse_key_list, AnnotatorConfiguration};
pub use hook::CMCD_HOOK_ID;
pub use observers::{FieldSetCallback, RequestLogCallback, RequestLogRecord};

use hook::CmcdRequestHook;
use observers::Observers;
use segment_tracker::SegmentTracker;

/// Flags set by playback events and read when deriving CMCD fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransientFlags {
    /// Set on load, seek and rebuffering recovery, cleared by the next
    /// request announcing `su`.
    pub startup_pending: bool,
    /// Set while playback is stalled.
    pub buffer_starvation: bool,
}

/// State shared between the `CmcdAnnotator` and the hook it installs.
pub(crate) struct AnnotatorState {
    session: SessionContext,
    flags: TransientFlags,
    tracker: SegmentTracker,
    config: AnnotatorConfiguration,
    request_count: u64,
}

impl AnnotatorState {
    fn new(config: AnnotatorConfiguration) -> Self {
        Self {
            session: SessionContext::default(),
            flags: TransientFlags::default(),
            tracker: SegmentTracker::new(),
            config,
            request_count: 0,
        }
    }

    /// Derive the CMCD fields of a request about to be sent and produce the
    /// query fragment to append to its URL.
    ///
    /// Returns `None` if nothing has to be appended.
    pub(crate) fn annotate(
        &mut self,
        options: &RequestOptions,
        playback: &PlaybackSnapshot<'_>,
    ) -> Option<(CmcdFieldSet, String)> {
        if options.uri.query_param(CMCD_QUERY_PARAM).is_some() {
            Logger::debug("CMCD: request already annotated");
            return None;
        }
        let object_type = classify_object_type(&options.uri, options.is_init_segment);
        let tracked_segment = self.tracker.on_request(&options.uri, object_type, playback);

        let mut fields = derive_fields(&DerivationContext {
            playback,
            request: RequestContext {
                url: &options.uri,
                is_init_segment: options.is_init_segment,
            },
            session: &self.session,
            startup_pending: self.flags.startup_pending,
            buffer_starvation: self.flags.buffer_starvation,
            tracked_segment,
        });
        let config = &self.config;
        fields.retain_keys(|key| config.is_enabled(key));
        let fragment = to_query_fragment(&fields)?;

        if fields.get(CmcdKey::Startup).and_then(CmcdValue::as_bool) == Some(true) {
            self.flags.startup_pending = false;
        }
        self.request_count += 1;
        Logger::lazy_debug(&|| {
            format!(
                "CMCD: annotated request #{} u:{} ot:{}",
                self.request_count,
                options.uri,
                object_type.token()
            )
        });
        Some((fields, fragment))
    }
}

/// The `CmcdAnnotator` adds Common Media Client Data to the requests of a
/// streaming engine.
///
/// It installs a hook on the engine's `RequestTransport` and keeps, through
/// its lifecycle methods, the session and the transient flags that hook
/// relies on.
pub struct CmcdAnnotator {
    state: Rc<RefCell<AnnotatorState>>,
    observers: Rc<RefCell<Observers>>,
}

impl Default for CmcdAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl CmcdAnnotator {
    pub fn new() -> Self {
        Self::with_config(AnnotatorConfiguration::default())
    }

    pub fn with_config(config: AnnotatorConfiguration) -> Self {
        Self {
            state: Rc::new(RefCell::new(AnnotatorState::new(config))),
            observers: Rc::new(RefCell::new(Observers::default())),
        }
    }

    pub fn config_mut(&self) -> RefMut<'_, AnnotatorConfiguration> {
        RefMut::map(self.state.borrow_mut(), |state| &mut state.config)
    }

    /// The current session, cloned.
    pub fn session(&self) -> SessionContext {
        self.state.borrow().session.clone()
    }

    pub fn flags(&self) -> TransientFlags {
        self.state.borrow().flags
    }

    /// Number of requests annotated since this `CmcdAnnotator` was created.
    pub fn request_count(&self) -> u64 {
        self.state.borrow().request_count
    }

    /// Set the callback receiving a `RequestLogRecord` per annotated request.
    pub fn set_request_log_observer(&self, cb: Option<RequestLogCallback>) {
        self.observers.borrow_mut().set_request_log(cb);
    }

    /// Set the callback receiving the CMCD fields of each annotated request.
    pub fn set_field_set_observer(&self, cb: Option<FieldSetCallback>) {
        self.observers.borrow_mut().set_field_set(cb);
    }

    /// Install the CMCD hook on the engine's transport.
    ///
    /// Returns `true` if the hook is installed after this call, whether it
    /// was just installed or already there. Returns `false` if the engine has
    /// no transport, in which case its requests won't be annotated.
    pub fn install(&self, engine: &mut dyn StreamingEngine) -> bool {
        match engine.transport_mut() {
            None => {
                Logger::warn("CMCD: no request transport, requests won't be annotated");
                false
            }
            Some(transport) => {
                let hook = CmcdRequestHook::new(self.state.clone(), self.observers.clone());
                if !transport.install(Box::new(hook)) {
                    Logger::debug("CMCD: hook already installed");
                }
                true
            }
        }
    }

    /// Remove the CMCD hook from the engine's transport, if present.
    pub fn uninstall(&self, engine: &mut dyn StreamingEngine) -> bool {
        engine
            .transport_mut()
            .map_or(false, |transport| transport.uninstall(CMCD_HOOK_ID))
    }

    /// A new content starts loading from `source_url`.
    ///
    /// Starts a new session and (re-)installs the hook on the engine.
    pub fn on_load_start(&self, source_url: Option<&str>, engine: &mut dyn StreamingEngine) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let session_id = state
                .config
                .session_id
                .clone()
                .unwrap_or_else(generate_session_id);
            let content_id = state
                .config
                .content_id
                .clone()
                .or_else(|| source_url.map(content_id_for));
            Logger::info(&format!(
                "CMCD: new session sid:{} cid:{}",
                session_id,
                content_id.as_deref().unwrap_or("none")
            ));
            state.session = SessionContext::new(session_id, content_id);
            state.flags = TransientFlags {
                startup_pending: true,
                buffer_starvation: false,
            };
            state.tracker.reset();
        }
        self.install(engine)
    }

    /// The content's metadata are known.
    pub fn on_loaded_metadata(&self) {
        Logger::debug("CMCD: metadata loaded");
        self.state.borrow_mut().flags.startup_pending = true;
    }

    /// Playback stalled because of an empty buffer.
    pub fn on_stall_begin(&self) {
        Logger::debug("CMCD: stall begins");
        self.state.borrow_mut().flags.buffer_starvation = true;
    }

    /// Playback can resume. If it was stalled, the next request is
    /// considered part of a new startup.
    pub fn on_stall_end(&self) {
        let mut state = self.state.borrow_mut();
        if state.flags.buffer_starvation {
            Logger::debug("CMCD: recovered from a stall");
            state.flags.startup_pending = true;
        }
        state.flags.buffer_starvation = false;
    }

    /// A seek operation ended.
    pub fn on_seeked(&self) {
        Logger::debug("CMCD: seeked");
        self.state.borrow_mut().flags.startup_pending = true;
    }
}
