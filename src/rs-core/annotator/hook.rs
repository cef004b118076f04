use std::{cell::RefCell, rc::Rc};

use crate::{
    playback::PlaybackSnapshot,
    requester::{HookId, RequestHook, RequestOptions},
    Logger,
};

use super::{
    observers::{Observers, RequestLogRecord},
    AnnotatorState,
};

pub const CMCD_HOOK_ID: HookId = HookId("cmcd");

/// The pre-send hook appending CMCD data to requests.
///
/// It shares its state with the `CmcdAnnotator` which installed it, so
/// lifecycle events are seen by the very next request.
pub(crate) struct CmcdRequestHook {
    state: Rc<RefCell<AnnotatorState>>,
    observers: Rc<RefCell<Observers>>,
}

impl CmcdRequestHook {
    pub(crate) fn new(
        state: Rc<RefCell<AnnotatorState>>,
        observers: Rc<RefCell<Observers>>,
    ) -> Self {
        Self { state, observers }
    }
}

impl RequestHook for CmcdRequestHook {
    fn id(&self) -> HookId {
        CMCD_HOOK_ID
    }

    fn before_request(
        &mut self,
        mut options: RequestOptions,
        playback: &PlaybackSnapshot<'_>,
    ) -> RequestOptions {
        let annotation = match self.state.try_borrow_mut() {
            Ok(mut state) => state.annotate(&options, playback),
            Err(_) => {
                Logger::warn("CMCD: state unavailable, request left as is");
                return options;
            }
        };
        let (fields, fragment) = match annotation {
            Some(annotation) => annotation,
            None => return options,
        };

        options.uri = options.uri.with_query_fragment(&fragment);
        let record = RequestLogRecord::new(
            options.uri.to_string(),
            options.method.clone(),
            fragment,
        );
        match self.observers.try_borrow_mut() {
            Ok(mut observers) => observers.notify(&record, &fields),
            Err(_) => Logger::debug("CMCD: observers busy, skipping notification"),
        }
        options
    }
}
