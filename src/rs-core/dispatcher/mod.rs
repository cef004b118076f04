use crate::{annotator::CmcdAnnotator, wasm_bindgen};

mod api;
mod core;
mod engine_state;
mod event_listeners;

pub use engine_state::EngineStateError;
pub use event_listeners::PlaybackObservation;

use engine_state::EngineState;

/// The `Dispatcher` is the CMCD annotator's interface exported to the JavaScript-side.
///
/// The JavaScript-side mirrors the state of its streaming engine through it, forwards the
/// playback events it receives and asks it for the final URL of each request before sending it.
#[wasm_bindgen]
pub struct Dispatcher {
    /// Keeps the CMCD session and the flags driven by playback events, and
    /// installs the CMCD hook on the engine's request transport.
    annotator: CmcdAnnotator,

    /// State of the streaming engine, as communicated by the JavaScript-side,
    /// with the transport its requests go through.
    engine: EngineState,
}
