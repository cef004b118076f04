#![allow(dead_code)]

use wasm_bindgen::prelude::*;

pub mod annotator;
mod bindings;
pub mod cmcd;
pub mod dispatcher;
pub mod playback;
pub mod requester;
pub mod utils;

pub use annotator::CmcdAnnotator;
pub use utils::logger::Logger;
