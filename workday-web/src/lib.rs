#![forbid(unsafe_code)]
//! Browser bridge for the Workday session core.
//!
//! The crate exposes the scene router to a host page: every scene entry is
//! re-broadcast as a `game-state` `CustomEvent` on `window`, `jump-to-stage`
//! events are fed back into the router, and the host drives time and input
//! through the `game_*` exports.

#[cfg(target_arch = "wasm32")]
mod bridge;
pub mod dom;
pub mod events;
#[cfg(target_arch = "wasm32")]
pub mod exports;
pub mod runner;

pub use events::{GAME_STATE_EVENT, JUMP_EVENT, parse_jump_detail};
pub use runner::WebRunner;
