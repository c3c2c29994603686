//! Hyakunin Karuta core crate.
//!
//! A poem is recited one character at a time and the player takes the card
//! carrying its second half from a hand of ten. The game state machine, dealing
//! and recitation are plain Rust (`game`, `round`, `recitation`) and run under
//! `cargo test` on the host; `web` wires them to the DOM when built for wasm.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod poems;
pub mod recitation;
pub mod round;
pub mod schedule;
pub mod view;
mod web;

pub use config::GameConfig;
pub use error::ConfigError;
pub use game::{Command, Env, Game, GameState, Session};
pub use poems::{Dataset, PoemId, PoemRecord};
pub use round::{Hand, Round, generate_round};
pub use view::Snapshot;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Trace);
    log::set_max_level(log::LevelFilter::Info);
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::start(GameConfig::default())
}

/// Start with tuning overrides, e.g. `{"recitation_speed_ms": 250}`.
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    web::start(GameConfig::from_json(json)?)
}

#[wasm_bindgen]
pub fn set_recitation_speed(ms: u32) {
    web::dispatch(Command::SetRecitationSpeed(ms));
}

/// Current session as JSON, `"null"` before `start_game`.
#[wasm_bindgen]
pub fn snapshot_json() -> String {
    web::snapshot()
        .map(|snap| snap.to_json())
        .unwrap_or_else(|| "null".to_string())
}
