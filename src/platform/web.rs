//! Browser bindings
//!
//! The page owns rendering, input and audio. It forwards clicks and
//! `requestAnimationFrame` timestamps here and reads back JSON.

use wasm_bindgen::prelude::*;

use super::FrameClock;
use crate::persistence::platform_store;
use crate::sim::{Difficulty, GameSession, TargetKind};

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_kind(name: &str) -> Result<TargetKind, JsValue> {
    TargetKind::from_str(name).ok_or_else(|| js_err(format!("unknown bug kind {:?}", name)))
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    super::init_logging();
    log::info!("Ladybug Sheriff starting...");
}

/// One game session, driven from JS
#[wasm_bindgen]
pub struct WebGame {
    session: GameSession,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let seed = js_sys::Date::now() as u64;
        log::info!("Game initialized with seed: {}", seed);
        WebGame {
            session: GameSession::new(seed, platform_store()),
            clock: FrameClock::new(),
        }
    }

    /// Drive timers from a `requestAnimationFrame` timestamp
    pub fn frame(&mut self, now_ms: f64) {
        let step = self.clock.step(now_ms);
        self.session.advance(step);
    }

    pub fn open_setup(&mut self) -> Result<(), JsValue> {
        self.session.open_setup().map_err(js_err)
    }

    /// Start (or restart) a round with the current settings
    pub fn start_round(&mut self) -> Result<(), JsValue> {
        self.session.start_with_settings().map_err(js_err)
    }

    pub fn pause(&mut self) -> Result<(), JsValue> {
        self.session.pause().map_err(js_err)
    }

    pub fn resume(&mut self) -> Result<(), JsValue> {
        self.session.resume().map_err(js_err)
    }

    pub fn quit(&mut self) -> Result<(), JsValue> {
        self.session.quit().map_err(js_err)
    }

    /// Returns the outcome name
    pub fn hit(&mut self, slot: usize) -> String {
        self.session.hit(slot).as_str().to_string()
    }

    pub fn select_sheriff(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = parse_kind(name)?;
        self.session.select_sheriff(kind);
        Ok(())
    }

    pub fn toggle_correct(&mut self, name: &str) -> Result<bool, JsValue> {
        let kind = parse_kind(name)?;
        Ok(self.session.toggle_correct_kind(kind))
    }

    pub fn set_difficulty(&mut self, name: &str) -> Result<(), JsValue> {
        let difficulty = Difficulty::from_str(name)
            .ok_or_else(|| js_err(format!("unknown difficulty {:?}", name)))?;
        self.session.set_difficulty(difficulty);
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.session.toggle_mute()
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(js_err)
    }

    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_events()).map_err(js_err)
    }

    pub fn drain_cues_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_cues()).map_err(js_err)
    }

    /// Game-over summary, or `null` mid-round
    pub fn summary_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.summary()).map_err(js_err)
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
