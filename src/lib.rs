pub mod game;
pub mod utils;
pub mod web;

use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

pub use game::{
    format_elapsed, Activation, BrowserClock, Card, CardId, CardState, Clock, ConfigError, Deck,
    Deferred, DeferredTask, GameConfig, GameEngine, GameEvent, Generation, IgnoreReason,
    IntegrityError, ManualClock, Outcome, Position, Presenter, RecordingPresenter, Resolution,
    RoundState, RoundSummary, Session, Symbol, SymbolCatalog, Timing, Turn,
};
pub use web::{DomPresenter, MemoryApp, WebError};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging(log::LevelFilter::Info);
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn load_config(config_json: Option<String>) -> Result<GameConfig, JsValue> {
    let config = GameConfig::from_json(config_json.as_deref()).map_err(to_js_error)?;
    utils::init_logging(config.level_filter().map_err(to_js_error)?);
    Ok(config)
}

/// 无界面的引擎封装：由 JS 自行渲染，所有结果以 JSON 返回。
/// 延迟任务（`deferred`）需由调用方按 `delay_ms` 计时后传回 `fire`。
#[wasm_bindgen]
pub struct MemoryGame {
    engine: GameEngine<BrowserClock>,
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = load_config(config_json)?;
        let engine = GameEngine::new(&config, BrowserClock).map_err(to_js_error)?;
        Ok(MemoryGame { engine })
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.engine.state()).map_err(serde_to_js_error)
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(self.engine.state()).map_err(JsValue::from)
    }

    pub fn generation(&self) -> f64 {
        self.engine.generation() as f64
    }

    pub fn activate(&mut self, position: usize) -> Result<String, JsValue> {
        let turn = self.engine.activate(position);
        serde_json::to_string(&turn).map_err(serde_to_js_error)
    }

    pub fn resolve(&mut self) -> Result<Option<String>, JsValue> {
        self.engine
            .resolve()
            .map(|resolution| serde_json::to_string(&resolution).map_err(serde_to_js_error))
            .transpose()
    }

    pub fn fire(&mut self, deferred_json: &str) -> Result<String, JsValue> {
        let deferred: Deferred = serde_json::from_str(deferred_json).map_err(serde_to_js_error)?;
        let events = self.engine.fire(&deferred);
        serde_json::to_string(&events).map_err(serde_to_js_error)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let events = self.engine.reset();
        serde_json::to_string(&events).map_err(serde_to_js_error)
    }

    pub fn tick(&self) -> Option<String> {
        self.engine.tick()
    }

    #[wasm_bindgen(js_name = "elapsedDisplay")]
    pub fn elapsed_display(&self) -> String {
        self.engine.elapsed_display()
    }

    pub fn validate(&self) -> Result<(), JsValue> {
        self.engine.state().integrity_check().map_err(|error| {
            to_value(&error).unwrap_or_else(|err| JsValue::from_str(&err.to_string()))
        })
    }
}

/// 按配置挂载到当前页面。
#[wasm_bindgen]
pub fn mount(config_json: Option<String>) -> Result<MemoryApp, JsValue> {
    let config = load_config(config_json)?;
    let document = web::document().map_err(to_js_error)?;
    web::mount(&config, &document).map_err(to_js_error)
}

#[wasm_bindgen(js_name = "formatElapsed")]
pub fn format_elapsed_ms(elapsed_ms: f64) -> String {
    format_elapsed(elapsed_ms.max(0.0) as u64)
}
