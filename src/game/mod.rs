//! 游戏核心逻辑模块（牌组、状态机、规则引擎等）。

pub mod clock;
pub mod config;
pub mod deck;
pub mod present;
pub mod rules;
pub mod session;
pub mod state;

pub use clock::{format_elapsed, BrowserClock, Clock, ManualClock, Millis, Ticker, TickerChange};
pub use config::{ConfigError, ElementIds, GameConfig, Timing, DEFAULT_CARD_BACK, DEFAULT_SYMBOLS};
pub use deck::{Card, CardId, CardState, Deck, Symbol, SymbolCatalog};
pub use present::{present, Presenter, RecordingPresenter};
pub use rules::{
    Activation,
    Deferred,
    DeferredTask,
    GameEngine,
    IgnoreReason,
    Outcome,
    Resolution,
    Turn,
};
pub use session::Session;
pub use state::{
    GameEvent,
    Generation,
    IntegrityError,
    Position,
    RoundState,
    RoundSummary,
    SELECTION_LIMIT,
};
