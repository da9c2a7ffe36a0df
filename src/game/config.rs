use std::collections::HashSet;
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::deck::{Symbol, SymbolCatalog};

/// 默认卡面：每张图片会生成两张卡。
pub const DEFAULT_SYMBOLS: [&str; 8] = [
    "assets/anoma ateş.png",
    "assets/anoma uçuş.png",
    "assets/anoma top.png",
    "assets/anoma npc.png",
    "assets/anoma yemek.png",
    "assets/anoma elmas.png",
    "assets/anoma bisiklet.png",
    "assets/anoma sihir.png",
];

pub const DEFAULT_CARD_BACK: &str = "assets/anoma kart2.png";

const DEFAULT_MATCH_HIGHLIGHT_MS: u32 = 300;
const DEFAULT_MISMATCH_REVERT_MS: u32 = 750;
const DEFAULT_WIN_BANNER_MS: u32 = 500;
const DEFAULT_TICK_MS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("at least 2 symbols are required, got {count}")]
    TooFewSymbols { count: usize },
    #[error("symbol `{symbol}` appears more than once")]
    DuplicateSymbol { symbol: String },
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
    #[error("unknown log level `{level}`")]
    InvalidLogLevel { level: String },
    #[error("invalid config json: {message}")]
    InvalidJson { message: String },
    #[error("deck does not match the symbol catalog: {reason}")]
    DeckMismatch { reason: String },
}

/// 延迟参数（毫秒）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timing {
    /// 配对成功后多久给卡牌加上 matched 样式。
    pub match_highlight_ms: u32,
    /// 配对失败的两张牌保持翻开的时间，期间不接受新的翻牌。
    pub mismatch_revert_ms: u32,
    /// 最后一对配对后多久弹出胜利提示。
    pub win_banner_ms: u32,
    pub tick_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            match_highlight_ms: DEFAULT_MATCH_HIGHLIGHT_MS,
            mismatch_revert_ms: DEFAULT_MISMATCH_REVERT_MS,
            win_banner_ms: DEFAULT_WIN_BANNER_MS,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

/// 页面元素 id。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ElementIds {
    pub board: String,
    pub moves: String,
    pub time: String,
    pub reset_button: String,
    pub play_again_button: String,
    pub win_message: String,
    pub final_moves: String,
    pub final_time: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            board: "game-board".into(),
            moves: "moves".into(),
            time: "time".into(),
            reset_button: "reset-btn".into(),
            play_again_button: "play-again-btn".into(),
            win_message: "win-message".into(),
            final_moves: "final-moves".into(),
            final_time: "final-time".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub symbols: Vec<String>,
    pub card_back: String,
    pub timing: Timing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    pub elements: ElementIds,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            card_back: DEFAULT_CARD_BACK.into(),
            timing: Timing::default(),
            seed: None,
            log_level: None,
            elements: ElementIds::default(),
        }
    }
}

impl GameConfig {
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// 解析可选的 JSON 配置；缺省字段使用默认值。
    pub fn from_json(json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(json).map_err(|err| ConfigError::InvalidJson {
                    message: err.to_string(),
                })?
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog()?;
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<SymbolCatalog, ConfigError> {
        SymbolCatalog::new(self.symbols.iter().map(Symbol::new).collect())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        match self.log_level.as_deref() {
            None => Ok(LevelFilter::Info),
            Some(level) => LevelFilter::from_str(level).map_err(|_| ConfigError::InvalidLogLevel {
                level: level.to_string(),
            }),
        }
    }
}

pub(crate) fn ensure_distinct(symbols: &[Symbol]) -> Result<(), ConfigError> {
    if symbols.len() < 2 {
        return Err(ConfigError::TooFewSymbols {
            count: symbols.len(),
        });
    }
    let mut seen = HashSet::new();
    for symbol in symbols {
        if !seen.insert(symbol) {
            return Err(ConfigError::DuplicateSymbol {
                symbol: symbol.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_json_uses_reference_catalog() {
        let config = GameConfig::from_json(None).expect("default config should be valid");
        assert_eq!(config.symbols.len(), 8);
        assert_eq!(config.timing.mismatch_revert_ms, 750);
        assert_eq!(config.elements.board, "game-board");
        assert_eq!(
            config.catalog().expect("catalog should build").pair_count(),
            8
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(Some(
            r#"{ "symbols": ["a", "b", "c"], "timing": { "mismatch_revert_ms": 10 }, "seed": 7 }"#,
        ))
        .expect("partial config should parse");
        assert_eq!(config.symbols, vec!["a", "b", "c"]);
        assert_eq!(config.timing.mismatch_revert_ms, 10);
        assert_eq!(config.timing.match_highlight_ms, 300);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.card_back, DEFAULT_CARD_BACK);
    }

    #[test]
    fn rejects_invalid_catalogs() {
        assert_eq!(
            GameConfig::with_symbols(["only"]).validate(),
            Err(ConfigError::TooFewSymbols { count: 1 })
        );
        assert_eq!(
            GameConfig::with_symbols(["a", "b", "a"]).validate(),
            Err(ConfigError::DuplicateSymbol { symbol: "a".into() })
        );
    }

    #[test]
    fn rejects_bad_timing_and_levels() {
        let mut config = GameConfig::default();
        config.timing.tick_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));

        let mut config = GameConfig::default();
        config.log_level = Some("loud".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel { .. })
        ));

        config.log_level = Some("debug".into());
        assert_eq!(config.level_filter(), Ok(LevelFilter::Debug));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = GameConfig::from_json(Some("{ nope")).expect_err("json should be rejected");
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
        assert!(err.to_string().starts_with("invalid config json"));
    }
}
