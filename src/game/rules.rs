use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{
    clock::{format_elapsed, Clock},
    config::{ConfigError, GameConfig, Timing},
    deck::{Card, CardState, Deck, Symbol, SymbolCatalog},
    state::{GameEvent, Generation, Position, RoundState, RoundSummary, SELECTION_LIMIT},
};

/// 翻牌请求被忽略的原因。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IgnoreReason {
    OutOfRange,
    AlreadyFaceUp,
    AlreadyMatched,
    SelectionFull,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Activation {
    Ignored {
        position: Position,
        reason: IgnoreReason,
    },
    Flipped {
        position: Position,
        card: Card,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    Match {
        first: Position,
        second: Position,
        symbol: Symbol,
    },
    Mismatch {
        first: Position,
        second: Position,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DeferredTask {
    /// 仅展示：给已配对的两张牌加 matched 样式。
    HighlightMatch { first: Position, second: Position },
    /// 翻回配对失败的两张牌并清空选择。
    RevertMismatch { first: Position, second: Position },
    AnnounceWin { summary: RoundSummary },
}

/// 带局号的延迟任务，由宿主按 `delay_ms` 调度后交回 `GameEngine::fire`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deferred {
    pub generation: Generation,
    pub delay_ms: u32,
    pub task: DeferredTask,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub events: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<Deferred>,
}

/// 一次 `activate` 的完整结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub activation: Activation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<Deferred>,
}

impl Turn {
    fn ignored(position: Position, reason: IgnoreReason) -> Self {
        Self {
            activation: Activation::Ignored { position, reason },
            events: Vec::new(),
            outcome: None,
            deferred: Vec::new(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self.activation, Activation::Ignored { .. })
    }
}

pub struct GameEngine<C> {
    catalog: SymbolCatalog,
    timing: Timing,
    clock: C,
    rng: SmallRng,
    state: RoundState,
}

impl<C: Clock> GameEngine<C> {
    pub fn new(config: &GameConfig, clock: C) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, clock, rng)
    }

    pub fn with_rng(config: &GameConfig, clock: C, mut rng: SmallRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = config.catalog()?;
        let deck = Deck::deal(&catalog, &mut rng);
        log::info!("dealt {} cards ({} pairs)", deck.len(), catalog.pair_count());
        Ok(Self {
            catalog,
            timing: config.timing,
            clock,
            rng,
            state: RoundState::new(0, deck),
        })
    }

    /// 使用给定牌序开局。牌序须是全部背面朝上的新牌，且恰好覆盖符号表中每个符号各两张。
    pub fn with_deck(config: &GameConfig, clock: C, deck: Deck) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config, clock)?;
        let state = RoundState::new(0, deck);
        state
            .integrity_check()
            .map_err(|error| ConfigError::DeckMismatch {
                reason: error.to_string(),
            })?;
        let dealt: BTreeSet<&Symbol> = state.deck.symbol_counts().into_keys().collect();
        let expected: BTreeSet<&Symbol> = engine.catalog.symbols().iter().collect();
        if dealt != expected {
            return Err(ConfigError::DeckMismatch {
                reason: format!(
                    "deck has {} symbols, catalog has {}",
                    dealt.len(),
                    expected.len()
                ),
            });
        }
        engine.state = state;
        Ok(engine)
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    /// 整副牌的快照事件，用于首次渲染。
    pub fn dealt_event(&self) -> GameEvent {
        GameEvent::RoundDealt {
            generation: self.state.generation,
            cards: self.state.deck.cards().to_vec(),
        }
    }

    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.state.elapsed(self.clock.now()))
    }

    /// 计时中返回新的显示值，否则 `None`。
    pub fn tick(&self) -> Option<String> {
        self.state.is_timing().then(|| self.elapsed_display())
    }

    fn check_activation(&self, position: Position) -> Result<(), IgnoreReason> {
        let card = self.state.card(position).ok_or(IgnoreReason::OutOfRange)?;
        match card.state {
            CardState::FaceUp => return Err(IgnoreReason::AlreadyFaceUp),
            CardState::Matched => return Err(IgnoreReason::AlreadyMatched),
            CardState::FaceDown => {}
        }
        if self.state.selection_full() {
            return Err(IgnoreReason::SelectionFull);
        }
        Ok(())
    }

    pub fn activate(&mut self, position: Position) -> Turn {
        if let Err(reason) = self.check_activation(position) {
            log::debug!("ignored activation at {position}: {reason:?}");
            return Turn::ignored(position, reason);
        }

        let mut events = Vec::new();
        if !self.state.started {
            let now = self.clock.now();
            self.state.started = true;
            self.state.start_time = Some(now);
            events.push(GameEvent::RoundStarted { started_at: now });
        }

        let card = match self.state.deck.get_mut(position) {
            Some(card) => {
                card.state = CardState::FaceUp;
                card.clone()
            }
            None => return Turn::ignored(position, IgnoreReason::OutOfRange),
        };
        self.state.selection.push(position);
        log::debug!("flipped {position} ({})", card.symbol);
        events.push(GameEvent::CardChanged {
            position,
            state: CardState::FaceUp,
        });

        let mut turn = Turn {
            activation: Activation::Flipped { position, card },
            events,
            outcome: None,
            deferred: Vec::new(),
        };

        if self.state.selection.len() == SELECTION_LIMIT {
            self.state.moves += 1;
            turn.events.push(GameEvent::MovesChanged {
                moves: self.state.moves,
            });
            if let Some(resolution) = self.resolve() {
                turn.events.extend(resolution.events);
                turn.deferred = resolution.deferred;
                turn.outcome = Some(resolution.outcome);
            }
        }

        turn
    }

    /// 比较选择中的两张牌。选择不足两张或已在等待翻回时返回 `None`。
    pub fn resolve(&mut self) -> Option<Resolution> {
        if self.state.awaiting_revert {
            return None;
        }
        let (first, second) = match self.state.selection.as_slice() {
            &[first, second] => (first, second),
            _ => return None,
        };
        let first_card = self.state.card(first)?;
        let is_match = first_card.pairs_with(self.state.card(second)?);
        let symbol = first_card.symbol.clone();
        let generation = self.state.generation;

        if !is_match {
            self.state.awaiting_revert = true;
            log::debug!("mismatch at {first}/{second}");
            return Some(Resolution {
                outcome: Outcome::Mismatch { first, second },
                events: vec![GameEvent::PairMismatched { first, second }],
                deferred: vec![Deferred {
                    generation,
                    delay_ms: self.timing.mismatch_revert_ms,
                    task: DeferredTask::RevertMismatch { first, second },
                }],
            });
        }

        for position in [first, second] {
            if let Some(card) = self.state.deck.get_mut(position) {
                card.state = CardState::Matched;
            }
        }
        self.state.selection.clear();
        self.state.matched_pairs += 1;
        log::debug!("matched {symbol} at {first}/{second}");

        let mut events = vec![GameEvent::PairMatched {
            first,
            second,
            matched_pairs: self.state.matched_pairs,
        }];
        let mut deferred = vec![Deferred {
            generation,
            delay_ms: self.timing.match_highlight_ms,
            task: DeferredTask::HighlightMatch { first, second },
        }];

        if !self.state.completed && self.state.matched_pairs as usize == self.state.pair_count() {
            let summary = self.complete();
            events.push(GameEvent::RoundCompleted {
                summary: summary.clone(),
            });
            deferred.push(Deferred {
                generation,
                delay_ms: self.timing.win_banner_ms,
                task: DeferredTask::AnnounceWin { summary },
            });
        }

        Some(Resolution {
            outcome: Outcome::Match {
                first,
                second,
                symbol,
            },
            events,
            deferred,
        })
    }

    fn complete(&mut self) -> RoundSummary {
        let elapsed_ms = self
            .state
            .start_time
            .map(|start| self.clock.now().saturating_sub(start))
            .unwrap_or_default();
        let summary = RoundSummary {
            moves: self.state.moves,
            elapsed_ms,
        };
        self.state.completed = true;
        self.state.summary = Some(summary.clone());
        log::info!(
            "round {} completed in {} moves, {}",
            self.state.generation,
            summary.moves,
            summary.elapsed_display()
        );
        summary
    }

    /// 执行到期的延迟任务；局号不符的任务直接丢弃。
    pub fn fire(&mut self, deferred: &Deferred) -> Vec<GameEvent> {
        if deferred.generation != self.state.generation {
            log::debug!(
                "dropping stale {:?} from round {} (current {})",
                deferred.task,
                deferred.generation,
                self.state.generation
            );
            return Vec::new();
        }

        match &deferred.task {
            DeferredTask::HighlightMatch { first, second } => self.highlight(*first, *second),
            DeferredTask::RevertMismatch { first, second } => self.revert(*first, *second),
            DeferredTask::AnnounceWin { .. } => self.announce(),
        }
    }

    fn highlight(&self, first: Position, second: Position) -> Vec<GameEvent> {
        let matched = |position| {
            self.state
                .card(position)
                .map_or(false, |card| card.state == CardState::Matched)
        };
        if first == second || !matched(first) || !matched(second) {
            log::debug!("ignoring highlight of unmatched {first}/{second}");
            return Vec::new();
        }
        [first, second]
            .into_iter()
            .map(|position| GameEvent::CardChanged {
                position,
                state: CardState::Matched,
            })
            .collect()
    }

    /// 胜利提示以局面记录的结果为准，未完成的局不提示。
    fn announce(&self) -> Vec<GameEvent> {
        match (&self.state.summary, self.state.completed) {
            (Some(summary), true) => vec![GameEvent::WinAnnounced {
                summary: summary.clone(),
            }],
            _ => {
                log::debug!("ignoring win banner for unfinished round {}", self.state.generation);
                Vec::new()
            }
        }
    }

    fn revert(&mut self, first: Position, second: Position) -> Vec<GameEvent> {
        if !self.state.awaiting_revert || self.state.selection != [first, second] {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(SELECTION_LIMIT);
        for position in [first, second] {
            if let Some(card) = self.state.deck.get_mut(position) {
                if card.state == CardState::FaceUp {
                    card.state = CardState::FaceDown;
                    events.push(GameEvent::CardChanged {
                        position,
                        state: CardState::FaceDown,
                    });
                }
            }
        }
        self.state.selection.clear();
        self.state.awaiting_revert = false;
        events
    }

    /// 丢弃当前局，用同一符号表重新洗牌开局。
    pub fn reset(&mut self) -> Vec<GameEvent> {
        let generation = self.state.generation + 1;
        let deck = Deck::deal(&self.catalog, &mut self.rng);
        self.state = RoundState::new(generation, deck);
        log::info!("round {generation} dealt");
        vec![
            self.dealt_event(),
            GameEvent::MovesChanged { moves: 0 },
        ]
    }
}
