use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::clock::{format_elapsed, Millis};
use super::deck::{Card, CardId, CardState, Deck, Symbol};

/// 棋盘上的位置（牌序下标）。
pub type Position = usize;
/// 局号，每次重置递增，用来识别过期的延迟任务。
pub type Generation = u64;

pub const SELECTION_LIMIT: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundSummary {
    pub moves: u32,
    pub elapsed_ms: Millis,
}

impl RoundSummary {
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_ms)
    }
}

/// 游戏事件流，供展示层消费。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    RoundDealt {
        generation: Generation,
        cards: Vec<Card>,
    },
    RoundStarted {
        started_at: Millis,
    },
    CardChanged {
        position: Position,
        state: CardState,
    },
    MovesChanged {
        moves: u32,
    },
    PairMatched {
        first: Position,
        second: Position,
        matched_pairs: u32,
    },
    PairMismatched {
        first: Position,
        second: Position,
    },
    RoundCompleted {
        summary: RoundSummary,
    },
    WinAnnounced {
        summary: RoundSummary,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("selection holds {len} cards")]
    SelectionOverflow { len: usize },
    #[error("position {position} is out of range")]
    PositionOutOfRange { position: Position },
    #[error("selected card at {position} is not face up")]
    SelectionNotFaceUp { position: Position },
    #[error("card at {position} is face up outside the selection")]
    FaceUpOutsideSelection { position: Position },
    #[error("card id {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("symbol `{symbol}` appears {count} times")]
    UnpairedSymbol { symbol: Symbol, count: usize },
    #[error("{matched_pairs} matched pairs but {matched_cards} matched cards")]
    MatchedCountMismatch { matched_pairs: u32, matched_cards: usize },
    #[error("{matched_pairs}/{pair_count} pairs found but completed is {completed}")]
    CompletionMismatch { matched_pairs: u32, pair_count: usize, completed: bool },
}

/// 一局的全部可变状态，只由 `GameEngine` 修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundState {
    pub generation: Generation,
    pub deck: Deck,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<Position>,
    pub moves: u32,
    pub matched_pairs: u32,
    pub started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Millis>,
    pub completed: bool,
    /// 配对失败、等待翻回的窗口。
    #[serde(default)]
    pub awaiting_revert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoundSummary>,
}

impl RoundState {
    pub fn new(generation: Generation, deck: Deck) -> Self {
        Self {
            generation,
            deck,
            selection: Vec::with_capacity(SELECTION_LIMIT),
            moves: 0,
            matched_pairs: 0,
            started: false,
            start_time: None,
            completed: false,
            awaiting_revert: false,
            summary: None,
        }
    }

    pub fn pair_count(&self) -> usize {
        self.deck.pair_count()
    }

    pub fn card(&self, position: Position) -> Option<&Card> {
        self.deck.get(position)
    }

    pub fn selection_full(&self) -> bool {
        self.selection.len() >= SELECTION_LIMIT
    }

    /// 已开始且未完成时计时器才需要运行。
    pub fn is_timing(&self) -> bool {
        self.started && !self.completed
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        match (&self.summary, self.start_time) {
            (Some(summary), _) => summary.elapsed_ms,
            (None, Some(start)) => now.saturating_sub(start),
            (None, None) => 0,
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.selection.len() > SELECTION_LIMIT {
            return Err(IntegrityError::SelectionOverflow {
                len: self.selection.len(),
            });
        }
        for &position in &self.selection {
            let card = self
                .card(position)
                .ok_or(IntegrityError::PositionOutOfRange { position })?;
            if card.state != CardState::FaceUp {
                return Err(IntegrityError::SelectionNotFaceUp { position });
            }
        }

        let mut ids = HashSet::new();
        let mut matched_cards = 0;
        for (position, card) in self.deck.cards().iter().enumerate() {
            if !ids.insert(card.id) {
                return Err(IntegrityError::DuplicateCardId { card_id: card.id });
            }
            match card.state {
                CardState::FaceUp if !self.selection.contains(&position) => {
                    return Err(IntegrityError::FaceUpOutsideSelection { position });
                }
                CardState::Matched => matched_cards += 1,
                _ => {}
            }
        }

        if let Some((symbol, count)) = self
            .deck
            .symbol_counts()
            .into_iter()
            .find(|(_, count)| *count != 2)
        {
            return Err(IntegrityError::UnpairedSymbol {
                symbol: symbol.clone(),
                count,
            });
        }

        if matched_cards != self.matched_pairs as usize * 2 {
            return Err(IntegrityError::MatchedCountMismatch {
                matched_pairs: self.matched_pairs,
                matched_cards,
            });
        }

        let all_found = self.matched_pairs as usize == self.pair_count();
        if all_found != self.completed {
            return Err(IntegrityError::CompletionMismatch {
                matched_pairs: self.matched_pairs,
                pair_count: self.pair_count(),
                completed: self.completed,
            });
        }

        Ok(())
    }
}
