use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::{ensure_distinct, ConfigError};

/// 本局内唯一的卡牌标识。
pub type CardId = u32;

/// 卡面符号，两张卡牌共享同一个符号即为一对。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardState {
    FaceDown,
    FaceUp,
    Matched,
}

impl Default for CardState {
    fn default() -> Self {
        CardState::FaceDown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub symbol: Symbol,
    #[serde(default)]
    pub state: CardState,
}

impl Card {
    pub fn new(id: CardId, symbol: Symbol) -> Self {
        Self {
            id,
            symbol,
            state: CardState::FaceDown,
        }
    }

    pub fn is_face_down(&self) -> bool {
        self.state == CardState::FaceDown
    }

    pub fn pairs_with(&self, other: &Card) -> bool {
        self.symbol == other.symbol
    }
}

/// 去重后的符号表，至少两个符号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
}

impl SymbolCatalog {
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, ConfigError> {
        ensure_distinct(&symbols)?;
        Ok(Self { symbols })
    }

    pub fn pair_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// 一局的牌序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 按符号表顺序生成成对相邻、全部背面朝上的牌。
    pub fn build(catalog: &SymbolCatalog) -> Self {
        let cards = catalog
            .symbols()
            .iter()
            .enumerate()
            .flat_map(|(index, symbol)| {
                let base = index as CardId * 2;
                [
                    Card::new(base, symbol.clone()),
                    Card::new(base + 1, symbol.clone()),
                ]
            })
            .collect();
        Self { cards }
    }

    /// Fisher–Yates，从最后一位向前与 `0..=i` 中均匀选取的位置交换。
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn deal<R: Rng + ?Sized>(catalog: &SymbolCatalog, rng: &mut R) -> Self {
        let mut deck = Self::build(catalog);
        deck.shuffle(rng);
        deck
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn get(&self, position: usize) -> Option<&Card> {
        self.cards.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Card> {
        self.cards.get_mut(position)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn symbol_counts(&self) -> BTreeMap<&Symbol, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(&card.symbol).or_insert(0) += 1;
        }
        counts
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}
