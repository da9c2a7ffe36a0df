use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::game::{Card, CardState, ConfigError, ElementIds, Position, Presenter, RoundSummary};

pub const CARD_CLASS: &str = "card";
pub const FLIPPED_CLASS: &str = "flipped";
pub const MATCHED_CLASS: &str = "matched";
pub const SHOW_CLASS: &str = "show";
pub const INDEX_ATTR: &str = "data-index";

/// 图片加载失败时隐藏自身，保留布局。
const HIDE_ON_ERROR: &str = "this.style.display='none'";

#[derive(Debug, Clone, Serialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum WebError {
    #[error("no global window")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("missing element #{id}")]
    MissingElement { id: String },
    #[error("dom call failed: {message}")]
    Js { message: String },
    #[error("{error}")]
    Config { error: ConfigError },
}

impl From<ConfigError> for WebError {
    fn from(error: ConfigError) -> Self {
        WebError::Config { error }
    }
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        WebError::Js {
            message: value.as_string().unwrap_or_else(|| format!("{value:?}")),
        }
    }
}

pub fn document() -> Result<Document, WebError> {
    web_sys::window()
        .ok_or(WebError::NoWindow)?
        .document()
        .ok_or(WebError::NoDocument)
}

pub fn element(document: &Document, id: &str) -> Result<Element, WebError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| WebError::MissingElement { id: id.to_string() })
}

fn warn_on_error(result: Result<(), JsValue>, context: &str) {
    if let Err(err) = result {
        log::warn!("{context}: {}", WebError::from(err));
    }
}

/// 直接操作页面元素的展示层。
pub struct DomPresenter {
    document: Document,
    board: Element,
    moves: Element,
    time: Element,
    win_message: Element,
    final_moves: Element,
    final_time: Element,
    card_back: String,
    cards: Vec<Element>,
}

impl DomPresenter {
    pub fn new(
        document: &Document,
        ids: &ElementIds,
        card_back: impl Into<String>,
    ) -> Result<Self, WebError> {
        Ok(Self {
            document: document.clone(),
            board: element(document, &ids.board)?,
            moves: element(document, &ids.moves)?,
            time: element(document, &ids.time)?,
            win_message: element(document, &ids.win_message)?,
            final_moves: element(document, &ids.final_moves)?,
            final_time: element(document, &ids.final_time)?,
            card_back: card_back.into(),
            cards: Vec::new(),
        })
    }

    pub fn board(&self) -> &Element {
        &self.board
    }

    fn face(&self, class: &str, src: &str, alt: &str) -> Result<Element, WebError> {
        let face = self.document.create_element("div")?;
        face.set_class_name(class);
        let image = self.document.create_element("img")?;
        image.set_attribute("src", src)?;
        image.set_attribute("alt", alt)?;
        image.set_attribute("onerror", HIDE_ON_ERROR)?;
        face.append_child(&image)?;
        Ok(face)
    }

    fn build_card(&self, position: Position, card: &Card) -> Result<Element, WebError> {
        let element = self.document.create_element("div")?;
        element.set_class_name(CARD_CLASS);
        element.set_attribute(INDEX_ATTR, &position.to_string())?;
        apply_state(&element, card.state)?;
        let front = self.face("card-front", card.symbol.as_str(), "Card")?;
        element.append_child(&front)?;
        let back = self.face("card-back", &self.card_back, "Card back")?;
        element.append_child(&back)?;
        Ok(element)
    }
}

fn apply_state(element: &Element, state: CardState) -> Result<(), JsValue> {
    let classes = element.class_list();
    match state {
        CardState::FaceDown => {
            classes.remove_1(FLIPPED_CLASS)?;
            classes.remove_1(MATCHED_CLASS)
        }
        CardState::FaceUp => classes.add_1(FLIPPED_CLASS),
        CardState::Matched => {
            classes.add_1(FLIPPED_CLASS)?;
            classes.add_1(MATCHED_CLASS)
        }
    }
}

impl Presenter for DomPresenter {
    fn render_board(&mut self, cards: &[Card]) {
        self.board.set_inner_html("");
        self.cards.clear();
        for (position, card) in cards.iter().enumerate() {
            let built = self
                .build_card(position, card)
                .and_then(|element| {
                    self.board.append_child(&element)?;
                    Ok(element)
                });
            match built {
                Ok(element) => self.cards.push(element),
                Err(err) => log::warn!("failed to render card {position}: {err}"),
            }
        }
    }

    fn card_changed(&mut self, position: Position, state: CardState) {
        match self.cards.get(position) {
            Some(element) => warn_on_error(apply_state(element, state), "card state"),
            None => log::warn!("no card element at {position}"),
        }
    }

    fn moves_changed(&mut self, moves: u32) {
        self.moves.set_text_content(Some(&moves.to_string()));
    }

    fn time_changed(&mut self, elapsed: &str) {
        self.time.set_text_content(Some(elapsed));
    }

    fn show_win(&mut self, summary: &RoundSummary) {
        self.final_moves
            .set_text_content(Some(&summary.moves.to_string()));
        self.final_time
            .set_text_content(Some(&summary.elapsed_display()));
        warn_on_error(self.win_message.class_list().add_1(SHOW_CLASS), "win message");
    }

    fn hide_win(&mut self) {
        warn_on_error(
            self.win_message.class_list().remove_1(SHOW_CLASS),
            "win message",
        );
    }
}
