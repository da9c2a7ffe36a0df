#![cfg(target_arch = "wasm32")]

use gloo_timers::future::TimeoutFuture;
use memory_match::web::mount;
use memory_match::{
    format_elapsed_ms, Deferred, GameConfig, MemoryApp, MemoryGame, RoundState, Timing, Turn,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn game() -> MemoryGame {
    MemoryGame::new(Some(r#"{ "symbols": ["A", "B", "C"], "seed": 4 }"#.into()))
        .expect("config should be accepted")
}

fn state(game: &MemoryGame) -> RoundState {
    serde_json::from_str(&game.state_json().expect("state should serialize"))
        .expect("state json should parse")
}

/// 找到与位置 0 同符号 / 不同符号的位置。
fn partners(state: &RoundState) -> (usize, usize) {
    let cards = state.deck.cards();
    let same = (1..cards.len())
        .find(|&p| cards[p].symbol == cards[0].symbol)
        .expect("every symbol has a partner");
    let other = (1..cards.len())
        .find(|&p| cards[p].symbol != cards[0].symbol)
        .expect("deck has more than one symbol");
    (same, other)
}

#[wasm_bindgen_test]
fn rejects_invalid_config() {
    assert!(MemoryGame::new(Some(r#"{ "symbols": ["A"] }"#.into())).is_err());
    assert!(MemoryGame::new(Some("not json".into())).is_err());
}

#[wasm_bindgen_test]
fn mismatch_round_trips_deferred_task_through_json() {
    let mut game = game();
    let (_, other) = partners(&state(&game));

    game.activate(0).expect("activate should serialize");
    let turn: Turn = serde_json::from_str(&game.activate(other).expect("activate should serialize"))
        .expect("turn json should parse");
    assert_eq!(turn.deferred.len(), 1);
    assert_eq!(state(&game).moves, 1);

    let task = serde_json::to_string(&turn.deferred[0]).expect("deferred should serialize");
    let events = game.fire(&task).expect("fire should succeed");
    assert!(events.contains("FaceDown"));
    assert!(state(&game).selection.is_empty());
    assert!(game.validate().is_ok());
}

#[wasm_bindgen_test]
fn reset_invalidates_pending_tasks() {
    let mut game = game();
    let (same, _) = partners(&state(&game));
    game.activate(0).expect("activate should serialize");
    let turn: Turn = serde_json::from_str(&game.activate(same).expect("activate should serialize"))
        .expect("turn json should parse");
    let stale: Vec<Deferred> = turn.deferred;

    game.reset().expect("reset should serialize");
    assert_eq!(game.generation(), 1.0);
    for task in &stale {
        let json = serde_json::to_string(task).expect("deferred should serialize");
        assert_eq!(game.fire(&json).expect("fire should succeed"), "[]");
    }
    assert_eq!(game.tick(), None);
}

#[wasm_bindgen_test]
fn formats_elapsed_for_js() {
    assert_eq!(format_elapsed_ms(125_400.0), "02:05");
    assert_eq!(format_elapsed_ms(-5.0), "00:00");
}

/// 每个用例使用独立前缀的元素 id，互不干扰。
struct Fixture {
    document: Document,
    root: Element,
    prefix: String,
}

impl Fixture {
    fn new(prefix: &str) -> Self {
        let document = memory_match::web::document().expect("test page has a document");
        let root = document.create_element("div").expect("div should be created");
        root.set_inner_html(&format!(
            r#"<div id="{p}-board"></div>
               <span id="{p}-moves"></span><span id="{p}-time"></span>
               <button id="{p}-reset"></button>
               <div id="{p}-win"><span id="{p}-final-moves"></span><span id="{p}-final-time"></span>
                 <button id="{p}-again"></button></div>"#,
            p = prefix
        ));
        document
            .body()
            .expect("test page has a body")
            .append_child(&root)
            .expect("fixture should attach");
        Self {
            document,
            root,
            prefix: prefix.to_string(),
        }
    }

    fn config(&self) -> GameConfig {
        let mut config = GameConfig::with_symbols(["A", "B"]).with_seed(11).with_timing(Timing {
            match_highlight_ms: 5,
            mismatch_revert_ms: 20,
            win_banner_ms: 10,
            tick_ms: 1000,
        });
        let p = &self.prefix;
        config.elements.board = format!("{p}-board");
        config.elements.moves = format!("{p}-moves");
        config.elements.time = format!("{p}-time");
        config.elements.reset_button = format!("{p}-reset");
        config.elements.play_again_button = format!("{p}-again");
        config.elements.win_message = format!("{p}-win");
        config.elements.final_moves = format!("{p}-final-moves");
        config.elements.final_time = format!("{p}-final-time");
        config
    }

    fn mount(&self) -> MemoryApp {
        mount(&self.config(), &self.document).expect("mount should succeed")
    }

    fn by_id(&self, suffix: &str) -> Element {
        self.document
            .get_element_by_id(&format!("{}-{suffix}", self.prefix))
            .expect("fixture element exists")
    }

    fn card(&self, position: usize) -> Element {
        self.by_id("board")
            .query_selector(&format!(r#".card[data-index="{position}"]"#))
            .expect("selector is valid")
            .expect("card is rendered")
    }

    fn click(&self, element: &Element) {
        element
            .clone()
            .dyn_into::<HtmlElement>()
            .expect("element is an html element")
            .click();
    }

    /// 点击卡牌内部的图片，由棋盘上的委托监听器处理。
    fn click_card(&self, position: usize) {
        let image = self
            .card(position)
            .query_selector("img")
            .expect("selector is valid")
            .expect("card has an image");
        self.click(&image);
    }

    fn text(&self, suffix: &str) -> String {
        self.by_id(suffix).text_content().unwrap_or_default()
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.root.remove();
    }
}

fn app_state(app: &MemoryApp) -> RoundState {
    serde_json::from_str(&app.state_json().expect("state should serialize"))
        .expect("state json should parse")
}

#[wasm_bindgen_test]
fn renders_cards_with_fallback_images() {
    let fixture = Fixture::new("render");
    let _app = fixture.mount();
    let board = fixture.by_id("board");
    assert_eq!(board.child_element_count(), 4);

    let card = fixture.card(0);
    let faces = card.query_selector_all("img").expect("selector is valid");
    assert_eq!(faces.length(), 2);
    for index in 0..faces.length() {
        let image = faces
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
            .expect("face is an element");
        assert!(image.get_attribute("onerror").is_some());
    }
    assert_eq!(fixture.text("moves"), "0");
    assert_eq!(fixture.text("time"), "00:00");
}

#[wasm_bindgen_test]
async fn mismatch_flips_back_and_clicks_on_open_tiles_are_skipped() {
    let fixture = Fixture::new("mismatch");
    let app = fixture.mount();
    let (_, other) = partners(&app_state(&app));

    fixture.click_card(0);
    assert!(fixture.has_class(&fixture.card(0), "flipped"));
    assert!(app.is_ticking());

    // 已翻开的牌不会再次触发翻牌
    fixture.click_card(0);
    assert_eq!(app_state(&app).selection, vec![0]);

    fixture.click_card(other);
    assert_eq!(app.moves(), Some(1));
    assert_eq!(fixture.text("moves"), "1");

    TimeoutFuture::new(60).await;
    assert!(!fixture.has_class(&fixture.card(0), "flipped"));
    assert!(!fixture.has_class(&fixture.card(other), "flipped"));
    assert!(app_state(&app).selection.is_empty());
}

#[wasm_bindgen_test]
async fn completing_the_round_shows_the_banner_and_stops_the_ticker() {
    let fixture = Fixture::new("win");
    let app = fixture.mount();
    let state = app_state(&app);
    let cards = state.deck.cards();

    let mut done = vec![false; cards.len()];
    for first in 0..cards.len() {
        if done[first] {
            continue;
        }
        let second = (first + 1..cards.len())
            .find(|&p| cards[p].symbol == cards[first].symbol)
            .expect("every symbol has a partner");
        fixture.click_card(first);
        fixture.click_card(second);
        done[first] = true;
        done[second] = true;
    }
    assert!(!app.is_ticking());
    assert!(!fixture.has_class(&fixture.by_id("win"), "show"));

    TimeoutFuture::new(60).await;
    for position in 0..cards.len() {
        assert!(fixture.has_class(&fixture.card(position), "matched"));
    }
    // 已配对的牌点击无效
    fixture.click_card(0);
    assert_eq!(app.moves(), Some(2));

    assert!(fixture.has_class(&fixture.by_id("win"), "show"));
    assert_eq!(fixture.text("final-moves"), "2");

    fixture.click(&fixture.by_id("again"));
    assert!(!fixture.has_class(&fixture.by_id("win"), "show"));
    assert_eq!(app.moves(), Some(0));
    assert_eq!(app_state(&app).generation, 1);
}

#[wasm_bindgen_test]
async fn reset_stops_the_ticker_and_drops_pending_reverts() {
    let fixture = Fixture::new("reset");
    let app = fixture.mount();
    let (_, other) = partners(&app_state(&app));

    fixture.click_card(0);
    fixture.click_card(other);
    assert!(app.is_ticking());

    fixture.click(&fixture.by_id("reset"));
    assert!(!app.is_ticking());
    assert_eq!(fixture.text("moves"), "0");
    assert_eq!(fixture.text("time"), "00:00");

    fixture.click_card(1);
    TimeoutFuture::new(60).await;
    assert!(fixture.has_class(&fixture.card(1), "flipped"));
    assert_eq!(app_state(&app).selection, vec![1]);
}

#[wasm_bindgen_test]
async fn destroy_unmounts_and_silences_pending_tasks() {
    let fixture = Fixture::new("destroy");
    let mut app = fixture.mount();
    let (_, other) = partners(&app_state(&app));

    fixture.click_card(0);
    fixture.click_card(other);
    app.destroy();
    assert!(!app.is_mounted());
    assert!(!app.is_ticking());
    assert_eq!(app.moves(), None);

    TimeoutFuture::new(60).await;
    assert!(fixture.has_class(&fixture.card(0), "flipped"));
    fixture.click_card(other);
    assert!(app.state_json().is_err());
}
