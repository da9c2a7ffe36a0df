use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Interval;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, MouseEvent};

use super::dom::{
    element, DomPresenter, WebError, CARD_CLASS, FLIPPED_CLASS, INDEX_ATTR, MATCHED_CLASS,
};
use crate::game::{BrowserClock, Deferred, GameConfig, Position, Session, Ticker, TickerChange};

type ClickListener = Closure<dyn FnMut(MouseEvent)>;
type Shared = Rc<RefCell<Host>>;

type GameSession = Session<BrowserClock, DomPresenter>;

/// 卸载后 `session` 为 `None`，尚未到期的任务随之失效。
struct Host {
    session: Option<GameSession>,
    ticker: Ticker<Interval>,
    tick_ms: u32,
}

impl Host {
    /// 计时器随局面启停：首次翻牌后启动，完成、重置或卸载后停止。
    fn sync_ticker(&mut self, host: Weak<RefCell<Host>>) {
        let tick_ms = self.tick_ms;
        let active = self.session.as_ref().map_or(false, GameSession::is_timing);
        let change = self.ticker.sync(active, move || {
            Interval::new(tick_ms, move || {
                if let Some(host) = host.upgrade() {
                    if let Some(session) = host.borrow_mut().session.as_mut() {
                        session.tick();
                    }
                }
            })
        });
        if change != TickerChange::Unchanged {
            log::debug!("elapsed ticker {change:?}");
        }
    }
}

fn schedule(shared: &Shared, deferred: Vec<Deferred>) {
    for task in deferred {
        let host = Rc::downgrade(shared);
        spawn_local(async move {
            TimeoutFuture::new(task.delay_ms).await;
            if let Some(host) = host.upgrade() {
                if let Some(session) = host.borrow_mut().session.as_mut() {
                    session.fire(&task);
                }
            }
        });
    }
}

fn dispatch<F>(shared: &Shared, action: F)
where
    F: FnOnce(&mut GameSession) -> Vec<Deferred>,
{
    let deferred = {
        let mut host = shared.borrow_mut();
        let Some(session) = host.session.as_mut() else {
            return;
        };
        let deferred = action(session);
        host.sync_ticker(Rc::downgrade(shared));
        deferred
    };
    schedule(shared, deferred);
}

/// 点击落在可翻开的卡牌上时返回其位置。
fn clicked_position(event: &MouseEvent) -> Option<Position> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let card = target.closest(&format!(".{CARD_CLASS}")).ok().flatten()?;
    let classes = card.class_list();
    if classes.contains(FLIPPED_CLASS) || classes.contains(MATCHED_CLASS) {
        return None;
    }
    card.get_attribute(INDEX_ATTR)?.parse().ok()
}

fn click_listener<F>(shared: &Shared, mut handler: F) -> ClickListener
where
    F: FnMut(&Shared, &MouseEvent) + 'static,
{
    let host = Rc::downgrade(shared);
    Closure::wrap(Box::new(move |event: MouseEvent| {
        if let Some(host) = host.upgrade() {
            handler(&host, &event);
        }
    }) as Box<dyn FnMut(MouseEvent)>)
}

/// 挂载到页面上的一局游戏；持有所有监听器与计时器，释放即卸载。
#[wasm_bindgen]
pub struct MemoryApp {
    host: Shared,
    listeners: Vec<(Element, ClickListener)>,
}

impl MemoryApp {
    fn listen(&mut self, target: Element, listener: ClickListener) -> Result<(), WebError> {
        target.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())?;
        self.listeners.push((target, listener));
        Ok(())
    }

    fn detach(&mut self) {
        for (target, listener) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback("click", listener.as_ref().unchecked_ref());
        }
        if let Ok(mut host) = self.host.try_borrow_mut() {
            host.session = None;
            host.ticker.stop();
        }
    }
}

#[wasm_bindgen]
impl MemoryApp {
    pub fn reset(&self) {
        dispatch(&self.host, |session| {
            session.reset();
            Vec::new()
        });
    }

    #[wasm_bindgen(js_name = "playAgain")]
    pub fn play_again(&self) {
        dispatch(&self.host, |session| {
            session.play_again();
            Vec::new()
        });
    }

    pub fn moves(&self) -> Option<u32> {
        let host = self.host.borrow();
        host.session
            .as_ref()
            .map(|session| session.engine().state().moves)
    }

    #[wasm_bindgen(js_name = "isTicking")]
    pub fn is_ticking(&self) -> bool {
        self.host.borrow().ticker.is_running()
    }

    #[wasm_bindgen(js_name = "isMounted")]
    pub fn is_mounted(&self) -> bool {
        self.host.borrow().session.is_some()
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        let host = self.host.borrow();
        let session = host
            .session
            .as_ref()
            .ok_or_else(|| JsValue::from_str("memory game is unmounted"))?;
        serde_json::to_string(session.engine().state())
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn destroy(&mut self) {
        self.detach();
    }
}

impl Drop for MemoryApp {
    fn drop(&mut self) {
        self.detach();
    }
}

pub fn mount(config: &GameConfig, document: &Document) -> Result<MemoryApp, WebError> {
    let presenter = DomPresenter::new(document, &config.elements, config.card_back.clone())?;
    let board = presenter.board().clone();
    let session = Session::from_config(config, BrowserClock, presenter)?;
    let host = Rc::new(RefCell::new(Host {
        session: Some(session),
        ticker: Ticker::new(),
        tick_ms: config.timing.tick_ms,
    }));

    let mut app = MemoryApp {
        host: Rc::clone(&host),
        listeners: Vec::new(),
    };

    let on_board = click_listener(&host, |host, event| {
        if let Some(position) = clicked_position(event) {
            dispatch(host, |session| session.activate(position).deferred);
        }
    });
    app.listen(board, on_board)?;

    let on_reset = click_listener(&host, |host, _| {
        dispatch(host, |session| {
            session.reset();
            Vec::new()
        })
    });
    app.listen(element(document, &config.elements.reset_button)?, on_reset)?;

    let on_play_again = click_listener(&host, |host, _| {
        dispatch(host, |session| {
            session.play_again();
            Vec::new()
        })
    });
    app.listen(
        element(document, &config.elements.play_again_button)?,
        on_play_again,
    )?;

    log::info!("memory game mounted on #{}", config.elements.board);
    Ok(app)
}
