//! 时间来源与计时显示。

use std::cell::Cell;
use std::rc::Rc;

use web_sys::js_sys::Date;

/// 毫秒时间戳。
pub type Millis = u64;

pub trait Clock {
    fn now(&self) -> Millis;
}

/// 浏览器墙钟（`Date.now()`）。
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now(&self) -> Millis {
        Date::now() as Millis
    }
}

/// 手动推进的时钟，克隆体共享同一时间。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, millis: Millis) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    pub fn set(&self, millis: Millis) {
        self.now.set(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// `MM:SS`，分钟超过两位时不截断。
pub fn format_elapsed(elapsed: Millis) -> String {
    let seconds = elapsed / 1000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerChange {
    Started,
    Stopped,
    Unchanged,
}

/// 周期任务句柄的持有者：丢弃句柄即停止任务。
#[derive(Debug)]
pub struct Ticker<H> {
    handle: Option<H>,
}

impl<H> Default for Ticker<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H> Ticker<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn sync<F>(&mut self, active: bool, start: F) -> TickerChange
    where
        F: FnOnce() -> H,
    {
        match (active, self.handle.is_some()) {
            (true, false) => {
                self.handle = Some(start());
                TickerChange::Started
            }
            (false, true) => {
                self.handle = None;
                TickerChange::Stopped
            }
            _ => TickerChange::Unchanged,
        }
    }

    pub fn stop(&mut self) -> bool {
        self.handle.take().is_some()
    }
}
