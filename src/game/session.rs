use super::clock::Clock;
use super::config::{ConfigError, GameConfig};
use super::present::{present, Presenter};
use super::rules::{Deferred, GameEngine, Turn};
use super::state::Position;

/// 引擎与展示层的绑定。延迟任务交由宿主调度，到期后调用 `fire`。
pub struct Session<C, P> {
    engine: GameEngine<C>,
    presenter: P,
}

impl<C: Clock, P: Presenter> Session<C, P> {
    pub fn new(engine: GameEngine<C>, mut presenter: P) -> Self {
        let dealt = engine.dealt_event();
        present(&mut presenter, &[dealt]);
        presenter.moves_changed(engine.state().moves);
        Self { engine, presenter }
    }

    pub fn from_config(config: &GameConfig, clock: C, presenter: P) -> Result<Self, ConfigError> {
        Ok(Self::new(GameEngine::new(config, clock)?, presenter))
    }

    pub fn engine(&self) -> &GameEngine<C> {
        &self.engine
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn is_timing(&self) -> bool {
        self.engine.state().is_timing()
    }

    pub fn activate(&mut self, position: Position) -> Turn {
        let turn = self.engine.activate(position);
        present(&mut self.presenter, &turn.events);
        turn
    }

    pub fn fire(&mut self, deferred: &Deferred) {
        let events = self.engine.fire(deferred);
        present(&mut self.presenter, &events);
    }

    pub fn reset(&mut self) {
        let events = self.engine.reset();
        present(&mut self.presenter, &events);
    }

    pub fn play_again(&mut self) {
        self.reset();
        self.presenter.hide_win();
    }

    /// 只刷新时间显示，不改动局面。
    pub fn tick(&mut self) -> bool {
        match self.engine.tick() {
            Some(display) => {
                self.presenter.time_changed(&display);
                true
            }
            None => false,
        }
    }
}
