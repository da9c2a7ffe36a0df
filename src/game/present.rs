use super::clock::format_elapsed;
use super::deck::{Card, CardState};
use super::state::{GameEvent, Position, RoundSummary};

/// 展示层接口：只接收状态变化，不回写引擎。
pub trait Presenter {
    fn render_board(&mut self, cards: &[Card]);
    fn card_changed(&mut self, position: Position, state: CardState);
    fn moves_changed(&mut self, moves: u32);
    fn time_changed(&mut self, elapsed: &str);
    fn show_win(&mut self, summary: &RoundSummary);
    fn hide_win(&mut self);
}

/// 把事件流翻译成展示层调用。
///
/// 配对成功时引擎立即把牌标记为 `Matched`，但展示层要等
/// `HighlightMatch` 延迟任务产生的 `CardChanged` 才加样式，
/// 所以 `PairMatched` 本身不触发任何展示。
pub fn present<P: Presenter + ?Sized>(presenter: &mut P, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::RoundDealt { cards, .. } => {
                presenter.render_board(cards);
                presenter.time_changed(&format_elapsed(0));
            }
            GameEvent::CardChanged { position, state } => presenter.card_changed(*position, *state),
            GameEvent::MovesChanged { moves } => presenter.moves_changed(*moves),
            GameEvent::RoundCompleted { summary } => {
                presenter.time_changed(&summary.elapsed_display())
            }
            GameEvent::WinAnnounced { summary } => presenter.show_win(summary),
            GameEvent::RoundStarted { .. }
            | GameEvent::PairMatched { .. }
            | GameEvent::PairMismatched { .. } => {}
        }
    }
}

/// 记录所有调用，测试与无界面宿主使用。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingPresenter {
    pub board: Vec<Card>,
    pub renders: u32,
    pub moves: u32,
    pub time: String,
    pub win: Option<RoundSummary>,
    pub log: Vec<(Position, CardState)>,
}

impl Presenter for RecordingPresenter {
    fn render_board(&mut self, cards: &[Card]) {
        self.board = cards.to_vec();
        self.renders += 1;
    }

    fn card_changed(&mut self, position: Position, state: CardState) {
        if let Some(card) = self.board.get_mut(position) {
            card.state = state;
        }
        self.log.push((position, state));
    }

    fn moves_changed(&mut self, moves: u32) {
        self.moves = moves;
    }

    fn time_changed(&mut self, elapsed: &str) {
        self.time = elapsed.to_string();
    }

    fn show_win(&mut self, summary: &RoundSummary) {
        self.win = Some(summary.clone());
    }

    fn hide_win(&mut self) {
        self.win = None;
    }
}
