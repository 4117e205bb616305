//! Screen Flow
//!
//! Routes each frame to the screen that owns it. While playing, the world
//! update loop runs; while paused or in the shift interface, the world is
//! frozen and only that screen sees input.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::events::WorldEvent;
use crate::game::input::{InputFrame, KeyInput};
use crate::game::level::{GameConfig, LevelConfig};
use crate::game::shift::{ShiftInterface, ShiftInterfaceStatus};
use crate::game::state::{GameContext, GameError};
use crate::game::tick::{tick, FrameError, Transition};

/// Screen currently receiving input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    /// World simulation running
    Playing,
    /// Pause menu open
    Paused,
    /// Shift interface open
    Shifting,
}

/// What one routed frame produced.
#[derive(Debug)]
pub struct FlowFrame {
    /// Screen after the frame
    pub screen: Screen,
    /// World events generated
    pub events: Vec<WorldEvent>,
}

/// A running session: the level plus the screen stack above it.
pub struct GameFlow {
    ctx: GameContext,
    screen: Screen,
    shift_ui: Option<ShiftInterface>,
}

impl GameFlow {
    /// Wrap a started level.
    pub fn new(ctx: GameContext) -> Self {
        Self {
            ctx,
            screen: Screen::Playing,
            shift_ui: None,
        }
    }

    /// Start `level` with the reference physics and wave director.
    pub fn start(level: LevelConfig, config: GameConfig) -> Result<Self, GameError> {
        Ok(Self::new(GameContext::with_defaults(level, config)?))
    }

    /// The running level.
    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The open shift interface.
    pub fn shift_interface(&self) -> Option<&ShiftInterface> {
        self.shift_ui.as_ref()
    }

    /// Route one frame of input.
    pub fn frame(&mut self, input: &InputFrame, dt: f32) -> Result<FlowFrame, FrameError> {
        let events = match self.screen {
            Screen::Playing => self.play(input, dt)?,
            Screen::Paused => {
                if input.was_key_clicked(KeyInput::TogglePauseMenu) {
                    self.set_screen(Screen::Playing);
                }
                Vec::new()
            }
            Screen::Shifting => self.shift(input),
        };

        Ok(FlowFrame {
            screen: self.screen,
            events,
        })
    }

    /// Tear the level down.
    pub fn end(mut self) -> GameContext {
        self.ctx.end_level();
        self.ctx
    }

    fn play(&mut self, input: &InputFrame, dt: f32) -> Result<Vec<WorldEvent>, FrameError> {
        let result = tick(&mut self.ctx, input, dt)?;
        match self.ctx.take_transition() {
            Some(Transition::PauseMenu) => self.set_screen(Screen::Paused),
            Some(Transition::ShiftInterface) => {
                self.shift_ui = Some(ShiftInterface::new(&self.ctx.config.shift_layout, &self.ctx.map));
                self.set_screen(Screen::Shifting);
            }
            None => {}
        }
        Ok(result.events)
    }

    fn shift(&mut self, input: &InputFrame) -> Vec<WorldEvent> {
        let Some(ui) = self.shift_ui.as_mut() else {
            self.set_screen(Screen::Playing);
            return Vec::new();
        };

        match ui.update(input, &mut self.ctx.map, &mut self.ctx.rng) {
            ShiftInterfaceStatus::Open => Vec::new(),
            ShiftInterfaceStatus::Closed { shift } => {
                self.shift_ui = None;
                self.set_screen(Screen::Playing);
                shift
                    .map(|outcome| vec![WorldEvent::tiles_shifted(self.ctx.frame, outcome)])
                    .unwrap_or_default()
            }
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            debug!("Screen {:?} -> {:?}", self.screen, screen);
            self.screen = screen;
        }
    }
}

/// Replay a recorded input sequence from a fresh start.
///
/// Returns the session and every event it produced.
pub fn replay_session(
    level: LevelConfig,
    config: GameConfig,
    inputs: &[InputFrame],
    dt: f32,
) -> Result<(GameFlow, Vec<WorldEvent>), GameError> {
    let mut flow = GameFlow::start(level, config)?;
    let mut all_events = Vec::new();
    for input in inputs {
        let frame = flow.frame(input, dt)?;
        all_events.extend(frame.events);
    }
    Ok((flow, all_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::events::WorldEventData;
    use crate::game::map::{Direction, Slot};

    fn flow() -> GameFlow {
        GameFlow::start(LevelConfig::demo(), GameConfig::default()).unwrap()
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut flow = flow();
        let frame = flow.frame(&InputFrame::with_click(KeyInput::TogglePauseMenu), 0.016).unwrap();
        assert_eq!(frame.screen, Screen::Paused);

        let frames_before = flow.context().frame;
        flow.frame(&InputFrame::with_movement(1.0, 0.0), 0.016).unwrap();
        assert_eq!(flow.context().frame, frames_before);

        let frame = flow.frame(&InputFrame::with_click(KeyInput::TogglePauseMenu), 0.016).unwrap();
        assert_eq!(frame.screen, Screen::Playing);
        flow.frame(&InputFrame::new(), 0.016).unwrap();
        assert_eq!(flow.context().frame, frames_before + 1);
    }

    #[test]
    fn test_shift_round_trip_through_interface() {
        let mut flow = flow();
        flow.frame(&InputFrame::with_click(KeyInput::ToggleShiftMenu), 0.016).unwrap();
        assert_eq!(flow.screen(), Screen::Shifting);

        let ui = flow.shift_interface().unwrap();
        let button = ui.button_index(1, Direction::Down).unwrap();
        let click = ui.buttons()[button].rect.center();
        flow.frame(&InputFrame::with_pointer_click(click), 0.016).unwrap();

        let frame = flow.frame(&InputFrame::with_click(KeyInput::Confirm), 0.016).unwrap();
        assert_eq!(frame.screen, Screen::Playing);
        assert!(flow.shift_interface().is_none());

        let [event] = frame.events.as_slice() else {
            panic!("expected one event, got {:?}", frame.events);
        };
        let WorldEventData::TilesShifted { outcome } = &event.data else {
            panic!("unexpected event {:?}", event);
        };
        assert_eq!(outcome.reentry_slot, Slot::new(1, 0));
        assert_eq!(flow.context().map.shift_count(), 1);
    }

    #[test]
    fn test_shift_menu_toggle_closes_without_shift() {
        let mut flow = flow();
        flow.frame(&InputFrame::with_click(KeyInput::ToggleShiftMenu), 0.016).unwrap();
        let frame = flow.frame(&InputFrame::with_click(KeyInput::ToggleShiftMenu), 0.016).unwrap();
        assert_eq!(frame.screen, Screen::Playing);
        assert!(frame.events.is_empty());
        assert_eq!(flow.context().map.shift_count(), 0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let inputs: Vec<InputFrame> = (0..90)
            .map(|i| {
                let mut input = InputFrame::with_movement(if i < 45 { 1.0 } else { -0.5 }, 0.3);
                input.pointer_world = Vec2::new(40.0, 40.0);
                input.set_clicked(KeyInput::Fire, i % 30 == 0);
                input
            })
            .collect();

        let (a, events_a) = replay_session(LevelConfig::demo(), GameConfig::default(), &inputs, 1.0 / 60.0).unwrap();
        let (b, events_b) = replay_session(LevelConfig::demo(), GameConfig::default(), &inputs, 1.0 / 60.0).unwrap();
        assert_eq!(a.context().compute_hash(), b.context().compute_hash());
        assert_eq!(events_a, events_b);
    }

    #[test]
    fn test_end_clears_level() {
        let ctx = flow().end();
        assert_eq!(ctx.physics.body_count(), 0);
    }
}
