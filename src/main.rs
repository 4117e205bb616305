//! Chaotic Mind Demo Runner
//!
//! Plays a scripted session on a level (the built-in demo level, or a JSON
//! level file given as the first argument), then replays the recorded input
//! and checks that both runs end in the same state hash.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use chaotic_mind::{
    FRAME_RATE, FRAME_SECONDS, VERSION,
    GameConfig, GameFlow, InputFrame, KeyInput, LevelConfig, Screen, Vec2,
    game::{
        events::WorldEventData,
        flow::replay_session,
        map::Direction,
        snapshot::FrameSnapshot,
    },
};

/// Length of the scripted session in frames.
const SESSION_FRAMES: u32 = 20 * FRAME_RATE;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Chaotic Mind v{}", VERSION);
    info!("Frame Rate: {} Hz", FRAME_RATE);

    let level = match std::env::args().nth(1) {
        Some(path) => LevelConfig::load(&path).with_context(|| format!("loading level {}", path))?,
        None => LevelConfig::demo(),
    };

    demo_session(level, GameConfig::default())
}

/// Input for frame `t`, reacting to the screen the session is on.
fn scripted_input(t: u32, flow: &GameFlow) -> InputFrame {
    match flow.screen() {
        Screen::Shifting => {
            // Arm "push column 1 down", then confirm on the next frame
            let Some(ui) = flow.shift_interface() else {
                return InputFrame::new();
            };
            if ui.armed().is_none() {
                ui.button_index(1, Direction::Down)
                    .map(|i| InputFrame::with_pointer_click(ui.buttons()[i].rect.center()))
                    .unwrap_or_default()
            } else {
                InputFrame::with_click(KeyInput::Confirm)
            }
        }
        Screen::Paused => InputFrame::with_click(KeyInput::TogglePauseMenu),
        Screen::Playing => {
            let phase = t as f32 / FRAME_RATE as f32;
            let mut input = InputFrame::with_movement(phase.cos(), (phase * 0.7).sin());
            let player = flow.context().player_position().unwrap_or(Vec2::ZERO);
            input.pointer_world = player + Vec2::new((phase * 2.0).cos(), (phase * 2.0).sin()).scale(5.0);
            input.set_clicked(KeyInput::Fire, t % 20 == 0);
            input.set_clicked(KeyInput::ToggleShiftMenu, t % (5 * FRAME_RATE) == 0 && t > 0);
            input.set_clicked(KeyInput::TogglePauseMenu, t == 7 * FRAME_RATE);
            input
        }
    }
}

/// Play the scripted session, then verify it by replaying the recording.
fn demo_session(level: LevelConfig, config: GameConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");
    info!("Level: {} ({}x{}), seed {}", level.name, level.width, level.height, level.seed);

    let mut flow = GameFlow::start(level.clone(), config.clone())?;
    let mut recording = Vec::with_capacity(SESSION_FRAMES as usize);
    let mut total_events = 0;

    for t in 0..SESSION_FRAMES {
        let input = scripted_input(t, &flow);
        recording.push(input);

        let frame = flow.frame(&input, FRAME_SECONDS)?;
        total_events += frame.events.len();

        for event in &frame.events {
            match &event.data {
                WorldEventData::TilesShifted { outcome } => {
                    info!(
                        "Frame {}: {:?} shifted {:?}, tile {} re-entered with {}",
                        event.frame, outcome.request.line, outcome.request.direction,
                        outcome.reentered.0, outcome.new_doors
                    );
                }
                WorldEventData::CollectablePicked { id, .. } => {
                    info!("Frame {}: collectable {} picked up", event.frame, id.0);
                }
                WorldEventData::EnemySpawned { id, slot } => {
                    info!("Frame {}: enemy {} spawned at ({}, {})", event.frame, id.0, slot.col, slot.row);
                }
                WorldEventData::ObjectUpdateFailed { id, reason } => {
                    warn!("Frame {}: object {} failed: {}", event.frame, id.0, reason);
                }
                _ => {}
            }
        }
    }

    info!("=== Session Results ===");
    let ctx = flow.context();
    let hash = ctx.compute_hash();
    info!("Frames simulated: {}", ctx.frame);
    info!("Collectables picked: {}", ctx.collectables_picked);
    info!("Shifts applied: {}", ctx.map.shift_count());
    info!("Total events: {}", total_events);
    info!("Final State Hash: {}", hex::encode(hash));

    let snapshot = FrameSnapshot::capture(ctx);
    info!("Final snapshot: {} objects, {} markers", snapshot.objects.len(), snapshot.minimap.len());

    info!("=== Verifying Determinism ===");
    let (replay, _) = replay_session(level, config, &recording, FRAME_SECONDS)?;
    let replay_hash = replay.context().compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");

    flow.end();
    replay.end();
    Ok(())
}
