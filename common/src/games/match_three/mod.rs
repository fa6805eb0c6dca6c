mod engine;
mod gem_source;
mod grid;
mod input;
mod presenter;
mod settings;
mod types;

pub mod match_finder;

pub use engine::{IgnoreReason, Phase, ResolutionEngine, ResolutionStats, SwapOutcome};
pub use gem_source::{GemSource, ScriptedGemSource};
pub use grid::{Gem, Grid, distinct_columns};
pub use input::{InputEvent, PointerTracker};
pub use match_finder::MatchSet;
pub use presenter::{Presenter, PresenterCommand, RecordingPresenter};
pub use settings::{
    BoardSettings, MAX_BOARD_SIDE, MIN_BOARD_SIDE, MIN_PALETTE_SIZE, Palette, SettingsError,
    TimingSettings,
};
pub use types::{Axis, GemId, GemType, MIN_MATCH, Position, SETTLE_EPSILON, SwapRequest};
