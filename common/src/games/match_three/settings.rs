use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Validate;

use super::grid::Grid;
use super::types::GemType;

pub const MIN_BOARD_SIDE: usize = 3;
pub const MAX_BOARD_SIDE: usize = 64;
/// Fewer distinct types cannot always refill a cell without completing a run.
pub const MIN_PALETTE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    EmptyPalette,
    PaletteTooSmall { size: usize },
    BoardTooSmall { width: usize, height: usize },
    BoardTooLarge { width: usize, height: usize },
    InvalidTiming(String),
    InvalidLayout(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::EmptyPalette => write!(f, "gem palette is empty, nothing to draw from"),
            SettingsError::PaletteTooSmall { size } => write!(
                f,
                "gem palette has {} distinct types, at least {} are needed to refill without matches",
                size, MIN_PALETTE_SIZE
            ),
            SettingsError::BoardTooSmall { width, height } => write!(
                f,
                "board {}x{} is too small, each side needs at least {} cells",
                width, height, MIN_BOARD_SIDE
            ),
            SettingsError::BoardTooLarge { width, height } => write!(
                f,
                "board {}x{} is too large, each side allows at most {} cells",
                width, height, MAX_BOARD_SIDE
            ),
            SettingsError::InvalidTiming(reason) => write!(f, "invalid timing: {}", reason),
            SettingsError::InvalidLayout(reason) => write!(f, "invalid initial layout: {}", reason),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Animation constants handed to the presenter, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub swap_ms: u64,
    pub collapse_ms_per_cell: u64,
    pub clear_ms: u64,
    pub drop_ms: u64,
    /// Rows above its cell at which a new gem appears before dropping in.
    pub drop_offset: u32,
    /// How long to wait for a settle signal before forcing it; 0 waits forever.
    pub settle_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            swap_ms: 500,
            collapse_ms_per_cell: 100,
            clear_ms: 250,
            drop_ms: 500,
            drop_offset: 10,
            settle_timeout_ms: 0,
        }
    }
}

impl TimingSettings {
    /// Everything settles the moment it is commanded.
    pub fn instant() -> Self {
        Self {
            swap_ms: 0,
            collapse_ms_per_cell: 0,
            clear_ms: 0,
            drop_ms: 0,
            drop_offset: 0,
            settle_timeout_ms: 0,
        }
    }

    pub fn swap_time(&self) -> Duration {
        Duration::from_millis(self.swap_ms)
    }

    /// Collapse time grows with the number of rows fallen.
    pub fn collapse_time(&self, distance: usize) -> Duration {
        Duration::from_millis(self.collapse_ms_per_cell.saturating_mul(distance as u64))
    }

    pub fn clear_time(&self) -> Duration {
        Duration::from_millis(self.clear_ms)
    }

    pub fn drop_time(&self) -> Duration {
        Duration::from_millis(self.drop_ms)
    }

    pub fn settle_timeout(&self) -> Option<Duration> {
        (self.settle_timeout_ms > 0).then(|| Duration::from_millis(self.settle_timeout_ms))
    }

    fn check(&self) -> Result<(), SettingsError> {
        const MAX_MS: u64 = 60_000;
        for (name, value) in [
            ("swap_ms", self.swap_ms),
            ("collapse_ms_per_cell", self.collapse_ms_per_cell),
            ("clear_ms", self.clear_ms),
            ("drop_ms", self.drop_ms),
        ] {
            if value > MAX_MS {
                return Err(SettingsError::InvalidTiming(format!(
                    "{} must be at most {}ms, got {}",
                    name, MAX_MS, value
                )));
            }
        }
        if self.drop_offset > 100 {
            return Err(SettingsError::InvalidTiming(format!(
                "drop_offset must be at most 100 rows, got {}",
                self.drop_offset
            )));
        }
        Ok(())
    }
}

/// Distinct gem types a board draws from, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<GemType>);

impl Palette {
    pub fn new(types: &[GemType]) -> Result<Self, SettingsError> {
        let mut distinct = Vec::with_capacity(types.len());
        for &gem_type in types {
            if !distinct.contains(&gem_type) {
                distinct.push(gem_type);
            }
        }
        if distinct.is_empty() {
            return Err(SettingsError::EmptyPalette);
        }
        if distinct.len() < MIN_PALETTE_SIZE {
            return Err(SettingsError::PaletteTooSmall {
                size: distinct.len(),
            });
        }
        Ok(Self(distinct))
    }

    pub fn types(&self) -> &[GemType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub width: usize,
    pub height: usize,
    pub palette: Vec<GemType>,
    pub timing: TimingSettings,
    /// Optional starting board, bottom row first (see `Grid::from_rows`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub initial_layout: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            palette: GemType::ALL.to_vec(),
            timing: TimingSettings::default(),
            initial_layout: Vec::new(),
        }
    }
}

impl BoardSettings {
    pub fn check(&self) -> Result<(), SettingsError> {
        if self.width < MIN_BOARD_SIDE || self.height < MIN_BOARD_SIDE {
            return Err(SettingsError::BoardTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_BOARD_SIDE || self.height > MAX_BOARD_SIDE {
            return Err(SettingsError::BoardTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        self.palette()?;
        self.timing.check()?;
        self.initial_grid()?;
        Ok(())
    }

    pub fn palette(&self) -> Result<Palette, SettingsError> {
        Palette::new(&self.palette)
    }

    /// Parses `initial_layout`; `Ok(None)` when no layout is configured.
    pub fn initial_grid(&self) -> Result<Option<Grid>, SettingsError> {
        if self.initial_layout.is_empty() {
            return Ok(None);
        }
        let grid = Grid::from_rows(&self.initial_layout).map_err(SettingsError::InvalidLayout)?;
        if grid.width() != self.width || grid.height() != self.height {
            return Err(SettingsError::InvalidLayout(format!(
                "layout is {}x{} but the board is {}x{}",
                grid.width(),
                grid.height(),
                self.width,
                self.height
            )));
        }
        Ok(Some(grid))
    }
}

impl Validate for BoardSettings {
    fn validate(&self) -> Result<(), String> {
        self.check().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = BoardSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.palette().unwrap().len(), 6);
    }

    #[test]
    fn test_empty_palette_is_configuration_error() {
        let settings = BoardSettings {
            palette: Vec::new(),
            ..BoardSettings::default()
        };
        assert_eq!(settings.check(), Err(SettingsError::EmptyPalette));
    }

    #[test]
    fn test_palette_drops_duplicates() {
        let palette = Palette::new(&[
            GemType::Red,
            GemType::Blue,
            GemType::Red,
            GemType::Teal,
        ])
        .unwrap();
        assert_eq!(palette.types(), &[GemType::Red, GemType::Blue, GemType::Teal]);
    }

    #[test]
    fn test_palette_too_small_to_avoid_matches() {
        let single = BoardSettings {
            palette: vec![GemType::Red],
            ..BoardSettings::default()
        };
        assert_eq!(single.check(), Err(SettingsError::PaletteTooSmall { size: 1 }));
        assert!(single.validate().is_err());

        let duplicated = BoardSettings {
            palette: vec![GemType::Red, GemType::Blue, GemType::Red, GemType::Blue],
            ..BoardSettings::default()
        };
        assert_eq!(
            duplicated.check(),
            Err(SettingsError::PaletteTooSmall { size: 2 })
        );

        let minimal = BoardSettings {
            palette: vec![GemType::Red, GemType::Blue, GemType::Green],
            ..BoardSettings::default()
        };
        assert!(minimal.check().is_ok());
    }

    #[test]
    fn test_board_size_limits() {
        let small = BoardSettings {
            width: 2,
            ..BoardSettings::default()
        };
        assert!(matches!(small.check(), Err(SettingsError::BoardTooSmall { .. })));

        let large = BoardSettings {
            height: MAX_BOARD_SIDE + 1,
            ..BoardSettings::default()
        };
        assert!(matches!(large.check(), Err(SettingsError::BoardTooLarge { .. })));
    }

    #[test]
    fn test_layout_must_match_dimensions() {
        let settings = BoardSettings {
            width: 3,
            height: 3,
            initial_layout: vec!["RGB".to_string(), "GBR".to_string()],
            ..BoardSettings::default()
        };
        assert!(matches!(settings.check(), Err(SettingsError::InvalidLayout(_))));
    }

    #[test]
    fn test_collapse_time_scales_with_distance() {
        let timing = TimingSettings::default();
        assert_eq!(timing.collapse_time(3), Duration::from_millis(300));
        assert_eq!(timing.settle_timeout(), None);
    }

    #[test]
    fn test_yaml_round_trip_with_partial_fields() {
        let yaml = "width: 5\nheight: 6\npalette: [Red, Blue, Green]\ntiming:\n  swap_ms: 200\n";
        let settings: BoardSettings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.width, 5);
        assert_eq!(settings.height, 6);
        assert_eq!(settings.palette, vec![GemType::Red, GemType::Blue, GemType::Green]);
        assert_eq!(settings.timing.swap_ms, 200);
        assert_eq!(settings.timing.drop_ms, 500);
        assert!(settings.validate().is_ok());
    }
}
