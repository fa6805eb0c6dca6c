use std::collections::HashSet;
use std::time::Duration;

use crate::{log, log_debug};

use super::gem_source::GemSource;
use super::grid::{Gem, Grid, distinct_columns};
use super::match_finder::{self, MatchSet};
use super::presenter::{Presenter, PresenterCommand, RecordingPresenter};
use super::settings::{BoardSettings, Palette, SettingsError, TimingSettings};
use super::types::{GemId, GemType, MIN_MATCH, Position, SETTLE_EPSILON, SwapRequest};

/// Externally visible state of the swap protocol.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Swaps are accepted.
    Idle,
    /// Both swapped gems are travelling; validation runs once they settle.
    SwapPending,
    /// The swap made no match and both gems are travelling back.
    RevertSwap,
    /// Matched gems were cleared and the gems above are falling.
    Collapsing,
    /// New gems are dropping into the emptied cells.
    Refilling,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IgnoreReason {
    Busy,
    OutOfBounds,
    NotAdjacent,
    EmptyCell,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SwapOutcome {
    Started,
    Ignored(IgnoreReason),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub swaps_committed: u64,
    pub swaps_reverted: u64,
    pub waves: u64,
    pub gems_cleared: u64,
    pub gems_created: u64,
}

/// Where the engine is parked while it waits for outstanding moves to settle.
enum Stage {
    Idle,
    Swapping { first: Position, second: Position },
    Reverting,
    Collapsing { collapsed: Vec<GemId> },
    Refilling,
}

impl Stage {
    /// The step to run once every outstanding move has settled.
    fn release(self) -> Option<Step> {
        match self {
            Stage::Idle => None,
            Stage::Swapping { first, second } => Some(Step::Validate { first, second }),
            Stage::Reverting => Some(Step::Finish),
            Stage::Collapsing { collapsed } => Some(Step::Recheck(collapsed)),
            Stage::Refilling => Some(Step::FinalCheck),
        }
    }
}

enum Step {
    Validate { first: Position, second: Position },
    Wave(MatchSet),
    Recheck(Vec<GemId>),
    Refill,
    FinalCheck,
    Finish,
}

/// Runs the swap, clear, collapse and refill cycle for one board.
///
/// Logical board state changes synchronously: by the time a move command
/// reaches the presenter the grid already holds the gem in its new cell. The
/// only thing the engine waits for is the settle signal of every move it
/// issued in the current step. Steps then run in a loop until the next one
/// has to wait again, so chain reactions never grow the call stack.
pub struct ResolutionEngine<P: Presenter, S: GemSource> {
    grid: Grid,
    palette: Palette,
    timing: TimingSettings,
    presenter: P,
    gem_source: S,
    stage: Stage,
    pending: HashSet<GemId>,
    stats: ResolutionStats,
}

impl<P: Presenter, S: GemSource> ResolutionEngine<P, S> {
    /// Builds a board from settings. Without an `initial_layout` the board is
    /// filled with match-free random gems that drop in; the engine turns idle
    /// once those drops settle.
    pub fn new(settings: &BoardSettings, presenter: P, gem_source: S) -> Result<Self, SettingsError> {
        settings.check()?;
        let palette = settings.palette()?;

        match settings.initial_grid()? {
            Some(grid) => Ok(Self::from_grid(
                grid,
                palette,
                settings.timing.clone(),
                presenter,
                gem_source,
            )),
            None => {
                let mut engine = Self::with_parts(
                    Grid::new(settings.width, settings.height),
                    palette,
                    settings.timing.clone(),
                    presenter,
                    gem_source,
                );
                log_debug!(
                    "Filling {}x{} board from a palette of {} gem types",
                    settings.width,
                    settings.height,
                    engine.palette.len()
                );
                engine.drive(Some(Step::Refill));
                Ok(engine)
            }
        }
    }

    /// Adopts an existing layout as-is and starts idle. Runs already on the
    /// board stay until `resolve_existing_matches` is called.
    pub fn from_grid(
        grid: Grid,
        palette: Palette,
        timing: TimingSettings,
        presenter: P,
        gem_source: S,
    ) -> Self {
        let mut engine = Self::with_parts(grid, palette, timing, presenter, gem_source);

        let mut existing: Vec<(GemId, GemType, Position)> = engine
            .grid
            .gems()
            .map(|gem| (gem.id(), gem.gem_type(), gem.position()))
            .collect();
        existing.sort_by_key(|&(id, _, _)| id);
        for (id, gem_type, position) in existing {
            engine.presenter.present(PresenterCommand::Create {
                id,
                gem_type,
                position,
                spawn_y: position.y as f32,
            });
        }
        engine
    }

    fn with_parts(
        grid: Grid,
        palette: Palette,
        timing: TimingSettings,
        presenter: P,
        gem_source: S,
    ) -> Self {
        Self {
            grid,
            palette,
            timing,
            presenter,
            gem_source,
            stage: Stage::Idle,
            pending: HashSet::new(),
            stats: ResolutionStats::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn timing(&self) -> &TimingSettings {
        &self.timing
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }

    pub fn pending_moves(&self) -> usize {
        self.pending.len()
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Idle => Phase::Idle,
            Stage::Swapping { .. } => Phase::SwapPending,
            Stage::Reverting => Phase::RevertSwap,
            Stage::Collapsing { .. } => Phase::Collapsing,
            Stage::Refilling => Phase::Refilling,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.stage, Stage::Idle)
    }

    pub fn find_valid_swap(&self) -> Option<SwapRequest> {
        match_finder::find_valid_swap(&self.grid)
    }

    fn check_swap(&self, from: Position, to: Position) -> SwapOutcome {
        if !self.is_idle() {
            return SwapOutcome::Ignored(IgnoreReason::Busy);
        }
        if !self.grid.contains(from) || !self.grid.contains(to) {
            return SwapOutcome::Ignored(IgnoreReason::OutOfBounds);
        }
        if !from.is_adjacent(to) {
            return SwapOutcome::Ignored(IgnoreReason::NotAdjacent);
        }
        if !self.grid.is_occupied(from) || !self.grid.is_occupied(to) {
            return SwapOutcome::Ignored(IgnoreReason::EmptyCell);
        }
        SwapOutcome::Started
    }

    /// Starts swapping two adjacent gems. Requests that cannot be honoured
    /// leave the board untouched and report why.
    pub fn attempt_swap(&mut self, from: Position, to: Position) -> SwapOutcome {
        let outcome = self.check_swap(from, to);
        if let SwapOutcome::Ignored(reason) = outcome {
            log_debug!("Ignoring swap {} <-> {}: {:?}", from, to, reason);
            return outcome;
        }

        self.grid.swap(from, to);
        let swap_time = self.timing.swap_time();
        for pos in [to, from] {
            if let Some(id) = self.grid.gem_id_at(pos) {
                self.issue_move(id, pos, swap_time);
            }
        }
        log_debug!("Swapping {} <-> {}", from, to);

        let next = self.suspend(Stage::Swapping {
            first: from,
            second: to,
        });
        self.drive(next);
        SwapOutcome::Started
    }

    /// Settle signal from the presenter. Accepted only for a gem the engine is
    /// waiting on and only once its reported position has converged on its
    /// cell. Returns whether the signal was accepted.
    pub fn on_settled(&mut self, id: GemId, x: f32, y: f32) -> bool {
        if !self.pending.contains(&id) {
            return false;
        }
        let Some(gem) = self.grid.gem_mut(id) else {
            self.pending.remove(&id);
            return false;
        };

        let target = gem.position();
        if (x - target.x as f32).abs() > SETTLE_EPSILON
            || (y - target.y as f32).abs() > SETTLE_EPSILON
        {
            log_debug!(
                "Gem {} reported ({:.3}, {:.3}) but belongs at {}, still waiting",
                id,
                x,
                y,
                target
            );
            return false;
        }

        gem.set_moving(false);
        self.pending.remove(&id);
        if self.pending.is_empty() {
            self.advance();
        }
        true
    }

    /// Treats every outstanding move as settled. Used when the presentation
    /// layer stops answering; returns how many moves were forced.
    pub fn force_settle(&mut self) -> usize {
        let forced = self.pending.len();
        for id in self.pending.drain() {
            if let Some(gem) = self.grid.gem_mut(id) {
                gem.set_moving(false);
            }
        }
        if forced > 0 {
            log!("Forced {} outstanding moves to settle", forced);
        }
        if !self.is_idle() {
            self.advance();
        }
        forced
    }

    /// Starts a cascade for runs already on an idle board. Returns whether one started.
    pub fn resolve_existing_matches(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        let matches = match_finder::all_matches(&self.grid);
        if matches.is_empty() {
            return false;
        }
        log!("Resolving {} gems already matched on the board", matches.len());
        self.drive(Some(Step::Wave(matches)));
        true
    }

    fn advance(&mut self) {
        let next = std::mem::replace(&mut self.stage, Stage::Idle).release();
        self.drive(next);
    }

    fn drive(&mut self, mut next: Option<Step>) {
        while let Some(step) = next {
            next = self.run(step);
            debug_assert_eq!(
                self.grid.check_consistency(),
                Ok(()),
                "board cells and gems disagree after a resolution step"
            );
        }
    }

    /// Parks in `stage` if moves are outstanding, otherwise continues at once.
    fn suspend(&mut self, stage: Stage) -> Option<Step> {
        if self.pending.is_empty() {
            return stage.release();
        }
        self.stage = stage;
        None
    }

    fn run(&mut self, step: Step) -> Option<Step> {
        match step {
            Step::Validate { first, second } => self.validate_swap(first, second),
            Step::Wave(matches) => self.clear_and_collapse(matches),
            Step::Recheck(collapsed) => {
                let seeds: Vec<Position> = collapsed
                    .iter()
                    .filter_map(|&id| self.grid.gem(id).map(Gem::position))
                    .collect();
                let matches = match_finder::matches_through_seeds(&self.grid, seeds, MIN_MATCH);
                if matches.is_empty() {
                    Some(Step::Refill)
                } else {
                    log_debug!("Chain reaction matched {} more gems", matches.len());
                    Some(Step::Wave(matches))
                }
            }
            Step::Refill => self.refill(),
            Step::FinalCheck => {
                let matches = match_finder::all_matches(&self.grid);
                if matches.is_empty() {
                    Some(Step::Finish)
                } else {
                    log_debug!("Refilled board holds {} matched gems", matches.len());
                    Some(Step::Wave(matches))
                }
            }
            Step::Finish => {
                self.stage = Stage::Idle;
                log_debug!("Board settled after {} waves in total", self.stats.waves);
                None
            }
        }
    }

    fn validate_swap(&mut self, first: Position, second: Position) -> Option<Step> {
        let mut matches = match_finder::matches_at(&self.grid, first, MIN_MATCH);
        matches.union_with(match_finder::matches_at(&self.grid, second, MIN_MATCH));

        if !matches.is_empty() {
            self.stats.swaps_committed += 1;
            log_debug!("Swap {} <-> {} matched {} gems", first, second, matches.len());
            return Some(Step::Wave(matches));
        }

        self.stats.swaps_reverted += 1;
        log_debug!("Swap {} <-> {} made no match, reverting", first, second);
        self.grid.swap(first, second);
        let swap_time = self.timing.swap_time();
        for pos in [first, second] {
            if let Some(id) = self.grid.gem_id_at(pos) {
                self.issue_move(id, pos, swap_time);
            }
        }
        self.suspend(Stage::Reverting)
    }

    fn clear_and_collapse(&mut self, matches: MatchSet) -> Option<Step> {
        let positions = matches.positions(&self.grid);
        let columns = distinct_columns(positions.iter().copied());
        let clear_time = self.timing.clear_time();

        for &pos in &positions {
            if let Some(gem) = self.grid.remove(pos) {
                self.presenter.present(PresenterCommand::Destroy {
                    id: gem.id(),
                    duration: clear_time,
                });
            }
        }
        self.stats.waves += 1;
        self.stats.gems_cleared += positions.len() as u64;

        let mut collapsed = Vec::new();
        for column in columns.iter().copied() {
            collapsed.extend(self.collapse_column(column));
        }
        log_debug!(
            "Wave {}: cleared {} gems, {} falling in columns {:?}",
            self.stats.waves,
            positions.len(),
            collapsed.len(),
            columns
        );

        self.suspend(Stage::Collapsing { collapsed })
    }

    /// Pulls every gem in `column` down over the empty cells below it.
    /// The grid is updated immediately; one move per falling gem is issued.
    fn collapse_column(&mut self, column: usize) -> Vec<GemId> {
        let height = self.grid.height();
        let mut collapsing = Vec::new();

        for row in 0..height.saturating_sub(1) {
            let target = Position::new(column, row);
            if self.grid.is_occupied(target) {
                continue;
            }
            let above = (row + 1..height).find_map(|source| {
                self.grid
                    .gem_id_at(Position::new(column, source))
                    .map(|id| (source, id))
            });
            let Some((source, id)) = above else {
                break;
            };

            self.grid.relocate(id, target);
            let duration = self.timing.collapse_time(source - row);
            self.issue_move(id, target, duration);
            collapsing.push(id);
        }

        collapsing
    }

    fn refill(&mut self) -> Option<Step> {
        let empty = self.grid.empty_positions();
        let drop_offset = self.timing.drop_offset as f32;
        let drop_time = self.timing.drop_time();

        for &pos in &empty {
            let gem_type = self.draw_for(pos);
            let id = self.grid.place(gem_type, pos);
            self.presenter.present(PresenterCommand::Create {
                id,
                gem_type,
                position: pos,
                spawn_y: pos.y as f32 + drop_offset,
            });
            self.issue_move(id, pos, drop_time);
        }

        if !empty.is_empty() {
            self.stats.gems_created += empty.len() as u64;
            log_debug!("Refilled {} cells", empty.len());
        }
        self.suspend(Stage::Refilling)
    }

    /// Draws a type for the empty cell `pos`, redrawing while the draw would
    /// complete a run with the gems already around it.
    fn draw_for(&mut self, pos: Position) -> GemType {
        let mut candidates = self.palette.types().to_vec();
        loop {
            let drawn = self.gem_source.draw(&candidates);
            let gem_type = if candidates.contains(&drawn) {
                drawn
            } else {
                candidates[0]
            };
            if !match_finder::completes_match(&self.grid, pos, gem_type) {
                return gem_type;
            }

            candidates.retain(|&candidate| candidate != gem_type);
            if candidates.is_empty() {
                log!(
                    "No gem type fits {} without completing a match, keeping {}",
                    pos,
                    gem_type
                );
                return gem_type;
            }
        }
    }

    fn issue_move(&mut self, id: GemId, target: Position, duration: Duration) -> bool {
        let Some(gem) = self.grid.gem_mut(id) else {
            return false;
        };
        if gem.is_moving() {
            log_debug!("Gem {} is still moving, ignoring move to {}", id, target);
            return false;
        }

        gem.set_moving(true);
        self.pending.insert(id);
        self.presenter.present(PresenterCommand::MoveTo {
            id,
            position: target,
            duration,
        });
        true
    }
}

impl<S: GemSource> ResolutionEngine<RecordingPresenter, S> {
    /// Answers every recorded move with an exact settle signal until the
    /// board stops issuing moves. Returns the number of settles delivered.
    pub fn settle_all(&mut self) -> usize {
        let mut settled = 0;
        loop {
            let moves: Vec<(GemId, Position)> = self
                .presenter
                .drain()
                .into_iter()
                .filter_map(|command| match command {
                    PresenterCommand::MoveTo { id, position, .. } => Some((id, position)),
                    _ => None,
                })
                .collect();
            if moves.is_empty() {
                return settled;
            }
            for (id, position) in moves {
                if self.on_settled(id, position.x as f32, position.y as f32) {
                    settled += 1;
                }
            }
        }
    }
}
