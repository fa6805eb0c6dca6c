use std::time::Duration;

use super::types::{GemId, GemType, Position};

/// What the board asks its view layer to animate. The board never waits on a
/// command directly; it waits for the matching settle signal instead.
#[derive(Clone, Debug, PartialEq)]
pub enum PresenterCommand {
    /// A new gem appears at column `position.x`, height `spawn_y`. Its logical
    /// cell is `position`; a `MoveTo` follows when it has to drop in.
    Create {
        id: GemId,
        gem_type: GemType,
        position: Position,
        spawn_y: f32,
    },
    MoveTo {
        id: GemId,
        position: Position,
        duration: Duration,
    },
    Destroy {
        id: GemId,
        duration: Duration,
    },
}

pub trait Presenter {
    fn present(&mut self, command: PresenterCommand);
}

impl<T: Presenter + ?Sized> Presenter for Box<T> {
    fn present(&mut self, command: PresenterCommand) {
        (**self).present(command);
    }
}

/// Buffers commands until the owner drains them.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    commands: Vec<PresenterCommand>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PresenterCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<PresenterCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, command: PresenterCommand) {
        self.commands.push(command);
    }
}
