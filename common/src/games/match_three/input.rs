use super::types::{Position, SwapRequest};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    /// Pointer went down on a tile.
    Press(Position),
    /// Pointer moved onto a tile while held.
    Enter(Position),
    Release,
    /// Already-resolved swap, e.g. from a keyboard or a script.
    Swap(SwapRequest),
}

/// Turns press / drag / release gestures into swap requests.
///
/// Only the first pressed tile counts, and a drag target is kept only while it
/// is adjacent to that tile. Anything else is dropped without complaint since
/// pointer gestures are imprecise.
#[derive(Debug, Default)]
pub struct PointerTracker {
    pressed: Option<Position>,
    target: Option<Position>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, pos: Position) {
        if self.pressed.is_none() {
            self.pressed = Some(pos);
        }
    }

    pub fn enter(&mut self, pos: Position) {
        if let Some(pressed) = self.pressed
            && pressed.is_adjacent(pos)
        {
            self.target = Some(pos);
        }
    }

    pub fn release(&mut self) -> Option<SwapRequest> {
        match (self.pressed.take(), self.target.take()) {
            (Some(from), Some(to)) => Some(SwapRequest::new(from, to)),
            _ => None,
        }
    }

    pub fn apply(&mut self, event: InputEvent) -> Option<SwapRequest> {
        match event {
            InputEvent::Press(pos) => {
                self.press(pos);
                None
            }
            InputEvent::Enter(pos) => {
                self.enter(pos);
                None
            }
            InputEvent::Release => self.release(),
            InputEvent::Swap(request) => Some(request),
        }
    }
}
