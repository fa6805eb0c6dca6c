use std::collections::VecDeque;

use crate::games::SessionRng;

use super::types::GemType;

/// Supplies gem types for new gems. `candidates` is never empty.
pub trait GemSource {
    fn draw(&mut self, candidates: &[GemType]) -> GemType;
}

impl GemSource for SessionRng {
    fn draw(&mut self, candidates: &[GemType]) -> GemType {
        *self
            .pick(candidates)
            .unwrap_or_else(|| panic!("gem source asked to draw from no candidates"))
    }
}

/// Hands out a fixed sequence of types; once it runs dry, or its next type is
/// not an allowed candidate, the first candidate is used.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGemSource {
    queue: VecDeque<GemType>,
}

impl ScriptedGemSource {
    pub fn new(types: impl IntoIterator<Item = GemType>) -> Self {
        Self {
            queue: types.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl GemSource for ScriptedGemSource {
    fn draw(&mut self, candidates: &[GemType]) -> GemType {
        match self.queue.pop_front() {
            Some(next) if candidates.contains(&next) => next,
            _ => candidates[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_rng_draws_only_candidates() {
        let mut rng = SessionRng::new(11);
        let candidates = [GemType::Orange, GemType::Teal];
        for _ in 0..100 {
            assert!(candidates.contains(&rng.draw(&candidates)));
        }
    }

    #[test]
    fn test_scripted_source_follows_script_then_falls_back() {
        let mut source = ScriptedGemSource::new([GemType::Red, GemType::Purple]);
        let candidates = [GemType::Blue, GemType::Red];

        assert_eq!(source.draw(&candidates), GemType::Red);
        assert_eq!(source.draw(&candidates), GemType::Blue);
        assert_eq!(source.draw(&candidates), GemType::Blue);
        assert_eq!(source.remaining(), 0);
    }
}
