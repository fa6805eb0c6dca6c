use std::time::Duration;
use tokio::sync::mpsc;
use common::games::match_three::{GemId, Presenter, PresenterCommand};
use common::log_debug;

/// Largest accepted slow-down factor for animations.
pub const MAX_TIME_SCALE: f32 = 1000.0;

/// Settle signal reported back to the main loop once a move has played out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settled {
    pub id: GemId,
    pub x: f32,
    pub y: f32,
}

/// Plays moves in wall-clock time: every `MoveTo` becomes a tokio task that
/// sleeps for the scaled duration and then reports the gem as settled.
pub struct TimedPresenter {
    settle_tx: mpsc::UnboundedSender<Settled>,
    time_scale: f32,
}

impl TimedPresenter {
    pub fn new(settle_tx: mpsc::UnboundedSender<Settled>, time_scale: f32) -> Self {
        Self {
            settle_tx,
            time_scale: if time_scale.is_nan() {
                1.0
            } else {
                time_scale.clamp(0.0, MAX_TIME_SCALE)
            },
        }
    }

    fn scaled(&self, duration: Duration) -> Duration {
        Duration::try_from_secs_f64(duration.as_secs_f64() * f64::from(self.time_scale))
            .unwrap_or(Duration::MAX)
    }
}

impl Presenter for TimedPresenter {
    fn present(&mut self, command: PresenterCommand) {
        match command {
            PresenterCommand::Create {
                id,
                gem_type,
                position,
                spawn_y,
            } => {
                log_debug!("Create gem {} ({}) for {} at height {:.1}", id, gem_type, position, spawn_y);
            }
            PresenterCommand::MoveTo {
                id,
                position,
                duration,
            } => {
                let settled = Settled {
                    id,
                    x: position.x as f32,
                    y: position.y as f32,
                };
                let delay = self.scaled(duration);
                if delay.is_zero() {
                    let _ = self.settle_tx.send(settled);
                    return;
                }

                let settle_tx = self.settle_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = settle_tx.send(settled);
                });
            }
            PresenterCommand::Destroy { id, duration } => {
                log_debug!("Destroy gem {} over {:?}", id, self.scaled(duration));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::games::match_three::Position;

    #[tokio::test]
    async fn test_zero_scale_settles_immediately() {
        let (settle_tx, mut settle_rx) = mpsc::unbounded_channel();
        let mut presenter = TimedPresenter::new(settle_tx, 0.0);

        presenter.present(PresenterCommand::MoveTo {
            id: 7,
            position: Position::new(2, 3),
            duration: Duration::from_millis(500),
        });

        assert_eq!(
            settle_rx.try_recv().unwrap(),
            Settled { id: 7, x: 2.0, y: 3.0 }
        );
    }

    #[tokio::test]
    async fn test_move_settles_after_scaled_duration() {
        let (settle_tx, mut settle_rx) = mpsc::unbounded_channel();
        let mut presenter = TimedPresenter::new(settle_tx, 2.0);

        presenter.present(PresenterCommand::MoveTo {
            id: 1,
            position: Position::new(0, 0),
            duration: Duration::from_millis(20),
        });
        presenter.present(PresenterCommand::Destroy {
            id: 2,
            duration: Duration::from_millis(20),
        });
        assert!(settle_rx.try_recv().is_err());

        let settled = tokio::time::timeout(Duration::from_secs(5), settle_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.id, 1);
    }

    #[test]
    fn test_huge_time_scale_is_capped() {
        let (settle_tx, _settle_rx) = mpsc::unbounded_channel();
        let presenter = TimedPresenter::new(settle_tx, 1e30);

        assert_eq!(
            presenter.scaled(Duration::from_millis(500)),
            Duration::from_secs(500)
        );
        assert_eq!(presenter.scaled(Duration::MAX), Duration::MAX);
    }
}
