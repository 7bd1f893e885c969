//! Native session driver for the `kioku` engine.
//!
//! Owns the timers the pure core refuses to own: a worker thread waits on a
//! command channel with a deadline computed from the engine's pending
//! [`TimerRequest`], so every engine mutation happens inside the handling of
//! exactly one stimulus, a user command or an elapsed deadline. Replacing
//! the deadline after each stimulus is what cancels a superseded round's
//! scramble timer.
//!
//! [`TimerRequest`]: kioku_core::TimerRequest

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use kioku_core::{
    ElementCount, ElementId, RoundConfig, RoundResult, RoundView, SequenceEngine, TimerKind,
};

/// Receives the render projection after every state change.
pub type ViewSink = Box<dyn FnMut(RoundView) + Send>;

/// Receives the terminal result, exactly once per settled round.
pub type OutcomeSink = Box<dyn FnMut(RoundResult) + Send>;

enum Command {
    Start(ElementCount),
    Select(ElementId),
    Shutdown,
}

/// Handle to a running game session.
///
/// Dropping the handle stops the worker thread and every pending timer.
pub struct SessionDriver {
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// Session with OS-entropy randomness.
    pub fn spawn(config: RoundConfig, on_view: ViewSink, on_outcome: OutcomeSink) -> Self {
        Self::spawn_engine(SequenceEngine::new(config), on_view, on_outcome)
    }

    /// Deterministic session for tests and replays.
    pub fn spawn_seeded(
        config: RoundConfig,
        seed: u64,
        on_view: ViewSink,
        on_outcome: OutcomeSink,
    ) -> Self {
        Self::spawn_engine(SequenceEngine::from_seed(config, seed), on_view, on_outcome)
    }

    fn spawn_engine(engine: SequenceEngine, on_view: ViewSink, on_outcome: OutcomeSink) -> Self {
        let (commands, inbox) = mpsc::channel();
        let worker = thread::spawn(move || run_loop(engine, inbox, on_view, on_outcome));
        Self {
            commands,
            worker: Some(worker),
        }
    }

    /// Begins a round, discarding any round in play along with its timers.
    pub fn start_round(&self, n: ElementCount) {
        let _ = self.commands.send(Command::Start(n));
    }

    /// Forwards one resolved user click.
    pub fn submit_selection(&self, id: ElementId) {
        let _ = self.commands.send(Command::Select(id));
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_loop(
    mut engine: SequenceEngine,
    inbox: Receiver<Command>,
    mut on_view: ViewSink,
    mut on_outcome: OutcomeSink,
) {
    // the one timer armed from the engine's pending request
    let mut armed: Option<(TimerKind, Instant)> = None;

    loop {
        let stimulus = match armed {
            None => match inbox.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            },
            Some((_, due)) => {
                let wait = due.saturating_duration_since(Instant::now());
                match inbox.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        };

        match stimulus {
            Some(Command::Shutdown) => return,
            Some(Command::Start(n)) => {
                engine.reset();
                armed = None;
                match engine.start_round(n) {
                    Ok(()) => on_view(engine.view()),
                    Err(err) => log::warn!("start_round({}) rejected: {}", n, err),
                }
            }
            Some(Command::Select(id)) => match engine.submit_selection(id) {
                Ok(_) => on_view(engine.view()),
                Err(err) => log::debug!("selection {} rejected: {}", id, err),
            },
            None => {
                if let Some((kind, _)) = armed.take() {
                    match kind {
                        TimerKind::ScrambleTick => {
                            match engine.scramble_tick() {
                                Ok(_) => on_view(engine.view()),
                                Err(err) => log::warn!("scramble tick rejected: {}", err),
                            }
                        }
                        TimerKind::Settle => match engine.settle() {
                            Ok(result) => {
                                on_view(engine.view());
                                on_outcome(result);
                            }
                            Err(err) => log::warn!("settle rejected: {}", err),
                        },
                    }
                }
            }
        }

        if let Some(request) = engine.take_timer() {
            armed = Some((request.kind, Instant::now() + request.delay));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kioku_core::{InitialDelay, Phase};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    fn fast_config() -> RoundConfig {
        let mut config = RoundConfig::new((1280.0, 720.0));
        config.initial_delay = InitialDelay::Fixed(Duration::from_millis(1));
        config.cadence = Duration::from_millis(1);
        config.settle_delay = Duration::from_millis(1);
        config
    }

    fn channel_sinks() -> (ViewSink, Receiver<RoundView>, OutcomeSink, Receiver<RoundResult>) {
        let (view_tx, view_rx) = channel();
        let (outcome_tx, outcome_rx) = channel();
        let on_view: ViewSink = Box::new(move |view| {
            let _ = view_tx.send(view);
        });
        let on_outcome: OutcomeSink = Box::new(move |outcome| {
            let _ = outcome_tx.send(outcome);
        });
        (on_view, view_rx, on_outcome, outcome_rx)
    }

    fn await_input_phase(views: &Receiver<RoundView>) -> RoundView {
        loop {
            let view = views
                .recv_timeout(Duration::from_secs(5))
                .expect("engine never opened input");
            if view.phase == Phase::AwaitingInput {
                return view;
            }
        }
    }

    #[test]
    fn full_round_reports_a_win_once() {
        let (on_view, view_rx, on_outcome, outcome_rx) = channel_sinks();
        let driver = SessionDriver::spawn_seeded(fast_config(), 7, on_view, on_outcome);

        driver.start_round(4);
        let view = await_input_phase(&view_rx);
        // element sequence order is the answer key
        for element in &view.elements {
            driver.submit_selection(element.id);
        }

        assert_eq!(
            outcome_rx.recv_timeout(Duration::from_secs(5)),
            Ok(RoundResult::Won)
        );
        assert!(outcome_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn wrong_selection_reports_a_loss() {
        let (on_view, view_rx, on_outcome, outcome_rx) = channel_sinks();
        let driver = SessionDriver::spawn_seeded(fast_config(), 13, on_view, on_outcome);

        driver.start_round(3);
        let view = await_input_phase(&view_rx);
        let wrong = view.elements.last().expect("empty round").id;
        driver.submit_selection(wrong);

        assert_eq!(
            outcome_rx.recv_timeout(Duration::from_secs(5)),
            Ok(RoundResult::Lost)
        );
    }

    #[test]
    fn restarting_mid_round_supersedes_the_old_round() {
        let (on_view, view_rx, on_outcome, outcome_rx) = channel_sinks();
        // cadence long enough that the superseded round can never finish
        // its cycle before the replacement command is handled
        let mut config = fast_config();
        config.cadence = Duration::from_millis(20);
        let driver = SessionDriver::spawn_seeded(config, 29, on_view, on_outcome);

        driver.start_round(7);
        driver.start_round(3);
        let view = await_input_phase(&view_rx);
        assert_eq!(view.elements.len(), 3);

        for element in &view.elements {
            driver.submit_selection(element.id);
        }
        assert_eq!(
            outcome_rx.recv_timeout(Duration::from_secs(5)),
            Ok(RoundResult::Won)
        );
    }
}
