use chrono::prelude::*;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Duration;

use crate::*;

/// Decorrelates the order/color stream from the layout stream when both are
/// derived from one caller-supplied seed.
const ORDER_SEED_TWEAK: u64 = 0x4B49_4F4B_55;

type ElementVec = SmallVec<[Element; MAX_ELEMENTS as usize]>;
type OrderVec = SmallVec<[ElementId; MAX_ELEMENTS as usize]>;

/// Valid transitions:
/// - Init -> Scrambling
/// - Scrambling -> AwaitingInput
/// - AwaitingInput -> Won
/// - AwaitingInput -> Lost
///
/// Terminal phases re-enter Init through `start_round` or `reset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No round in play.
    Init,
    /// Elements are being repositioned on the scramble cadence.
    Scrambling,
    /// The answer key is fixed and input is open.
    AwaitingInput,
    Won,
    Lost,
}

impl Phase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::AwaitingInput)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Init
    }
}

/// Outcome of one scramble tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Elements moved, more ticks to come.
    Repositioned,
    /// The final tick ran: the answer key is fixed and input is open.
    CycleComplete,
}

/// Outcome of one user selection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SelectOutcome {
    /// Correct pick, more to go.
    Advanced,
    /// Correct pick completed the sequence; `Won` is pending settle.
    AllMatched,
    /// Wrong pick; `Lost` is pending settle.
    Mismatched,
}

impl SelectOutcome {
    /// Whether this selection decided the round.
    pub const fn is_deciding(self) -> bool {
        matches!(self, Self::AllMatched | Self::Mismatched)
    }
}

/// Terminal result of a round, reported exactly once by `settle`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Won,
    Lost,
}

/// Which engine event a due timer must feed back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Call `scramble_tick`.
    ScrambleTick,
    /// Call `settle`.
    Settle,
}

/// The single timer a driver is asked to schedule next.
///
/// The engine never sleeps on its own: it arms at most one request at a time
/// and discards it on `reset`, which is all a driver needs to cancel stale
/// ticks when a round is superseded.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub delay: Duration,
}

/// One playthrough from element creation to win or loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    elements: ElementVec,
    ticks_done: ElementCount,
    canonical_order: OrderVec,
    progress: ElementCount,
    phase: Phase,
    pending_result: Option<RoundResult>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Round {
    fn new(elements: ElementVec) -> Self {
        Self {
            elements,
            ticks_done: 0,
            canonical_order: SmallVec::new(),
            progress: 0,
            phase: Phase::Scrambling,
            pending_result: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The answer key; empty until the scramble cycle completes.
    pub fn canonical_order(&self) -> &[ElementId] {
        &self.canonical_order
    }

    pub fn progress(&self) -> ElementCount {
        self.progress
    }

    pub fn ticks_done(&self) -> ElementCount {
        self.ticks_done
    }

    pub fn element_count(&self) -> ElementCount {
        self.elements.len() as ElementCount
    }

    /// Seconds since the round started, frozen once it ends.
    pub fn elapsed_secs(&self) -> u32 {
        (self.ended_at.unwrap_or_else(Utc::now) - self.started_at)
            .num_seconds()
            .max(0) as u32
    }

    fn reveal_all(&mut self) {
        for element in &mut self.elements {
            element.label_state = LabelState::Revealed;
        }
    }
}

/// Render projection handed to the display layer after every state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub phase: Phase,
    pub elements: Vec<Element>,
    pub progress: ElementCount,
}

/// Drives rounds of the sequence-memory game.
///
/// The engine is advanced exclusively by explicit events; time lives in the
/// caller. After every event it exposes at most one [`TimerRequest`]
/// describing the next event a timer should feed back.
#[derive(Debug)]
pub struct SequenceEngine<L = UniformLayoutGenerator> {
    config: RoundConfig,
    layout: L,
    rng: SmallRng,
    round: Option<Round>,
    timer: Option<TimerRequest>,
}

impl SequenceEngine {
    /// Engine with OS-entropy randomness for play.
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            layout: UniformLayoutGenerator::from_entropy(),
            rng: SmallRng::from_entropy(),
            round: None,
            timer: None,
        }
    }

    /// Deterministic engine: `seed` drives both the initial element order
    /// and the scrambled positions.
    pub fn from_seed(config: RoundConfig, seed: u64) -> Self {
        Self::with_layout(
            config,
            UniformLayoutGenerator::from_seed(seed),
            seed ^ ORDER_SEED_TWEAK,
        )
    }
}

impl<L: LayoutGenerator> SequenceEngine<L> {
    /// Engine over a caller-supplied layout strategy; `order_seed` drives
    /// the initial element order and the colors.
    pub fn with_layout(config: RoundConfig, layout: L, order_seed: u64) -> Self {
        Self {
            config,
            layout,
            rng: SmallRng::seed_from_u64(order_seed),
            round: None,
            timer: None,
        }
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.round.as_ref().map(|round| round.phase()).unwrap_or_default()
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn elements(&self) -> &[Element] {
        self.round.as_ref().map(|round| round.elements()).unwrap_or_default()
    }

    pub fn canonical_order(&self) -> &[ElementId] {
        self.round
            .as_ref()
            .map(|round| round.canonical_order())
            .unwrap_or_default()
    }

    pub fn progress(&self) -> ElementCount {
        self.round.as_ref().map(|round| round.progress()).unwrap_or(0)
    }

    /// Seconds since the current round started, 0 when no round is in play.
    pub fn elapsed_secs(&self) -> u32 {
        self.round.as_ref().map(|round| round.elapsed_secs()).unwrap_or(0)
    }

    /// The one timer the caller should have scheduled, if any.
    pub fn pending_timer(&self) -> Option<TimerRequest> {
        self.timer
    }

    /// Consumes the pending request; drivers call this when arming a real
    /// timer so a request is acted on exactly once.
    pub fn take_timer(&mut self) -> Option<TimerRequest> {
        self.timer.take()
    }

    /// Render projection: everything a display layer needs after an event.
    pub fn view(&self) -> RoundView {
        RoundView {
            phase: self.phase(),
            elements: self.elements().to_vec(),
            progress: self.progress(),
        }
    }

    /// Begins a round of `n` elements.
    ///
    /// Allowed from `Init` and from terminal phases, where the finished
    /// round is discarded. A live round must go through [`reset`] first.
    ///
    /// [`reset`]: Self::reset
    pub fn start_round(&mut self, n: ElementCount) -> Result<()> {
        let phase = self.phase();
        if !matches!(phase, Phase::Init) && !phase.is_terminal() {
            return Err(GameError::PhaseViolation(phase));
        }
        if !count_in_range(n) {
            return Err(GameError::InvalidElementCount(n));
        }

        let mut elements: ElementVec = (1..=n)
            .map(|id| Element::new(id, self.rng.gen()))
            .collect();
        elements.shuffle(&mut self.rng);

        log::debug!("round started with {} elements", n);
        self.round = Some(Round::new(elements));
        self.timer = Some(TimerRequest {
            kind: TimerKind::ScrambleTick,
            delay: self.config.initial_delay.for_count(n),
        });
        Ok(())
    }

    /// Discards any round in play along with its pending timer.
    pub fn reset(&mut self) {
        if self.round.take().is_some() {
            log::debug!("round discarded");
        }
        self.timer = None;
    }

    /// One scramble tick: repositions every element and hides the labels.
    ///
    /// Labels count as hidden at tick completion, so they stay visible
    /// through the initial delay (the memorize window) and go dark from the
    /// first tick on. The N-th tick fixes the answer key, opens input, and
    /// leaves no pending timer.
    pub fn scramble_tick(&mut self) -> Result<TickOutcome> {
        let phase = self.phase();
        let Some(round) = self.round.as_mut() else {
            return Err(GameError::PhaseViolation(phase));
        };
        if round.phase != Phase::Scrambling {
            return Err(GameError::PhaseViolation(phase));
        }

        for element in &mut round.elements {
            element.position = Some(
                self.layout
                    .next_position(self.config.viewport, self.config.reserve),
            );
            element.label_state = LabelState::Hidden;
        }
        round.ticks_done += 1;
        log::trace!(
            "scramble tick {}/{}",
            round.ticks_done,
            round.element_count()
        );

        if round.ticks_done < round.element_count() {
            self.timer = Some(TimerRequest {
                kind: TimerKind::ScrambleTick,
                delay: self.config.cadence,
            });
            Ok(TickOutcome::Repositioned)
        } else {
            round.canonical_order = round.elements.iter().map(|element| element.id).collect();
            for element in &mut round.elements {
                element.interactive = true;
            }
            round.phase = Phase::AwaitingInput;
            self.timer = None;
            log::debug!("scramble cycle complete, answer key fixed");
            Ok(TickOutcome::CycleComplete)
        }
    }

    /// Consumes one user selection, comparing it to the answer key.
    ///
    /// The caller is expected to route only interactive elements' ids; an
    /// unknown or already-consumed id simply fails the comparison and loses
    /// the round.
    pub fn submit_selection(&mut self, id: ElementId) -> Result<SelectOutcome> {
        let phase = self.phase();
        let Some(round) = self.round.as_mut() else {
            return Err(GameError::PhaseViolation(phase));
        };
        if round.phase != Phase::AwaitingInput || round.pending_result.is_some() {
            return Err(GameError::PhaseViolation(phase));
        }

        let expected = round.canonical_order[usize::from(round.progress)];
        if id == expected {
            round.progress += 1;
            if let Some(element) = round.elements.iter_mut().find(|element| element.id == id) {
                element.interactive = false;
            }
            if round.progress == round.element_count() {
                round.reveal_all();
                round.pending_result = Some(RoundResult::Won);
                self.timer = Some(TimerRequest {
                    kind: TimerKind::Settle,
                    delay: self.config.settle_delay,
                });
                log::debug!("sequence complete, win pending settle");
                Ok(SelectOutcome::AllMatched)
            } else {
                log::trace!(
                    "correct pick {}, progress {}/{}",
                    id,
                    round.progress,
                    round.element_count()
                );
                Ok(SelectOutcome::Advanced)
            }
        } else {
            round.reveal_all();
            for element in &mut round.elements {
                element.interactive = false;
            }
            round.pending_result = Some(RoundResult::Lost);
            self.timer = Some(TimerRequest {
                kind: TimerKind::Settle,
                delay: self.config.settle_delay,
            });
            log::debug!("expected {}, got {}, loss pending settle", expected, id);
            Ok(SelectOutcome::Mismatched)
        }
    }

    /// Applies the pending outcome once the settle delay has elapsed,
    /// reporting the terminal result exactly once.
    pub fn settle(&mut self) -> Result<RoundResult> {
        let phase = self.phase();
        let Some(round) = self.round.as_mut() else {
            return Err(GameError::PhaseViolation(phase));
        };
        let Some(result) = round.pending_result.take() else {
            return Err(GameError::PhaseViolation(phase));
        };

        round.phase = match result {
            RoundResult::Won => Phase::Won,
            RoundResult::Lost => Phase::Lost,
        };
        round.ended_at = Some(Utc::now());
        self.timer = None;
        log::debug!("round settled: {:?} after {}s", result, round.elapsed_secs());
        Ok(result)
    }
}
