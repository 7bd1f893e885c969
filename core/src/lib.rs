use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use element::*;
pub use engine::*;
pub use error::*;
pub use layout::*;
pub use types::*;

mod element;
mod engine;
mod error;
mod layout;
mod types;

pub(crate) const DEFAULT_RESERVE: Px2 = (300.0, 250.0);
pub(crate) const DEFAULT_CADENCE: Duration = Duration::from_secs(2);
pub(crate) const DEFAULT_PER_ELEMENT_DELAY: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Delay between `start_round` and the first scramble tick.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InitialDelay {
    /// `duration * n` for a round of `n` elements, so the memorize window
    /// grows with the sequence length.
    PerElement(Duration),
    /// The same delay regardless of element count.
    Fixed(Duration),
}

impl InitialDelay {
    pub fn for_count(self, n: ElementCount) -> Duration {
        match self {
            Self::PerElement(per) => per * u32::from(n),
            Self::Fixed(delay) => delay,
        }
    }
}

impl Default for InitialDelay {
    fn default() -> Self {
        Self::PerElement(DEFAULT_PER_ELEMENT_DELAY)
    }
}

/// Timing and geometry knobs for a round.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Extent of the play surface positions are sampled from.
    pub viewport: Px2,
    /// Exclusion margin reserved for an element's own footprint.
    pub reserve: Px2,
    pub initial_delay: InitialDelay,
    /// Spacing between scramble ticks.
    pub cadence: Duration,
    /// Delay between the deciding selection and the reported outcome, so a
    /// renderer can show the revealed labels before the result lands.
    pub settle_delay: Duration,
}

impl RoundConfig {
    pub fn new(viewport: Px2) -> Self {
        Self {
            viewport,
            reserve: DEFAULT_RESERVE,
            initial_delay: Default::default(),
            cadence: DEFAULT_CADENCE,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}
