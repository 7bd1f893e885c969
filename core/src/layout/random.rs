use rand::prelude::*;

use super::LayoutGenerator;
use crate::{Px, Px2};

/// Uniform sampling over the viewport minus the element reserve.
#[derive(Clone, Debug)]
pub struct UniformLayoutGenerator {
    rng: SmallRng,
}

impl UniformLayoutGenerator {
    /// Deterministic generator for tests and replays.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// OS-entropy generator for play.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

fn axis_span(extent: Px, reserve: Px) -> Px {
    (extent - reserve).max(0.0)
}

impl LayoutGenerator for UniformLayoutGenerator {
    fn next_position(&mut self, viewport: Px2, reserve: Px2) -> Px2 {
        let max_x = axis_span(viewport.0, reserve.0);
        let max_y = axis_span(viewport.1, reserve.1);

        if max_x == 0.0 || max_y == 0.0 {
            log::warn!(
                "reserve {:?} does not fit viewport {:?}, collapsing to the edge",
                reserve,
                viewport
            );
        }

        let x = if max_x > 0.0 {
            self.rng.gen_range(0.0..=max_x)
        } else {
            0.0
        };
        let y = if max_y > 0.0 {
            self.rng.gen_range(0.0..=max_y)
        } else {
            0.0
        };
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_stay_inside_reduced_viewport() {
        let mut layout = UniformLayoutGenerator::from_seed(11);
        for _ in 0..1000 {
            let (x, y) = layout.next_position((1280.0, 720.0), (300.0, 250.0));
            assert!((0.0..=980.0).contains(&x));
            assert!((0.0..=470.0).contains(&y));
        }
    }

    #[test]
    fn degenerate_viewport_collapses_to_origin() {
        let mut layout = UniformLayoutGenerator::from_seed(11);
        assert_eq!(
            layout.next_position((200.0, 100.0), (300.0, 250.0)),
            (0.0, 0.0)
        );
        assert_eq!(
            layout.next_position((300.0, 250.0), (300.0, 250.0)),
            (0.0, 0.0)
        );
    }

    #[test]
    fn degenerate_axis_still_samples_the_other() {
        let mut layout = UniformLayoutGenerator::from_seed(3);
        for _ in 0..100 {
            let (x, y) = layout.next_position((200.0, 720.0), (300.0, 250.0));
            assert_eq!(x, 0.0);
            assert!((0.0..=470.0).contains(&y));
        }
    }

    #[test]
    fn equal_seeds_give_equal_sequences() {
        let mut a = UniformLayoutGenerator::from_seed(99);
        let mut b = UniformLayoutGenerator::from_seed(99);
        for _ in 0..32 {
            assert_eq!(
                a.next_position((800.0, 600.0), (300.0, 250.0)),
                b.next_position((800.0, 600.0), (300.0, 250.0)),
            );
        }
    }
}
