/// Linear screen dimension in CSS-pixel units.
pub type Px = f32;

/// Position or extent on the play surface, `(x, y)`.
pub type Px2 = (Px, Px);

/// Stable per-round element identity, the `1..=N` ordinal.
pub type ElementId = u8;

/// Count type used for element counts, tick counts, and input progress.
pub type ElementCount = u8;

/// RGB color assigned to an element at creation.
pub type Color = (u8, u8, u8);

/// Smallest playable element count.
pub const MIN_ELEMENTS: ElementCount = 3;

/// Largest playable element count.
pub const MAX_ELEMENTS: ElementCount = 7;

/// Whether `n` is a playable element count.
pub const fn count_in_range(n: ElementCount) -> bool {
    MIN_ELEMENTS <= n && n <= MAX_ELEMENTS
}
