use serde::{Deserialize, Serialize};

use crate::{Color, ElementId, Px2};

/// Whether an element's label is currently exposed to the player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelState {
    Revealed,
    Hidden,
}

impl LabelState {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed)
    }
}

impl Default for LabelState {
    fn default() -> Self {
        Self::Revealed
    }
}

/// One playable unit: a stable identity with a hideable label.
///
/// The engine owns every mutation; a renderer only reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable `1..=N` ordinal, unique within the round.
    pub id: ElementId,
    /// Marker shown while the label is exposed.
    pub label: String,
    /// Background color picked at creation.
    pub color: Color,
    pub label_state: LabelState,
    /// Last assigned screen position, `None` before the first scramble tick.
    pub position: Option<Px2>,
    /// Whether the input layer should route clicks for this element.
    pub interactive: bool,
}

impl Element {
    pub(crate) fn new(id: ElementId, color: Color) -> Self {
        Self {
            id,
            label: id.to_string(),
            color,
            label_state: LabelState::Revealed,
            position: None,
            interactive: false,
        }
    }

    /// Color as a `#RRGGBB` string for CSS-flavored renderers.
    pub fn color_hex(&self) -> String {
        let (r, g, b) = self.color;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}
