// Layout numbers shared by the tag widget, the card list and the panels.

/// UI spacing constants
pub mod spacing {
    /// Small spacing (4px)
    pub const SMALL: f32 = 4.0;

    /// Medium spacing (8px)
    pub const MEDIUM: f32 = 8.0;

    /// Extra large spacing (24px)
    pub const XLARGE: f32 = 24.0;
}

/// Chip geometry of the tag collection widget
pub mod chips {
    /// Left/right margin inside the widget area
    pub const MARGIN: f32 = 10.0;

    /// Height of one chip
    pub const HEIGHT: f32 = 30.0;

    /// Gap between chips and between rows
    pub const GAP: f32 = 5.0;

    /// Horizontal text padding on each side of a chip
    pub const PAD_X: f32 = 10.0;

    /// Font size of chip labels
    pub const FONT_SIZE: f32 = 14.0;

    /// Upper bound of a glyph advance at FONT_SIZE, used before text was measured
    pub const ESTIMATED_CHAR_WIDTH: f32 = 14.0;

    /// Height reserved for the empty and the error placeholders
    pub const MIN_HEIGHT: f32 = 40.0;

    /// Corner rounding of a chip (egui adapter only)
    pub const ROUNDING: f32 = 4.0;

    /// Border width of a highlighted chip
    pub const HIGHLIGHT_STROKE: f32 = 2.0;

    /// Vertical step of one chip row
    pub const ROW_STEP: f32 = HEIGHT + GAP;
}

/// Strength range accepted for weighted tags
pub mod strength {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 2.0;
}

/// Card-specific layout constants
pub mod card {
    /// Inner margin of card frame (symmetric)
    pub const INNER_MARGIN: f32 = 8.0;

    /// Border radius of card corners
    pub const ROUNDING: f32 = 8.0;

    /// Number of prompt characters shown in a collapsed card
    pub const PREVIEW_CHARS: usize = 100;

    /// Max width of an expanded thumbnail
    pub const THUMBNAIL_MAX_WIDTH: f32 = 256.0;

    /// Metadata plaque rounding
    pub const META_ROUNDING: f32 = 6.0;
}
