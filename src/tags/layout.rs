use eframe::egui::{pos2, vec2, Pos2, Rect};

use crate::ui_constants::chips::{GAP, HEIGHT, MARGIN, MIN_HEIGHT, PAD_X, ROW_STEP};

/// Position of one chip; `index` points into the tag collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipSlot {
    pub index: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChipLayout {
    pub slots: Vec<ChipSlot>,
    pub rows: usize,
}

impl ChipLayout {
    pub fn height(&self) -> f32 {
        (self.rows as f32 * ROW_STEP).max(MIN_HEIGHT)
    }

    pub fn hit(&self, pos: Pos2) -> Option<usize> {
        self.slots
            .iter()
            .find(|slot| slot.rect.contains(pos))
            .map(|slot| slot.index)
    }
}

/// Greedy left-to-right walk shared by painting, height estimation and hit testing.
/// `measure` returns the text width of the label at `index`.
/// A chip goes to the next row when it does not fit and the row already holds one.
pub fn layout_chips<E>(
    count: usize,
    origin_y: f32,
    width: f32,
    mut measure: impl FnMut(usize) -> Result<f32, E>,
) -> Result<ChipLayout, E> {
    let max_x = width - 2.0 * MARGIN;
    let mut x = MARGIN;
    let mut y = origin_y;
    let mut layout = ChipLayout::default();

    for index in 0..count {
        let chip_w = measure(index)? + 2.0 * PAD_X;
        if x + chip_w > max_x && x > MARGIN {
            x = MARGIN;
            y += ROW_STEP;
            layout.rows += 1;
        }
        if layout.rows == 0 {
            layout.rows = 1;
        }
        layout.slots.push(ChipSlot {
            index,
            rect: Rect::from_min_size(pos2(x, y), vec2(chip_w, HEIGHT)),
        });
        x += chip_w + GAP;
    }
    Ok(layout)
}
