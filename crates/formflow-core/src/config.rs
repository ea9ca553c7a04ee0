use crate::MAX_EXTENT;

/// Tunables shared by layout, traversal and scrolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormConfig {
    /// Horizontal margin on each side of every row.
    pub margin: i32,
    /// Gap between widgets of a row and between consecutive rows.
    pub item_spacing: i32,
    /// Growth of the search band per step of a vertical focus search.
    pub search_step: i32,
    /// Distance covered by one incremental scroll.
    pub scroll_step: i32,
    /// Attempts at a layout pass before giving up on a form that keeps
    /// being invalidated by its own widgets.
    pub max_layout_passes: u32,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            margin: 0,
            item_spacing: 0,
            search_step: 1,
            scroll_step: 16,
            max_layout_passes: 4,
        }
    }
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn margin(mut self, margin: i32) -> Self {
        self.margin = margin.clamp(0, MAX_EXTENT);
        self
    }

    pub fn item_spacing(mut self, spacing: i32) -> Self {
        self.item_spacing = spacing.clamp(0, MAX_EXTENT);
        self
    }

    pub fn search_step(mut self, step: i32) -> Self {
        self.search_step = step.clamp(1, MAX_EXTENT);
        self
    }

    pub fn scroll_step(mut self, step: i32) -> Self {
        self.scroll_step = step.clamp(1, MAX_EXTENT);
        self
    }

    pub fn max_layout_passes(mut self, passes: u32) -> Self {
        self.max_layout_passes = passes.max(1);
        self
    }

    /// Runs every field through its setter, for configs built field by field.
    pub fn normalized(self) -> Self {
        Self::new()
            .margin(self.margin)
            .item_spacing(self.item_spacing)
            .search_step(self.search_step)
            .scroll_step(self.scroll_step)
            .max_layout_passes(self.max_layout_passes)
    }

    /// Width left for widgets and gaps once the margins are taken off.
    pub fn usable_width(&self, viewport_width: i32) -> i32 {
        viewport_width
            .saturating_sub(self.margin.saturating_mul(2))
            .max(0)
    }
}
