//! # Row packing
//!
//! [`layout`] is a pure function from measured widgets and a viewport width
//! to bounds grouped into rows. It runs in one pass over the widgets:
//!
//! - Each widget gets a candidate width: its minimum when `SHRINK` is set,
//!   otherwise its preferred (or locked) width, clamped to the usable width.
//! - A row closes before a widget when the previous widget asked for
//!   `NEWLINE_AFTER`, the widget asked for `NEWLINE_BEFORE`, or it does not
//!   fit in the space left. Breaks never stack, so no empty rows appear.
//! - Closing a row inflates shrinkable widgets towards their preferred width
//!   in proportion to how much they were shrunk, then shares what is left
//!   equally between `EXPAND` widgets, then pads the row according to the
//!   alignment of its first explicitly aligned widget.
//! - The row height is the tallest contribution; widgets are then placed
//!   top, bottom or centered inside it, or stretched with `VEXPAND`.
//!
//! ```rust
//! use formflow_core::*;
//! use formflow_ui::layout::{layout, Measure};
//!
//! let fixed = |w| Measure { pref_width: w, pref_height: 10, ..Measure::default() };
//! let out = layout(&[fixed(40), fixed(30), fixed(50)], 100, &FormConfig::default());
//!
//! assert_eq!(out.rows.len(), 2);
//! assert_eq!(out.bounds[2], Rect::new(0, 10, 50, 10));
//! assert_eq!(out.total_height, 20);
//! ```

use std::ops::Range;

use formflow_core::*;
use smallvec::SmallVec;

/// Everything the engine needs to know about one widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    pub layout: Layout,
    pub min_width: i32,
    pub min_height: i32,
    /// Preferred width, already replaced by the locked width if there is one.
    pub pref_width: i32,
    pub pref_height: i32,
    pub skip: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    /// First widget index of the row.
    pub start: usize,
    /// One past the last widget index.
    pub end: usize,
    pub y: i32,
    pub height: i32,
}

impl Row {
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutResult {
    pub bounds: Vec<Rect>,
    pub rows: Vec<Row>,
    pub total_height: i32,
}

impl LayoutResult {
    /// Index of the row holding widget `index`.
    pub fn row_of(&self, index: usize) -> Option<usize> {
        let r = self.rows.partition_point(|row| row.end <= index);
        self.rows.get(r).filter(|row| row.contains(index)).map(|_| r)
    }
}

pub fn layout(measures: &[Measure], viewport_width: i32, config: &FormConfig) -> LayoutResult {
    let usable = config.usable_width(viewport_width);
    let spacing = config.item_spacing;
    let mut out = LayoutResult {
        bounds: vec![Rect::default(); measures.len()],
        rows: Vec::new(),
        total_height: 0,
    };

    let mut row_start = 0;
    let mut available = usable;
    for (i, m) in measures.iter().enumerate() {
        let width = candidate_width(m, usable);
        out.bounds[i].w = width;

        if i > row_start {
            let forced = measures[i - 1].layout.newline_after() || m.layout.newline_before();
            if forced || width.saturating_add(spacing) > available {
                close_row(&mut out, measures, row_start..i, available, config);
                row_start = i;
                available = usable;
            }
        }
        available = available.saturating_sub(if i == row_start {
            width
        } else {
            width.saturating_add(spacing)
        });
    }
    if row_start < measures.len() {
        close_row(&mut out, measures, row_start..measures.len(), available, config);
    }

    log::trace!(
        "layout: {} widgets, {} rows, height {}",
        measures.len(),
        out.rows.len(),
        out.total_height
    );
    out
}

fn candidate_width(m: &Measure, usable: i32) -> i32 {
    let w = if m.layout.contains(Layout::SHRINK) {
        m.min_width
    } else {
        m.pref_width
    };
    w.clamp(0, usable)
}

fn contributed_height(m: &Measure) -> i32 {
    if m.layout.contains(Layout::VSHRINK) {
        m.min_height
    } else {
        m.pref_height
    }
}

fn close_row(
    out: &mut LayoutResult,
    measures: &[Measure],
    range: Range<usize>,
    leftover: i32,
    config: &FormConfig,
) {
    let spacing = config.item_spacing;

    let leftover = inflate_shrinkables(&mut out.bounds, measures, range.clone(), leftover);
    let leftover = inflate_expandables(&mut out.bounds, measures, range.clone(), leftover);

    let align = measures[range.clone()]
        .iter()
        .map(|m| m.layout.horizontal())
        .find(|a| *a != HAlign::Default)
        .unwrap_or(HAlign::Left);
    let pad = match align {
        HAlign::Center => leftover / 2,
        HAlign::Right => leftover,
        HAlign::Left | HAlign::Default => 0,
    };

    let mut x = config.margin + pad.max(0);
    for b in &mut out.bounds[range.clone()] {
        b.x = x;
        x = x.saturating_add(b.w).saturating_add(spacing);
    }

    let y = out.rows.last().map_or(0, |r| {
        r.y.saturating_add(r.height).saturating_add(spacing)
    });
    let height = measures[range.clone()]
        .iter()
        .map(contributed_height)
        .max()
        .unwrap_or(0);

    for (b, m) in out.bounds[range.clone()].iter_mut().zip(&measures[range.clone()]) {
        let h = if m.layout.contains(Layout::VEXPAND) {
            height
        } else if m.layout.contains(Layout::VSHRINK) {
            m.pref_height.min(height)
        } else {
            m.pref_height
        };
        let dy = match m.layout.vertical() {
            VAlign::Top => 0,
            VAlign::Center => height.saturating_sub(h) / 2,
            VAlign::Bottom => height.saturating_sub(h),
        };
        b.y = y.saturating_add(dy);
        b.h = h;
    }

    out.rows.push(Row {
        start: range.start,
        end: range.end,
        y,
        height,
    });
    out.total_height = y.saturating_add(height);
}

/// Grows shrunk widgets back towards their preferred width.
///
/// Each widget's share is proportional to `(preferred - minimum)` counted in
/// units of the smallest such gap in the row, and never takes a widget past
/// its preferred width. Returns the space still unused.
fn inflate_shrinkables(
    bounds: &mut [Rect],
    measures: &[Measure],
    range: Range<usize>,
    space: i32,
) -> i32 {
    if space <= 0 {
        return space;
    }
    let gaps: SmallVec<[(usize, i32); 8]> = range
        .filter(|&i| measures[i].layout.contains(Layout::SHRINK))
        .map(|i| (i, measures[i].pref_width.max(bounds[i].w) - bounds[i].w))
        .filter(|&(_, gap)| gap > 0)
        .collect();
    let Some(baseline) = gaps.iter().map(|&(_, gap)| gap).min() else {
        return space;
    };

    let total_weight: i64 = gaps.iter().map(|&(_, gap)| i64::from(gap / baseline)).sum();
    let budget = i64::from(space);
    let mut left = space;
    for &(i, gap) in &gaps {
        let weight = i64::from(gap / baseline);
        let share = (budget * weight / total_weight).min(i64::from(gap)) as i32;
        bounds[i].w += share;
        left -= share;
    }
    left
}

/// Shares the leftover equally between `EXPAND` widgets; the last one also
/// takes the division remainder so the row ends flush.
fn inflate_expandables(
    bounds: &mut [Rect],
    measures: &[Measure],
    range: Range<usize>,
    space: i32,
) -> i32 {
    if space <= 0 {
        return space;
    }
    let expandables: SmallVec<[usize; 8]> = range
        .filter(|&i| measures[i].layout.contains(Layout::EXPAND))
        .collect();
    let Some(&last) = expandables.last() else {
        return space;
    };
    let count = expandables.len() as i32;
    for &i in &expandables {
        bounds[i].w += space / count;
    }
    bounds[last].w += space % count;
    0
}
