//! # Scroll model
//!
//! A form's content (the *view*) can be taller than its viewport. The
//! [`ScrollState`] keeps the vertical offset of the viewport into the view
//! and holds one invariant: the offset always lies in
//! `[0, max(0, content_height - viewport_height)]`, whatever order the sizes
//! and offset are updated in.
//!
//! Keeping focus visible goes through [`ScrollState::ensure_visible`]:
//!
//! - Content that fits the viewport is never scrolled.
//! - A target already fully inside the viewport leaves the offset alone.
//! - Otherwise the offset moves by at most one `step` towards the target.
//!   Callers run it once per input signal, so long moves scroll smoothly
//!   instead of jumping.
//! - With no arrival direction (first display, programmatic focus) there is
//!   nothing to animate from, so the offset jumps straight to the target.

use formflow_core::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    offset: i32,
    viewport_height: i32,
    content_height: i32,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport_height(&mut self, h: i32) {
        self.viewport_height = h.max(0);
        self.clamp_offset();
    }

    pub fn set_content_height(&mut self, h: i32) {
        self.content_height = h.max(0);
        self.clamp_offset();
    }

    pub fn set_offset(&mut self, off: i32) {
        self.offset = off.clamp(0, self.max_offset());
    }

    fn clamp_offset(&mut self) {
        self.set_offset(self.offset);
    }

    pub fn get(&self) -> i32 {
        self.offset
    }

    pub fn viewport_height(&self) -> i32 {
        self.viewport_height
    }

    pub fn content_height(&self) -> i32 {
        self.content_height
    }

    pub fn max_offset(&self) -> i32 {
        (self.content_height - self.viewport_height).max(0)
    }

    /// True when `rect` lies entirely inside the visible band.
    pub fn is_visible(&self, rect: &Rect) -> bool {
        rect.y >= self.offset && rect.bottom() <= self.offset.saturating_add(self.viewport_height)
    }

    /// Consume `dy`, clamp to bounds, return the part that could not be used.
    pub fn scroll_immediate(&mut self, dy: i32) -> i32 {
        let before = self.offset;
        self.set_offset(before.saturating_add(dy));
        dy - (self.offset - before)
    }

    /// Moves the viewport towards `target`; returns whether the offset changed.
    pub fn ensure_visible(&mut self, target: Rect, arrival: Option<Direction>, step: i32) -> bool {
        let before = self.offset;
        if self.content_height <= self.viewport_height {
            self.offset = 0;
            return before != 0;
        }
        if self.is_visible(&target) {
            return false;
        }

        let top_hidden = target.y < self.offset;
        let bottom_hidden = target.bottom() > self.offset.saturating_add(self.viewport_height);
        // A target taller than the viewport is settled once its edge in the
        // arrival direction shows.
        let settled = match arrival {
            Some(dir) if target.h > self.viewport_height => {
                if dir.is_forward() { !bottom_hidden } else { !top_hidden }
            }
            _ => false,
        };
        if settled {
            return false;
        }
        let towards_end = match (top_hidden, bottom_hidden) {
            (true, false) => false,
            (false, true) => true,
            _ => arrival.is_some_and(Direction::is_forward),
        };

        let flush_bottom = target.bottom().saturating_sub(self.viewport_height);
        let next = match arrival {
            None if towards_end && target.h <= self.viewport_height => flush_bottom,
            None => target.y,
            Some(_) if towards_end => self.offset.saturating_add(step).min(flush_bottom),
            Some(_) => self.offset.saturating_sub(step).max(target.y),
        };
        self.set_offset(next);
        log::debug!("scroll {before} -> {} towards {target:?}", self.offset);
        self.offset != before
    }
}
