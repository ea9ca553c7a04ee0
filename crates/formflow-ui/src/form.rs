//! # Form container
//!
//! A [`Form`] owns an ordered list of [`Widget`]s, lays them out in rows on
//! a fixed-width viewport, and tracks focus and scroll state.
//!
//! ## Locking
//!
//! All state sits behind one mutex. Widget callbacks (size queries,
//! internal traversal, focus hooks) may call back into the form, so no
//! operation holds the lock while calling into an [`Item`]:
//!
//! - Layout snapshots the widget list and a generation counter, measures
//!   unlocked, and only applies the result if nothing changed meanwhile.
//! - Focus changes are decided under the lock and the resulting hooks are
//!   queued, then run after the lock is released.
//! - A callback may delete, replace or refocus its own widget. Hooks for a
//!   widget whose callback is still running are delivered once it returns
//!   (see [`Widget`]), and the form re-checks focus after every callback.
//!
//! ## Directional input
//!
//! [`Form::handle_directional_signal`] first offers the signal to the
//! focused widget when it is in [`TraverseMode::Widget`]. If the widget
//! yields, the form moves focus itself: Left/Right by index, Up/Down to the
//! nearest widget above or below. A widget taller than the viewport is
//! scrolled through before focus leaves it.

use std::sync::Arc;

use formflow_core::*;
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;

use crate::layout::{LayoutResult, Measure, Row, layout};
use crate::scroll::ScrollState;
use crate::traverse::{TraverseMode, find_horizontal, find_vertical, first_focusable};
use crate::widget::Widget;

/// Cheap, cloneable handle to a form. All clones share the same state.
#[derive(Clone)]
pub struct Form {
    shared: Arc<FormShared>,
}

pub(crate) struct FormShared {
    state: Mutex<FormState>,
    config: FormConfig,
}

impl FormShared {
    pub(crate) fn invalidate(&self) {
        self.state.lock().invalidate();
    }
}

#[derive(Default)]
struct FormState {
    widgets: Vec<Widget>,
    viewport_width: i32,
    scroll: ScrollState,
    focus: Option<usize>,
    mode: TraverseMode,
    traverse_rect: Option<Rect>,
    /// Last applied layout; always matches `widgets` when present.
    cache: Option<Cache>,
    valid: bool,
    generation: u64,
    shown: bool,
    /// Focus points at a widget that has not been told it gained focus.
    pending_gain: bool,
}

struct Cache {
    layout: LayoutResult,
    skip: Vec<bool>,
}

enum Callout {
    Lost(Widget),
    Gained(Widget),
}

type Callouts = SmallVec<[Callout; 2]>;

fn run(callouts: Callouts) {
    for c in callouts {
        match c {
            Callout::Lost(w) => w.traverse_out(),
            Callout::Gained(w) => w.focus_gained(),
        }
    }
}

impl FormState {
    fn invalidate(&mut self) {
        self.valid = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn structure_changed(&mut self) {
        self.cache = None;
        self.invalidate();
    }

    fn bounds(&self, index: usize) -> Option<Rect> {
        self.cache.as_ref()?.layout.bounds.get(index).copied()
    }

    fn reset_mode(&mut self) {
        self.mode = TraverseMode::Container;
        self.traverse_rect = None;
    }

    /// Queues the hooks for moving focus to `next`.
    fn move_focus(&mut self, next: Option<usize>, callouts: &mut Callouts) {
        if let Some(old) = self.focus.filter(|_| !self.pending_gain) {
            callouts.push(Callout::Lost(self.widgets[old].clone()));
        }
        if let Some(new) = next {
            callouts.push(Callout::Gained(self.widgets[new].clone()));
        }
        log::debug!("focus {:?} -> {:?}", self.focus, next);
        self.focus = next;
        self.pending_gain = false;
        self.reset_mode();
    }

    fn apply(&mut self, result: LayoutResult, skip: Vec<bool>, callouts: &mut Callouts) {
        for (w, b) in self.widgets.iter().zip(&result.bounds) {
            w.set_bounds(*b);
        }
        self.scroll.set_content_height(result.total_height);
        self.cache = Some(Cache {
            layout: result,
            skip,
        });
        self.valid = true;
        self.revalidate_focus(callouts);
    }

    /// Moves focus off a widget that stopped being focusable, and delivers
    /// a gain that was held back by a structural change.
    fn revalidate_focus(&mut self, callouts: &mut Callouts) {
        let Some(cache) = &self.cache else {
            return;
        };
        let next = match self.focus {
            Some(i) if !cache.skip[i] => Some(i),
            Some(i) => first_focusable(&cache.skip, i),
            None if self.shown => first_focusable(&cache.skip, 0),
            None => None,
        };
        if next != self.focus {
            self.move_focus(next, callouts);
        } else if self.pending_gain {
            if let Some(i) = next {
                callouts.push(Callout::Gained(self.widgets[i].clone()));
            }
            self.pending_gain = false;
        }
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new(FormConfig::default())
    }
}

impl Form {
    pub fn new(config: FormConfig) -> Self {
        Self {
            shared: Arc::new(FormShared {
                state: Mutex::new(FormState::default()),
                config: config.normalized(),
            }),
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.shared.config
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.shared.state.lock()
    }

    /// Marks the cached layout stale; the next query or signal lays out again.
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    pub fn len(&self) -> usize {
        self.lock().widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Widget> {
        self.lock().widgets.get(index).cloned()
    }

    /// Appends `widget`, returning its index.
    pub fn append(&self, widget: Widget) -> Result<usize, FormError> {
        let mut s = self.lock();
        let index = s.widgets.len();
        self.insert_locked(&mut s, index, widget)?;
        Ok(index)
    }

    /// Inserts `widget` at `index`, shifting later widgets down by one.
    pub fn insert(&self, index: usize, widget: Widget) -> Result<(), FormError> {
        let mut s = self.lock();
        self.insert_locked(&mut s, index, widget)
    }

    fn insert_locked(&self, s: &mut FormState, index: usize, widget: Widget) -> Result<(), FormError> {
        let len = s.widgets.len();
        if index > len {
            return Err(FormError::IndexOutOfBounds { index, len });
        }
        widget.claim(Arc::downgrade(&self.shared))?;
        s.widgets.insert(index, widget);
        if let Some(f) = s.focus.filter(|&f| f >= index) {
            s.focus = Some(f + 1);
        }
        s.structure_changed();
        Ok(())
    }

    /// Replaces the widget at `index`, returning the old one.
    pub fn set(&self, index: usize, widget: Widget) -> Result<Widget, FormError> {
        let mut callouts = Callouts::new();
        let old = {
            let mut s = self.lock();
            let len = s.widgets.len();
            if index >= len {
                return Err(FormError::IndexOutOfBounds { index, len });
            }
            widget.claim(Arc::downgrade(&self.shared))?;
            let old = std::mem::replace(&mut s.widgets[index], widget);
            old.release();
            if s.focus == Some(index) {
                if !s.pending_gain {
                    callouts.push(Callout::Lost(old.clone()));
                }
                s.pending_gain = true;
                s.reset_mode();
            }
            s.structure_changed();
            old
        };
        run(callouts);
        Ok(old)
    }

    /// Removes the widget at `index` and releases it.
    ///
    /// Removing the focused widget moves focus to the widget that took its
    /// index (or the new last one); it is told so after the next layout.
    pub fn delete(&self, index: usize) -> Result<Widget, FormError> {
        let mut callouts = Callouts::new();
        let removed = {
            let mut s = self.lock();
            let len = s.widgets.len();
            if index >= len {
                return Err(FormError::IndexOutOfBounds { index, len });
            }
            let removed = s.widgets.remove(index);
            removed.release();
            let focus = s.focus;
            match focus {
                Some(f) if f > index => s.focus = Some(f - 1),
                Some(f) if f == index => {
                    if !s.pending_gain {
                        callouts.push(Callout::Lost(removed.clone()));
                    }
                    s.focus = s.widgets.len().checked_sub(1).map(|last| f.min(last));
                    s.pending_gain = s.focus.is_some();
                    s.reset_mode();
                }
                _ => {}
            }
            s.structure_changed();
            removed
        };
        run(callouts);
        Ok(removed)
    }

    pub fn delete_all(&self) {
        let mut callouts = Callouts::new();
        {
            let mut s = self.lock();
            if let Some(f) = s.focus.filter(|_| !s.pending_gain) {
                callouts.push(Callout::Lost(s.widgets[f].clone()));
            }
            for w in s.widgets.drain(..) {
                w.release();
            }
            s.focus = None;
            s.pending_gain = false;
            s.reset_mode();
            s.scroll.set_content_height(0);
            s.structure_changed();
        }
        run(callouts);
    }

    /// Called by the surrounding window system when the available space changes.
    pub fn viewport_size(&self, width: i32, height: i32) {
        let mut s = self.lock();
        let width = width.clamp(0, MAX_EXTENT);
        if s.viewport_width != width {
            s.viewport_width = width;
            s.invalidate();
        }
        s.scroll.set_viewport_height(height.min(MAX_EXTENT));
    }

    pub fn viewport(&self) -> Size {
        let s = self.lock();
        Size {
            width: s.viewport_width,
            height: s.scroll.viewport_height(),
        }
    }

    /// Brings the cached layout up to date.
    ///
    /// Widgets are measured without the lock held. If the form is changed
    /// while measuring, the pass is thrown away and run again.
    fn validate(&self) {
        let passes = self.shared.config.max_layout_passes;
        let mut callouts = Callouts::new();
        for _ in 0..passes {
            let (widgets, generation, width) = {
                let s = self.lock();
                if s.valid {
                    return;
                }
                (s.widgets.clone(), s.generation, s.viewport_width)
            };
            let measures: Vec<Measure> = widgets.iter().map(Widget::measure).collect();
            let result = layout(&measures, width, &self.shared.config);

            let mut s = self.lock();
            if s.generation != generation {
                log::trace!("form changed while measuring, laying out again");
                continue;
            }
            let skip = measures.iter().map(|m| m.skip).collect();
            s.apply(result, skip, &mut callouts);
            drop(s);
            run(callouts);
            return;
        }
        log::warn!("layout abandoned after {passes} passes, widgets keep invalidating the form");
    }

    /// Initial transition: focuses the current widget, or the first
    /// focusable one, scrolls it into view and tries to enter it.
    ///
    /// Returns whether a widget has focus.
    pub fn show(&self) -> bool {
        self.validate();
        let step = self.shared.config.scroll_step;
        let mut callouts = Callouts::new();
        let (index, widget) = {
            let mut guard = self.lock();
            let s = &mut *guard;
            s.shown = true;
            let Some(cache) = &s.cache else {
                return false;
            };
            let current = s.focus.filter(|&i| !cache.skip[i]);
            let Some(index) = current.or_else(|| first_focusable(&cache.skip, 0)) else {
                return false;
            };
            let bounds = cache.layout.bounds[index];
            if current.is_none() {
                s.move_focus(Some(index), &mut callouts);
            } else if s.pending_gain {
                callouts.push(Callout::Gained(s.widgets[index].clone()));
                s.pending_gain = false;
            }
            s.reset_mode();
            s.scroll.ensure_visible(bounds, None, step);
            (index, s.widgets[index].clone())
        };
        run(callouts);
        self.enter(index, &widget, Direction::Down, None);
        true
    }

    /// Moves focus to `index` directly, jumping the scroll position to it.
    ///
    /// Returns `Ok(false)` when that widget cannot take focus.
    pub fn focus(&self, index: usize) -> Result<bool, FormError> {
        self.validate();
        let step = self.shared.config.scroll_step;
        let mut callouts = Callouts::new();
        let widget = {
            let mut guard = self.lock();
            let s = &mut *guard;
            let len = s.widgets.len();
            if index >= len {
                return Err(FormError::IndexOutOfBounds { index, len });
            }
            let Some(cache) = &s.cache else {
                return Ok(false);
            };
            if cache.skip[index] {
                return Ok(false);
            }
            if s.focus == Some(index) && !s.pending_gain {
                return Ok(true);
            }
            let bounds = cache.layout.bounds[index];
            s.move_focus(Some(index), &mut callouts);
            s.scroll.ensure_visible(bounds, None, step);
            s.widgets[index].clone()
        };
        run(callouts);
        self.enter(index, &widget, Direction::Down, None);
        Ok(true)
    }

    /// Routes one directional signal; returns whether it was consumed.
    pub fn handle_directional_signal(&self, dir: Direction) -> bool {
        self.validate();
        self.traverse_widget(dir) || self.traverse_container(dir)
    }

    fn traverse_widget(&self, dir: Direction) -> bool {
        let (index, widget) = {
            let s = self.lock();
            match s.focus {
                Some(i) if s.mode == TraverseMode::Widget => (i, s.widgets[i].clone()),
                _ => return false,
            }
        };
        if self.enter(index, &widget, dir, Some(dir)) {
            return true;
        }
        let mut s = self.lock();
        if s.focus == Some(index) {
            s.reset_mode();
        }
        log::trace!("widget {index} yielded {dir:?}");
        false
    }

    fn traverse_container(&self, dir: Direction) -> bool {
        let config = self.shared.config;
        let mut callouts = Callouts::new();
        let (to, widget) = {
            let mut guard = self.lock();
            let s = &mut *guard;
            let Some(cache) = &s.cache else {
                return false;
            };
            let Some(from) = s.focus else {
                if !dir.is_vertical() {
                    return false;
                }
                let dy = if dir.is_forward() { config.scroll_step } else { -config.scroll_step };
                return s.scroll.scroll_immediate(dy) != dy;
            };

            let bounds = cache.layout.bounds[from];
            let hidden = match dir {
                Direction::Down => {
                    bounds.bottom() > s.scroll.get().saturating_add(s.scroll.viewport_height())
                }
                Direction::Up => bounds.y < s.scroll.get(),
                Direction::Left | Direction::Right => false,
            };
            if hidden && s.scroll.ensure_visible(bounds, Some(dir), config.scroll_step) {
                return true;
            }

            let target = if dir.is_vertical() {
                find_vertical(&cache.layout, &cache.skip, from, dir, config.search_step)
            } else {
                find_horizontal(&cache.skip, from, dir)
            };
            let Some(to) = target else {
                log::trace!("no widget {dir:?} of {from}");
                return false;
            };
            let bounds = cache.layout.bounds[to];
            s.move_focus(Some(to), &mut callouts);
            s.scroll.ensure_visible(bounds, Some(dir), config.scroll_step);
            (to, s.widgets[to].clone())
        };
        run(callouts);
        self.enter(to, &widget, dir.entry(), Some(dir));
        true
    }

    /// Offers `entry` to the widget's internal traversal; on success the
    /// form switches to widget mode and scrolls towards the returned region.
    fn enter(&self, index: usize, widget: &Widget, entry: Direction, arrival: Option<Direction>) -> bool {
        let (vw, vh, mut rect) = {
            let s = self.lock();
            if s.focus != Some(index) || !s.widgets[index].ptr_eq(widget) {
                return false;
            }
            let Some(b) = s.bounds(index) else {
                return false;
            };
            let vh = s.scroll.viewport_height();
            let visible = Rect::new(-b.x, s.scroll.get() - b.y, s.viewport_width, vh);
            (s.viewport_width, vh, visible)
        };
        if !widget.traverse(entry, vw, vh, &mut rect) {
            return false;
        }
        // The widget may have resized itself.
        self.validate();

        let mut s = self.lock();
        if s.focus != Some(index) || !s.widgets[index].ptr_eq(widget) {
            return true;
        }
        let Some(b) = s.bounds(index) else {
            return true;
        };
        let target = rect.translate(b.x, b.y);
        s.mode = TraverseMode::Widget;
        s.traverse_rect = Some(target);
        s.scroll.ensure_visible(target, arrival, self.shared.config.scroll_step);
        log::trace!("widget {index} took {entry:?}, region {target:?}");
        true
    }

    pub fn current_focused_widget(&self) -> Option<Widget> {
        self.validate();
        let s = self.lock();
        s.focus.map(|i| s.widgets[i].clone())
    }

    pub fn focus_index(&self) -> Option<usize> {
        self.validate();
        self.lock().focus
    }

    pub fn mode(&self) -> TraverseMode {
        self.lock().mode
    }

    /// Region inside the focused widget, in content coordinates, while it
    /// handles traversal itself.
    pub fn traverse_rect(&self) -> Option<Rect> {
        let s = self.lock();
        s.traverse_rect.filter(|_| s.mode == TraverseMode::Widget)
    }

    pub fn scroll_offset(&self) -> i32 {
        self.validate();
        self.lock().scroll.get()
    }

    /// Sets the scroll offset, clamped to the scrollable range.
    pub fn scroll_to(&self, offset: i32) {
        self.validate();
        self.lock().scroll.set_offset(offset);
    }

    /// Total content height.
    pub fn view_height(&self) -> i32 {
        self.validate();
        self.lock().scroll.content_height()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.validate();
        let s = self.lock();
        s.cache.as_ref().map(|c| c.layout.rows.clone()).unwrap_or_default()
    }

    /// Index of the widget under a viewport point.
    pub fn widget_at(&self, x: i32, y: i32) -> Option<usize> {
        self.validate();
        let s = self.lock();
        let p = Vec2 {
            x,
            y: y.saturating_add(s.scroll.get()),
        };
        s.cache.as_ref()?.layout.bounds.iter().position(|b| b.contains(p))
    }
}
