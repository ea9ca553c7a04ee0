use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use formflow_core::*;
use parking_lot::{Mutex, ReentrantMutex};
use smallvec::SmallVec;

use crate::form::FormShared;
use crate::guard::isolate;
use crate::layout::Measure;

/// Shared handle to an arrangeable element.
///
/// Cloning is cheap and every clone refers to the same widget. The user
/// supplied [`Item`] and the properties the form manages live behind two
/// separate locks, so an item callback can still change its own directives
/// or call [`Widget::invalidate`].
///
/// The item lock is reentrant. When a callback leads back to its own widget
/// on the same thread (say `traverse` deletes the widget, and the form then
/// tells it focus was lost), focus hooks are queued and delivered as soon
/// as the outer callback returns. Size queries answer with the sizes of the
/// last completed measurement and traversal yields.
#[derive(Clone)]
pub struct Widget {
    inner: Arc<WidgetInner>,
}

struct WidgetInner {
    item: ReentrantMutex<RefCell<Box<dyn Item>>>,
    props: Mutex<Props>,
}

#[derive(Clone, Copy, Debug)]
enum Hook {
    Gained,
    Lost,
}

impl Hook {
    fn name(self) -> &'static str {
        match self {
            Hook::Gained => "focus_gained",
            Hook::Lost => "traverse_out",
        }
    }
}

#[derive(Default)]
struct Props {
    layout: Layout,
    locked_width: Option<i32>,
    locked_height: Option<i32>,
    bounds: Option<Rect>,
    owner: Option<Weak<FormShared>>,
    measured: Option<Measure>,
    /// Focus hooks raised while the item was busy further up the stack.
    deferred: SmallVec<[Hook; 2]>,
}

impl Widget {
    pub fn new(item: impl Item + 'static) -> Self {
        Self::from_box(Box::new(item))
    }

    pub fn from_box(item: Box<dyn Item>) -> Self {
        Self {
            inner: Arc::new(WidgetInner {
                item: ReentrantMutex::new(RefCell::new(item)),
                props: Mutex::new(Props::default()),
            }),
        }
    }

    pub fn with_layout(self, layout: Layout) -> Self {
        self.set_layout(layout);
        self
    }

    pub fn ptr_eq(&self, other: &Widget) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn layout(&self) -> Layout {
        self.inner.props.lock().layout
    }

    pub fn set_layout(&self, layout: Layout) {
        let owner = {
            let mut p = self.inner.props.lock();
            if p.layout == layout {
                return;
            }
            p.layout = layout;
            p.owner.clone()
        };
        notify_owner(owner);
    }

    /// Same as [`Widget::set_layout`] for raw bits, rejecting unknown ones.
    pub fn set_layout_bits(&self, bits: u32) -> Result<(), FormError> {
        self.set_layout(Layout::parse(bits)?);
        Ok(())
    }

    /// Locks the width and/or height; `None` unlocks that axis.
    pub fn lock_size(&self, width: Option<i32>, height: Option<i32>) -> Result<(), FormError> {
        if let Some(v) = width.into_iter().chain(height).find(|v| *v < 0) {
            return Err(FormError::NegativeSize(v));
        }
        let owner = {
            let mut p = self.inner.props.lock();
            p.locked_width = width;
            p.locked_height = height;
            p.owner.clone()
        };
        notify_owner(owner);
        Ok(())
    }

    pub fn locked_size(&self) -> (Option<i32>, Option<i32>) {
        let p = self.inner.props.lock();
        (p.locked_width, p.locked_height)
    }

    /// Bounds from the last layout pass; `None` before the first pass since
    /// insertion and after removal.
    pub fn bounds(&self) -> Option<Rect> {
        self.inner.props.lock().bounds
    }

    pub fn is_owned(&self) -> bool {
        self.owner().is_some()
    }

    /// Marks the owning form's layout stale.
    pub fn invalidate(&self) {
        let owner = self.inner.props.lock().owner.clone();
        notify_owner(owner);
    }

    /// Runs `f` with exclusive access to the item.
    ///
    /// Returns `None` when called from inside one of this item's own
    /// callbacks. Call [`Widget::invalidate`] afterwards if the change
    /// affects sizes.
    pub fn with_item<R>(&self, f: impl FnOnce(&mut dyn Item) -> R) -> Option<R> {
        let result = {
            let cell = self.inner.item.lock();
            let mut item = cell.try_borrow_mut().ok()?;
            f(&mut **item)
        };
        self.run_deferred();
        Some(result)
    }

    pub fn debug_name(&self) -> String {
        let cell = self.inner.item.lock();
        match cell.try_borrow() {
            Ok(item) => item_name(&**item),
            Err(_) => "busy".to_string(),
        }
    }

    pub(crate) fn owner(&self) -> Option<Arc<FormShared>> {
        self.inner
            .props
            .lock()
            .owner
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn claim(&self, owner: Weak<FormShared>) -> Result<(), FormError> {
        let mut p = self.inner.props.lock();
        if p.owner.as_ref().is_some_and(|o| o.strong_count() > 0) {
            return Err(FormError::AlreadyOwned);
        }
        p.owner = Some(owner);
        p.bounds = None;
        Ok(())
    }

    pub(crate) fn release(&self) {
        let mut p = self.inner.props.lock();
        p.owner = None;
        p.bounds = None;
    }

    pub(crate) fn set_bounds(&self, bounds: Rect) {
        self.inner.props.lock().bounds = Some(bounds);
    }

    /// Queries every size the layout engine needs.
    ///
    /// A faulting item measures as zero-sized and skips traversal. Sizes are
    /// clamped to [`MAX_EXTENT`].
    pub(crate) fn measure(&self) -> Measure {
        let (layout, locked_width, locked_height) = {
            let p = self.inner.props.lock();
            (p.layout, p.locked_width, p.locked_height)
        };
        let fallback = Measure {
            layout,
            skip: true,
            ..Measure::default()
        };
        let measured = self.call("measure", fallback, |item| {
            let min_width = item.minimum_width().clamp(0, MAX_EXTENT);
            let min_height = item.minimum_height().clamp(0, MAX_EXTENT);
            let pref_width = locked_width
                .unwrap_or_else(|| item.preferred_width(locked_height))
                .clamp(min_width, MAX_EXTENT);
            let pref_height = locked_height
                .unwrap_or_else(|| item.preferred_height(locked_width))
                .clamp(min_height, MAX_EXTENT);
            Measure {
                layout,
                min_width,
                min_height,
                pref_width,
                pref_height,
                skip: item.skip_traversal(),
            }
        });

        let mut p = self.inner.props.lock();
        match measured {
            Some(m) => {
                p.measured = Some(m);
                m
            }
            None => {
                log::debug!("measured from inside its own callback, reusing the last sizes");
                p.measured.map_or(fallback, |m| Measure { layout, ..m })
            }
        }
    }

    pub(crate) fn traverse(&self, dir: Direction, vw: i32, vh: i32, rect: &mut Rect) -> bool {
        let mut out = *rect;
        let consumed = self
            .call("traverse", false, |item| item.traverse(dir, vw, vh, &mut out))
            .unwrap_or(false);
        if consumed {
            *rect = out;
        }
        consumed
    }

    pub(crate) fn focus_gained(&self) {
        self.hook(Hook::Gained);
    }

    pub(crate) fn traverse_out(&self) {
        self.hook(Hook::Lost);
    }

    fn hook(&self, hook: Hook) {
        self.inner.props.lock().deferred.push(hook);
        self.run_deferred();
    }

    /// Runs `f` on the item under fault isolation, then delivers any focus
    /// hooks queued meanwhile. `None` if the item is already in a callback
    /// on this thread.
    fn call<R>(&self, what: &str, fallback: R, f: impl FnOnce(&mut dyn Item) -> R) -> Option<R> {
        let result = {
            let cell = self.inner.item.lock();
            let mut item = cell.try_borrow_mut().ok()?;
            let name = item_name(&**item);
            isolate(what, &name, fallback, || f(&mut **item))
        };
        self.run_deferred();
        Some(result)
    }

    fn run_deferred(&self) {
        let cell = self.inner.item.lock();
        let Ok(mut item) = cell.try_borrow_mut() else {
            return;
        };
        loop {
            let hook = {
                let mut p = self.inner.props.lock();
                if p.deferred.is_empty() {
                    return;
                }
                p.deferred.remove(0)
            };
            let name = item_name(&**item);
            isolate(hook.name(), &name, (), || match hook {
                Hook::Gained => item.focus_gained(),
                Hook::Lost => item.traverse_out(),
            });
        }
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.inner.props.lock();
        f.debug_struct("Widget")
            .field("layout", &p.layout)
            .field("locked_width", &p.locked_width)
            .field("locked_height", &p.locked_height)
            .field("bounds", &p.bounds)
            .finish()
    }
}

fn item_name(item: &dyn Item) -> String {
    isolate("debug_name", "?", "?".to_string(), || item.debug_name().to_string())
}

fn notify_owner(owner: Option<Weak<FormShared>>) {
    if let Some(form) = owner.as_ref().and_then(Weak::upgrade) {
        form.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        min: (i32, i32),
        pref: (i32, i32),
    }

    impl Item for Fixed {
        fn minimum_width(&self) -> i32 {
            self.min.0
        }
        fn minimum_height(&self) -> i32 {
            self.min.1
        }
        fn preferred_width(&self, _h: Option<i32>) -> i32 {
            self.pref.0
        }
        fn preferred_height(&self, _w: Option<i32>) -> i32 {
            self.pref.1
        }
    }

    struct Faulty;

    impl Item for Faulty {
        fn minimum_width(&self) -> i32 {
            panic!("no width today")
        }
        fn minimum_height(&self) -> i32 {
            1
        }
        fn preferred_width(&self, _h: Option<i32>) -> i32 {
            1
        }
        fn preferred_height(&self, _w: Option<i32>) -> i32 {
            1
        }
        fn traverse(&mut self, _d: Direction, _w: i32, _h: i32, _r: &mut Rect) -> bool {
            panic!("lost")
        }
    }

    /// Reaches back into its own widget from `traverse`.
    struct Recursive {
        me: Arc<Mutex<Option<Widget>>>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Item for Recursive {
        fn minimum_width(&self) -> i32 {
            10
        }
        fn minimum_height(&self) -> i32 {
            10
        }
        fn preferred_width(&self, _h: Option<i32>) -> i32 {
            20
        }
        fn preferred_height(&self, _w: Option<i32>) -> i32 {
            20
        }
        fn traverse(&mut self, dir: Direction, vw: i32, vh: i32, _rect: &mut Rect) -> bool {
            let Some(me) = self.me.lock().take() else {
                return false;
            };
            self.log.lock().push("traverse");
            me.traverse_out();
            if me.measure().pref_width == 20 {
                self.log.lock().push("last sizes");
            }
            if !me.traverse(dir, vw, vh, &mut Rect::default()) {
                self.log.lock().push("nested yields");
            }
            if me.with_item(|_| ()).is_none() && me.debug_name() == "busy" {
                self.log.lock().push("busy");
            }
            true
        }
        fn traverse_out(&mut self) {
            self.log.lock().push("out");
        }
    }

    #[test]
    fn test_measure_uses_locks_and_minimums() {
        let w = Widget::new(Fixed {
            min: (10, 5),
            pref: (40, 20),
        });
        let m = w.measure();
        assert_eq!((m.min_width, m.pref_width, m.pref_height), (10, 40, 20));

        w.lock_size(Some(60), None).unwrap();
        assert_eq!(w.measure().pref_width, 60);

        // A lock below the minimum is raised to it.
        w.lock_size(Some(3), Some(2)).unwrap();
        let m = w.measure();
        assert_eq!((m.pref_width, m.pref_height), (10, 5));
    }

    #[test]
    fn test_reentry_defers_hooks_until_callback_returns() {
        let me = Arc::new(Mutex::new(None));
        let log = Arc::new(Mutex::new(Vec::new()));
        let w = Widget::new(Recursive {
            me: me.clone(),
            log: log.clone(),
        });
        assert_eq!(w.measure().pref_width, 20);
        *me.lock() = Some(w.clone());

        let mut rect = Rect::default();
        assert!(w.traverse(Direction::Down, 100, 100, &mut rect));
        assert_eq!(*log.lock(), ["traverse", "last sizes", "nested yields", "busy", "out"]);

        // Hooks run straight away when nothing is in flight.
        w.traverse_out();
        assert_eq!(log.lock().last(), Some(&"out"));
        assert_eq!(log.lock().len(), 6);
        assert_eq!(w.with_item(|item| item.preferred_height(None)), Some(20));
    }

    #[test]
    fn test_measure_is_clamped() {
        let w = Widget::new(Fixed {
            min: (-5, i32::MAX),
            pref: (i32::MAX, 1),
        });
        let m = w.measure();
        assert_eq!((m.min_width, m.pref_width), (0, MAX_EXTENT));
        assert_eq!((m.min_height, m.pref_height), (MAX_EXTENT, MAX_EXTENT));
    }

    #[test]
    fn test_negative_lock_is_rejected_and_state_kept() {
        let w = Widget::new(Fixed {
            min: (0, 0),
            pref: (1, 1),
        });
        w.lock_size(Some(5), None).unwrap();
        assert_eq!(w.lock_size(Some(7), Some(-2)), Err(FormError::NegativeSize(-2)));
        assert_eq!(w.locked_size(), (Some(5), None));
    }

    #[test]
    fn test_faulty_item_measures_as_zero_and_skips() {
        let w = Widget::new(Faulty);
        let m = w.measure();
        assert_eq!((m.min_width, m.pref_width, m.pref_height), (0, 0, 0));
        assert!(m.skip);

        let mut rect = Rect::new(1, 2, 3, 4);
        assert!(!w.traverse(Direction::Down, 10, 10, &mut rect));
        assert_eq!(rect, Rect::new(1, 2, 3, 4));
    }

    #[test]
    fn test_set_layout_bits_validates() {
        let w = Widget::new(Fixed {
            min: (0, 0),
            pref: (1, 1),
        });
        assert!(w.set_layout_bits(0x0800).is_ok());
        assert_eq!(w.layout(), Layout::EXPAND);
        assert_eq!(w.set_layout_bits(0x10000), Err(FormError::InvalidLayout(0x10000)));
        assert_eq!(w.layout(), Layout::EXPAND);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Widget::new(Fixed {
            min: (0, 0),
            pref: (1, 1),
        });
        let b = a.clone();
        b.set_layout(Layout::SHRINK);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.layout(), Layout::SHRINK);
        assert!(a.bounds().is_none());
        assert!(!a.is_owned());
    }
}
