use std::fmt::Write;

use web_time::Instant;

use formflow_core::{Direction, Rect};
use formflow_ui::{Form, TraverseMode};

pub struct Hud {
    pub inspector_enabled: bool,
    last_signal: Option<(Direction, bool)>,
    pub metrics: Metrics,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            last_signal: None,
            metrics: Metrics::default(),
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
    }

    pub fn record(&mut self, dir: Direction, consumed: bool, elapsed_ms: f32) {
        self.metrics.signals += 1;
        if consumed {
            self.metrics.consumed += 1;
        }
        self.metrics.signal_ms = elapsed_ms;
        self.last_signal = Some((dir, consumed));
    }

    pub fn status_line(&self) -> String {
        let mut lines = vec![
            format!("signals: {}", self.metrics.signals),
            format!("consumed: {}", self.metrics.consumed),
        ];
        if let Some((dir, consumed)) = self.last_signal {
            let verdict = if consumed { "taken" } else { "ignored" };
            lines.push(format!("last: {dir:?} {verdict}"));
            lines.push(format!("{:.2} ms", self.metrics.signal_ms));
        }
        lines.join("  |  ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub signals: u64,
    pub consumed: u64,
    /// Time spent in the last signal, layout included.
    pub signal_ms: f32,
}

pub struct Inspector {
    pub hud: Hud,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self { hud: Hud::new() }
    }

    /// Delivers `dir` to the form and records it in the HUD.
    pub fn signal(&mut self, form: &Form, dir: Direction) -> bool {
        let start = Instant::now();
        let consumed = form.handle_directional_signal(dir);
        let ms = start.elapsed().as_secs_f32() * 1000.0;
        if !consumed {
            log::debug!("{dir:?} was not consumed");
        }
        self.hud.record(dir, consumed, ms);
        consumed
    }

    pub fn frame(&self, form: &Form) -> Option<String> {
        if !self.hud.inspector_enabled {
            return None;
        }
        Some(format!("{}\n{}", self.hud.status_line(), dump(form)))
    }
}

/// Text picture of a form: one header line, then every row with its
/// widgets. The focused widget is marked with `>`; widgets entirely
/// outside the viewport are flagged `hidden`.
pub fn dump(form: &Form) -> String {
    let viewport = form.viewport();
    let view = form.view_height();
    let offset = form.scroll_offset();
    let focus = form.focus_index();
    let mode = match form.mode() {
        TraverseMode::Container => "Container",
        TraverseMode::Widget => "Widget",
    };
    let visible = Rect::new(0, offset, viewport.width, viewport.height);

    let mut out = format!(
        "form {}x{} view {view} scroll {offset}/{} {mode}",
        viewport.width,
        viewport.height,
        (view - viewport.height).max(0),
    );
    if let Some(f) = focus {
        let _ = write!(out, " focus {f}");
    }
    if let Some(r) = form.traverse_rect() {
        let _ = write!(out, "\nregion {},{} {}x{}", r.x, r.y, r.w, r.h);
    }

    for (n, row) in form.rows().iter().enumerate() {
        let _ = write!(out, "\nrow {n} @{} h{}", row.y, row.height);
        for i in row.indices() {
            let Some(widget) = form.get(i) else {
                continue;
            };
            let marker = if focus == Some(i) { '>' } else { ' ' };
            let _ = write!(out, "\n{marker} {i} {}", widget.debug_name());
            if let Some(b) = widget.bounds() {
                let _ = write!(out, " {},{} {}x{}", b.x, b.y, b.w, b.h);
                if !b.is_empty() && !b.intersects(&visible) {
                    out.push_str(" hidden");
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use formflow_core::*;
    use formflow_ui::Widget;

    use super::*;

    struct Named(&'static str, i32, i32);

    impl Item for Named {
        fn minimum_width(&self) -> i32 {
            self.1
        }
        fn minimum_height(&self) -> i32 {
            self.2
        }
        fn preferred_width(&self, _h: Option<i32>) -> i32 {
            self.1
        }
        fn preferred_height(&self, _w: Option<i32>) -> i32 {
            self.2
        }
        fn debug_name(&self) -> &str {
            self.0
        }
    }

    fn sample() -> Form {
        let form = Form::default();
        form.viewport_size(100, 30);
        for (name, w, h) in [("a", 40, 10), ("b", 30, 10), ("c", 100, 20), ("d", 100, 20)] {
            form.append(Widget::new(Named(name, w, h))).unwrap();
        }
        form
    }

    #[test]
    fn test_dump_after_scrolling() {
        let form = sample();
        let mut inspector = Inspector::new();
        form.show();
        assert!(inspector.signal(&form, Direction::Down));
        assert!(inspector.signal(&form, Direction::Down));

        insta::assert_snapshot!(dump(&form), @r"
        form 100x30 view 50 scroll 16/20 Container focus 3
        row 0 @0 h10
          0 a 0,0 40x10 hidden
          1 b 40,0 30x10 hidden
        row 1 @10 h20
          2 c 0,10 100x20
        row 2 @30 h20
        > 3 d 0,30 100x20
        ");
    }

    #[test]
    fn test_hud_counts_signals() {
        let form = sample();
        let mut inspector = Inspector::new();
        form.show();

        assert!(!inspector.signal(&form, Direction::Left));
        assert!(inspector.signal(&form, Direction::Right));
        assert_eq!(inspector.hud.metrics.signals, 2);
        assert_eq!(inspector.hud.metrics.consumed, 1);
        assert!(inspector.hud.status_line().contains("last: Right taken"));
    }

    #[test]
    fn test_frame_only_when_enabled() {
        let form = sample();
        let mut inspector = Inspector::new();
        assert!(inspector.frame(&form).is_none());

        inspector.hud.toggle_inspector();
        let frame = inspector.frame(&form).unwrap();
        assert!(frame.starts_with("signals: 0  |  consumed: 0\nform 100x30"));
    }
}
