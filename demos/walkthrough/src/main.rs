use formflow_core::*;
use formflow_devtools::Inspector;
use formflow_ui::{Form, Widget};

/// Fixed-size element; labels skip traversal.
struct Field {
    name: &'static str,
    min: (i32, i32),
    pref: (i32, i32),
    label: bool,
}

impl Field {
    fn new(name: &'static str, w: i32, h: i32) -> Self {
        Self {
            name,
            min: (w, h),
            pref: (w, h),
            label: false,
        }
    }

    fn shrinkable(mut self, min_width: i32) -> Self {
        self.min.0 = min_width;
        self
    }

    fn label(mut self) -> Self {
        self.label = true;
        self
    }
}

impl Item for Field {
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
    fn skip_traversal(&self) -> bool {
        self.label
    }
    fn focus_gained(&mut self) {
        log::info!("{} gained focus", self.name);
    }
    fn traverse_out(&mut self) {
        log::info!("{} lost focus", self.name);
    }
    fn debug_name(&self) -> &str {
        self.name
    }
}

/// Horizontal choice group: Left/Right move between options.
struct Choice {
    options: i32,
    selected: Option<i32>,
}

impl Item for Choice {
    fn minimum_width(&self) -> i32 {
        self.options * 40
    }
    fn minimum_height(&self) -> i32 {
        20
    }
    fn preferred_width(&self, _h: Option<i32>) -> i32 {
        self.options * 40
    }
    fn preferred_height(&self, _w: Option<i32>) -> i32 {
        20
    }
    fn traverse(&mut self, dir: Direction, _vw: i32, _vh: i32, rect: &mut Rect) -> bool {
        self.selected = match (self.selected, dir) {
            (None, Direction::Down | Direction::Right) => Some(0),
            (None, _) => Some(self.options - 1),
            (Some(i), Direction::Right) if i + 1 < self.options => Some(i + 1),
            (Some(i), Direction::Left) if i > 0 => Some(i - 1),
            _ => None,
        };
        let Some(i) = self.selected else {
            return false;
        };
        *rect = Rect::new(i * 40, 0, 40, 20);
        true
    }
    fn traverse_out(&mut self) {
        self.selected = None;
    }
    fn debug_name(&self) -> &str {
        "choice"
    }
}

fn build() -> Result<Form, FormError> {
    let form = Form::new(FormConfig::new().margin(4).item_spacing(2));
    form.viewport_size(160, 60);

    let title = Field::new("title", 80, 12).label();
    form.append(Widget::new(title).with_layout(Layout::CENTER | Layout::NEWLINE_AFTER))?;
    form.append(Widget::new(Field::new("name-label", 40, 16).label()))?;
    form.append(Widget::new(Field::new("name", 60, 16)).with_layout(Layout::EXPAND))?;

    let choice = Choice {
        options: 3,
        selected: None,
    };
    form.append(Widget::new(choice).with_layout(Layout::NEWLINE_BEFORE))?;
    form.append(Widget::new(Field::new("notes", 152, 90)))?;

    let ok = Field::new("ok", 50, 16).shrinkable(30);
    form.append(Widget::new(ok).with_layout(Layout::RIGHT | Layout::SHRINK))?;
    let cancel = Field::new("cancel", 70, 16).shrinkable(30);
    form.append(Widget::new(cancel).with_layout(Layout::SHRINK))?;
    Ok(form)
}

fn parse(c: char) -> Option<Direction> {
    match c {
        'u' | 'U' => Some(Direction::Up),
        'd' | 'D' => Some(Direction::Down),
        'l' | 'L' => Some(Direction::Left),
        'r' | 'R' => Some(Direction::Right),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let script = std::env::args().nth(1).unwrap_or_else(|| "drrrddddddrlu".to_string());
    let form = build()?;
    let mut inspector = Inspector::new();
    inspector.hud.toggle_inspector();

    form.show();
    println!("{}\n", formflow_devtools::dump(&form));

    for c in script.chars() {
        let Some(dir) = parse(c) else {
            log::warn!("skipping unknown signal '{c}'");
            continue;
        };
        inspector.signal(&form, dir);
        if let Some(frame) = inspector.frame(&form) {
            println!("{frame}\n");
        }
    }
    Ok(())
}
