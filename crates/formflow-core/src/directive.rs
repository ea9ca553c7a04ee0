use crate::FormError;

bitflags::bitflags! {
    /// Per-widget layout directives.
    ///
    /// The horizontal and vertical alignment fields are two-bit values, so
    /// `CENTER == LEFT | RIGHT` and `VCENTER == TOP | BOTTOM`. Use
    /// [`Layout::horizontal`] and [`Layout::vertical`] to decode them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Layout: u32 {
        const LEFT = 0x0001;
        const RIGHT = 0x0002;
        const CENTER = 0x0003;
        const TOP = 0x0010;
        const BOTTOM = 0x0020;
        const VCENTER = 0x0030;
        const NEWLINE_BEFORE = 0x0100;
        const NEWLINE_AFTER = 0x0200;
        const SHRINK = 0x0400;
        const EXPAND = 0x0800;
        const VSHRINK = 0x1000;
        const VEXPAND = 0x2000;
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    /// No explicit alignment; the row keeps whatever band it already has.
    #[default]
    Default,
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl Layout {
    /// Validates raw directive bits coming from outside the crate.
    pub fn parse(bits: u32) -> Result<Layout, FormError> {
        Layout::from_bits(bits).ok_or(FormError::InvalidLayout(bits))
    }

    pub fn horizontal(self) -> HAlign {
        match self.bits() & Layout::CENTER.bits() {
            0x1 => HAlign::Left,
            0x2 => HAlign::Right,
            0x3 => HAlign::Center,
            _ => HAlign::Default,
        }
    }

    pub fn vertical(self) -> VAlign {
        match self.bits() & Layout::VCENTER.bits() {
            0x20 => VAlign::Bottom,
            0x30 => VAlign::Center,
            _ => VAlign::Top,
        }
    }

    pub fn newline_before(self) -> bool {
        self.contains(Layout::NEWLINE_BEFORE)
    }

    pub fn newline_after(self) -> bool {
        self.contains(Layout::NEWLINE_AFTER)
    }
}

/// One of the four directional signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Down and Right travel towards the end of the content.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Down | Direction::Right)
    }

    /// Direction handed to a widget that focus just arrived at.
    ///
    /// Vertical container moves enter as Left/Right and horizontal moves as
    /// Up/Down, so arriving from below always means "start at the end".
    pub fn entry(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Up,
            Direction::Right => Direction::Down,
        }
    }
}
