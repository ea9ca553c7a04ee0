//! # Forms
//!
//! A form is a vertically scrollable container of widgets packed into rows
//! on a fixed-width viewport. Focus moves between widgets with four
//! directional signals, and a widget can take those signals itself to move
//! around inside its own content.
//!
//! - [`Widget`]: shared handle around a user [`Item`](formflow_core::Item).
//! - [`layout()`]: the row packing pass, a pure function.
//! - [`ScrollState`]: clamped offset and the keep-visible policy.
//! - [`traverse`]: focus search between widgets.
//! - [`Form`]: the container tying it together.
//!
//! ```rust
//! use formflow_core::*;
//! use formflow_ui::*;
//!
//! struct Label(i32);
//!
//! impl Item for Label {
//!     fn minimum_width(&self) -> i32 { self.0 }
//!     fn minimum_height(&self) -> i32 { 10 }
//!     fn preferred_width(&self, _h: Option<i32>) -> i32 { self.0 }
//!     fn preferred_height(&self, _w: Option<i32>) -> i32 { 10 }
//! }
//!
//! let form = Form::default();
//! form.viewport_size(100, 40);
//! for w in [40, 30, 50] {
//!     form.append(Widget::new(Label(w))).unwrap();
//! }
//!
//! assert!(form.show());
//! assert_eq!(form.rows().len(), 2);
//! assert!(form.handle_directional_signal(Direction::Down));
//! assert_eq!(form.focus_index(), Some(2));
//! ```

pub mod form;
pub mod guard;
pub mod layout;
pub mod scroll;
pub mod traverse;
pub mod widget;

pub use form::Form;
pub use layout::{LayoutResult, Measure, Row, layout};
pub use scroll::ScrollState;
pub use traverse::TraverseMode;
pub use widget::Widget;
