//! # Formflow core types
//!
//! Everything here is plain data shared by the layout engine and the focus
//! navigator in `formflow-ui`:
//!
//! - [`Rect`]: integer bounds in container-local coordinates.
//! - [`Layout`]: the directive bitmask (alignment, newlines, shrink and
//!   expand), with [`HAlign`]/[`VAlign`] decoders.
//! - [`Direction`]: the four directional signals.
//! - [`Item`]: the capability trait a widget implements.
//! - [`FormConfig`] and [`FormError`].
//!
//! ```rust
//! use formflow_core::*;
//!
//! let layout = Layout::parse(0x0803).unwrap();
//! assert_eq!(layout.horizontal(), HAlign::Center);
//! assert!(layout.contains(Layout::EXPAND));
//! assert!(Layout::parse(0x8000).is_err());
//! ```

pub mod config;
pub mod directive;
pub mod error;
pub mod geometry;
pub mod item;

pub use config::*;
pub use directive::*;
pub use error::*;
pub use geometry::*;
pub use item::*;
