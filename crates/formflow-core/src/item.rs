use crate::{Direction, Rect};

/// The capability contract every arrangeable element implements.
///
/// Sizes are in the same integer units as the viewport. Implementations
/// are called without any form lock held, so they may freely call back
/// into the form, including deleting, replacing or refocusing their own
/// widget. Focus hooks that such a change raises for the same item are
/// delivered after the running callback returns.
pub trait Item: Send {
    fn minimum_width(&self) -> i32;

    fn minimum_height(&self) -> i32;

    /// Preferred width given the locked height, if any.
    fn preferred_width(&self, tentative_height: Option<i32>) -> i32;

    /// Preferred height given the locked width, if any.
    fn preferred_height(&self, tentative_width: Option<i32>) -> i32;

    /// Non-interactive widgets without a visible label opt out of focus.
    fn skip_traversal(&self) -> bool {
        false
    }

    /// Moves focus inside the widget's own sub-structure.
    ///
    /// `rect` comes in as the visible part of the viewport in the widget's
    /// coordinates; on `true` it holds the region (same coordinates) that
    /// should be scrolled into view. Returning `false` yields focus back to
    /// the container.
    fn traverse(
        &mut self,
        _dir: Direction,
        _viewport_width: i32,
        _viewport_height: i32,
        _rect: &mut Rect,
    ) -> bool {
        false
    }

    fn focus_gained(&mut self) {}

    /// Called when focus leaves the widget.
    fn traverse_out(&mut self) {}

    /// Name used in logs and inspector output.
    fn debug_name(&self) -> &str {
        "Item"
    }
}
