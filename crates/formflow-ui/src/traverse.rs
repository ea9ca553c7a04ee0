use formflow_core::*;

use crate::layout::LayoutResult;

/// Who consumes directional input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraverseMode {
    /// Signals move focus between widgets.
    #[default]
    Container,
    /// Signals go to the focused widget's own traversal first.
    Widget,
}

/// First focusable widget scanning forward from `start`, then backward.
pub fn first_focusable(skip: &[bool], start: usize) -> Option<usize> {
    let start = start.min(skip.len());
    (start..skip.len())
        .chain((0..start).rev())
        .find(|&i| !skip[i])
}

/// Next focusable widget in index order for Left/Right.
pub fn find_horizontal(skip: &[bool], from: usize, dir: Direction) -> Option<usize> {
    match dir {
        Direction::Right => (from + 1..skip.len()).find(|&i| !skip[i]),
        Direction::Left => (0..from.min(skip.len())).rev().find(|&i| !skip[i]),
        Direction::Up | Direction::Down => None,
    }
}

/// Nearest widget above or below `from`.
///
/// Conceptually a band as wide as the focused widget grows away from it by
/// `step` at a time; the first widget on another row that the band touches
/// wins, ties going to the widget met first in scan order (lowest index
/// going down, highest going up). Widgets that skip traversal are passed
/// over. The band stops at the content edge, so `None` means there is
/// nothing in that direction.
pub fn find_vertical(
    layout: &LayoutResult,
    skip: &[bool],
    from: usize,
    dir: Direction,
    step: i32,
) -> Option<usize> {
    let row = layout.rows.get(layout.row_of(from)?)?;
    let focus = layout.bounds[from];
    let band = Rect {
        w: focus.w.max(1),
        ..focus
    };
    let step = step.max(1);

    let candidates = match dir {
        Direction::Down => row.end..layout.bounds.len(),
        Direction::Up => 0..row.start,
        Direction::Left | Direction::Right => return None,
    };

    let mut best: Option<(i32, usize)> = None;
    for i in candidates {
        let b = layout.bounds[i];
        if skip.get(i).copied().unwrap_or(true) || b.is_empty() || !b.overlaps_horizontally(&band) {
            continue;
        }
        // Band depth needed before it shares area with `b`.
        let depth = match dir {
            Direction::Down => b.y.saturating_sub(focus.bottom()),
            _ => focus.y.saturating_sub(b.bottom()),
        }
        .max(0)
        .saturating_add(1);
        let steps = depth.saturating_add(step - 1) / step;
        let better = match best {
            None => true,
            Some((s, _)) if dir == Direction::Down => steps < s,
            Some((s, _)) => steps <= s,
        };
        if better {
            best = Some((steps, i));
        }
    }
    log::trace!("vertical search {dir:?} from {from}: {best:?}");
    best.map(|(_, i)| i)
}
