//! Directional caret navigation primitives.

use vellum_draw::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Moved within the queried view; the new caret offset.
    Valid(usize),
    /// The move is illegal (document edge, stale layout, offset outside any
    /// content). Not an error; callers simply leave the caret in place.
    Invalid,
    /// The queried view's edge was hit; the caller retries with a sibling or
    /// ancestor using the reported target offset.
    BoundaryChanged(usize),
}

/// Vertical navigation built generically from horizontal stepping plus
/// offset→rectangle mapping.
///
/// Records the current line's Y band, steps horizontally (`Up` ⇒ `Left`,
/// `Down` ⇒ `Right`) until the band changes, then runs a greedy
/// nearest-column search inside the new line: keep stepping while the
/// X distance to the original column shrinks, stop as soon as it grows.
/// The greedy stop assumes X positions are locally monotonic within a line;
/// that heuristic is part of the navigation contract and is kept as-is.
pub fn navigate_vertical_flat(
    offset: usize,
    direction: Direction,
    model_to_view: impl Fn(usize) -> Option<Rect>,
    navigate_horizontal: impl Fn(usize, Direction) -> NavOutcome,
) -> NavOutcome {
    let horizontal = match direction {
        Direction::Up => Direction::Left,
        Direction::Down => Direction::Right,
        _ => return NavOutcome::Invalid,
    };
    let Some(origin) = model_to_view(offset) else {
        return NavOutcome::Invalid;
    };
    let goal_x = origin.x;
    let band = (origin.y, origin.height.max(f32::MIN_POSITIVE));

    // Walk to the first offset whose rectangle leaves the current band.
    let mut cur = offset;
    let new_band;
    loop {
        match navigate_horizontal(cur, horizontal) {
            NavOutcome::Valid(t) => {
                cur = t;
                let Some(r) = model_to_view(cur) else {
                    return NavOutcome::Invalid;
                };
                if !in_band(&r, band) {
                    new_band = (r.y, r.height.max(f32::MIN_POSITIVE));
                    break;
                }
            }
            NavOutcome::Invalid => return NavOutcome::Invalid,
            NavOutcome::BoundaryChanged(t) => return NavOutcome::BoundaryChanged(t),
        }
    }

    // Greedy nearest-column search within the new line.
    let Some(first) = model_to_view(cur) else {
        return NavOutcome::Invalid;
    };
    let mut best = cur;
    let mut best_dist = (first.x - goal_x).abs();
    loop {
        match navigate_horizontal(cur, horizontal) {
            NavOutcome::Valid(t) => {
                let Some(r) = model_to_view(t) else { break };
                if !in_band(&r, new_band) {
                    break;
                }
                let dist = (r.x - goal_x).abs();
                if dist < best_dist {
                    best = t;
                    best_dist = dist;
                    cur = t;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    NavOutcome::Valid(best)
}

fn in_band(rect: &Rect, band: (f32, f32)) -> bool {
    let center = rect.y + rect.height * 0.5;
    center >= band.0 && center < band.0 + band.1
}
