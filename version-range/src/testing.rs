// SPDX-License-Identifier: MPL-2.0

//! Proptest support: generate arbitrary [`Ranges`] values that already
//! satisfy the canonical-form invariants, so property tests exercise the set
//! operations rather than tripping over malformed inputs.

use std::collections::Bound::{Excluded, Included, Unbounded};

use proptest::prelude::*;

use crate::{Ranges, SmallVec};

/// A strategy producing version sets with 0 to ~5 segments, mixing inclusive,
/// exclusive and unbounded endpoints on both ends.
pub fn proptest_strategy() -> impl Strategy<Value = Ranges<u32>> {
    (
        any::<bool>(),
        prop::collection::vec(any::<(u32, bool)>(), 1..10),
    )
        .prop_map(|(unbounded_below, steps)| from_steps(unbounded_below, steps))
}

/// Walk a list of `(offset, inclusive)` steps left to right, alternately
/// turning each accepted bound into a segment start and the matching end.
/// Offsets accumulate, so bounds never move backwards.
///
/// A zero offset lands two bounds on the same value and needs the same care
/// the merge operations apply:
///
/// * within one segment, a shared value is only a valid segment when both
///   bounds are inclusive (the singleton `[p, p]`);
/// * between two segments, the gap at a shared value only exists when both
///   touching bounds are exclusive; any other combination would have to be
///   merged into one segment to stay canonical.
///
/// Steps that would break either rule are dropped rather than repaired, and
/// the result goes through the same `check_invariants` that `union` and
/// `intersection` answer to.
fn from_steps(unbounded_below: bool, steps: Vec<(u32, bool)>) -> Ranges<u32> {
    let mut segments = SmallVec::new();
    let mut pending_start = if unbounded_below {
        Some(Unbounded)
    } else {
        None
    };
    let mut position: u32 = 0;
    let mut previous_end_inclusive = false;
    for (offset, inclusive) in steps {
        position = match position.checked_add(offset) {
            Some(position) => position,
            // Saturating here would pile several bounds onto u32::MAX, so
            // overflowing steps are dropped instead.
            None => continue,
        };
        let bound = if inclusive {
            Included(position)
        } else {
            Excluded(position)
        };
        match pending_start.take() {
            // This bound closes the open segment.
            Some(start) => {
                if offset == 0 && !(matches!(start, Included(_)) && inclusive) {
                    // Zero-width and not `[p, p]`: no version fits between
                    // the bounds, keep waiting for a farther end.
                    pending_start = Some(start);
                    continue;
                }
                previous_end_inclusive = inclusive;
                segments.push((start, bound));
            }
            // This bound opens the next segment.
            None => {
                if offset == 0 && (previous_end_inclusive || inclusive) {
                    // Touching the previous end without a gap at `position`.
                    continue;
                }
                pending_start = Some(bound);
            }
        }
    }
    // A start with no end left to pair with extends to infinity.
    if let Some(start) = pending_start {
        segments.push((start, Unbounded));
    }
    Ranges { segments }.check_invariants()
}
