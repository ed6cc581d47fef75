//! Participant ordering
//!
//! Final left-to-right order of participants: grouped participants are made
//! contiguous first, then explicit `position` overrides are applied on top.

use tracing::trace;

use super::database::SequenceDatabase;

/// Compute the final participant order as indices into `db.participants()`
///
/// # Example
/// ```
/// use tideline::core::Parser;
/// use tideline::plugins::sequence::{order_participants, SequenceDatabase, SequenceParser};
///
/// let mut db = SequenceDatabase::new();
/// SequenceParser::new().parse("A position -1\nA -> B: x\nB -> C: y", &mut db).unwrap();
/// let ids: Vec<_> = order_participants(&db)
///     .into_iter()
///     .map(|i| db.participants()[i].id.as_str())
///     .collect();
/// assert_eq!(ids, vec!["B", "C", "A"]);
/// ```
pub fn order_participants(db: &SequenceDatabase) -> Vec<usize> {
    let grouped = group_adjacent(db);
    let positions: Vec<Option<i64>> = grouped
        .iter()
        .map(|&index| db.participants()[index].position)
        .collect();
    apply_positions(&grouped, &positions)
}

/// Group members in group declaration order, then ungrouped participants
fn group_adjacent(db: &SequenceDatabase) -> Vec<usize> {
    let participants = db.participants();
    let mut order = Vec::with_capacity(participants.len());
    let mut placed = vec![false; participants.len()];

    for group in db.groups() {
        for id in &group.participant_ids {
            let Some(index) = participants.iter().position(|p| &p.id == id) else {
                continue;
            };
            if !placed[index] {
                placed[index] = true;
                order.push(index);
            }
        }
    }

    for (index, was_placed) in placed.iter().enumerate() {
        if !was_placed {
            order.push(index);
        }
    }
    order
}

/// Reorder `items` honouring per-item slot overrides
///
/// Negative slots count from the end and out-of-range slots are clamped.
/// Positioned items are placed in target order; a taken slot is resolved by
/// scanning outward (+1, -1, +2, -2, ...) for the nearest free one.
/// Unpositioned items fill the remaining slots in their original order.
pub fn apply_positions<T: Copy>(items: &[T], positions: &[Option<i64>]) -> Vec<T> {
    let len = items.len();
    if len == 0 {
        return Vec::new();
    }

    let last = len as i64 - 1;
    let mut targets: Vec<(usize, usize)> = positions
        .iter()
        .enumerate()
        .filter_map(|(item, position)| {
            let position = (*position)?;
            let resolved = if position < 0 { len as i64 + position } else { position };
            Some((resolved.clamp(0, last) as usize, item))
        })
        .collect();
    targets.sort();

    let mut slots: Vec<Option<T>> = vec![None; len];
    let mut positioned = vec![false; len];
    for (target, item) in targets {
        let Some(slot) = nearest_free(&slots, target) else {
            continue;
        };
        trace!(item, target, slot, "Positioned participant");
        slots[slot] = Some(items[item]);
        positioned[item] = true;
    }

    let mut rest = items
        .iter()
        .zip(&positioned)
        .filter(|(_, placed)| !**placed)
        .map(|(item, _)| *item);
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect()
}

fn nearest_free<T>(slots: &[Option<T>], target: usize) -> Option<usize> {
    if slots[target].is_none() {
        return Some(target);
    }
    (1..slots.len()).find_map(|offset| {
        let right = target + offset;
        if right < slots.len() && slots[right].is_none() {
            return Some(right);
        }
        let left = target.checked_sub(offset)?;
        slots[left].is_none().then_some(left)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_positions_keeps_order() {
        assert_eq!(apply_positions(&['a', 'b', 'c'], &[None, None, None]), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_negative_position_is_last() {
        assert_eq!(
            apply_positions(&['a', 'b', 'c'], &[Some(-1), None, None]),
            vec!['b', 'c', 'a']
        );
    }

    #[test]
    fn test_explicit_slot() {
        assert_eq!(
            apply_positions(&['a', 'b', 'c', 'd'], &[None, None, None, Some(0)]),
            vec!['d', 'a', 'b', 'c']
        );
    }

    #[test]
    fn test_collision_scans_outward() {
        assert_eq!(
            apply_positions(&['a', 'b', 'c', 'd'], &[Some(1), Some(1), Some(1), None]),
            vec!['c', 'a', 'b', 'd']
        );
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(
            apply_positions(&['a', 'b', 'c'], &[Some(99), None, Some(-99)]),
            vec!['c', 'b', 'a']
        );
    }

    #[test]
    fn test_collision_at_end_scans_left() {
        assert_eq!(
            apply_positions(&['a', 'b', 'c'], &[Some(-1), Some(-1), None]),
            vec!['c', 'b', 'a']
        );
    }
}
