//! Sibling reordering.
//!
//! Sort positions are display-only (scheduling never looks at them) but
//! they are kept dense (0..N-1) so the UI can treat them as list indexes.

/// Reassign dense positions with `target` moved to `new_position`.
///
/// `ordered` is the sibling ids in current display order and must contain
/// `target`. The position is clamped to the list bounds. Returns
/// `(id, position)` pairs for every sibling; calling this with the target
/// already in place returns the positions unchanged.
pub fn plan_positions(ordered: &[i64], target: i64, new_position: i64) -> Vec<(i64, i64)> {
    let mut siblings: Vec<i64> = ordered.to_vec();
    if siblings.is_empty() {
        return Vec::new();
    }
    let clamped = new_position.clamp(0, siblings.len() as i64 - 1) as usize;
    if let Some(current) = siblings.iter().position(|&id| id == target) {
        let moved = siblings.remove(current);
        siblings.insert(clamped, moved);
    }
    siblings
        .into_iter()
        .enumerate()
        .map(|(position, id)| (id, position as i64))
        .collect()
}
