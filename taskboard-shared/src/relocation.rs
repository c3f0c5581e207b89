//! Ordered-sequence relocation
//!
//! Pure functions that move a task id between two ordered id sequences. Both
//! store adapters run these under their own atomicity primitive (a write lock
//! or a database transaction), so the arrangement rules live in one place.
//!
//! # Index semantics
//!
//! - The requested index is clamped to `[0, len]` of the destination sequence:
//!   negative indices prepend, indices past the end append.
//! - For a same-list move the task is removed first and the index is applied
//!   to the shortened sequence.
//!
//! # Example
//!
//! ```
//! use taskboard_shared::relocation::relocate;
//! use uuid::Uuid;
//!
//! let (t1, t2, t3, t4) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
//! let mut a = vec![t1, t2, t3];
//! let mut b = vec![t4];
//!
//! let position = relocate(&mut a, Some(&mut b), t2, 0);
//!
//! assert_eq!(position, 0);
//! assert_eq!(a, vec![t1, t3]);
//! assert_eq!(b, vec![t2, t4]);
//! ```

use uuid::Uuid;

/// Clamps a caller-supplied index to a valid insertion point
///
/// Valid insertion points for a sequence of length `len` are `0..=len`.
pub fn clamp_index(index: i64, len: usize) -> usize {
    if index <= 0 {
        return 0;
    }

    usize::try_from(index).map_or(len, |index| index.min(len))
}

/// Moves `task_id` out of `source` and into `dest` at `index`
///
/// Pass `None` for `dest` when source and destination are the same list.
/// Every occurrence of `task_id` is removed from both sequences before the
/// insert, so the id ends up exactly once in the destination.
///
/// Returns the position the task was inserted at.
pub fn relocate(
    source: &mut Vec<Uuid>,
    dest: Option<&mut Vec<Uuid>>,
    task_id: Uuid,
    index: i64,
) -> usize {
    source.retain(|id| *id != task_id);

    let target = match dest {
        Some(dest) => {
            dest.retain(|id| *id != task_id);
            dest
        }
        None => source,
    };

    let position = clamp_index(index, target.len());
    target.insert(position, task_id);
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-5, 3), 0);
        assert_eq!(clamp_index(0, 3), 0);
        assert_eq!(clamp_index(2, 3), 2);
        assert_eq!(clamp_index(3, 3), 3);
        assert_eq!(clamp_index(999, 3), 3);
        assert_eq!(clamp_index(i64::MAX, 0), 0);
        assert_eq!(clamp_index(i64::MIN, 0), 0);
    }

    #[test]
    fn test_move_between_lists_at_front() {
        let t = ids(4);
        let mut a = vec![t[0], t[1], t[2]];
        let mut b = vec![t[3]];

        let position = relocate(&mut a, Some(&mut b), t[1], 0);

        assert_eq!(position, 0);
        assert_eq!(a, vec![t[0], t[2]]);
        assert_eq!(b, vec![t[1], t[3]]);
    }

    #[test]
    fn test_oversized_index_appends() {
        let t = ids(4);
        let mut a = vec![t[0], t[1], t[2]];
        let mut b = vec![t[3]];

        let position = relocate(&mut a, Some(&mut b), t[0], 999);

        assert_eq!(position, 1);
        assert_eq!(a, vec![t[1], t[2]]);
        assert_eq!(b, vec![t[3], t[0]]);
    }

    #[test]
    fn test_negative_index_prepends() {
        let t = ids(3);
        let mut a = vec![t[0]];
        let mut b = vec![t[1], t[2]];

        let position = relocate(&mut a, Some(&mut b), t[0], -1);

        assert_eq!(position, 0);
        assert!(a.is_empty());
        assert_eq!(b, vec![t[0], t[1], t[2]]);
    }

    #[test]
    fn test_move_into_empty_list() {
        let t = ids(2);
        let mut a = vec![t[0], t[1]];
        let mut b = Vec::new();

        let position = relocate(&mut a, Some(&mut b), t[1], 5);

        assert_eq!(position, 0);
        assert_eq!(a, vec![t[0]]);
        assert_eq!(b, vec![t[1]]);
    }

    #[test]
    fn test_same_list_index_is_post_removal() {
        let t = ids(4);
        let mut a = vec![t[0], t[1], t[2], t[3]];

        // Remove t0 -> [t1, t2, t3], then insert at 2 -> [t1, t2, t0, t3]
        let position = relocate(&mut a, None, t[0], 2);

        assert_eq!(position, 2);
        assert_eq!(a, vec![t[1], t[2], t[0], t[3]]);
    }

    #[test]
    fn test_same_list_move_to_end() {
        let t = ids(3);
        let mut a = vec![t[0], t[1], t[2]];

        let position = relocate(&mut a, None, t[0], 3);

        assert_eq!(position, 2);
        assert_eq!(a, vec![t[1], t[2], t[0]]);
    }

    #[test]
    fn test_missing_from_source_still_lands_once() {
        let t = ids(3);
        let mut a = vec![t[0]];
        let mut b = vec![t[1], t[2]];

        relocate(&mut a, Some(&mut b), t[2], 0);

        assert_eq!(a, vec![t[0]]);
        assert_eq!(b, vec![t[2], t[1]]);
    }

    #[test]
    fn test_duplicate_ids_are_collapsed() {
        let t = ids(2);
        let mut a = vec![t[0], t[1], t[0]];
        let mut b = Vec::new();

        relocate(&mut a, Some(&mut b), t[0], 0);

        assert_eq!(a, vec![t[1]]);
        assert_eq!(b, vec![t[0]]);
    }
}
