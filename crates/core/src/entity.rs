//! Entity trait: identity + continuity across state changes.

use core::cmp::Ordering;

use crate::pagination::SortDirection;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Sort by `compare` in `direction`; ties always fall back to ascending id so
/// repeated listings come back in the same order.
pub fn sort_with_id_tiebreak<E, F>(items: &mut [E], direction: SortDirection, compare: F)
where
    E: Entity,
    F: Fn(&E, &E) -> Ordering,
{
    items.sort_by(|a, b| {
        let primary = match direction {
            SortDirection::Asc => compare(a, b),
            SortDirection::Desc => compare(a, b).reverse(),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: u32,
        rank: u8,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn ties_break_on_ascending_id_in_both_directions() {
        let mut rows = vec![
            Row { id: 4, rank: 1 },
            Row { id: 2, rank: 2 },
            Row { id: 3, rank: 1 },
            Row { id: 1, rank: 2 },
        ];

        sort_with_id_tiebreak(&mut rows, SortDirection::Asc, |a, b| a.rank.cmp(&b.rank));
        assert_eq!(ids(&rows), vec![3, 4, 1, 2]);

        sort_with_id_tiebreak(&mut rows, SortDirection::Desc, |a, b| a.rank.cmp(&b.rank));
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
    }
}
