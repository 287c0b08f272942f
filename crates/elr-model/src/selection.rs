//! Row selections produced by filters.

/// The set of row indices of a table that passed a filter.
///
/// A selection always knows the height of the table it was computed over;
/// combining selections of different heights is a logic error and only
/// the common prefix is considered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    mask: Vec<bool>,
}

impl Selection {
    pub fn all(height: usize) -> Self {
        Self {
            mask: vec![true; height],
        }
    }

    pub fn none(height: usize) -> Self {
        Self {
            mask: vec![false; height],
        }
    }

    pub fn from_mask(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    /// Selection of `height` rows containing `indices`; out-of-range indices
    /// are ignored.
    pub fn from_indices(height: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut mask = vec![false; height];
        for index in indices {
            if let Some(slot) = mask.get_mut(index) {
                *slot = true;
            }
        }
        Self { mask }
    }

    /// Height of the underlying table.
    pub fn height(&self) -> usize {
        self.mask.len()
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|selected| **selected).count()
    }

    /// True when no row is selected.
    pub fn is_empty(&self) -> bool {
        !self.mask.contains(&true)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(index, selected)| selected.then_some(index))
    }

    #[must_use]
    pub fn and(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b| a && b)
    }

    #[must_use]
    pub fn or(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b| a || b)
    }

    #[must_use]
    pub fn and_not(&self, other: &Selection) -> Selection {
        self.combine(other, |a, b| a && !b)
    }

    #[must_use]
    pub fn invert(&self) -> Selection {
        Self {
            mask: self.mask.iter().map(|selected| !selected).collect(),
        }
    }

    fn combine(&self, other: &Selection, op: impl Fn(bool, bool) -> bool) -> Selection {
        Self {
            mask: self
                .mask
                .iter()
                .zip(&other.mask)
                .map(|(a, b)| op(*a, *b))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let left = Selection::from_indices(4, [0, 1, 3]);
        let right = Selection::from_indices(4, [1, 2, 3]);
        assert_eq!(left.and(&right).indices().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(left.or(&right).count(), 4);
        assert_eq!(left.and_not(&right).indices().collect::<Vec<_>>(), [0]);
        assert_eq!(left.invert().indices().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn empty_and_all() {
        assert!(Selection::none(3).is_empty());
        assert!(Selection::all(0).is_empty());
        assert_eq!(Selection::all(3).count(), 3);
        assert!(!Selection::from_indices(2, [7]).contains(7));
    }
}
