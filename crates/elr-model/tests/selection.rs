use elr_model::Selection;
use proptest::prelude::*;

fn masks(height: usize) -> impl Strategy<Value = (Vec<bool>, Vec<bool>)> {
    (
        proptest::collection::vec(any::<bool>(), height),
        proptest::collection::vec(any::<bool>(), height),
    )
}

proptest! {
    #[test]
    fn and_or_are_commutative((left, right) in (0usize..64).prop_flat_map(masks)) {
        let left = Selection::from_mask(left);
        let right = Selection::from_mask(right);
        prop_assert_eq!(left.and(&right), right.and(&left));
        prop_assert_eq!(left.or(&right), right.or(&left));
    }

    #[test]
    fn invert_partitions_rows((mask, _) in (0usize..64).prop_flat_map(masks)) {
        let selection = Selection::from_mask(mask);
        let inverted = selection.invert();
        prop_assert_eq!(selection.count() + inverted.count(), selection.height());
        prop_assert!(selection.and(&inverted).is_empty());
        prop_assert_eq!(inverted.invert(), selection);
    }

    #[test]
    fn and_not_removes_other((left, right) in (0usize..64).prop_flat_map(masks)) {
        let left = Selection::from_mask(left);
        let right = Selection::from_mask(right);
        let difference = left.and_not(&right);
        prop_assert!(difference.and(&right).is_empty());
        prop_assert_eq!(difference.or(&left.and(&right)), left);
    }
}

#[test]
fn indices_round_trip() {
    let selection = Selection::from_indices(5, [4, 1]);
    assert_eq!(selection.indices().collect::<Vec<_>>(), [1, 4]);
    assert!(selection.contains(4));
    assert!(!selection.contains(0));
    assert_eq!(Selection::all(3).count(), 3);
    assert!(Selection::none(3).is_empty());
}
