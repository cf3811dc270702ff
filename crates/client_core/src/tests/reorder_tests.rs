use super::*;

fn items(names: &[&'static str]) -> Vec<OrderedItem<&'static str>> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            OrderedItem::new(ItemId(index as i64 + 1), index as u32, *name)
                .with_pivot(PivotId(100 + index as i64))
        })
        .collect()
}

fn names<T: Copy>(items: &[OrderedItem<T>]) -> Vec<T> {
    items.iter().map(|item| item.data).collect()
}

#[test]
fn moving_first_to_last_renumbers_everything() {
    let next = reorder(&items(&["A", "B", "C", "D"]), 0, 3).expect("in range");
    assert_eq!(names(&next), vec!["B", "C", "D", "A"]);
    assert!(is_contiguous(&next));
}

#[test]
fn reorder_to_same_index_keeps_order() {
    let original = items(&["A", "B", "C"]);
    let next = reorder(&original, 1, 1).expect("in range");
    assert_eq!(next, original);
}

#[test]
fn out_of_range_indices_are_rejected() {
    let original = items(&["A", "B"]);
    assert_eq!(
        reorder(&original, 0, 2),
        Err(ReorderError::IndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(
        reorder(&original, 5, 0),
        Err(ReorderError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[test]
fn reorder_preserves_membership() {
    let original = items(&["A", "B", "C", "D", "E"]);
    for from in 0..original.len() {
        for to in 0..original.len() {
            let next = reorder(&original, from, to).expect("in range");
            let mut ids: Vec<_> = next.iter().map(|item| item.id).collect();
            ids.sort();
            assert_eq!(ids, original.iter().map(|item| item.id).collect::<Vec<_>>());
            assert!(is_contiguous(&next));
        }
    }
}

#[test]
fn duplicate_positions_sort_stably_and_renumber() {
    let mut raw = items(&["A", "B", "C", "D"]);
    for (item, position) in raw.iter_mut().zip([0, 1, 1, 2]) {
        item.position = position;
    }
    let sorted = sort_by_position(raw);
    assert_eq!(names(&sorted), vec!["A", "B", "C", "D"]);
    assert_eq!(
        sorted.iter().map(|item| item.position).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn sparse_positions_collapse() {
    let mut raw = items(&["A", "B", "C"]);
    for (item, position) in raw.iter_mut().zip([40, 5, 12]) {
        item.position = position;
    }
    let sorted = sort_by_position(raw);
    assert_eq!(names(&sorted), vec!["B", "C", "A"]);
    assert!(is_contiguous(&sorted));
}

#[test]
fn reposition_moves_by_pivot_key() {
    let original = items(&["A", "B", "C", "D"]);
    let next = reposition(&original, PositionKey::Pivot(PivotId(103)), 0).expect("valid");
    assert_eq!(names(&next), vec!["D", "A", "B", "C"]);
}

#[test]
fn reposition_rejects_position_past_end() {
    let original = items(&["A", "B", "C"]);
    assert_eq!(
        reposition(&original, PositionKey::Item(ItemId(1)), 3),
        Err(ReorderError::PositionOutOfRange { position: 3, len: 3 })
    );
    assert_eq!(
        reposition(&original, PositionKey::Item(ItemId(42)), 0),
        Err(ReorderError::UnknownItem("item 42".to_string()))
    );
}

#[test]
fn remove_item_closes_the_gap() {
    let next = remove_item(&items(&["A", "B", "C"]), PositionKey::Item(ItemId(2))).expect("known");
    assert_eq!(names(&next), vec!["A", "C"]);
    assert!(is_contiguous(&next));
}

#[test]
fn bulk_payload_uses_pivot_ids_and_array_order() {
    let next = reorder(&items(&["A", "B", "C"]), 2, 0).expect("in range");
    let updates = position_updates(&next);
    assert_eq!(
        updates,
        vec![
            PositionUpdate { id: 102, position: 0 },
            PositionUpdate { id: 100, position: 1 },
            PositionUpdate { id: 101, position: 2 },
        ]
    );
}

#[test]
fn items_without_pivot_use_their_own_id() {
    let plain = vec![OrderedItem::new(ItemId(9), 0, "layout")];
    assert_eq!(plain[0].position_key(), PositionKey::Item(ItemId(9)));
    assert_eq!(position_updates(&plain)[0].id, 9);
}
