use std::collections::BTreeSet;

use contracts::{Settings, TokenRecord, TurnEntry};
use initiative_core::groups::build_groups;
use initiative_core::markers::{MarkerAllocator, DEFAULT_MARKER_PALETTE};
use initiative_core::store::{InMemoryStore, TabletopStore};
use initiative_core::turn_order;
use proptest::prelude::*;

fn goblin(index: usize) -> TokenRecord {
    TokenRecord {
        token_id: format!("tok_{index:03}"),
        name: "goblin".to_string(),
        represents: Some("char_1".to_string()),
        page_id: "page_1".to_string(),
    }
}

fn solo(index: usize) -> TokenRecord {
    TokenRecord {
        token_id: format!("tok_{index:03}"),
        name: format!("creature {index}"),
        represents: Some(format!("char_{index}")),
        page_id: "page_1".to_string(),
    }
}

#[test]
fn direct_palette_assignment_is_bijective() {
    let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
    let mut store = InMemoryStore::new(1);
    let mut sets = BTreeSet::new();
    for index in 0..DEFAULT_MARKER_PALETTE.len() {
        let id = format!("tok_{index}");
        allocator.assign(&mut store, &id, index);
        assert!(sets.insert(store.marker_set(&id)));
    }
    assert_eq!(sets.len(), DEFAULT_MARKER_PALETTE.len());
}

#[test]
fn default_settings_are_fully_disabled() {
    let settings = Settings::default();
    assert!(!settings.enable && !settings.group && !settings.output && !settings.players);
    assert_eq!(settings.max_per_group, None);
}

proptest! {
    #[test]
    fn marker_assignment_never_panics(index in 0_usize..100_000) {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        allocator.assign(&mut store, "tok_x", index);
        prop_assert!(!store.marker_set("tok_x").is_empty());
    }

    #[test]
    fn grouping_disabled_yields_one_group_per_token(count in 0_usize..40) {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        let tokens: Vec<TokenRecord> = (0..count).map(goblin).collect();
        let groups = build_groups(&mut store, &tokens, false, Some(3), &allocator);
        prop_assert_eq!(groups.len(), count);
    }

    #[test]
    fn subdivision_bounds_sizes_and_preserves_membership(
        count in 1_usize..60,
        cap in 2_u32..8,
    ) {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        let tokens: Vec<TokenRecord> = (0..count).map(goblin).collect();
        let groups = build_groups(&mut store, &tokens, true, Some(cap), &allocator);

        let mut members = BTreeSet::new();
        for subgroup in groups.values() {
            prop_assert!(subgroup.len() <= cap as usize);
            for token in subgroup {
                prop_assert!(members.insert(token.token_id.clone()));
            }
        }
        let expected: BTreeSet<String> =
            tokens.iter().map(|token| token.token_id.clone()).collect();
        prop_assert_eq!(members, expected);
    }

    #[test]
    fn subgroup_sizes_stay_balanced(count in 1_usize..60, cap in 2_u32..8) {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        let tokens: Vec<TokenRecord> = (0..count).map(goblin).collect();
        let groups = build_groups(&mut store, &tokens, true, Some(cap), &allocator);

        let sizes: Vec<usize> = groups.values().map(Vec::len).collect();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        // Round-robin dealing keeps subgroup sizes within one of each other.
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn appended_queue_is_sorted_descending_with_membership_preserved(
        priorities in proptest::collection::vec(-50_i64..50, 0..30),
    ) {
        let mut store = InMemoryStore::new(1);
        store.set_turn_order(&[]);
        let entries: Vec<TurnEntry> = priorities
            .iter()
            .enumerate()
            .map(|(i, &pr)| TurnEntry::new(format!("tok_{i}"), pr, "page_1"))
            .collect();
        turn_order::append(&mut store, entries.clone());

        let queue = store.turn_order().expect("queue open");
        prop_assert_eq!(queue.len(), entries.len());
        prop_assert!(queue.windows(2).all(|pair| pair[0].pr >= pair[1].pr));

        let queued: BTreeSet<String> = queue.into_iter().map(|entry| entry.id).collect();
        let expected: BTreeSet<String> = entries.into_iter().map(|entry| entry.id).collect();
        prop_assert_eq!(queued, expected);
    }

    #[test]
    fn grouping_is_deterministic_for_a_given_enumeration(count in 0_usize..30) {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens: Vec<TokenRecord> = (0..count).map(solo).collect();

        let mut store_a = InMemoryStore::new(7);
        let mut store_b = InMemoryStore::new(7);
        let groups_a = build_groups(&mut store_a, &tokens, true, Some(2), &allocator);
        let groups_b = build_groups(&mut store_b, &tokens, true, Some(2), &allocator);
        prop_assert_eq!(groups_a, groups_b);
    }
}
