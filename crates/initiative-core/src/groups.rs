//! Token grouping and balanced subdivision of oversized groups.

use std::collections::BTreeMap;

use contracts::TokenRecord;

use crate::markers::MarkerAllocator;
use crate::store::TabletopStore;

/// Grouping key for a token when grouping is enabled: display name plus
/// represented character id. Tokens representing the same character under
/// different names are deliberately NOT merged; renames split groups.
pub fn group_key(token: &TokenRecord) -> String {
    format!(
        "{}_{}",
        token.name,
        token.represents.as_deref().unwrap_or("")
    )
}

/// Partition `tokens` into initiative groups.
///
/// With grouping disabled every token is its own group, keyed by token id,
/// and no subdivision or marker writes happen. With grouping enabled, tokens
/// sharing a [`group_key`] are clustered; a group larger than `max_per_group`
/// is split into `ceil(size / max)` subgroups with members dealt round-robin
/// (index `i` lands in subgroup `i % num_splits`), each reassigned member
/// receiving that subgroup's markers. Subgroups are emitted under
/// `"{group_key}_{subgroup_index}"`.
///
/// Member order inside each group follows the input token order, so the split
/// is deterministic for a given enumeration.
pub fn build_groups(
    store: &mut dyn TabletopStore,
    tokens: &[TokenRecord],
    group_enabled: bool,
    max_per_group: Option<u32>,
    allocator: &MarkerAllocator<'_>,
) -> BTreeMap<String, Vec<TokenRecord>> {
    let mut by_key: BTreeMap<String, Vec<TokenRecord>> = BTreeMap::new();
    for token in tokens {
        let key = if group_enabled {
            group_key(token)
        } else {
            token.token_id.clone()
        };
        by_key.entry(key).or_default().push(token.clone());
    }

    let cap = match max_per_group {
        Some(cap) if group_enabled && cap > 0 => cap as usize,
        _ => return by_key,
    };

    let mut groups: BTreeMap<String, Vec<TokenRecord>> = BTreeMap::new();
    for (key, members) in by_key {
        if members.len() <= cap {
            groups.insert(key, members);
            continue;
        }
        let num_splits = (members.len() + cap - 1) / cap;
        for (i, token) in members.into_iter().enumerate() {
            let subgroup = i % num_splits;
            allocator.assign(store, &token.token_id, subgroup);
            groups
                .entry(format!("{key}_{subgroup}"))
                .or_default()
                .push(token);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::DEFAULT_MARKER_PALETTE;
    use crate::store::InMemoryStore;

    fn token(id: &str, name: &str, represents: &str) -> TokenRecord {
        TokenRecord {
            token_id: id.to_string(),
            name: name.to_string(),
            represents: Some(represents.to_string()),
            page_id: "page_1".to_string(),
        }
    }

    fn ids(members: &[TokenRecord]) -> Vec<&str> {
        members.iter().map(|t| t.token_id.as_str()).collect()
    }

    #[test]
    fn grouping_disabled_gives_one_group_per_token() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens = vec![
            token("tok_a", "goblin", "char_1"),
            token("tok_b", "goblin", "char_1"),
            token("tok_c", "wolf", "char_2"),
        ];
        let groups = build_groups(&mut store, &tokens, false, Some(2), &allocator);
        assert_eq!(groups.len(), tokens.len());
        assert!(groups.values().all(|members| members.len() == 1));
        // no subdivision means no marker writes
        assert!(store.marker_set("tok_a").is_empty());
    }

    #[test]
    fn grouping_clusters_by_name_and_character() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens = vec![
            token("tok_a", "goblin", "char_1"),
            token("tok_b", "goblin", "char_1"),
            token("tok_c", "wolf", "char_2"),
        ];
        let groups = build_groups(&mut store, &tokens, true, None, &allocator);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups["goblin_char_1"]), vec!["tok_a", "tok_b"]);
        assert_eq!(ids(&groups["wolf_char_2"]), vec!["tok_c"]);
    }

    #[test]
    fn renamed_duplicates_of_one_character_stay_separate() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens = vec![
            token("tok_a", "goblin", "char_1"),
            token("tok_b", "goblin boss", "char_1"),
        ];
        let groups = build_groups(&mut store, &tokens, true, None, &allocator);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn oversized_group_splits_round_robin_with_markers() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens = vec![
            token("tok_a", "goblin", "char_1"),
            token("tok_b", "goblin", "char_1"),
            token("tok_c", "goblin", "char_1"),
        ];
        let groups = build_groups(&mut store, &tokens, true, Some(2), &allocator);
        // ceil(3/2) = 2 subgroups, dealt round-robin by original index.
        assert_eq!(ids(&groups["goblin_char_1_0"]), vec!["tok_a", "tok_c"]);
        assert_eq!(ids(&groups["goblin_char_1_1"]), vec!["tok_b"]);
        assert!(store.marker_set("tok_a").contains("blue"));
        assert!(store.marker_set("tok_c").contains("blue"));
        assert!(store.marker_set("tok_b").contains("brown"));
    }

    #[test]
    fn cap_at_group_size_leaves_group_intact() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let tokens = vec![
            token("tok_a", "goblin", "char_1"),
            token("tok_b", "goblin", "char_1"),
        ];
        let groups = build_groups(&mut store, &tokens, true, Some(2), &allocator);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("goblin_char_1"));
        assert!(store.marker_set("tok_a").is_empty());
    }

    #[test]
    fn empty_token_set_yields_zero_groups() {
        let mut store = InMemoryStore::new(1);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let groups = build_groups(&mut store, &[], true, Some(2), &allocator);
        assert!(groups.is_empty());
    }
}
