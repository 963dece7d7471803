//! Subgroup marker allocation over a fixed visual palette.

use contracts::TokenRecord;

use crate::store::TabletopStore;

/// Palette shared by every group's subdivision; its length is the base for
/// marker encoding of large subgroup indices.
pub const DEFAULT_MARKER_PALETTE: [&str; 7] =
    ["blue", "brown", "green", "red", "yellow", "purple", "pink"];

/// Maps subgroup indices to marker sets. Scoped to one splitting pass so the
/// digit counters never leak between calls.
#[derive(Debug, Clone, Copy)]
pub struct MarkerAllocator<'a> {
    palette: &'a [&'a str],
}

impl<'a> MarkerAllocator<'a> {
    pub fn new(palette: &'a [&'a str]) -> Self {
        Self { palette }
    }

    /// Mark `token_id` as belonging to subgroup `index`.
    ///
    /// Indices below the palette size map bijectively to a single marker.
    /// Larger indices are expanded in base `P` (P = palette size), setting the
    /// marker for each digit; a repeated digit additionally sets the markers at
    /// `(count + 1) % P` and `(count + 2) % P` to reduce visual collisions.
    /// The expansion is an approximate disambiguation, not a bijection.
    pub fn assign(&self, store: &mut dyn TabletopStore, token_id: &str, index: usize) {
        let p = self.palette.len();
        if p == 0 {
            return;
        }
        if index < p {
            store.set_marker(token_id, self.palette[index], true);
            return;
        }

        let mut counts = vec![0_usize; p];
        let mut n = index;
        while n > 0 {
            let digit = n % p;
            counts[digit] += 1;
            store.set_marker(token_id, self.palette[digit], true);
            n /= p;
        }

        // A digit seen more than once collapsed two positions onto one marker.
        if let Some(count) = counts.into_iter().find(|count| *count > 1) {
            store.set_marker(token_id, self.palette[(count + 1) % p], true);
            store.set_marker(token_id, self.palette[(count + 2) % p], true);
        }
    }

    /// Clear every palette marker on every given token. A full reset, not the
    /// inverse of any particular allocation.
    pub fn clear_all(&self, store: &mut dyn TabletopStore, tokens: &[TokenRecord]) {
        for token in tokens {
            for marker in self.palette {
                store.set_marker(&token.token_id, marker, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::store::InMemoryStore;

    fn token(id: &str) -> TokenRecord {
        TokenRecord {
            token_id: id.to_string(),
            name: "goblin".to_string(),
            represents: None,
            page_id: "page_1".to_string(),
        }
    }

    #[test]
    fn direct_palette_indices_map_to_single_distinct_markers() {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        let mut seen = BTreeSet::new();
        for index in 0..DEFAULT_MARKER_PALETTE.len() {
            let id = format!("tok_{index}");
            allocator.assign(&mut store, &id, index);
            let set = store.marker_set(&id);
            assert_eq!(set.len(), 1, "index {index} should set exactly one marker");
            assert!(seen.insert(set), "index {index} collided with a lower index");
        }
    }

    #[test]
    fn large_indices_never_panic_and_set_at_least_one_marker() {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        for index in [7, 8, 48, 49, 50, 343, 9999] {
            let id = format!("tok_{index}");
            allocator.assign(&mut store, &id, index);
            assert!(!store.marker_set(&id).is_empty());
        }
    }

    #[test]
    fn repeated_digit_triggers_collision_fallback() {
        // index 8 in base 7 is digits [1, 1]: counter for position 1 reaches 2,
        // so markers at (2+1)%7 and (2+2)%7 are added as well.
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        allocator.assign(&mut store, "tok_8", 8);
        let set = store.marker_set("tok_8");
        assert!(set.contains("brown")); // digit 1
        assert!(set.contains("red")); // fallback (2+1)%7 = 3
        assert!(set.contains("yellow")); // fallback (2+2)%7 = 4
    }

    #[test]
    fn clear_all_resets_every_palette_marker() {
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let mut store = InMemoryStore::new(1);
        allocator.assign(&mut store, "tok_a", 3);
        allocator.assign(&mut store, "tok_b", 12);
        allocator.clear_all(&mut store, &[token("tok_a"), token("tok_b")]);
        assert!(store.marker_set("tok_a").is_empty());
        assert!(store.marker_set("tok_b").is_empty());
    }

    #[test]
    fn empty_palette_is_a_no_op() {
        let allocator = MarkerAllocator::new(&[]);
        let mut store = InMemoryStore::new(1);
        allocator.assign(&mut store, "tok_a", 5);
        assert!(store.marker_set("tok_a").is_empty());
    }
}
