//! Canonical turn-queue upkeep: every mutation reads the persisted queue,
//! re-sorts descending by priority, and writes it back. No authoritative
//! in-memory copy survives between operations.

use contracts::TurnEntry;

use crate::store::TabletopStore;

/// Stable descending sort by `pr`; ties keep their insertion order.
pub fn sort_descending(entries: &mut [TurnEntry]) {
    entries.sort_by(|a, b| b.pr.cmp(&a.pr));
}

/// Merge `entries` into the persisted queue and re-sort. An absent queue is
/// treated as empty, which covers the rebuild pass right after the queue was
/// cleared.
pub fn append(store: &mut dyn TabletopStore, entries: Vec<TurnEntry>) {
    let mut queue = store.turn_order().unwrap_or_default();
    queue.extend(entries);
    sort_descending(&mut queue);
    store.set_turn_order(&queue);
}

/// Append an asynchronously resolved roll. Silent no-op when no queue is
/// open; a result that arrives after the turn order closed is discarded.
pub fn ingest_async_result(
    store: &mut dyn TabletopStore,
    token_id: &str,
    page_id: &str,
    priority: i64,
) -> bool {
    let Some(mut queue) = store.turn_order() else {
        return false;
    };
    queue.push(TurnEntry::new(token_id, priority, page_id));
    sort_descending(&mut queue);
    store.set_turn_order(&queue);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn append_on_empty_queue_sorts_descending() {
        let mut store = InMemoryStore::new(1);
        store.set_turn_order(&[]);
        append(
            &mut store,
            vec![
                TurnEntry::new("t1", 12, "page_1"),
                TurnEntry::new("t2", 18, "page_1"),
            ],
        );
        let queue = store.turn_order().expect("queue open");
        assert_eq!(queue[0], TurnEntry::new("t2", 18, "page_1"));
        assert_eq!(queue[1], TurnEntry::new("t1", 12, "page_1"));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut store = InMemoryStore::new(1);
        store.set_turn_order(&[]);
        append(
            &mut store,
            vec![
                TurnEntry::new("first", 10, "page_1"),
                TurnEntry::new("second", 10, "page_1"),
                TurnEntry::new("third", 15, "page_1"),
            ],
        );
        let ids: Vec<String> = store
            .turn_order()
            .expect("queue open")
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["third", "first", "second"]);
    }

    #[test]
    fn ingest_merges_into_existing_queue() {
        let mut store = InMemoryStore::new(1);
        store.set_turn_order(&[TurnEntry::new("t1", 12, "page_1")]);
        assert!(ingest_async_result(&mut store, "t2", "page_1", 18));
        let ids: Vec<String> = store
            .turn_order()
            .expect("queue open")
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[test]
    fn ingest_without_open_queue_is_a_no_op() {
        let mut store = InMemoryStore::new(1);
        assert!(!ingest_async_result(&mut store, "t1", "page_1", 9));
        assert_eq!(store.turn_order(), None);
    }
}
