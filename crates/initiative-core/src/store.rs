//! Platform boundary: the queryable external token/character/attribute store.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use contracts::{CharacterRecord, TokenRecord, TurnEntry};

/// Host-platform primitives the kernel operates through. Implementations are
/// expected to be cheap to call; the kernel never caches across operations.
pub trait TabletopStore {
    /// Page whose tokens participate in a rebuild pass.
    fn active_page(&self) -> String;

    /// Tokens on a page, in the platform's placement order.
    fn tokens_on_page(&self, page_id: &str) -> Vec<TokenRecord>;

    fn character(&self, character_id: &str) -> Option<CharacterRecord>;

    /// Numeric attribute lookup on a character's sheet.
    fn attribute(&self, character_id: &str, name: &str) -> Option<i64>;

    fn set_marker(&mut self, token_id: &str, marker: &str, on: bool);

    /// Uniform integer in `[1, sides]`.
    fn roll_die(&mut self, sides: i64) -> i64;

    /// `None` when no turn queue is currently open.
    fn turn_order(&self) -> Option<Vec<TurnEntry>>;

    fn set_turn_order(&mut self, entries: &[TurnEntry]);

    /// Dispatch a line on the chat/roll channel.
    fn send_chat(&mut self, speaker: &str, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: String,
    pub message: String,
}

/// Deterministic in-memory store used by tests and the offline demo path.
#[derive(Debug)]
pub struct InMemoryStore {
    active_page: String,
    tokens: Vec<TokenRecord>,
    characters: BTreeMap<String, CharacterRecord>,
    attributes: BTreeMap<String, BTreeMap<String, i64>>,
    markers: BTreeMap<String, BTreeSet<String>>,
    turn_order: Option<Vec<TurnEntry>>,
    chat_log: Vec<ChatLine>,
    rng_state: u64,
    forced_rolls: VecDeque<i64>,
}

impl InMemoryStore {
    pub fn new(seed: u64) -> Self {
        Self {
            active_page: "page_1".to_string(),
            tokens: Vec::new(),
            characters: BTreeMap::new(),
            attributes: BTreeMap::new(),
            markers: BTreeMap::new(),
            turn_order: None,
            chat_log: Vec::new(),
            rng_state: seed,
            forced_rolls: VecDeque::new(),
        }
    }

    pub fn set_active_page(&mut self, page_id: impl Into<String>) {
        self.active_page = page_id.into();
    }

    /// Insert or replace a token, preserving first-placement order.
    pub fn upsert_token(&mut self, token: TokenRecord) {
        if let Some(existing) = self
            .tokens
            .iter_mut()
            .find(|t| t.token_id == token.token_id)
        {
            *existing = token;
        } else {
            self.tokens.push(token);
        }
    }

    pub fn upsert_character(&mut self, character: CharacterRecord) {
        self.characters
            .insert(character.character_id.clone(), character);
    }

    pub fn set_attribute(&mut self, character_id: &str, name: &str, value: i64) {
        self.attributes
            .entry(character_id.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Queue rolls returned ahead of the seeded stream, oldest first.
    pub fn force_rolls(&mut self, rolls: impl IntoIterator<Item = i64>) {
        self.forced_rolls.extend(rolls);
    }

    pub fn marker_set(&self, token_id: &str) -> BTreeSet<String> {
        self.markers.get(token_id).cloned().unwrap_or_default()
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.chat_log
    }

    /// SplitMix64-style step; good distribution from any nonzero seed.
    fn next_u64(&mut self) -> u64 {
        self.rng_state = self.rng_state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut value = self.rng_state;
        value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        value ^ (value >> 31)
    }
}

impl TabletopStore for InMemoryStore {
    fn active_page(&self) -> String {
        self.active_page.clone()
    }

    fn tokens_on_page(&self, page_id: &str) -> Vec<TokenRecord> {
        self.tokens
            .iter()
            .filter(|token| token.page_id == page_id)
            .cloned()
            .collect()
    }

    fn character(&self, character_id: &str) -> Option<CharacterRecord> {
        self.characters.get(character_id).cloned()
    }

    fn attribute(&self, character_id: &str, name: &str) -> Option<i64> {
        self.attributes
            .get(character_id)
            .and_then(|attrs| attrs.get(name))
            .copied()
    }

    fn set_marker(&mut self, token_id: &str, marker: &str, on: bool) {
        let set = self.markers.entry(token_id.to_string()).or_default();
        if on {
            set.insert(marker.to_string());
        } else {
            set.remove(marker);
        }
    }

    fn roll_die(&mut self, sides: i64) -> i64 {
        if let Some(forced) = self.forced_rolls.pop_front() {
            return forced;
        }
        let span = sides.max(1) as u64;
        1 + (self.next_u64() % span) as i64
    }

    fn turn_order(&self) -> Option<Vec<TurnEntry>> {
        self.turn_order.clone()
    }

    fn set_turn_order(&mut self, entries: &[TurnEntry]) {
        self.turn_order = Some(entries.to_vec());
    }

    fn send_chat(&mut self, speaker: &str, message: &str) {
        self.chat_log.push(ChatLine {
            speaker: speaker.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_rolls_drain_before_seeded_stream() {
        let mut store = InMemoryStore::new(7);
        store.force_rolls([14, 3]);
        assert_eq!(store.roll_die(20), 14);
        assert_eq!(store.roll_die(20), 3);
        let free = store.roll_die(20);
        assert!((1..=20).contains(&free));
    }

    #[test]
    fn seeded_rolls_are_deterministic() {
        let mut a = InMemoryStore::new(1337);
        let mut b = InMemoryStore::new(1337);
        let rolls_a: Vec<i64> = (0..32).map(|_| a.roll_die(20)).collect();
        let rolls_b: Vec<i64> = (0..32).map(|_| b.roll_die(20)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|roll| (1..=20).contains(roll)));
    }

    #[test]
    fn upsert_token_keeps_placement_order() {
        let mut store = InMemoryStore::new(1);
        for id in ["tok_a", "tok_b", "tok_c"] {
            store.upsert_token(TokenRecord {
                token_id: id.to_string(),
                name: "goblin".to_string(),
                represents: None,
                page_id: "page_1".to_string(),
            });
        }
        store.upsert_token(TokenRecord {
            token_id: "tok_b".to_string(),
            name: "hobgoblin".to_string(),
            represents: None,
            page_id: "page_1".to_string(),
        });
        let order: Vec<String> = store
            .tokens_on_page("page_1")
            .into_iter()
            .map(|t| t.token_id)
            .collect();
        assert_eq!(order, vec!["tok_a", "tok_b", "tok_c"]);
    }
}
