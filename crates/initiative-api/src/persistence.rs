//! SQLite-backed campaign store: the persisted side of the platform boundary.

use std::fmt;
use std::path::Path;

use contracts::{CharacterRecord, Settings, TokenRecord, TurnEntry};
use initiative_core::store::TabletopStore;
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Campaign state in SQLite, implementing [`TabletopStore`].
///
/// Trait methods cannot surface errors, so a failed statement records its
/// message in `last_error` and degrades to the method's neutral value; the
/// facade inspects and logs it after each operation.
#[derive(Debug)]
pub struct SqliteCampaignStore {
    conn: Connection,
    rng_state: u64,
    last_error: Option<String>,
}

impl SqliteCampaignStore {
    pub fn open(path: impl AsRef<Path>, seed: u64) -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open(path)?, seed)
    }

    pub fn open_in_memory(seed: u64) -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?, seed)
    }

    fn from_connection(conn: Connection, seed: u64) -> Result<Self, PersistenceError> {
        let mut store = Self {
            conn,
            rng_state: seed,
            last_error: None,
        };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tokens (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                token_id TEXT NOT NULL UNIQUE,
                page_id TEXT NOT NULL,
                name TEXT NOT NULL,
                represents TEXT
             );
             CREATE TABLE IF NOT EXISTS characters (
                character_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                controlled_by_json TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS attributes (
                character_id TEXT NOT NULL,
                name TEXT NOT NULL,
                value INTEGER NOT NULL,
                PRIMARY KEY (character_id, name)
             );
             CREATE TABLE IF NOT EXISTS markers (
                token_id TEXT NOT NULL,
                marker TEXT NOT NULL,
                PRIMARY KEY (token_id, marker)
             );
             CREATE TABLE IF NOT EXISTS campaign (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS chat_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                speaker TEXT NOT NULL,
                message TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    pub fn upsert_token(&mut self, token: &TokenRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO tokens (token_id, page_id, name, represents)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(token_id) DO UPDATE SET
                page_id = excluded.page_id,
                name = excluded.name,
                represents = excluded.represents",
            params![
                token.token_id.as_str(),
                token.page_id.as_str(),
                token.name.as_str(),
                token.represents.as_deref(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_character(&mut self, character: &CharacterRecord) -> Result<(), PersistenceError> {
        let controlled_by_json = serde_json::to_string(&character.controlled_by)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO characters (character_id, name, controlled_by_json)
             VALUES (?1, ?2, ?3)",
            params![
                character.character_id.as_str(),
                character.name.as_str(),
                controlled_by_json,
            ],
        )?;
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        character_id: &str,
        name: &str,
        value: i64,
    ) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO attributes (character_id, name, value) VALUES (?1, ?2, ?3)",
            params![character_id, name, value],
        )?;
        Ok(())
    }

    pub fn set_active_page(&mut self, page_id: &str) -> Result<(), PersistenceError> {
        self.set_campaign_value("active_page", page_id)
    }

    pub fn load_settings(&self) -> Result<Settings, PersistenceError> {
        match self.campaign_value("settings")? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Settings::default()),
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(settings)?;
        self.set_campaign_value("settings", &raw)
    }

    pub fn chat_lines(&self) -> Result<Vec<(String, String)>, PersistenceError> {
        let mut statement = self
            .conn
            .prepare("SELECT speaker, message FROM chat_log ORDER BY seq")?;
        let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    fn record_error(&mut self, err: PersistenceError) {
        self.last_error = Some(err.to_string());
    }

    fn campaign_value(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM campaign WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_campaign_value(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO campaign (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn try_tokens_on_page(&self, page_id: &str) -> Result<Vec<TokenRecord>, PersistenceError> {
        let mut statement = self.conn.prepare(
            "SELECT token_id, page_id, name, represents FROM tokens
             WHERE page_id = ?1 ORDER BY seq",
        )?;
        let rows = statement.query_map(params![page_id], |row| {
            Ok(TokenRecord {
                token_id: row.get(0)?,
                page_id: row.get(1)?,
                name: row.get(2)?,
                represents: row.get(3)?,
            })
        })?;
        let mut tokens = Vec::new();
        for row in rows {
            tokens.push(row?);
        }
        Ok(tokens)
    }

    fn try_character(&self, character_id: &str) -> Result<Option<CharacterRecord>, PersistenceError> {
        let row = self
            .conn
            .query_row(
                "SELECT character_id, name, controlled_by_json FROM characters
                 WHERE character_id = ?1",
                params![character_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((character_id, name, controlled_by_json)) = row else {
            return Ok(None);
        };
        let controlled_by = serde_json::from_str(&controlled_by_json)?;
        Ok(Some(CharacterRecord {
            character_id,
            name,
            controlled_by,
        }))
    }

    fn try_attribute(&self, character_id: &str, name: &str) -> Result<Option<i64>, PersistenceError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM attributes WHERE character_id = ?1 AND name = ?2",
                params![character_id, name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn try_set_marker(&mut self, token_id: &str, marker: &str, on: bool) -> Result<(), PersistenceError> {
        if on {
            self.conn.execute(
                "INSERT OR IGNORE INTO markers (token_id, marker) VALUES (?1, ?2)",
                params![token_id, marker],
            )?;
        } else {
            self.conn.execute(
                "DELETE FROM markers WHERE token_id = ?1 AND marker = ?2",
                params![token_id, marker],
            )?;
        }
        Ok(())
    }

    fn try_turn_order(&self) -> Result<Option<Vec<TurnEntry>>, PersistenceError> {
        match self.campaign_value("turnorder")? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn try_set_turn_order(&mut self, entries: &[TurnEntry]) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(entries)?;
        self.set_campaign_value("turnorder", &raw)
    }

    fn try_send_chat(&mut self, speaker: &str, message: &str) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO chat_log (speaker, message) VALUES (?1, ?2)",
            params![speaker, message],
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn marker_set(&self, token_id: &str) -> Vec<String> {
        let mut statement = self
            .conn
            .prepare("SELECT marker FROM markers WHERE token_id = ?1 ORDER BY marker")
            .expect("prepare");
        let rows = statement
            .query_map(params![token_id], |row| row.get::<_, String>(0))
            .expect("query");
        rows.map(|row| row.expect("row")).collect()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng_state = self.rng_state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut value = self.rng_state;
        value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        value ^ (value >> 31)
    }
}

impl TabletopStore for SqliteCampaignStore {
    fn active_page(&self) -> String {
        match self.campaign_value("active_page") {
            Ok(Some(page_id)) => page_id,
            _ => "page_1".to_string(),
        }
    }

    fn tokens_on_page(&self, page_id: &str) -> Vec<TokenRecord> {
        self.try_tokens_on_page(page_id).unwrap_or_default()
    }

    fn character(&self, character_id: &str) -> Option<CharacterRecord> {
        self.try_character(character_id).ok().flatten()
    }

    fn attribute(&self, character_id: &str, name: &str) -> Option<i64> {
        self.try_attribute(character_id, name).ok().flatten()
    }

    fn set_marker(&mut self, token_id: &str, marker: &str, on: bool) {
        if let Err(err) = self.try_set_marker(token_id, marker, on) {
            self.record_error(err);
        }
    }

    fn roll_die(&mut self, sides: i64) -> i64 {
        let span = sides.max(1) as u64;
        1 + (self.next_u64() % span) as i64
    }

    fn turn_order(&self) -> Option<Vec<TurnEntry>> {
        self.try_turn_order().ok().flatten()
    }

    fn set_turn_order(&mut self, entries: &[TurnEntry]) {
        if let Err(err) = self.try_set_turn_order(entries) {
            self.record_error(err);
        }
    }

    fn send_chat(&mut self, speaker: &str, message: &str) {
        if let Err(err) = self.try_send_chat(speaker, message) {
            self.record_error(err);
        }
    }
}
