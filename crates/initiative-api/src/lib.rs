//! In-process API facade: wires the initiative engine to a persisted
//! campaign store and keeps settings saved across operations.

mod persistence;
mod server;

use std::path::Path;

use contracts::{
    CharacterRecord, CommandOutcome, CommandPayload, PlatformEvent, Settings, TokenRecord,
    TurnEntry,
};
use initiative_core::InitiativeEngine;

pub use persistence::{PersistenceError, SqliteCampaignStore};
pub use server::{serve, ServerError};

#[derive(Debug)]
pub struct CampaignApi {
    engine: InitiativeEngine,
    store: SqliteCampaignStore,
    settings: Settings,
}

impl CampaignApi {
    pub fn open(path: impl AsRef<Path>, seed: u64) -> Result<Self, PersistenceError> {
        Self::with_store(SqliteCampaignStore::open(path, seed)?)
    }

    pub fn open_in_memory(seed: u64) -> Result<Self, PersistenceError> {
        Self::with_store(SqliteCampaignStore::open_in_memory(seed)?)
    }

    fn with_store(store: SqliteCampaignStore) -> Result<Self, PersistenceError> {
        let settings = store.load_settings()?;
        Ok(Self {
            engine: InitiativeEngine::new(),
            store,
            settings,
        })
    }

    /// Dispatch one inbound platform event through the engine, then persist
    /// any settings the event's commands changed.
    pub fn handle_event(
        &mut self,
        event: PlatformEvent,
    ) -> Result<Vec<CommandOutcome>, PersistenceError> {
        let outcomes = self
            .engine
            .handle_event(&mut self.store, &mut self.settings, event);
        if outcomes.iter().any(|outcome| outcome.accepted) {
            self.store.save_settings(&self.settings)?;
        }
        self.surface_store_error();
        Ok(outcomes)
    }

    /// Apply one already-validated command (the HTTP command route).
    pub fn apply_command(
        &mut self,
        payload: CommandPayload,
    ) -> Result<CommandOutcome, PersistenceError> {
        let outcome = self
            .engine
            .apply_command(&mut self.store, &mut self.settings, payload);
        if outcome.accepted {
            self.store.save_settings(&self.settings)?;
        }
        self.surface_store_error();
        tracing::info!(accepted = outcome.accepted, detail = %outcome.detail, "command applied");
        Ok(outcome)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn turn_order(&self) -> Option<Vec<TurnEntry>> {
        use initiative_core::TabletopStore;
        self.store.turn_order()
    }

    pub fn upsert_token(&mut self, token: &TokenRecord) -> Result<(), PersistenceError> {
        self.store.upsert_token(token)
    }

    pub fn upsert_character(
        &mut self,
        character: &CharacterRecord,
        attributes: &[(String, i64)],
    ) -> Result<(), PersistenceError> {
        self.store.upsert_character(character)?;
        for (name, value) in attributes {
            self.store
                .set_attribute(&character.character_id, name, *value)?;
        }
        Ok(())
    }

    pub fn set_active_page(&mut self, page_id: &str) -> Result<(), PersistenceError> {
        self.store.set_active_page(page_id)
    }

    pub fn chat_lines(&self) -> Result<Vec<(String, String)>, PersistenceError> {
        self.store.chat_lines()
    }

    fn surface_store_error(&mut self) {
        if let Some(message) = self.store.take_last_error() {
            tracing::warn!(%message, "campaign store degraded during event handling");
        }
    }
}
