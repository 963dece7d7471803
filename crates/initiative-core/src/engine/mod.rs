//! Event-driven engine: turn-order visibility transitions and chat handling.

mod commands;
mod ingest;

pub use ingest::{parse_roll_result, IngestError, RollResult};

use contracts::{
    ChatMessage, ChatMessageKind, CommandOutcome, PlatformEvent, Settings, TokenRecord, TurnEntry,
};

use crate::commands::{parse_command_line, COMMAND_WORD, USAGE};
use crate::groups::build_groups;
use crate::markers::{MarkerAllocator, DEFAULT_MARKER_PALETTE};
use crate::roller::roll_initiative;
use crate::store::TabletopStore;
use crate::{turn_order, ROLL_TEMPLATE, SPEAKER};

/// The initiative state machine. Holds only the volatile last-closed-queue
/// snapshot; everything else lives in the platform store, and settings are
/// passed in per operation.
#[derive(Debug, Default)]
pub struct InitiativeEngine {
    prev_turn_order: Option<Vec<TurnEntry>>,
}

impl InitiativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one inbound stimulus to completion. Returns the outcomes of any
    /// commands the stimulus carried (empty for non-command events).
    pub fn handle_event(
        &mut self,
        store: &mut dyn TabletopStore,
        settings: &mut Settings,
        event: PlatformEvent,
    ) -> Vec<CommandOutcome> {
        match event {
            PlatformEvent::Chat(message) => self.handle_chat(store, settings, message),
            PlatformEvent::TurnOrderVisibility {
                open,
                previous_queue,
            } => {
                self.handle_visibility(store, settings, open, previous_queue);
                Vec::new()
            }
        }
    }

    /// Closed→Open rebuilds the queue (when enabled); Open→Closed snapshots
    /// the queue value the platform held just before closing.
    fn handle_visibility(
        &mut self,
        store: &mut dyn TabletopStore,
        settings: &Settings,
        open: bool,
        previous_queue: Option<Vec<TurnEntry>>,
    ) {
        if !settings.enable {
            return;
        }
        if !open {
            self.prev_turn_order = previous_queue;
            return;
        }

        store.set_turn_order(&[]);

        let page = store.active_page();
        let tokens = eligible_tokens(store, settings, &page);
        let allocator = MarkerAllocator::new(&DEFAULT_MARKER_PALETTE);
        let groups = build_groups(
            store,
            &tokens,
            settings.group,
            settings.max_per_group,
            &allocator,
        );

        let mut pending = Vec::new();
        for members in groups.values() {
            let Some(representative) = members.first() else {
                continue;
            };
            if let Err(err) = roll_initiative(store, settings.output, representative, &mut pending)
            {
                // Skip the group, keep the pass going.
                store.send_chat(SPEAKER, &format!("/w gm {err}"));
            }
        }

        // Chat-output rolls re-enter through ingestion; direct rolls land now.
        if !settings.output {
            turn_order::append(store, pending);
        }
    }

    fn handle_chat(
        &mut self,
        store: &mut dyn TabletopStore,
        settings: &mut Settings,
        message: ChatMessage,
    ) -> Vec<CommandOutcome> {
        if message.who == SPEAKER && message.roll_template.as_deref() == Some(ROLL_TEMPLATE) {
            // Malformed results abort this message only.
            if let Ok(result) = parse_roll_result(&message) {
                turn_order::ingest_async_result(
                    store,
                    &result.token_id,
                    &result.page_id,
                    result.total,
                );
            }
            return Vec::new();
        }

        if message.kind != ChatMessageKind::Api
            || !message.content.trim_start().starts_with(COMMAND_WORD)
        {
            return Vec::new();
        }

        match parse_command_line(message.content.trim()) {
            Ok(payloads) if payloads.is_empty() => {
                store.send_chat(SPEAKER, &format!("/w gm {USAGE}"));
                Vec::new()
            }
            Ok(payloads) => payloads
                .into_iter()
                .map(|payload| self.apply_command(store, settings, payload))
                .collect(),
            Err(err) => {
                store.send_chat(SPEAKER, &format!("/w gm {err}\n{USAGE}"));
                vec![CommandOutcome::rejected(err.message)]
            }
        }
    }

    /// Queue value cached at the last Open→Closed transition, if any.
    pub fn snapshot(&self) -> Option<&[TurnEntry]> {
        self.prev_turn_order.as_deref()
    }
}

/// Tokens on the page that resolve to a character, with player-controlled
/// characters filtered out unless the `players` setting includes them.
fn eligible_tokens(
    store: &dyn TabletopStore,
    settings: &Settings,
    page_id: &str,
) -> Vec<TokenRecord> {
    store
        .tokens_on_page(page_id)
        .into_iter()
        .filter(|token| {
            let Some(character) = token
                .represents
                .as_deref()
                .and_then(|id| store.character(id))
            else {
                return false;
            };
            settings.players || !character.is_player_controlled()
        })
        .collect()
}
