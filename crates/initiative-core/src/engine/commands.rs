use contracts::{CommandOutcome, CommandPayload, Settings, ToggleOption};

use super::InitiativeEngine;
use crate::markers::{MarkerAllocator, DEFAULT_MARKER_PALETTE};
use crate::store::TabletopStore;
use crate::SPEAKER;

impl InitiativeEngine {
    /// Apply one validated command. Accepted settings changes are confirmed
    /// with a whisper on the chat channel, mirroring how they were issued.
    pub fn apply_command(
        &mut self,
        store: &mut dyn TabletopStore,
        settings: &mut Settings,
        payload: CommandPayload,
    ) -> CommandOutcome {
        match payload {
            CommandPayload::Toggle { option, value } => {
                match option {
                    ToggleOption::Group => settings.group = value,
                    ToggleOption::Output => settings.output = value,
                    ToggleOption::Players => settings.players = value,
                    ToggleOption::Enable => settings.enable = value,
                }
                let detail = format!(
                    "{} {}",
                    option.label(),
                    if value { "Enabled" } else { "Disabled" }
                );
                store.send_chat(SPEAKER, &format!("/w gm {detail}"));
                CommandOutcome::accepted(detail)
            }
            CommandPayload::SetMaxPerGroup { limit } => {
                settings.max_per_group = limit;
                let detail = match limit {
                    Some(limit) => format!("Set Max Per Group to {limit}"),
                    None => "Disabled Max Per Group limit".to_string(),
                };
                store.send_chat(SPEAKER, &format!("/w gm {detail}"));
                CommandOutcome::accepted(detail)
            }
            CommandPayload::ClearMarkers => {
                let page = store.active_page();
                let tokens = store.tokens_on_page(&page);
                MarkerAllocator::new(&DEFAULT_MARKER_PALETTE).clear_all(store, &tokens);
                CommandOutcome::accepted(format!("Cleared markers on {} tokens", tokens.len()))
            }
            CommandPayload::RecoverTurnOrder => match self.prev_turn_order.as_ref() {
                Some(previous) => {
                    store.set_turn_order(previous);
                    CommandOutcome::accepted("Restored last closed turn order")
                }
                // Nothing cached yet: a quiet no-op, not an error.
                None => CommandOutcome::accepted("No turn order snapshot to restore"),
            },
        }
    }
}
