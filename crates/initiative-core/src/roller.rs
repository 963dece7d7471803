//! One initiative roll per group, applied to the group's representative.

use std::fmt;

use contracts::{TokenRecord, TurnEntry};

use crate::store::TabletopStore;
use crate::{INITIATIVE_BONUS_ATTRIBUTE, INITIATIVE_DIE_SIDES, ROLL_TEMPLATE, SPEAKER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollError {
    /// The token's represented character could not be resolved.
    UnknownCharacter { token_id: String },
    /// The character sheet carries no initiative bonus.
    MissingAttribute {
        character: String,
        attribute: String,
    },
}

impl fmt::Display for RollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter { token_id } => {
                write!(f, "token {token_id} does not resolve to a character")
            }
            Self::MissingAttribute {
                character,
                attribute,
            } => write!(f, "no {attribute} attribute found for {character}"),
        }
    }
}

impl std::error::Error for RollError {}

/// Roll initiative for a group's representative token.
///
/// With chat output enabled, a formatted roll request carrying
/// `{{tokenId=...}}` and `{{page=...}}` correlation markers is dispatched on
/// the chat channel; the resolved result re-enters later through the
/// ingestion path and is not appended here. With chat output disabled, the
/// roll is sampled directly and one [`TurnEntry`] is pushed onto `pending`.
pub fn roll_initiative(
    store: &mut dyn TabletopStore,
    output_to_chat: bool,
    token: &TokenRecord,
    pending: &mut Vec<TurnEntry>,
) -> Result<(), RollError> {
    let unknown = || RollError::UnknownCharacter {
        token_id: token.token_id.clone(),
    };
    let character_id = token.represents.as_deref().ok_or_else(unknown)?;
    let character = store.character(character_id).ok_or_else(unknown)?;

    if output_to_chat {
        store.send_chat(SPEAKER, &roll_request(token, &character.name));
        return Ok(());
    }

    let bonus = store
        .attribute(character_id, INITIATIVE_BONUS_ATTRIBUTE)
        .ok_or_else(|| RollError::MissingAttribute {
            character: character.name.clone(),
            attribute: INITIATIVE_BONUS_ATTRIBUTE.to_string(),
        })?;
    let total = store.roll_die(INITIATIVE_DIE_SIDES) + bonus;
    pending.push(TurnEntry::new(&token.token_id, total, &token.page_id));
    Ok(())
}

/// Outgoing roll request. The tokenId/page pairs are the only correlation
/// mechanism the async channel is assumed to round-trip reliably.
fn roll_request(token: &TokenRecord, character_name: &str) -> String {
    format!(
        "&{{template:{ROLL_TEMPLATE}}} {{{{name={name}}}}} {{{{page={page}}}}} \
         {{{{tokenId={token_id}}}}} {{{{rname=^{{init}}}}}} \
         {{{{r1=[[1d20+[[@{{{name}|{attr}}}]]]]}}}} {{{{normal=1}}}} {{{{type=Initiative}}}}",
        name = character_name,
        page = token.page_id,
        token_id = token.token_id,
        attr = INITIATIVE_BONUS_ATTRIBUTE,
    )
}
