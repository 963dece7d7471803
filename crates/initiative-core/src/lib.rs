//! Initiative automation kernel: token grouping, subgroup marker allocation,
//! initiative rolling, and turn-order upkeep for a turn-based tabletop.
//!
//! The kernel is single-threaded and event-driven: the host dispatcher feeds
//! [`contracts::PlatformEvent`]s into [`InitiativeEngine::handle_event`], each
//! handled to completion before the next. All platform state (tokens,
//! characters, markers, the persisted turn queue, the chat channel, dice)
//! sits behind the [`store::TabletopStore`] trait.

pub mod commands;
pub mod engine;
pub mod groups;
pub mod markers;
pub mod roller;
pub mod store;
pub mod turn_order;

pub use engine::InitiativeEngine;
pub use store::{InMemoryStore, TabletopStore};

/// Speaker name the kernel announces itself as on the chat channel.
/// Roll results coming back are correlated by this name plus the roll template.
pub const SPEAKER: &str = "Initiative";

/// Roll template tag stamped on outgoing roll requests.
pub const ROLL_TEMPLATE: &str = "npc";

/// Character attribute holding the flat initiative bonus.
pub const INITIATIVE_BONUS_ATTRIBUTE: &str = "initiative_bonus";

/// The initiative die.
pub const INITIATIVE_DIE_SIDES: i64 = 20;
