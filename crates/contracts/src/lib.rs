//! Cross-boundary contracts shared by the kernel, API, persistence, and clients.

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Operator-facing settings. Loaded and saved by the API layer and passed
/// into every kernel operation by reference; the kernel keeps no ambient copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub schema_version: String,
    /// Cluster tokens that share a name and represented character.
    #[serde(default)]
    pub group: bool,
    /// Dispatch rolls through the chat channel instead of rolling directly.
    #[serde(default)]
    pub output: bool,
    /// Include player-controlled tokens in the rebuild pass.
    #[serde(default)]
    pub players: bool,
    /// Master switch for the open-visibility rebuild pass.
    #[serde(default)]
    pub enable: bool,
    /// Upper bound on group size; `None` disables subdivision.
    #[serde(default)]
    pub max_per_group: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            group: false,
            output: false,
            players: false,
            enable: false,
            max_per_group: None,
        }
    }
}

/// A placed game-piece as the host platform reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub token_id: String,
    pub name: String,
    /// Represented character id, when the token stands for a character.
    pub represents: Option<String>,
    pub page_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterRecord {
    pub character_id: String,
    pub name: String,
    /// Player ids controlling this character; empty means GM-only.
    #[serde(default)]
    pub controlled_by: Vec<String>,
}

impl CharacterRecord {
    pub fn is_player_controlled(&self) -> bool {
        !self.controlled_by.is_empty()
    }
}

/// One row of the turn queue, wire-compatible with the host platform's
/// turn-order structure (hence the `_pageid` field name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnEntry {
    pub id: String,
    pub pr: i64,
    #[serde(default)]
    pub custom: String,
    #[serde(rename = "_pageid")]
    pub page_id: String,
}

impl TurnEntry {
    pub fn new(id: impl Into<String>, pr: i64, page_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pr,
            custom: String::new(),
            page_id: page_id.into(),
        }
    }
}

/// A resolved inline roll carried by a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineRoll {
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMessageKind {
    /// A bang-prefixed command addressed at an installed script.
    Api,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub who: String,
    pub kind: ChatMessageKind,
    pub content: String,
    #[serde(default)]
    pub roll_template: Option<String>,
    #[serde(default)]
    pub inline_rolls: Vec<InlineRoll>,
}

impl ChatMessage {
    pub fn api(who: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            who: who.into(),
            kind: ChatMessageKind::Api,
            content: content.into(),
            roll_template: None,
            inline_rolls: Vec::new(),
        }
    }

    pub fn general(who: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            who: who.into(),
            kind: ChatMessageKind::General,
            content: content.into(),
            roll_template: None,
            inline_rolls: Vec::new(),
        }
    }
}

/// Inbound stimuli handled to completion one at a time by the kernel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    Chat(ChatMessage),
    TurnOrderVisibility {
        open: bool,
        /// Queue value the platform held just before this transition;
        /// carried so a close can be snapshotted for recovery.
        #[serde(default)]
        previous_queue: Option<Vec<TurnEntry>>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOption {
    Group,
    Output,
    Players,
    Enable,
}

impl ToggleOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Output => "output",
            Self::Players => "players",
            Self::Enable => "enable",
        }
    }

    /// Human label used in command confirmations.
    pub fn label(self) -> &'static str {
        match self {
            Self::Group => "Group Tokens",
            Self::Output => "Send to Chat",
            Self::Players => "Roll for Players",
            Self::Enable => "Initiative Automation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    Toggle {
        option: ToggleOption,
        value: bool,
    },
    SetMaxPerGroup {
        /// `None` disables the group size cap.
        limit: Option<u32>,
    },
    ClearMarkers,
    RecoverTurnOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutcome {
    pub schema_version: String,
    pub accepted: bool,
    pub detail: String,
}

impl CommandOutcome {
    pub fn accepted(detail: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            accepted: true,
            detail: detail.into(),
        }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            accepted: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCommand,
    InvalidEvent,
    CampaignUnavailable,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}
