//! Parsing of asynchronously resolved roll results off the chat channel.

use std::fmt;

use contracts::ChatMessage;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{tokenId=(.*?)\}\}").expect("valid tokenId regex"));
static PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{page=(.*?)\}\}").expect("valid page regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollResult {
    pub token_id: String,
    pub page_id: String,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestError {
    MissingTokenId,
    MissingPage,
    MissingResult,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTokenId => write!(f, "roll result carries no tokenId marker"),
            Self::MissingPage => write!(f, "roll result carries no page marker"),
            Self::MissingResult => write!(f, "roll result carries no resolved total"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Extract the correlation markers and the resolved total from a roll-result
/// message. Any missing piece is a fatal parse error for that message only.
pub fn parse_roll_result(message: &ChatMessage) -> Result<RollResult, IngestError> {
    let token_id = capture(&TOKEN_ID_RE, &message.content).ok_or(IngestError::MissingTokenId)?;
    let page_id = capture(&PAGE_RE, &message.content).ok_or(IngestError::MissingPage)?;
    // Slot 0 is the nested bonus sub-roll; the outer total sits at slot 1.
    let total = message
        .inline_rolls
        .get(1)
        .map(|roll| roll.total)
        .ok_or(IngestError::MissingResult)?;
    Ok(RollResult {
        token_id,
        page_id,
        total,
    })
}

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
