//! Command-surface parser: `!initiative --option arg` argument groups.

use std::fmt;

use contracts::{CommandPayload, ToggleOption};

pub const COMMAND_WORD: &str = "!initiative";

pub const USAGE: &str = "Proper usage: !initiative --option arg\n\
Commands:\n\
  !initiative --recover            Restore last closed turn order.\n\
  !initiative --clear              Remove color token markers.\n\
Options:\n\
  --enable [true|false]            Enable or disable initiative automation.\n\
  --group [true|false]             Group matching tokens or roll individually.\n\
  --output [true|false]            Send rolls to chat.\n\
  --players [true|false]           Roll for player-controlled tokens.\n\
  --max [number|none]              Max tokens per group; oversized groups are\n\
                                   split into marker-tagged subgroups.";

/// Rejected input; carries the user-facing complaint. No state is mutated on
/// the way to this error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    pub message: String,
}

impl UsageError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UsageError {}

/// Parse one full command line into its payloads. A bare command word parses
/// to an empty payload list (the caller answers with usage text).
pub fn parse_command_line(content: &str) -> Result<Vec<CommandPayload>, UsageError> {
    let mut parts = content.split("--");
    let head = parts.next().unwrap_or("").trim();
    if head != COMMAND_WORD {
        return Err(UsageError::new(format!("unknown command '{head}'")));
    }

    let mut payloads = Vec::new();
    for arg in parts {
        let fields: Vec<&str> = arg.split_whitespace().collect();
        let payload = match fields.first().copied() {
            Some("group") => parse_toggle(ToggleOption::Group, &fields)?,
            Some("output") => parse_toggle(ToggleOption::Output, &fields)?,
            Some("players") => parse_toggle(ToggleOption::Players, &fields)?,
            Some("enable") => parse_toggle(ToggleOption::Enable, &fields)?,
            Some("max") => parse_max(&fields)?,
            Some("clear") => CommandPayload::ClearMarkers,
            Some("recover") => CommandPayload::RecoverTurnOrder,
            Some(other) => return Err(UsageError::new(format!("unknown option '{other}'"))),
            None => return Err(UsageError::new("empty option")),
        };
        payloads.push(payload);
    }
    Ok(payloads)
}

fn parse_toggle(option: ToggleOption, fields: &[&str]) -> Result<CommandPayload, UsageError> {
    match fields {
        [_, "true"] => Ok(CommandPayload::Toggle {
            option,
            value: true,
        }),
        [_, "false"] => Ok(CommandPayload::Toggle {
            option,
            value: false,
        }),
        _ => Err(UsageError::new(format!(
            "{} must be 'true' or 'false'",
            option.as_str()
        ))),
    }
}

fn parse_max(fields: &[&str]) -> Result<CommandPayload, UsageError> {
    let invalid = || UsageError::new("max must be a valid number greater than 1 or 'none'.");
    match fields {
        [_, "none"] => Ok(CommandPayload::SetMaxPerGroup { limit: None }),
        [_, raw] => {
            let limit = raw.parse::<u32>().map_err(|_| invalid())?;
            if limit < 2 {
                return Err(invalid());
            }
            Ok(CommandPayload::SetMaxPerGroup { limit: Some(limit) })
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_and_max_parse_together() {
        let payloads =
            parse_command_line("!initiative --group true --max 3").expect("well-formed line");
        assert_eq!(
            payloads,
            vec![
                CommandPayload::Toggle {
                    option: ToggleOption::Group,
                    value: true,
                },
                CommandPayload::SetMaxPerGroup { limit: Some(3) },
            ]
        );
    }

    #[test]
    fn bare_command_parses_to_no_payloads() {
        assert_eq!(parse_command_line("!initiative").expect("bare"), Vec::new());
    }

    #[test]
    fn non_boolean_toggle_value_is_rejected() {
        let err = parse_command_line("!initiative --enable yes").expect_err("bad toggle");
        assert_eq!(err.message, "enable must be 'true' or 'false'");
    }

    #[test]
    fn max_rejects_small_and_non_numeric_values() {
        for line in [
            "!initiative --max 1",
            "!initiative --max goblins",
            "!initiative --max",
        ] {
            let err = parse_command_line(line).expect_err("bad max");
            assert!(err.message.starts_with("max must be"));
        }
        assert_eq!(
            parse_command_line("!initiative --max none").expect("none clears"),
            vec![CommandPayload::SetMaxPerGroup { limit: None }]
        );
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(parse_command_line("!initiative --frobnicate").is_err());
        assert!(parse_command_line("!otherscript --group true").is_err());
    }
}
