use board_core::config::ConfigOverrides;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskboard", author, version, about = "Kanban-style task board", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in to the board
    ///
    /// Example: taskboard login intern@demo.com intern123 --remember
    Login {
        email: String,
        password: String,
        /// Keep the session across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Add a task to a column
    ///
    /// Example: taskboard add "Write spec" --priority high --due 2024-05-01 --tags "docs, q2"
    Add {
        title: Option<String>,
        /// Target column (defaults to the configured column, then "todo")
        #[arg(long)]
        column: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Change fields of a task
    ///
    /// Example: taskboard edit 3f9a1c2b7 --title "Write the spec" --clear-due
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: taskboard delete 3f9a1c2b7
    Delete {
        id: String,
        /// Column holding the task (looked up when omitted)
        #[arg(long)]
        column: Option<String>,
    },
    /// Move a task to a column and position
    ///
    /// Example: taskboard move 3f9a1c2b7 doing --index 0
    Move {
        id: String,
        column: String,
        /// Zero-based position in the target column (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Remove every task and the activity log
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the board, optionally filtered and sorted
    ///
    /// Example: taskboard list --search spec --priority high --sort-due
    List {
        /// Only show this column
        #[arg(long)]
        column: Option<String>,
        /// Case-insensitive title search
        #[arg(long, default_value = "")]
        search: String,
        /// all, low, medium or high
        #[arg(long, default_value = "all")]
        priority: String,
        /// Order by due date, undated tasks last
        #[arg(long)]
        sort_due: bool,
    },
    /// Show details of a task
    Show {
        id: String,
    },
    /// Show the activity log, newest first
    Log {
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Command {
    /// Commands that work without a signed-in user.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Logout | Self::Whoami)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    DefaultColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;
    let target = match key.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "default_column" | "column" => ConfigOverrideTarget::DefaultColumn,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::DefaultColumn => overrides.default_column = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits an interactive line into arguments. Double quotes group words;
/// inside quotes `\"` and `\\` escape.
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_quotes => escape = true,
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ch if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            ch => current.push(ch),
        }
    }

    if in_quotes {
        return Err("unterminated quote in command".to_string());
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

/// Comma-separated tag list as typed by a user.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, collect_overrides, parse_config_override,
        split_command_line, split_tags,
    };
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Default-Column = doing ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::DefaultColumn);
        assert_eq!(parsed.value, "doing");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("colour=red").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_overrides_keeps_last_value() {
        let overrides = collect_overrides(&[
            "theme=noir".to_string(),
            "column=done".to_string(),
            "theme=solarized".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("solarized"));
        assert_eq!(overrides.default_column.as_deref(), Some("done"));
    }

    #[test]
    fn split_command_line_honours_quotes() {
        let args = split_command_line(r#"add "Write \"the\" spec" --tags "a, b""#).unwrap();
        assert_eq!(args, vec!["add", "Write \"the\" spec", "--tags", "a, b"]);
    }

    #[test]
    fn split_command_line_keeps_empty_quoted_argument() {
        let args = split_command_line(r#"list --search """#).unwrap();
        assert_eq!(args, vec!["list", "--search", ""]);
    }

    #[test]
    fn split_command_line_rejects_open_quote() {
        assert!(split_command_line("add \"oops").is_err());
    }

    #[test]
    fn split_tags_trims_and_drops_blanks() {
        assert_eq!(split_tags(" ui, ,api,ui "), vec!["ui", "api", "ui"]);
    }

    #[test]
    fn board_commands_require_login() {
        let cli = Cli::try_parse_from(["taskboard", "move", "abc", "doing", "--index", "2"]).unwrap();
        assert!(!cli.command.is_public());
        match cli.command {
            Command::Move { id, column, index } => {
                assert_eq!(id, "abc");
                assert_eq!(column, "doing");
                assert_eq!(index, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["taskboard", "whoami"]).unwrap();
        assert!(cli.command.is_public());
    }
}
