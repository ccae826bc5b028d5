use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Ask one of the suggested follow-up questions
    Follow,
    /// Clear the conversation here and on the server
    Reset,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Zero-based `(turn, suggestion)` from a 1-based `<turn> <n>` or `<turn>.<n>` argument
    pub fn follow_target(&self) -> Option<(usize, usize)> {
        if self.command != SlashCommand::Follow {
            return None;
        }

        let arg = self.argument()?;
        let mut parts = arg
            .split(|c: char| c.is_whitespace() || c == '.' || c == ':')
            .filter(|part| !part.is_empty());
        let turn: usize = parts.next()?.parse().ok()?;
        let suggestion: usize = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some((turn.checked_sub(1)?, suggestion.checked_sub(1)?))
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Follow => "ask a suggested follow-up: /follow <turn> <n>",
            SlashCommand::Reset => "clear the conversation and the server session",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can be run while a question is in flight.
    pub fn available_while_loading(self) -> bool {
        match self {
            SlashCommand::Help | SlashCommand::Quit => true,
            SlashCommand::Follow | SlashCommand::Reset => false,
        }
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim_start();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let args: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "f" | "ask" => Some(SlashCommand::Follow),
            "clear" | "new" => Some(SlashCommand::Reset),
            "h" | "?" => Some(SlashCommand::Help),
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            _ => None,
        })?;

    let argument = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /f for /follow, /clear for /reset, /q for /quit.");
    help.push_str("\nKeys: Enter sends, PgUp/PgDn scroll, Ctrl+L resets, Ctrl+C quits.");

    help
}
