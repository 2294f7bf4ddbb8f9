use std::str::FromStr;

use crate::theme::AccentColor;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Pick an accent color, or cycle to the next one
    Accent,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
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
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Color named by `/accent <name>`, if any
    pub fn accent_target(&self) -> Option<AccentColor> {
        if self.command != SlashCommand::Accent {
            return None;
        }

        AccentColor::from_str(self.argument()?.trim()).ok()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Accent => "set the accent color (indigo, purple, blue, emerald, rose)",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let body = input.strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "h" | "?" => Some(SlashCommand::Help),
        "color" | "theme" => Some(SlashCommand::Accent),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Help lines for all commands and key bindings
pub fn help_lines() -> Vec<String> {
    let mut help: Vec<String> = SlashCommand::iter()
        .map(|command| format!("/{} - {}", command.command(), command.description()))
        .collect();

    help.push(String::new());
    help.push("Enter send · PgUp/PgDn scroll · F2 next accent".to_string());
    help.push("Esc close / quit · Ctrl+C quit · aliases: /q /exit /bye /color".to_string());
    help
}
