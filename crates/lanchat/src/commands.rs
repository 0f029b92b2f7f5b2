//! The command table: literal server queries and their answers.
//!
//! A client asks the server something by sending a ServerQuery whose
//! content is exactly one of the keys below (case-sensitive, no
//! wildcards). The table is a `static` slice, so it is fixed at compile
//! time and can never change while the server runs.
//!
//! Responders are plain `fn` pointers over a [`CommandContext`]: they read
//! the snapshot and clock they are handed and nothing else.

use chrono::{DateTime, Local};
use lanchat_protocol::{SIGN_OFF, SIGN_OFF_HELP};
use rand::seq::IndexedRandom;

/// What a responder is allowed to look at.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Nicknames of everyone in the chat, in join order.
    pub roster: Vec<String>,
    /// The server's local time when the query was handled.
    pub now: DateTime<Local>,
}

impl CommandContext {
    /// Captures the current local time alongside a roster snapshot.
    pub fn new(roster: Vec<String>) -> Self {
        Self {
            roster,
            now: Local::now(),
        }
    }
}

/// Produces the reply text for a command.
pub type Responder = fn(&CommandContext) -> String;

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    /// The exact content a client must send.
    pub key: &'static str,
    /// Shown next to the key in the command list.
    pub help: &'static str,
    /// `None` for rows that only document client-side syntax.
    pub respond: Option<Responder>,
}

/// Every command the server understands, in the order they are listed.
pub static COMMANDS: &[Command] = &[
    Command {
        key: "Server.Commands?",
        help: "List all commands",
        respond: Some(list_commands),
    },
    Command {
        key: "Server.Who is in chat?",
        help: "List everyone in the chat",
        respond: Some(who_is_in_chat),
    },
    Command {
        key: "Server.How are you?",
        help: "Ask the server",
        respond: Some(how_are_you),
    },
    Command {
        key: "Server.Day?",
        help: "Ask the server",
        respond: Some(day),
    },
    Command {
        key: "Server.Date?",
        help: "Ask the server",
        respond: Some(date),
    },
    Command {
        key: "Server.Time?",
        help: "Ask the server",
        respond: Some(time),
    },
    Command {
        key: "Server.What are you doing?",
        help: "Ask the server",
        respond: Some(what_are_you_doing),
    },
    Command {
        key: "!<name>:...",
        help: "Private message '...' to user <name>",
        respond: None,
    },
];

const AFFAIRS: &[&str] = &[
    "Not bad, not great...",
    "All good...",
    "Been better, could be worse...",
    "Still ticking...",
    "Couldn't be better...",
    "Slowly but surely...",
    "No worse than yours...",
    "Thanks for asking...",
];

const BUSINESSES: &[&str] = &[
    "Goofing off...",
    "Watching you all type...",
    "Counting packets...",
    "Up to my ears in work...",
    "Working hard, not overworking...",
    "Keeping an eye on you...",
    "Mostly dropping frames, with breaks for tea...",
];

/// Finds the command whose key equals `content` exactly.
///
/// Rows without a responder are documentation only and are never matched.
pub fn lookup(content: &str) -> Option<&'static Command> {
    COMMANDS
        .iter()
        .find(|c| c.key == content && c.respond.is_some())
}

/// The full command list, one `key --> help` per line, sign-off included.
///
/// Starts with a newline so it can be appended to a greeting.
pub fn command_list() -> String {
    let mut out = String::new();
    for command in COMMANDS {
        out.push('\n');
        out.push_str(command.key);
        out.push_str(" --> ");
        out.push_str(command.help);
    }
    out.push('\n');
    out.push_str(SIGN_OFF);
    out.push_str(" --> ");
    out.push_str(SIGN_OFF_HELP);
    out
}

fn list_commands(_: &CommandContext) -> String {
    command_list()
}

fn who_is_in_chat(ctx: &CommandContext) -> String {
    ctx.roster.join("\n")
}

fn how_are_you(_: &CommandContext) -> String {
    pick(AFFAIRS)
}

fn what_are_you_doing(_: &CommandContext) -> String {
    pick(BUSINESSES)
}

fn day(ctx: &CommandContext) -> String {
    ctx.now.format("%A").to_string()
}

fn date(ctx: &CommandContext) -> String {
    ctx.now.format("%Y-%m-%d").to_string()
}

fn time(ctx: &CommandContext) -> String {
    ctx.now.format("%H:%M").to_string()
}

fn pick(replies: &[&str]) -> String {
    replies
        .choose(&mut rand::rng())
        .map(|s| (*s).to_string())
        .unwrap_or_default()
}
