//! Chat commands: `!tick`, `!nexttick`, `!tickchannel` and `!help`

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::fetcher::TickFetcher;
use crate::formatter::{describe_tick, estimate_next_tick};
use crate::notifier::{color, Embed};
use crate::state::StateHandle;

/// Prefix that marks a chat message as a command
pub const COMMAND_PREFIX: char = '!';

/// A command understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tick,
    NextTick,
    TickChannel,
    Help,
}

impl Command {
    /// Parse a chat message. Only the first word counts and must match exactly.
    pub fn parse(message: &str) -> Option<Self> {
        let word = message.trim_start().strip_prefix(COMMAND_PREFIX)?;
        let word = word.split_whitespace().next()?;
        match word {
            "tick" => Some(Command::Tick),
            "nexttick" => Some(Command::NextTick),
            "tickchannel" => Some(Command::TickChannel),
            "help" => Some(Command::Help),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Tick => "tick",
            Command::NextTick => "nexttick",
            Command::TickChannel => "tickchannel",
            Command::Help => "help",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Command::Tick => "Display the last Elite Dangerous galaxy tick",
            Command::NextTick => "Estimate when the next tick might occur",
            Command::TickChannel => "Set the channel for tick notifications (Admin only)",
            Command::Help => "Show this message",
        }
    }

    pub const ALL: [Command; 4] = [
        Command::Tick,
        Command::NextTick,
        Command::TickChannel,
        Command::Help,
    ];
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COMMAND_PREFIX, self.name())
    }
}

/// Where a command was invoked from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub channel_id: u64,
    pub channel_name: Option<String>,
    pub is_admin: bool,
}

/// What to send back to the invoking channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Text { text: String },
    Embed { embed: Embed },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text { text: text.into() }
    }
}

/// Executes commands against the tick fetcher and shared state
#[derive(Debug, Clone)]
pub struct CommandHandler {
    fetcher: Arc<dyn TickFetcher>,
    state: StateHandle,
    footer: String,
}

impl CommandHandler {
    pub fn new(
        fetcher: Arc<dyn TickFetcher>,
        state: StateHandle,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            state,
            footer: footer.into(),
        }
    }

    /// Run a command.
    ///
    /// Fetch problems come back as user-facing replies; only a privilege
    /// violation is an error.
    pub async fn execute(&self, command: Command, ctx: &CommandContext) -> crate::Result<Reply> {
        tracing::debug!("Executing {} from channel {}", command, ctx.channel_id);
        match command {
            Command::Tick => Ok(self.tick().await),
            Command::NextTick => Ok(self.next_tick().await),
            Command::TickChannel => self.set_tick_channel(ctx).await,
            Command::Help => Ok(help_reply()),
        }
    }

    /// Parse and run a chat message; `None` if it is not a command.
    ///
    /// Entry point for a chat gateway delivering raw message text.
    pub async fn handle_message(&self, message: &str, ctx: &CommandContext) -> Option<Reply> {
        let command = Command::parse(message)?;
        Some(match self.execute(command, ctx).await {
            Ok(reply) => reply,
            Err(crate::GaltickError::Privilege(_)) => {
                Reply::text("❌ You need Administrator permission to use this command.")
            }
            Err(e) => Reply::text(format!("❌ {}", e)),
        })
    }

    pub async fn tick(&self) -> Reply {
        match self.fetcher.fetch().await {
            Ok(Some(tick)) => Reply::Embed {
                embed: Embed::new(
                    "🌌 Elite Dangerous Galaxy Tick",
                    describe_tick(Some(&tick), Utc::now()),
                    color::BLUE,
                )
                .with_footer(self.footer.as_str()),
            },
            Ok(None) => Reply::text("❌ Unable to fetch tick data. Please try again later."),
            Err(e) => {
                tracing::warn!("Error fetching tick: {}", e);
                Reply::text("❌ Unable to fetch tick data. Please try again later.")
            }
        }
    }

    pub async fn next_tick(&self) -> Reply {
        let tick = match self.fetcher.fetch().await {
            Ok(Some(tick)) => tick,
            Ok(None) => return Reply::text("❌ Unable to fetch tick data."),
            Err(e) => {
                tracing::warn!("Error fetching tick: {}", e);
                return Reply::text("❌ Unable to fetch tick data.");
            }
        };

        match estimate_next_tick(&tick, Utc::now()) {
            Ok(estimate) => Reply::Embed {
                embed: Embed::new("⏰ Next Tick Estimate", estimate.render(), color::ORANGE),
            },
            Err(e) => Reply::text(format!("❌ Error calculating next tick: {}", e)),
        }
    }

    /// Point tick notifications at the invoking channel. Administrators only.
    pub async fn set_tick_channel(&self, ctx: &CommandContext) -> crate::Result<Reply> {
        if !ctx.is_admin {
            tracing::warn!(
                "Rejected {} from non-administrator in channel {}",
                Command::TickChannel,
                ctx.channel_id
            );
            return Err(crate::GaltickError::Privilege(format!(
                "{} requires administrator",
                Command::TickChannel
            )));
        }

        if ctx.channel_id == 0 {
            return Err(crate::GaltickError::Config(
                "channel ID 0 is not a channel".to_string(),
            ));
        }

        self.state.write().await.set_channel_id(Some(ctx.channel_id));
        tracing::info!(
            "Tick channel set to: {} (ID: {})",
            ctx.channel_name.as_deref().unwrap_or("unnamed"),
            ctx.channel_id
        );

        Ok(Reply::text(format!(
            "✅ This channel will now receive tick notifications!\nChannel ID: {}",
            ctx.channel_id
        )))
    }
}

fn help_reply() -> Reply {
    let lines: Vec<String> = Command::ALL
        .iter()
        .map(|c| format!("`{}` - {}", c, c.help()))
        .collect();
    Reply::text(lines.join("\n"))
}
