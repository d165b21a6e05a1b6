//! Reminder command handlers
//!
//! Handles: reminder, remind, in, at
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Free-form requests with target resolution and pronoun rewriting;
//!   list, examples, unset and nuke sub-commands
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::core::chat::{Command, RoomId, BULLET, RIGHTWARDS_ARROW};
use crate::features::reminders::record::{ReminderError, ReminderRecord};
use crate::features::reminders::time_parser::{self, DueTime};
use crate::features::reminders::{compose, target, PronounRewriter};

const LIST_TIME_FORMAT: &str = "%A, %d %B %Y %H:%M (UTC)";

/// Greedy: the last ` in ` or ` at ` separates the text from the time
fn reminder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^(.*)\s+(?:in|at)\s+(.*)$").expect("valid reminder regex"))
}

fn usage(prefix: &str) -> String {
    format!(
        "Usage: `{prefix}reminder [ examples | list | <text> [ at <time> | in <delay> ] | unset <id> ]` Try `{prefix}reminder examples`"
    )
}

fn examples(prefix: &str) -> String {
    [
        "Examples: ".to_string(),
        format!("{BULLET} {prefix}reminder foo at 18:00 "),
        format!("{BULLET} With timezone: (ie. UTC-3) {prefix}reminder foo at 18:00-3:00 "),
        format!("{BULLET} {prefix}at 22:00 Grab a beer! "),
        format!("{BULLET} {prefix}reminder do something in 2 hours "),
        format!("{BULLET} {prefix}remind me to grab a beer in 2 hours "),
        format!("{BULLET} {prefix}remind everyone that strpbrk is a thing... in 12 hours "),
        format!("{BULLET} {prefix}remind @anAdmin to unpin that last xkcd in 2 days"),
        format!("{BULLET} {prefix}remind yourself that you are a bot... in 5 secs"),
        format!("{BULLET} {prefix}in 2 days 42 hours 42 minutes 42 seconds 42! "),
        format!("{BULLET} {prefix}reminder unset 32901146 "),
        format!("{BULLET} {prefix}reminder list "),
    ]
    .join("\n")
}

/// A request that parsed but has not been timed yet
struct Draft {
    for_token: String,
    target: String,
    text: String,
    expression: String,
}

/// Handler for reminder-related commands
pub struct RemindHandler;

#[async_trait]
impl CommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["reminder", "remind", "in", "at"]
    }

    async fn handle(&self, ctx: Arc<CommandContext>, command: &Command) -> Result<()> {
        if !command.has_parameters() {
            return ctx.say(command.room, &usage(&ctx.config.command_prefix)).await;
        }

        if matches!(command.name.as_str(), "in" | "at") {
            return self.handle_set(&ctx, command).await;
        }

        if command.parameters.len() == 1 {
            match command.parameter(0) {
                Some("list") => return self.handle_list(&ctx, command).await,
                Some("examples") => {
                    return ctx
                        .say(command.room, &examples(&ctx.config.command_prefix))
                        .await
                }
                Some("nuke") => return self.handle_nuke(&ctx, command).await,
                _ => {}
            }
        }

        if command.parameter(0) == Some("unset") && command.parameters.len() == 2 {
            return self.handle_unset(&ctx, command).await;
        }

        self.handle_set(&ctx, command).await
    }

    async fn enable_for_room(&self, ctx: Arc<CommandContext>, room: RoomId) -> Result<()> {
        ctx.scheduler.activate_room(room).await?;
        Ok(())
    }

    async fn disable_for_room(&self, ctx: Arc<CommandContext>, room: RoomId) -> Result<()> {
        ctx.scheduler.deactivate_room(room);
        Ok(())
    }
}

impl RemindHandler {
    /// Parse, compose, persist and arm a reminder
    async fn handle_set(&self, ctx: &CommandContext, command: &Command) -> Result<()> {
        let now = Utc::now();
        let outcome = match self.prepare(ctx, command, now).await {
            Ok(record) => ctx.scheduler.schedule(record, now).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => ctx.say(command.room, "Reminder set.").await,
            Err(error) => self.report(ctx, command, error).await,
        }
    }

    async fn report(&self, ctx: &CommandContext, command: &Command, error: ReminderError) -> Result<()> {
        debug!(
            "Reminder request {} from {} rejected: {error:?}",
            command.id, command.username
        );
        let text = match error {
            ReminderError::MissingText | ReminderError::Usage => usage(&ctx.config.command_prefix),
            ref other => other.to_string(),
        };

        if error.is_reply() {
            ctx.reply(command, &text).await
        } else {
            ctx.say(command.room, &text).await
        }
    }

    async fn prepare(
        &self,
        ctx: &CommandContext,
        command: &Command,
        now: DateTime<Utc>,
    ) -> Result<ReminderRecord, ReminderError> {
        let draft = match command.name.as_str() {
            "in" => Self::draft_in(command)?,
            "at" => Self::draft_at(command)?,
            _ => self.draft_reminder(ctx, command).await?,
        };

        let due = match time_parser::resolve(&draft.expression, now) {
            Some(DueTime::Future(due)) => due,
            Some(DueTime::Past(_)) => return Err(ReminderError::AlreadyPast { text: draft.text }),
            None => return Err(ReminderError::ParseFailure),
        };

        Ok(ReminderRecord {
            id: command.id.clone(),
            room_id: command.room,
            for_token: draft.for_token,
            target: draft.target,
            text: draft.text,
            delay: draft.expression,
            user_id: command.user_id,
            username: command.username.clone(),
            timestamp: due.timestamp(),
        })
    }

    /// `in <interval> <text>`
    fn draft_in(command: &Command) -> Result<Draft, ReminderError> {
        let (interval, trailing) =
            time_parser::parse_relative(&command.text()).ok_or(ReminderError::ParseFailure)?;
        if trailing.trim().is_empty() {
            return Err(ReminderError::MissingText);
        }

        Ok(Draft {
            for_token: String::new(),
            target: command.username.clone(),
            text: trailing,
            expression: interval,
        })
    }

    /// `at <HH:MM[±HH:MM]> <text>`
    fn draft_at(command: &Command) -> Result<Draft, ReminderError> {
        let time = command.parameter(0).ok_or(ReminderError::ParseFailure)?;
        if time_parser::parse_absolute(time).is_none() {
            return Err(ReminderError::ParseFailure);
        }

        let text = command
            .parameters
            .iter()
            .filter(|word| word.as_str() != time)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(ReminderError::MissingText);
        }

        Ok(Draft {
            for_token: String::new(),
            target: command.username.clone(),
            text,
            expression: time.to_string(),
        })
    }

    /// `reminder <target?> <text> (in|at) <time>`
    async fn draft_reminder(
        &self,
        ctx: &CommandContext,
        command: &Command,
    ) -> Result<Draft, ReminderError> {
        let parameters = command.text();
        let caps = reminder_regex()
            .captures(&parameters)
            .ok_or(ReminderError::Usage)?;
        let request = caps.get(1).map_or("", |m| m.as_str());
        let expression = caps.get(2).map_or("", |m| m.as_str());
        if expression.trim().is_empty() {
            return Err(ReminderError::ParseFailure);
        }
        if request.trim().is_empty() {
            return Err(ReminderError::MissingText);
        }

        let set_by = command.username.as_str();
        let first = command.parameter(0).unwrap_or_default();
        let resolution = target::resolve(first, request, set_by);
        if resolution.message.trim().is_empty() {
            return Err(ReminderError::MissingText);
        }

        if !target::classify(first).is_self_service()
            && !resolution.target.eq_ignore_ascii_case(set_by)
            && !ctx.is_admin(command).await
        {
            info!(
                "Refused reminder for {} set by non-admin {set_by} in room {}",
                resolution.target, command.room
            );
            return Err(ReminderError::Unauthorized(
                "Only an admin can set a reminder for someone else.",
            ));
        }

        let tokens = ctx.tagger.tag(&resolution.message);
        if tokens.is_empty() {
            return Err(ReminderError::Untaggable);
        }

        let rewritten = PronounRewriter::new(ctx.tagger.as_ref()).rewrite(
            &resolution.message,
            &tokens,
            &resolution.target,
            set_by,
        );
        let text = {
            let mut rng = ctx.rng.lock().await;
            compose(&resolution.target, &rewritten, set_by, &mut *rng)
        };

        Ok(Draft {
            for_token: first.to_string(),
            target: resolution.target,
            text,
            expression: time_parser::normalize(expression),
        })
    }

    async fn handle_list(&self, ctx: &CommandContext, command: &Command) -> Result<()> {
        let now = Utc::now();
        let pending = ctx.scheduler.pending(command.room, now).await?;
        if pending.is_empty() {
            return ctx
                .say(command.room, "There aren't any scheduled reminders.")
                .await;
        }

        let mut message = "Registered reminders are:".to_string();
        for record in &pending {
            let due = DateTime::from_timestamp(record.timestamp, 0)
                .map(|due| due.format(LIST_TIME_FORMAT).to_string())
                .unwrap_or_default();
            message.push_str(&format!(
                "\n{BULLET} {} {RIGHTWARDS_ARROW} Id: :{} {RIGHTWARDS_ARROW} {due} - Set by {} - Seconds left: {}",
                record.text,
                record.id,
                record.username,
                record.seconds_left(now.timestamp())
            ));
        }

        ctx.say(command.room, &message).await
    }

    async fn handle_unset(&self, ctx: &CommandContext, command: &Command) -> Result<()> {
        if !ctx.is_admin(command).await {
            let error = ReminderError::Unauthorized("Only an admin can unset a reminder.");
            return self.report(ctx, command, error).await;
        }

        let id = command.parameter(1).unwrap_or_default();
        if ctx.scheduler.unset(command.room, id).await? {
            ctx.say(command.room, "Reminder unset.").await
        } else {
            self.report(ctx, command, ReminderError::NotFound).await
        }
    }

    async fn handle_nuke(&self, ctx: &CommandContext, command: &Command) -> Result<()> {
        if !ctx.is_admin(command).await {
            let error = ReminderError::Unauthorized("Only an admin can nuke the reminders.");
            return self.report(ctx, command, error).await;
        }

        ctx.scheduler.nuke(command.room).await?;
        ctx.say(command.room, "Reminders are gone.").await
    }
}
