use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use nudge::commands::{default_registry, CommandContext, CommandRegistry};
use nudge::core::{Command, Config, Delivery, RoomId, StaticAdmins};
use nudge::database::Database;
use nudge::LexiconTagger;

/// Delivery that prints to stdout
struct ConsoleDelivery {
    bot_name: String,
}

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn post_message(&self, room: RoomId, text: &str, allow_pings: bool) -> Result<()> {
        let pings = if allow_pings { " (pings)" } else { "" };
        println!("[{room}] {}{pings}: {text}", self.bot_name);
        Ok(())
    }

    async fn post_reply(&self, room: RoomId, reply_to: &str, text: &str) -> Result<()> {
        println!("[{room}] {} ↪ #{reply_to}: {text}", self.bot_name);
        Ok(())
    }
}

/// One input line: `<room> <user_id> <username>: <text>`
struct ChatLine {
    room: RoomId,
    user_id: u64,
    username: String,
    text: String,
}

fn parse_line(line: &str) -> Option<ChatLine> {
    let (header, text) = line.split_once(':')?;
    let mut parts = header.split_whitespace();
    let room = parts.next()?.parse().ok()?;
    let user_id = parts.next()?.parse().ok()?;
    let username = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }

    Some(ChatLine {
        room,
        user_id,
        username,
        text: text.trim().to_string(),
    })
}

struct Bot {
    ctx: Arc<CommandContext>,
    registry: CommandRegistry,
    active_rooms: HashSet<RoomId>,
    next_message_id: u64,
}

impl Bot {
    async fn activate(&mut self, room: RoomId) {
        if self.active_rooms.insert(room) {
            info!("📡 Joining room {room}");
            self.registry.enable_for_room(self.ctx.clone(), room).await;
        }
    }

    async fn handle_line(&mut self, line: &str) {
        let Some(chat) = parse_line(line) else {
            warn!("Ignoring malformed line, expected '<room> <user_id> <username>: <text>'");
            return;
        };

        self.activate(chat.room).await;

        self.next_message_id += 1;
        let Some(command) = Command::parse(
            &self.ctx.config.command_prefix,
            chat.room,
            self.next_message_id.to_string(),
            chat.user_id,
            chat.username,
            &chat.text,
        ) else {
            debug!("Not a command: {}", chat.text);
            return;
        };

        info!(
            "Command '{}' #{} from {} in room {}",
            command.name, command.id, command.username, command.room
        );
        if let Err(e) = self.registry.dispatch(self.ctx.clone(), &command).await {
            error!("Command #{} failed: {e:#}", command.id);
        }
    }

    async fn shutdown(&mut self) {
        for room in self.active_rooms.drain() {
            self.registry.disable_for_room(self.ctx.clone(), room).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting {}...", config.bot_name);

    let database = Database::new(&config.database_path).await?;
    let delivery = Arc::new(ConsoleDelivery {
        bot_name: config.bot_name.clone(),
    });
    let admins = Arc::new(StaticAdmins::new(config.admin_user_ids.iter().copied()));
    let ctx = Arc::new(CommandContext::new(
        config.clone(),
        Arc::new(database),
        delivery,
        admins,
        Arc::new(LexiconTagger::new()),
    ));

    let registry = default_registry();
    info!("📋 Registered {} command names", registry.len());

    // Message ids key persisted reminders, so they must not repeat across restarts
    let mut bot = Bot {
        ctx,
        registry,
        active_rooms: HashSet::new(),
        next_message_id: Utc::now().timestamp_millis().unsigned_abs(),
    };

    for &room in &config.rooms {
        bot.activate(room).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => bot.handle_line(&line).await,
                Ok(None) => {
                    info!("Input closed, shutting down");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            },
        }
    }

    bot.shutdown().await;
    info!("👋 {} stopped", config.bot_name);
    Ok(())
}
