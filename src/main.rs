use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{debug, error};
use rusty_tg_bot::{Bot, BotConfig, ChatAction, ChatId, MessageOptions, TelegramBot};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "tgbot")]
#[command(about = "Call Telegram Bot API methods from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file; TG_* environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the bot's own user record.
    Me,
    /// Long-poll for updates.
    Updates {
        #[arg(long, default_value = "0")]
        offset: i64,
        #[arg(long)]
        timeout: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    SendMessage {
        chat: String,
        text: String,
        #[arg(long)]
        no_preview: bool,
    },
    /// Send a photo from a local path, an http(s) URL or a file_id.
    SendPhoto {
        chat: String,
        photo: String,
        #[arg(long)]
        caption: Option<String>,
    },
    SendDocument { chat: String, document: String },
    SendAudio { chat: String, audio: String },
    SendVideo { chat: String, video: String },
    SendSticker { chat: String, sticker: String },
    /// e.g. typing, upload_photo, find_location
    ChatAction { chat: String, action: String },
    SetWebhook { url: String },
    RemoveWebhook,
    /// Resolve a file_id to a download URL.
    FileUrl { file_id: String },
}

fn run(cli: Cli) -> rusty_tg_bot::Result<()> {
    let config = BotConfig::load(cli.config.as_deref())?;
    debug!("Using API at {}", config.api_url);
    let bot = TelegramBot::new(config)?;
    let none = MessageOptions::default();

    let res = match cli.command {
        Commands::Me => bot.get_me()?,
        Commands::Updates {
            offset,
            timeout,
            limit,
        } => bot.poll_updates(offset, timeout, limit)?,
        Commands::SendMessage {
            chat,
            text,
            no_preview,
        } => {
            let options = MessageOptions {
                disable_web_page_preview: no_preview,
                ..Default::default()
            };
            bot.send_message(ChatId::from(chat.as_str()), &text, &options)?
        }
        Commands::SendPhoto {
            chat,
            photo,
            caption,
        } => {
            let options = MessageOptions {
                caption,
                ..Default::default()
            };
            bot.send_photo(ChatId::from(chat.as_str()), &photo, &options)?
        }
        Commands::SendDocument { chat, document } => {
            bot.send_document(ChatId::from(chat.as_str()), &document, &none)?
        }
        Commands::SendAudio { chat, audio } => {
            bot.send_audio(ChatId::from(chat.as_str()), &audio, &none)?
        }
        Commands::SendVideo { chat, video } => {
            bot.send_video(ChatId::from(chat.as_str()), &video, &none)?
        }
        Commands::SendSticker { chat, sticker } => {
            bot.send_sticker(ChatId::from(chat.as_str()), &sticker, &none)?
        }
        Commands::ChatAction { chat, action } => {
            let action: ChatAction = action.parse()?;
            bot.send_chat_action(ChatId::from(chat.as_str()), action)?
        }
        Commands::SetWebhook { url } => bot.set_webhook(&url)?,
        Commands::RemoveWebhook => bot.remove_webhook()?,
        Commands::FileUrl { file_id } => {
            println!("{}", bot.get_file_url(&file_id)?);
            return Ok(());
        }
    };

    match serde_json::to_string_pretty(&res) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("{:?} ({})", res, e),
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
