use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use url::Url;

pub const DEFAULT_QUESTIONS_DIR: &str = "data/questions";
const TOKEN_VARS: [&str; 3] = ["BOT_TOKEN", "TELOXIDE_TOKEN", "TELEGRAM_APITOKEN"];

#[derive(Debug, Parser)]
#[command(version, about = "Telegram quiz bot for the Georgian citizenship exam")]
pub struct Args {
  /// Telegram bot token. Falls back to BOT_TOKEN, TELOXIDE_TOKEN or TELEGRAM_APITOKEN.
  #[arg(long = "tg-bot-token")]
  pub tg_bot_token: Option<String>,
  /// Directory with GeoLang.json, History.json and LawBasics.json. Falls back to QUESTIONS_DIR.
  #[arg(long)]
  pub questions_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
  pub url: Url,
  pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub bot_token: String,
  pub questions_dir: PathBuf,
  pub webhook: Option<WebhookConfig>,
}

impl Config {
  pub fn from_env_and_args() -> Result<Self> {
    Self::resolve(Args::parse(), |key| env::var(key).ok())
  }

  fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let bot_token = args
      .tg_bot_token
      .filter(|token| !token.trim().is_empty())
      .or_else(|| TOKEN_VARS.into_iter().find_map(|key| lookup(key).filter(|v| !v.trim().is_empty())))
      .context("a bot token must be given with --tg-bot-token or BOT_TOKEN, TELOXIDE_TOKEN, TELEGRAM_APITOKEN")?;
    let questions_dir = args
      .questions_dir
      .or_else(|| lookup("QUESTIONS_DIR").map(PathBuf::from))
      .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTIONS_DIR));
    let webhook = parse_webhook(lookup("WEBHOOK_URL"), lookup("WEBHOOK_ADDR"))?;
    Ok(Self {
      bot_token,
      questions_dir,
      webhook,
    })
  }
}

fn parse_webhook(url: Option<String>, addr: Option<String>) -> Result<Option<WebhookConfig>> {
  match (url, addr) {
    (None, None) => Ok(None),
    (Some(url), Some(addr)) => {
      let url = url.parse::<Url>().with_context(|| format!("WEBHOOK_URL {url:?} is not a valid URL"))?;
      let addr = addr
        .parse::<SocketAddr>()
        .with_context(|| format!("WEBHOOK_ADDR {addr:?} is not a socket address"))?;
      Ok(Some(WebhookConfig { url, addr }))
    },
    _ => bail!("WEBHOOK_URL and WEBHOOK_ADDR must be set together"),
  }
}
