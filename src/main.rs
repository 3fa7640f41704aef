mod app;
mod bot;
mod config;
mod models;
mod repository;
mod telemetry;

use anyhow::Context;
use anyhow::Result;
use teloxide::prelude::Bot;
use tracing::info;

use crate::repository::QuestionBank;

#[tokio::main]
async fn main() -> Result<()> {
  telemetry::init()?;
  let config = config::Config::from_env_and_args()?;
  info!(
    questions_dir = %config.questions_dir.display(),
    webhook = config.webhook.is_some(),
    "starting bot"
  );

  let questions = QuestionBank::load_dir(&config.questions_dir)
    .with_context(|| format!("failed to load questions from {}", config.questions_dir.display()))?;
  let bot = Bot::new(config.bot_token.clone());
  let app = app::App::new(bot, questions, config.webhook);
  app.run().await
}
