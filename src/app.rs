use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::UpdateHandler;
use teloxide::dptree;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::bot;
use crate::bot::AppContext;
use crate::bot::Keyword;
use crate::config::WebhookConfig;
use crate::repository::QuestionRepository;

pub struct App {
  bot: Bot,
  context: Arc<AppContext>,
  handler: UpdateHandler<anyhow::Error>,
  webhook: Option<WebhookConfig>,
}

impl App {
  pub fn new(bot: Bot, repository: impl QuestionRepository + 'static, webhook: Option<WebhookConfig>) -> Self {
    let context = Arc::new(AppContext::new(repository));
    let handler = bot::build_schema();
    Self {
      bot,
      context,
      handler,
      webhook,
    }
  }

  pub async fn run(self) -> anyhow::Result<()> {
    self
      .bot
      .set_my_commands(Keyword::bot_commands())
      .await
      .context("failed to register bot commands")?;
    let me = self.bot.get_me().await.context("failed to fetch bot identity")?;
    info!(username = me.user.username.as_deref().unwrap_or_default(), "bot identity resolved");

    let mut dispatcher = Dispatcher::builder(self.bot.clone(), self.handler)
      .dependencies(dptree::deps![self.context.clone(), me])
      .enable_ctrlc_handler()
      .build();

    match self.webhook {
      Some(webhook) => {
        info!(url = %webhook.url, addr = %webhook.addr, "receiving updates through webhook");
        let listener = webhooks::axum(self.bot, webhooks::Options::new(webhook.addr, webhook.url))
          .await
          .context("failed to start webhook listener")?;
        dispatcher
          .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("an error from the update listener"),
          )
          .await;
      },
      None => {
        info!("receiving updates through long polling");
        dispatcher.dispatch().await;
      },
    }

    Ok(())
  }
}
