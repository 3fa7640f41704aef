use std::sync::Arc;

use teloxide::RequestError;
use teloxide::dispatching::UpdateHandler;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::types::Me;
use teloxide::types::Message;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::bot::HandlerResult;
use crate::bot::context::AppContext;
use crate::bot::dispatch::Inbound;
use crate::bot::dispatch::Origin;
use crate::bot::dispatch::process;

type SharedContext = Arc<AppContext>;

const CALLBACK_FAILURE_TEXT: &str = "⚠️ Something went wrong, please try again.";

pub fn build_schema() -> UpdateHandler<anyhow::Error> {
  let message_handler = Update::filter_message().endpoint(handle_message);
  let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

  dptree::entry().branch(message_handler).branch(callback_handler)
}

#[instrument(skip(bot, ctx, me, msg))]
async fn handle_message(bot: Bot, ctx: SharedContext, me: Me, msg: Message) -> HandlerResult {
  let inbound = message_inbound(&msg, me.user.username.as_deref());
  info!(chat_id = %msg.chat.id, text = inbound.text.as_str(), "received message");
  process(&bot, ctx.repository(), &inbound).await?;
  Ok(())
}

#[instrument(skip(bot, ctx, query))]
async fn handle_callback_query(bot: Bot, ctx: SharedContext, query: CallbackQuery) -> HandlerResult {
  let callback_data = query.data.as_deref().unwrap_or("<empty>");
  let Some(inbound) = callback_inbound(&query) else {
    warn!(callback = callback_data, "callback query without message or data");
    bot.answer_callback_query(query.id).await?;
    return Ok(());
  };
  info!(chat_id = %inbound.chat_id, callback = callback_data, "handling callback query");

  let outcome = process(&bot, ctx.repository(), &inbound).await;
  let ack = bot.answer_callback_query(query.id.clone());
  let ack = match ack_text(&outcome) {
    Some(text) => ack.text(text),
    None => ack,
  };
  match outcome {
    Ok(()) => {
      ack.await?;
      Ok(())
    },
    Err(err) => {
      if let Err(ack_err) = ack.await {
        warn!(error = %ack_err, "failed to answer callback query");
      }
      Err(err.into())
    },
  }
}

/// Toast shown on the pressed button. Success stops the spinner silently.
fn ack_text(outcome: &Result<(), RequestError>) -> Option<&'static str> {
  match outcome {
    Ok(()) => None,
    Err(_) => Some(CALLBACK_FAILURE_TEXT),
  }
}

/// Typed messages always start a new question message. Non-text messages
/// resolve to the unknown-command reply.
fn message_inbound(msg: &Message, bot_username: Option<&str>) -> Inbound {
  Inbound {
    chat_id: msg.chat.id,
    origin: Origin::Fresh,
    text: msg.text().unwrap_or_default().to_string(),
    bot_username: bot_username.map(str::to_string),
  }
}

/// `None` when there is nothing to edit or no payload to act on.
fn callback_inbound(query: &CallbackQuery) -> Option<Inbound> {
  let message = query.message.as_ref()?;
  let data = query.data.as_deref().filter(|data| !data.is_empty())?;
  Some(Inbound {
    chat_id: message.chat().id,
    origin: Origin::Callback {
      message_id: message.id(),
    },
    text: data.to_string(),
    bot_username: None,
  })
}
