use std::future::Future;

use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::types::InlineKeyboardButton;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::MessageId;
use tracing::info;

use crate::bot::render::KeyboardLayout;

/// The three outbound calls the dispatcher is allowed to make.
pub trait Messenger: Send + Sync {
  fn send_message(
    &self,
    chat: ChatId,
    text: &str,
    keyboard: Option<&KeyboardLayout>,
  ) -> impl Future<Output = Result<(), RequestError>> + Send;

  fn edit_message_text(
    &self,
    chat: ChatId,
    message_id: MessageId,
    text: &str,
  ) -> impl Future<Output = Result<(), RequestError>> + Send;

  fn edit_message_keyboard(
    &self,
    chat: ChatId,
    message_id: MessageId,
    keyboard: &KeyboardLayout,
  ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

pub fn inline_markup(layout: &KeyboardLayout) -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(layout.rows.iter().map(|row| {
    row
      .iter()
      .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.payload.clone()))
      .collect::<Vec<_>>()
  }))
}

impl Messenger for Bot {
  async fn send_message(
    &self,
    chat: ChatId,
    text: &str,
    keyboard: Option<&KeyboardLayout>,
  ) -> Result<(), RequestError> {
    let request = Requester::send_message(self, chat, text.to_string());
    match keyboard {
      Some(layout) => request.reply_markup(inline_markup(layout)).await?,
      None => request.await?,
    };
    Ok(())
  }

  async fn edit_message_text(&self, chat: ChatId, message_id: MessageId, text: &str) -> Result<(), RequestError> {
    let request = Requester::edit_message_text(self, chat, message_id, text.to_string());
    tolerate_not_modified(request.await.map(drop), chat, message_id)
  }

  async fn edit_message_keyboard(
    &self,
    chat: ChatId,
    message_id: MessageId,
    keyboard: &KeyboardLayout,
  ) -> Result<(), RequestError> {
    let request = self
      .edit_message_reply_markup(chat, message_id)
      .reply_markup(inline_markup(keyboard));
    tolerate_not_modified(request.await.map(drop), chat, message_id)
  }
}

/// Pressing the button for the state already on screen makes Telegram reply
/// with `MessageNotModified`; the message is current, so that is a success.
fn tolerate_not_modified(
  result: Result<(), RequestError>,
  chat: ChatId,
  message_id: MessageId,
) -> Result<(), RequestError> {
  match result {
    Err(RequestError::Api(ApiError::MessageNotModified)) => {
      info!(chat_id = %chat, message_id = %message_id, "message already current");
      Ok(())
    },
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use teloxide::ApiError;
  use teloxide::RequestError;
  use teloxide::types::ChatId;
  use teloxide::types::InlineKeyboardButtonKind;
  use teloxide::types::MessageId;

  use super::inline_markup;
  use super::tolerate_not_modified;
  use crate::bot::render::Button;
  use crate::bot::render::KeyboardLayout;

  #[test]
  fn converts_layout_to_callback_buttons() {
    let layout = KeyboardLayout {
      rows: vec![
        vec![Button {
          label: "ა".to_string(),
          payload: "/history 2".to_string(),
        }],
        vec![Button {
          label: "show answers".to_string(),
          payload: "/showanswers topic:2,question:1".to_string(),
        }],
      ],
    };
    let markup = inline_markup(&layout);
    assert_eq!(markup.inline_keyboard.len(), 2);
    let first = &markup.inline_keyboard[0][0];
    assert_eq!(first.text, "ა");
    assert!(matches!(&first.kind, InlineKeyboardButtonKind::CallbackData(data) if data == "/history 2"));
  }

  #[test]
  fn not_modified_edits_count_as_success() {
    let chat = ChatId(7);
    let message = MessageId(3);
    let result = tolerate_not_modified(Err(RequestError::Api(ApiError::MessageNotModified)), chat, message);
    assert!(result.is_ok());

    let result = tolerate_not_modified(Err(RequestError::Api(ApiError::BotBlocked)), chat, message);
    assert!(result.is_err());
  }
}
