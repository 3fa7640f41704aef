use once_cell::sync::Lazy;
use teloxide::RequestError;
use teloxide::types::ChatId;
use teloxide::types::MessageId;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::bot::commands::Command;
use crate::bot::commands::Keyword;
use crate::bot::commands::ParseError;
use crate::bot::navigation::decode;
use crate::bot::outbound::Messenger;
use crate::bot::render::render;
use crate::repository::NotFound;
use crate::repository::QuestionRepository;

pub const WELCOME_TEXT: &str = "👋 Welcome! This bot helps you prepare for the Georgian citizenship exam.\n\n\
  Pick a topic: /language, /history or /lawbasics. \
  Add a number to jump to a question, e.g. /history 5.";
pub const UNKNOWN_TEXT: &str = "🤔 Unknown command. Use /help to see what I can do.";
pub const NOT_FOUND_TEXT: &str = "❓ There is no question with that number in this topic.";
pub const PARSE_FAILURE_TEXT: &str = "⚠️ I could not read that command. Use /help to see the expected format.";

static HELP_TEXT: Lazy<String> = Lazy::new(|| {
  let mut text = Keyword::descriptions().to_string();
  text.push_str(
    "\n\nTap an answer button to check yourself: the right one moves on to the next question, a wrong one reveals \
     the answer. Use << and >> to move between questions.",
  );
  text
});

/// Where an inbound command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  /// A message typed by the user; replies go out as new messages.
  Fresh,
  /// A button pressed under one of our messages, which is edited in place.
  Callback { message_id: MessageId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
  pub chat_id: ChatId,
  pub origin: Origin,
  pub text: String,
  /// Our own username. Typed commands mentioning any other bot are not for us.
  pub bot_username: Option<String>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error(transparent)]
  NotFound(#[from] NotFound),
  #[error("telegram request failed")]
  Transport(#[from] RequestError),
}

/// Parses the inbound text and performs the resulting send or edit calls.
pub async fn dispatch<M, R>(messenger: &M, repository: &R, inbound: &Inbound) -> Result<Command, DispatchError>
where
  M: Messenger,
  R: QuestionRepository + ?Sized,
{
  let command = match inbound.origin {
    Origin::Fresh => Command::parse_addressed(&inbound.text, inbound.bot_username.as_deref())?,
    Origin::Callback { .. } => decode(&inbound.text)?,
  };
  let chat = inbound.chat_id;

  match command {
    Command::ShowTopic { topic, number } => {
      let question = repository.pick_question(topic, number)?;
      let rendered = render(&question, false, repository.question_count(topic));
      match inbound.origin {
        Origin::Fresh => {
          messenger
            .send_message(chat, &rendered.text, Some(&rendered.keyboard))
            .await?;
        },
        Origin::Callback { message_id } => {
          messenger.edit_message_text(chat, message_id, &rendered.text).await?;
          messenger
            .edit_message_keyboard(chat, message_id, &rendered.keyboard)
            .await?;
        },
      }
    },
    Command::ShowAnswers { topic, number } => {
      let question = repository.pick_question(topic, number)?;
      let rendered = render(&question, true, repository.question_count(topic));
      match inbound.origin {
        Origin::Fresh => {
          messenger
            .send_message(chat, &rendered.text, Some(&rendered.keyboard))
            .await?;
        },
        Origin::Callback { message_id } => {
          messenger
            .edit_message_keyboard(chat, message_id, &rendered.keyboard)
            .await?;
        },
      }
    },
    Command::Help => messenger.send_message(chat, &HELP_TEXT, None).await?,
    Command::Start => messenger.send_message(chat, WELCOME_TEXT, None).await?,
    Command::Unknown => messenger.send_message(chat, UNKNOWN_TEXT, None).await?,
  }

  Ok(command)
}

/// Runs [`dispatch`] and turns recoverable failures into a reply to the user.
/// Only transport failures reach the caller.
#[instrument(skip(messenger, repository, inbound), fields(chat_id = %inbound.chat_id, origin = ?inbound.origin))]
pub async fn process<M, R>(messenger: &M, repository: &R, inbound: &Inbound) -> Result<(), RequestError>
where
  M: Messenger,
  R: QuestionRepository + ?Sized,
{
  match dispatch(messenger, repository, inbound).await {
    Ok(command) => {
      info!(command = command.name(), "handled command");
      Ok(())
    },
    Err(DispatchError::Transport(err)) => {
      warn!(error = %err, "telegram request failed");
      Err(err)
    },
    Err(DispatchError::Parse(err)) => {
      info!(error = %err, text = inbound.text.as_str(), "rejected malformed command");
      messenger.send_message(inbound.chat_id, PARSE_FAILURE_TEXT, None).await
    },
    Err(DispatchError::NotFound(err)) => {
      info!(error = %err, text = inbound.text.as_str(), "requested question does not exist");
      messenger.send_message(inbound.chat_id, NOT_FOUND_TEXT, None).await
    },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use teloxide::ApiError;
  use teloxide::RequestError;
  use teloxide::types::ChatId;
  use teloxide::types::MessageId;

  use super::DispatchError;
  use super::Inbound;
  use super::NOT_FOUND_TEXT;
  use super::Origin;
  use super::PARSE_FAILURE_TEXT;
  use super::UNKNOWN_TEXT;
  use super::WELCOME_TEXT;
  use super::dispatch;
  use super::process;
  use crate::bot::commands::Command;
  use crate::bot::outbound::Messenger;
  use crate::bot::render::KeyboardLayout;
  use crate::models::Topic;
  use crate::repository::tests::sample_bank;

  #[derive(Debug, Clone, PartialEq, Eq)]
  enum Call {
    Send {
      chat: ChatId,
      text: String,
      keyboard: Option<KeyboardLayout>,
    },
    EditText {
      chat: ChatId,
      message_id: MessageId,
      text: String,
    },
    EditKeyboard {
      chat: ChatId,
      message_id: MessageId,
      keyboard: KeyboardLayout,
    },
  }

  #[derive(Default)]
  struct Recorder {
    calls: Mutex<Vec<Call>>,
    fail: bool,
  }

  impl Recorder {
    fn failing() -> Self {
      Self {
        calls: Mutex::default(),
        fail: true,
      }
    }

    fn calls(&self) -> Vec<Call> {
      self.calls.lock().expect("recorder lock").clone()
    }

    fn record(&self, call: Call) -> Result<(), RequestError> {
      if self.fail {
        return Err(RequestError::Api(ApiError::BotBlocked));
      }
      self.calls.lock().expect("recorder lock").push(call);
      Ok(())
    }
  }

  impl Messenger for Recorder {
    async fn send_message(
      &self,
      chat: ChatId,
      text: &str,
      keyboard: Option<&KeyboardLayout>,
    ) -> Result<(), RequestError> {
      self.record(Call::Send {
        chat,
        text: text.to_string(),
        keyboard: keyboard.cloned(),
      })
    }

    async fn edit_message_text(&self, chat: ChatId, message_id: MessageId, text: &str) -> Result<(), RequestError> {
      self.record(Call::EditText {
        chat,
        message_id,
        text: text.to_string(),
      })
    }

    async fn edit_message_keyboard(
      &self,
      chat: ChatId,
      message_id: MessageId,
      keyboard: &KeyboardLayout,
    ) -> Result<(), RequestError> {
      self.record(Call::EditKeyboard {
        chat,
        message_id,
        keyboard: keyboard.clone(),
      })
    }
  }

  const CHAT: ChatId = ChatId(42);
  const MESSAGE: MessageId = MessageId(9);
  const BOT_USERNAME: &str = "CitizenshipQuizBot";

  fn fresh(text: &str) -> Inbound {
    Inbound {
      chat_id: CHAT,
      origin: Origin::Fresh,
      text: text.to_string(),
      bot_username: Some(BOT_USERNAME.to_string()),
    }
  }

  fn callback(text: &str) -> Inbound {
    Inbound {
      chat_id: CHAT,
      origin: Origin::Callback { message_id: MESSAGE },
      text: text.to_string(),
      bot_username: None,
    }
  }

  #[tokio::test]
  async fn topic_without_number_sends_first_question() {
    let recorder = Recorder::default();
    let command = dispatch(&recorder, &sample_bank(), &fresh("/history")).await.expect("dispatched");
    assert_eq!(
      command,
      Command::ShowTopic {
        topic: Topic::History,
        number: 1
      }
    );

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let Call::Send { chat, text, keyboard } = &calls[0] else {
      panic!("expected a new message, got {calls:?}");
    };
    assert_eq!(*chat, CHAT);
    assert!(text.starts_with("hist one"));
    let keyboard = keyboard.as_ref().expect("question has a keyboard");
    assert_eq!(keyboard.rows.len(), 2);
    assert!(keyboard.rows[0].iter().all(|b| !b.label.contains('✅')));
  }

  #[tokio::test]
  async fn topic_with_number_resolves_that_question() {
    let recorder = Recorder::default();
    dispatch(&recorder, &sample_bank(), &fresh("/history 2")).await.expect("dispatched");
    let calls = recorder.calls();
    assert!(matches!(&calls[0], Call::Send { text, .. } if text.starts_with("hist two")));
  }

  #[tokio::test]
  async fn out_of_range_question_is_not_found() {
    let recorder = Recorder::default();
    let err = dispatch(&recorder, &sample_bank(), &fresh("/history 5")).await.unwrap_err();
    assert!(matches!(err, DispatchError::NotFound(_)));
    assert!(recorder.calls().is_empty());
  }

  #[tokio::test]
  async fn callback_navigation_edits_text_then_keyboard() {
    let recorder = Recorder::default();
    dispatch(&recorder, &sample_bank(), &callback("/history 3")).await.expect("dispatched");
    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
      &calls[0],
      Call::EditText { message_id, text, .. } if *message_id == MESSAGE && text.starts_with("hist three")
    ));
    let Call::EditKeyboard { keyboard, .. } = &calls[1] else {
      panic!("expected a keyboard edit, got {calls:?}");
    };
    let controls: Vec<&str> = keyboard.rows[1].iter().map(|b| b.label.as_str()).collect();
    assert_eq!(controls, vec!["<<", "show answers"]);
  }

  #[tokio::test]
  async fn show_answers_callback_only_edits_keyboard() {
    let recorder = Recorder::default();
    let command = dispatch(&recorder, &sample_bank(), &callback("/showanswers topic:2,question:1"))
      .await
      .expect("dispatched");
    assert_eq!(
      command,
      Command::ShowAnswers {
        topic: Topic::History,
        number: 1
      }
    );
    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let Call::EditKeyboard { keyboard, message_id, .. } = &calls[0] else {
      panic!("expected a keyboard edit, got {calls:?}");
    };
    assert_eq!(*message_id, MESSAGE);
    let answers: Vec<&str> = keyboard.rows[0].iter().map(|b| b.label.as_str()).collect();
    assert_eq!(answers, vec!["1", "2 ✅", "3"]);
  }

  #[tokio::test]
  async fn typed_show_answers_sends_revealed_question() {
    let recorder = Recorder::default();
    dispatch(&recorder, &sample_bank(), &fresh("/showanswers topic:3,question:4"))
      .await
      .expect("dispatched");
    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
      &calls[0],
      Call::Send { text, keyboard: Some(keyboard), .. }
        if text.starts_with("law 4") && keyboard.rows[0][0].label == "1 ✅"
    ));
  }

  #[tokio::test]
  async fn static_commands_send_new_messages() {
    let recorder = Recorder::default();
    let bank = sample_bank();
    dispatch(&recorder, &bank, &fresh("/start")).await.expect("dispatched");
    dispatch(&recorder, &bank, &fresh("/help")).await.expect("dispatched");
    dispatch(&recorder, &bank, &callback("/whatever")).await.expect("dispatched");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[0], Call::Send { text, keyboard: None, .. } if text == WELCOME_TEXT));
    assert!(matches!(&calls[1], Call::Send { text, keyboard: None, .. } if text.contains("/history")));
    assert!(matches!(&calls[2], Call::Send { text, keyboard: None, .. } if text == UNKNOWN_TEXT));
  }

  #[tokio::test]
  async fn malformed_payload_is_a_parse_error() {
    let recorder = Recorder::default();
    let err = dispatch(&recorder, &sample_bank(), &callback("/showanswers topic:2"))
      .await
      .unwrap_err();
    assert!(matches!(err, DispatchError::Parse(_)));
    assert!(recorder.calls().is_empty());
  }

  #[tokio::test]
  async fn process_reports_recoverable_failures_to_the_user() {
    let recorder = Recorder::default();
    let bank = sample_bank();
    process(&recorder, &bank, &fresh("/lawbasics 99")).await.expect("handled");
    process(&recorder, &bank, &fresh("/history abc")).await.expect("handled");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Send { text, .. } if text == NOT_FOUND_TEXT));
    assert!(matches!(&calls[1], Call::Send { text, .. } if text == PARSE_FAILURE_TEXT));
  }

  #[tokio::test]
  async fn transport_failures_reach_the_caller() {
    let recorder = Recorder::failing();
    let err = dispatch(&recorder, &sample_bank(), &fresh("/history")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)));
    assert!(process(&recorder, &sample_bank(), &fresh("/start")).await.is_err());
  }

  #[tokio::test]
  async fn undeliverable_failure_reply_reaches_the_caller() {
    let recorder = Recorder::failing();
    let bank = sample_bank();
    assert!(process(&recorder, &bank, &fresh("/history abc")).await.is_err());
    assert!(process(&recorder, &bank, &fresh("/history 99")).await.is_err());
  }

  #[tokio::test]
  async fn commands_for_other_bots_are_unknown() {
    let recorder = Recorder::default();
    let bank = sample_bank();
    let command = dispatch(&recorder, &bank, &fresh("/history@SomeOtherBot 2"))
      .await
      .expect("dispatched");
    assert_eq!(command, Command::Unknown);
    dispatch(&recorder, &bank, &fresh("/history@CitizenshipQuizBot 2"))
      .await
      .expect("dispatched");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Send { text, keyboard: None, .. } if text == UNKNOWN_TEXT));
    assert!(matches!(&calls[1], Call::Send { text, .. } if text.starts_with("hist two")));
  }
}
