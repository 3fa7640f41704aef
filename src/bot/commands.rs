use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::utils::command::BotCommands;
use thiserror::Error;

use crate::models::Topic;

pub const HELP: &str = "/help";
pub const START: &str = "/start";
pub const SHOW_ANSWERS: &str = "/showanswers";

/// Commands advertised in the Telegram menu. `/showanswers` only ever arrives
/// from our own buttons, so it is not listed here.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Keyword {
  /// Show the help text
  Help,
  /// Show the welcome message
  Start,
  /// Georgian language questions, optionally from a given number
  Language,
  /// History questions, optionally from a given number
  History,
  /// Law basics questions, optionally from a given number
  Lawbasics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
  Help,
  Start,
  Topic(Topic),
  ShowAnswers,
}

static HEADS: Lazy<HashMap<&'static str, Head>> = Lazy::new(|| {
  let mut heads = HashMap::from([
    (HELP, Head::Help),
    (START, Head::Start),
    (SHOW_ANSWERS, Head::ShowAnswers),
  ]);
  for topic in Topic::ALL {
    heads.insert(topic.command(), Head::Topic(topic));
  }
  heads
});

static SHOW_ANSWERS_ARGS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(topic:[^,]*),(question:.*)$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  ShowTopic { topic: Topic, number: u32 },
  ShowAnswers { topic: Topic, number: u32 },
  Help,
  Start,
  Unknown,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("{command} expects a question number, got {argument:?}")]
  InvalidArgument { command: &'static str, argument: String },
  #[error("malformed show-answers argument {0:?}")]
  MalformedShowAnswers(String),
  #[error("unknown topic code {0}")]
  UnknownTopicCode(u32),
}

impl Command {
  /// Classifies a callback payload, or a message that mentions no bot.
  pub fn parse(raw: &str) -> Result<Self, ParseError> {
    Self::parse_addressed(raw, None)
  }

  /// Classifies a typed message or a callback payload.
  ///
  /// The leading token selects the command. A `@name` suffix on it must name
  /// `bot_username` (compared case-insensitively), otherwise the command is
  /// meant for another bot and resolves to [`Command::Unknown`]. Unrecognized
  /// tokens resolve to [`Command::Unknown`] too; only a malformed argument of a
  /// recognized command is an error.
  pub fn parse_addressed(raw: &str, bot_username: Option<&str>) -> Result<Self, ParseError> {
    let raw = raw.trim();
    let (token, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
    let token = match token.split_once('@') {
      None => token,
      Some((name, mention)) if bot_username.is_some_and(|own| own.eq_ignore_ascii_case(mention)) => name,
      Some(_) => return Ok(Self::Unknown),
    };
    let rest = rest.trim();

    let Some(head) = HEADS.get(token) else {
      return Ok(Self::Unknown);
    };

    match *head {
      Head::Help => Ok(Self::Help),
      Head::Start => Ok(Self::Start),
      Head::Topic(topic) => {
        let number = if rest.is_empty() {
          1
        } else {
          rest.parse::<u32>().map_err(|_| ParseError::InvalidArgument {
            command: topic.command(),
            argument: rest.to_string(),
          })?
        };
        Ok(Self::ShowTopic { topic, number })
      },
      Head::ShowAnswers => {
        let (topic, number) = parse_show_answers(rest)?;
        Ok(Self::ShowAnswers { topic, number })
      },
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::ShowTopic { topic, .. } => topic.command(),
      Self::ShowAnswers { .. } => SHOW_ANSWERS,
      Self::Help => HELP,
      Self::Start => START,
      Self::Unknown => "unknown",
    }
  }
}

fn parse_show_answers(argument: &str) -> Result<(Topic, u32), ParseError> {
  let malformed = || ParseError::MalformedShowAnswers(argument.to_string());
  let captures = SHOW_ANSWERS_ARGS.captures(argument).ok_or_else(malformed)?;
  let segment_value = |index: usize, prefix: &str| -> Result<u32, ParseError> {
    captures
      .get(index)
      .and_then(|segment| segment.as_str().strip_prefix(prefix))
      .and_then(|value| value.parse::<u32>().ok())
      .ok_or_else(malformed)
  };

  let code = segment_value(1, "topic:")?;
  let number = segment_value(2, "question:")?;
  let topic = Topic::from_code(code).ok_or(ParseError::UnknownTopicCode(code))?;
  Ok((topic, number))
}
