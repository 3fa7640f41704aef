//! Callback payloads that carry the whole navigation state.
//!
//! Telegram hands a button's callback data back verbatim, so every payload is
//! itself a valid command string and decoding is just [`Command::parse`].
//!
//! Grammar, version 1:
//!
//! ```text
//! payload      = show-topic | show-answers
//! show-topic   = topic-cmd " " number
//! show-answers = "/showanswers topic:" topic-code ",question:" number
//! topic-cmd    = "/language" | "/history" | "/lawbasics"
//! topic-code   = "1" | "2" | "3"
//! number       = 1*DIGIT
//! ```

use crate::bot::commands::Command;
use crate::bot::commands::ParseError;
use crate::bot::commands::SHOW_ANSWERS;
use crate::models::Topic;

/// Telegram rejects callback data longer than this many bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

pub fn encode(topic: Topic, number: u32) -> String {
  checked(format!("{} {number}", topic.command()))
}

pub fn encode_show_answers(topic: Topic, number: u32) -> String {
  checked(format!("{SHOW_ANSWERS} topic:{},question:{number}", topic.code()))
}

pub fn decode(payload: &str) -> Result<Command, ParseError> {
  Command::parse(payload)
}

/// Question number the correct answer leads to: the next one, or the first
/// after the last so a topic can be repeated in a loop.
pub fn advance(number: u32, question_count: usize) -> u32 {
  if number as usize >= question_count { 1 } else { number + 1 }
}

fn checked(payload: String) -> String {
  debug_assert!(
    payload.len() <= MAX_PAYLOAD_LEN,
    "callback payload {payload:?} exceeds {MAX_PAYLOAD_LEN} bytes"
  );
  payload
}
