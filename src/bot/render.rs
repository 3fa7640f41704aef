use crate::bot::navigation::advance;
use crate::bot::navigation::encode;
use crate::bot::navigation::encode_show_answers;
use crate::models::Question;

pub const PREVIOUS_LABEL: &str = "<<";
pub const NEXT_LABEL: &str = ">>";
pub const SHOW_ANSWERS_LABEL: &str = "show answers";
const CORRECT_MARK: &str = " ✅";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
  pub label: String,
  pub payload: String,
}

impl Button {
  fn new(label: impl Into<String>, payload: String) -> Self {
    Self {
      label: label.into(),
      payload,
    }
  }
}

/// Inline keyboard rows, independent of the Telegram types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyboardLayout {
  pub rows: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
  pub text: String,
  pub keyboard: KeyboardLayout,
}

pub fn render(question: &Question, reveal_answers: bool, question_count: usize) -> Rendered {
  Rendered {
    text: render_text(question),
    keyboard: render_keyboard(question, reveal_answers, question_count),
  }
}

pub fn render_text(question: &Question) -> String {
  let mut text = question.text.clone();
  for answer in &question.answers {
    text.push_str(&format!("\n\n{}. {}", answer.code, answer.text));
  }
  text
}

pub fn render_keyboard(question: &Question, reveal_answers: bool, question_count: usize) -> KeyboardLayout {
  let topic = question.topic;
  let number = question.number;
  let is_last = number as usize >= question_count;
  let show_answers_payload = encode_show_answers(topic, number);
  let advance_payload = encode(topic, advance(number, question_count));

  let answers = question
    .answers
    .iter()
    .map(|answer| {
      if answer.is_correct {
        let label = if reveal_answers {
          format!("{}{CORRECT_MARK}", answer.code)
        } else {
          answer.code.clone()
        };
        Button::new(label, advance_payload.clone())
      } else {
        Button::new(answer.code.clone(), show_answers_payload.clone())
      }
    })
    .collect();

  let mut controls = Vec::with_capacity(3);
  if number > 1 {
    controls.push(Button::new(PREVIOUS_LABEL, encode(topic, number - 1)));
  }
  controls.push(Button::new(SHOW_ANSWERS_LABEL, show_answers_payload));
  if !is_last {
    controls.push(Button::new(NEXT_LABEL, encode(topic, number + 1)));
  }

  KeyboardLayout {
    rows: vec![answers, controls],
  }
}
