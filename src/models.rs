use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
  GeorgianLanguage,
  History,
  LawBasics,
}

impl Topic {
  pub const ALL: [Topic; 3] = [Topic::GeorgianLanguage, Topic::History, Topic::LawBasics];

  /// Numeric code used inside show-answers payloads. Stable across releases.
  pub fn code(self) -> u32 {
    match self {
      Topic::GeorgianLanguage => 1,
      Topic::History => 2,
      Topic::LawBasics => 3,
    }
  }

  pub fn from_code(code: u32) -> Option<Self> {
    Self::ALL.into_iter().find(|topic| topic.code() == code)
  }

  pub fn command(self) -> &'static str {
    match self {
      Topic::GeorgianLanguage => "/language",
      Topic::History => "/history",
      Topic::LawBasics => "/lawbasics",
    }
  }

  pub fn file_name(self) -> &'static str {
    match self {
      Topic::GeorgianLanguage => "GeoLang.json",
      Topic::History => "History.json",
      Topic::LawBasics => "LawBasics.json",
    }
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Topic::GeorgianLanguage => "georgian_language",
      Topic::History => "history",
      Topic::LawBasics => "law_basics",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
  pub topic: Topic,
  pub number: u32,
  pub text: String,
  pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
  pub code: String,
  pub text: String,
  pub is_correct: bool,
}

/// One entry of a topic file as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionRow {
  pub number: u32,
  pub text: String,
  pub answers: Vec<AnswerRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnswerRow {
  pub code: String,
  pub text: String,
  pub this_correct_answer: bool,
}

impl QuestionRow {
  pub fn into_question(self, topic: Topic) -> Question {
    Question {
      topic,
      number: self.number,
      text: self.text,
      answers: self
        .answers
        .into_iter()
        .map(|row| Answer {
          code: row.code,
          text: row.text,
          is_correct: row.this_correct_answer,
        })
        .collect(),
    }
  }
}
