use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use tracing::instrument;

use crate::models::Question;
use crate::models::QuestionRow;
use crate::models::Topic;

/// Read-only access to the question lists of every topic.
pub trait QuestionRepository: Send + Sync {
  fn pick_question(&self, topic: Topic, number: u32) -> Result<Question, NotFound>;

  fn question_count(&self, topic: Topic) -> usize;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no question #{number} in topic {topic}")]
pub struct NotFound {
  pub topic: Topic,
  pub number: u32,
}

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse {}", path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("topic {topic}: {reason}")]
  Invalid { topic: Topic, reason: String },
}

/// Questions of all topics, loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
  topics: HashMap<Topic, Vec<Question>>,
}

impl QuestionBank {
  /// Reads `GeoLang.json`, `History.json` and `LawBasics.json` from `dir`.
  #[instrument]
  pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
    let mut sources = Vec::with_capacity(Topic::ALL.len());
    for topic in Topic::ALL {
      let path = dir.join(topic.file_name());
      let raw = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
      })?;
      let rows: Vec<QuestionRow> = serde_json::from_str(&raw).map_err(|source| LoadError::Json { path, source })?;
      sources.push((topic, rows));
    }
    let bank = Self::from_rows(sources)?;
    for topic in Topic::ALL {
      info!(%topic, count = bank.question_count(topic), "loaded topic questions");
    }
    Ok(bank)
  }

  pub fn from_rows(sources: impl IntoIterator<Item = (Topic, Vec<QuestionRow>)>) -> Result<Self, LoadError> {
    let mut topics = HashMap::new();
    for (topic, rows) in sources {
      let questions: Vec<Question> = rows.into_iter().map(|row| row.into_question(topic)).collect();
      validate(topic, &questions)?;
      topics.insert(topic, questions);
    }
    Ok(Self { topics })
  }
}

fn validate(topic: Topic, questions: &[Question]) -> Result<(), LoadError> {
  let invalid = |reason: String| LoadError::Invalid { topic, reason };
  for (index, question) in questions.iter().enumerate() {
    let expected = index as u32 + 1;
    if question.number != expected {
      return Err(invalid(format!(
        "question at position {expected} is numbered {}",
        question.number
      )));
    }
    if question.answers.is_empty() {
      return Err(invalid(format!("question #{expected} has no answers")));
    }
    let correct = question.answers.iter().filter(|answer| answer.is_correct).count();
    if correct != 1 {
      return Err(invalid(format!(
        "question #{expected} has {correct} correct answers, expected exactly one"
      )));
    }
  }
  Ok(())
}

impl QuestionRepository for QuestionBank {
  fn pick_question(&self, topic: Topic, number: u32) -> Result<Question, NotFound> {
    let index = number.checked_sub(1).ok_or(NotFound { topic, number })?;
    self
      .topics
      .get(&topic)
      .and_then(|questions| questions.get(index as usize))
      .cloned()
      .ok_or(NotFound { topic, number })
  }

  fn question_count(&self, topic: Topic) -> usize {
    self.topics.get(&topic).map_or(0, Vec::len)
  }
}
