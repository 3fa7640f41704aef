use std::sync::Arc;

use crate::repository::QuestionRepository;

#[derive(Clone)]
pub struct AppContext {
  repository: Arc<dyn QuestionRepository>,
}

impl AppContext {
  pub fn new(repository: impl QuestionRepository + 'static) -> Self {
    Self {
      repository: Arc::new(repository),
    }
  }

  pub fn repository(&self) -> &dyn QuestionRepository {
    self.repository.as_ref()
  }
}
