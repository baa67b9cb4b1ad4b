//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::pubmed::LiteratureSearch;

/// Canned literature search. Unknown terms and ids read as "not found".
#[derive(Default)]
pub struct FakeSearch {
  ids: HashMap<String, Vec<String>>,
  titles: HashMap<String, String>,
  delay: Option<Duration>,
  searches: Mutex<Vec<(String, u32)>>,
}

impl FakeSearch {
  pub fn with_ids(mut self, term: &str, ids: &[&str]) -> Self {
    self
      .ids
      .entry(term.to_string())
      .or_default()
      .extend(ids.iter().map(|s| s.to_string()));
    self
  }

  pub fn with_hit(self, term: &str, id: &str, title: &str) -> Self {
    let mut this = self.with_ids(term, &[id]);
    this.titles.insert(id.to_string(), title.to_string());
    this
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  /// Every (term, retmax) searched so far, in order.
  pub fn searches(&self) -> Vec<(String, u32)> {
    self.searches.lock().unwrap().clone()
  }
}

impl LiteratureSearch for FakeSearch {
  async fn search_ids(&self, term: &str, retmax: u32) -> Vec<String> {
    if let Some(d) = self.delay {
      tokio::time::sleep(d).await;
    }
    self.searches.lock().unwrap().push((term.to_string(), retmax));
    self
      .ids
      .get(term)
      .map(|ids| ids.iter().take(retmax as usize).cloned().collect())
      .unwrap_or_default()
  }

  async fn summary_title(&self, id: &str) -> Option<String> {
    if let Some(d) = self.delay {
      tokio::time::sleep(d).await;
    }
    self.titles.get(id).cloned()
  }
}
