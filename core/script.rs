// Copyright 2018-2026 the Deno authors. MIT license.

//! Per-context script registry.
//!
//! Every script the engine parses (or fails to parse) gets a record
//! with a context-unique numeric id, starting at 1 and strictly
//! monotonic. Ids are never reused, even after a script is removed, so
//! a front-end can cache `scriptId` strings across reloads.

use crate::debug_info::FunctionDebugInfo;

#[derive(Debug, Clone, Default)]
pub struct ScriptSource {
  pub id: i32,
  pub url: String,
  pub source: String,
  pub end_line: i64,
  pub hash: Option<String>,
  pub source_map_url: Option<String>,
  pub parse_failed: bool,
  /// Compile-time function records, present only for LepusNG scripts
  /// whose debug info has been hydrated.
  pub functions: Vec<FunctionDebugInfo>,
}

#[derive(Default)]
pub struct ScriptTable {
  scripts: Vec<ScriptSource>,
  next_id: i32,
}

impl ScriptTable {
  pub fn new() -> Self {
    Self {
      scripts: Vec::new(),
      next_id: 1,
    }
  }

  /// Registers a script and assigns it the next id. Returns the id.
  pub fn insert(&mut self, mut script: ScriptSource) -> i32 {
    let id = self.next_id;
    self.next_id += 1;
    script.id = id;
    self.scripts.push(script);
    id
  }

  pub fn by_id(&self, id: i32) -> Option<&ScriptSource> {
    self.scripts.iter().find(|s| s.id == id)
  }

  pub fn by_id_mut(&mut self, id: i32) -> Option<&mut ScriptSource> {
    self.scripts.iter_mut().find(|s| s.id == id)
  }

  /// First script registered under `url`. Urls are not unique; reloads
  /// register a fresh record with a fresh id.
  pub fn by_url(&self, url: &str) -> Option<&ScriptSource> {
    self.scripts.iter().find(|s| s.url == url)
  }

  /// Drops every record registered under `url`. The id counter is not
  /// rewound.
  pub fn remove_by_url(&mut self, url: &str) -> usize {
    let before = self.scripts.len();
    self.scripts.retain(|s| s.url != url);
    before - self.scripts.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ScriptSource> {
    self.scripts.iter()
  }

  pub fn len(&self) -> usize {
    self.scripts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scripts.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn script(url: &str) -> ScriptSource {
    ScriptSource {
      url: url.to_string(),
      source: "1 + 1".to_string(),
      end_line: 0,
      ..Default::default()
    }
  }

  #[test]
  fn ids_start_at_one_and_are_monotonic() {
    let mut table = ScriptTable::new();
    assert_eq!(table.insert(script("a.js")), 1);
    assert_eq!(table.insert(script("b.js")), 2);
    assert_eq!(table.by_id(2).map(|s| s.url.as_str()), Some("b.js"));
  }

  #[test]
  fn removal_does_not_rewind_ids() {
    let mut table = ScriptTable::new();
    table.insert(script("a.js"));
    table.insert(script("a.js"));
    assert_eq!(table.remove_by_url("a.js"), 2);
    assert!(table.is_empty());
    assert_eq!(table.insert(script("a.js")), 3);
  }

  #[test]
  fn by_url_returns_oldest_record() {
    let mut table = ScriptTable::new();
    table.insert(script("a.js"));
    table.insert(script("a.js"));
    assert_eq!(table.by_url("a.js").map(|s| s.id), Some(1));
  }
}
