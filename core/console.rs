// Copyright 2018-2026 the Deno authors. MIT license.

//! Bounded ring of `Runtime.consoleAPICalled` events.
//!
//! Console calls made before any front-end attaches are retained and
//! replayed when a session enables the Runtime domain, oldest first.
//! The ring holds the most recent [`CONSOLE_RING_CAPACITY`] entries.

use crate::cdp::ConsoleApiCalledParams;
use std::collections::VecDeque;

pub const CONSOLE_RING_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ConsoleEntry {
  pub params: ConsoleApiCalledParams,
  /// Engine-assigned id used by `deleteConsoleMessageWithRID`.
  pub runtime_id: Option<i64>,
}

#[derive(Default)]
pub struct ConsoleRing {
  entries: VecDeque<ConsoleEntry>,
}

impl ConsoleRing {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, entry: ConsoleEntry) {
    if self.entries.len() == CONSOLE_RING_CAPACITY {
      self.entries.pop_front();
    }
    self.entries.push_back(entry);
  }

  /// Oldest-first replay order.
  pub fn replay(&self) -> impl Iterator<Item = &ConsoleEntry> {
    self.entries.iter()
  }

  /// `Runtime.discardConsoleEntries`.
  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// Drops every entry tagged with `runtime_id`.
  pub fn delete_with_runtime_id(&mut self, runtime_id: i64) -> usize {
    let before = self.entries.len();
    self.entries.retain(|e| e.runtime_id != Some(runtime_id));
    before - self.entries.len()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cdp::RemoteObject;

  fn entry(kind: &str, runtime_id: Option<i64>) -> ConsoleEntry {
    ConsoleEntry {
      params: ConsoleApiCalledParams {
        kind: kind.to_string(),
        args: vec![RemoteObject::from_value(serde_json::json!("hi"))],
        execution_context_id: 1,
        timestamp: 0.0,
        stack_trace: None,
      },
      runtime_id,
    }
  }

  #[test]
  fn replay_is_oldest_first() {
    let mut ring = ConsoleRing::new();
    ring.push(entry("log", None));
    ring.push(entry("warn", None));
    let kinds: Vec<_> =
      ring.replay().map(|e| e.params.kind.clone()).collect();
    assert_eq!(kinds, vec!["log", "warn"]);
  }

  #[test]
  fn capacity_drops_oldest() {
    let mut ring = ConsoleRing::new();
    for i in 0..CONSOLE_RING_CAPACITY + 3 {
      ring.push(entry(&format!("log{}", i), None));
    }
    assert_eq!(ring.len(), CONSOLE_RING_CAPACITY);
    assert_eq!(ring.replay().next().map(|e| e.params.kind.as_str()), Some("log3"));
  }

  #[test]
  fn delete_with_runtime_id() {
    let mut ring = ConsoleRing::new();
    ring.push(entry("log", Some(7)));
    ring.push(entry("log", None));
    ring.push(entry("error", Some(7)));
    assert_eq!(ring.delete_with_runtime_id(7), 2);
    assert_eq!(ring.len(), 1);
  }
}
