// Copyright 2018-2026 the Deno authors. MIT license.

//! FIFO of inbound protocol messages.
//!
//! The transport layer appends from its own thread; the inspected (JS)
//! thread drains whenever the engine reaches a safe point. The critical
//! section is O(1): the lock is never held while a consumer runs, so a
//! consumer may push new messages while draining and observe them in
//! the same drain.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Session id used for messages that are not tied to one session.
/// Responses to such messages are broadcast to every session whose
/// `Debugger` domain is enabled.
pub const BROADCAST_SESSION_ID: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
  pub session_id: i32,
  pub content: String,
}

/// What a drain consumer wants the queue to do after one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainControl {
  /// Keep popping.
  Continue,
  /// Stop draining and let execution resume; remaining messages stay
  /// queued for the next drain.
  Resume,
}

#[derive(Default)]
pub struct MessageQueue {
  messages: Mutex<VecDeque<QueuedMessage>>,
}

impl MessageQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_back(&self, session_id: i32, content: impl Into<String>) {
    self.messages.lock().push_back(QueuedMessage {
      session_id,
      content: content.into(),
    });
  }

  /// Pops messages in FIFO order and hands each to `consumer` until the
  /// queue is empty or the consumer asks to resume execution.
  pub fn drain(
    &self,
    mut consumer: impl FnMut(QueuedMessage) -> DrainControl,
  ) -> DrainControl {
    loop {
      let message = match self.messages.lock().pop_front() {
        Some(message) => message,
        None => return DrainControl::Continue,
      };
      if consumer(message) == DrainControl::Resume {
        return DrainControl::Resume;
      }
    }
  }

  /// Removes the first queued message matching `predicate`. Used to
  /// cancel a scheduled `pauseOnNextStatement` frame before the engine
  /// observes it; a no-op if the frame was already consumed.
  pub fn remove_first(
    &self,
    predicate: impl Fn(&QueuedMessage) -> bool,
  ) -> bool {
    let mut messages = self.messages.lock();
    if let Some(index) = messages.iter().position(|m| predicate(m)) {
      messages.remove(index);
      true
    } else {
      false
    }
  }

  pub fn is_empty(&self) -> bool {
    self.messages.lock().is_empty()
  }

  pub fn len(&self) -> usize {
    self.messages.lock().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strict_fifo() {
    let queue = MessageQueue::new();
    queue.push_back(1, "a");
    queue.push_back(2, "b");
    queue.push_back(1, "c");

    let mut seen = Vec::new();
    queue.drain(|m| {
      seen.push((m.session_id, m.content));
      DrainControl::Continue
    });
    assert_eq!(
      seen,
      vec![
        (1, "a".to_string()),
        (2, "b".to_string()),
        (1, "c".to_string())
      ]
    );
    assert!(queue.is_empty());
  }

  #[test]
  fn resume_stops_drain_and_preserves_tail() {
    let queue = MessageQueue::new();
    queue.push_back(1, "resume");
    queue.push_back(1, "later");

    let control = queue.drain(|_| DrainControl::Resume);
    assert_eq!(control, DrainControl::Resume);
    assert_eq!(queue.len(), 1);
  }

  #[test]
  fn reentrant_push_is_observed_in_same_drain() {
    let queue = MessageQueue::new();
    queue.push_back(1, "first");

    let mut seen = Vec::new();
    queue.drain(|m| {
      if m.content == "first" {
        queue.push_back(1, "synthetic");
      }
      seen.push(m.content);
      DrainControl::Continue
    });
    assert_eq!(seen, vec!["first".to_string(), "synthetic".to_string()]);
  }

  #[test]
  fn remove_first_only_removes_one() {
    let queue = MessageQueue::new();
    queue.push_back(1, "x");
    queue.push_back(2, "x");
    assert!(queue.remove_first(|m| m.content == "x"));
    assert_eq!(queue.len(), 1);
    assert!(!queue.remove_first(|m| m.content == "y"));
  }
}
