// Copyright 2018-2026 the Deno authors. MIT license.

//! One attached front-end.

use crate::cdp;
use crate::context::InspectedContext;
use crate::inspector::Inspector;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use std::rc::Weak;

/// Outbound half of a session: the embedder's bridge to whatever
/// transport carries devtools traffic. Implementations must not call
/// back into the session from within these hooks.
pub trait Channel {
  fn send_response(&self, call_id: i64, message: &str);
  fn send_notification(&self, message: &str);
  /// Console mirroring hook, used when the embedder wants console
  /// events without enabling the Runtime domain. Default: ignore.
  fn on_console_message(&self, _message: &str, _runtime_id: Option<i64>) {}
}

pub struct InspectorSession {
  session_id: i32,
  context: Rc<InspectedContext>,
  inspector: Weak<Inspector>,
  channel: Rc<dyn Channel>,
  closed: Cell<bool>,
}

impl InspectorSession {
  pub(crate) fn new(
    session_id: i32,
    context: Rc<InspectedContext>,
    inspector: Weak<Inspector>,
    channel: Rc<dyn Channel>,
  ) -> Rc<InspectorSession> {
    Rc::new(InspectorSession {
      session_id,
      context,
      inspector,
      channel,
      closed: Cell::new(false),
    })
  }

  pub fn session_id(&self) -> i32 {
    self.session_id
  }

  pub fn channel(&self) -> &Rc<dyn Channel> {
    &self.channel
  }

  /// Feeds one front-end message into the context. Must be called on
  /// the inspected thread.
  pub fn dispatch_protocol_message(&self, raw: &str) {
    if self.closed.get() {
      return;
    }
    self
      .context
      .debugger()
      .dispatch_protocol_message(self.session_id, raw);
  }

  /// Queues a pause for the next statement boundary. The frame rides
  /// the normal message queue, so it can be cancelled while in flight
  /// and is dropped harmlessly if the engine is idle when it drains.
  pub fn schedule_pause_on_next_statement(&self, reason: &str) {
    self.context.queue().push_back(
      self.session_id,
      cdp::pause_on_next_statement_frame(reason),
    );
  }

  /// Cancels one scheduled pause that this session queued and the
  /// engine has not consumed yet.
  pub fn cancel_pause_on_next_statement(&self) -> bool {
    let session_id = self.session_id;
    self.context.queue().remove_first(|m| {
      m.session_id == session_id
        && m.content.contains("\"Debugger.pauseOnNextStatement\"")
    })
  }

  /// Toggles embedder-side console mirroring for this session.
  pub fn set_enable_console_inspect(&self, enabled: bool) {
    let mut state = self.context.state().borrow_mut();
    state
      .sessions
      .entry(self.session_id)
      .or_default()
      .console_inspect = enabled;
  }

  /// Detaches the session. Synthetic disable frames run through the
  /// regular dispatch path, so the per-session domain bits are cleared
  /// exactly as if the front-end had sent the disables itself.
  pub fn close(&self) {
    if self.closed.replace(true) {
      return;
    }
    if !self.context.is_destroyed() {
      for method in ["Debugger.disable", "Runtime.disable", "Profiler.disable"]
      {
        self.context.queue().push_back(
          self.session_id,
          json!({ "id": cdp::NO_RESPONSE_ID, "method": method }).to_string(),
        );
      }
      self.context.debugger().pump_queued_messages();
      self
        .context
        .state()
        .borrow_mut()
        .sessions
        .remove(&self.session_id);
    }
    if let Some(inspector) = self.inspector.upgrade() {
      inspector.forget_session(self.session_id);
    }
  }

  pub fn is_closed(&self) -> bool {
    self.closed.get()
  }
}

impl Drop for InspectorSession {
  fn drop(&mut self) {
    self.close();
  }
}
