// Copyright 2018-2026 the Deno authors. MIT license.

//! Engine-side seam.
//!
//! The debugger core never talks to an engine directly; it goes through
//! [`JsEngine`], the narrow trait an embedding implements over its
//! PrimJS (or LepusNG) runtime, and the engine calls back into the core
//! through a value-type [`CallbackTable`] of plain function pointers.
//! The table's entries take a [`ContextRegistry`] and a
//! [`ContextHandle`] instead of captured state, which keeps it embeddable
//! in C-flavored engine structs that know nothing about Rust closures.

use crate::cdp;
use crate::context::InspectedContext;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::rc::Weak;

/// Opaque id the engine embeds next to its own context pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub u64);

/// Which engine flavor a context runs. Latched at construction; for
/// LepusNG it also records whether debug info arrives out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
  QuickJs,
  LepusNg { debug_info_outside: bool },
}

impl VariantKind {
  pub fn is_lepus_ng(&self) -> bool {
    matches!(self, VariantKind::LepusNg { .. })
  }

  /// True when function debug info arrives as a separate sidecar blob
  /// instead of inline with the compiled script.
  pub fn debug_info_outside(&self) -> bool {
    matches!(
      self,
      VariantKind::LepusNg {
        debug_info_outside: true
      }
    )
  }
}

/// An execution position in engine terms (numeric script id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
  pub script_id: i32,
  pub line: i64,
  pub column: i64,
}

#[derive(Debug, Clone)]
pub struct EvalOutcome {
  pub result: cdp::RemoteObject,
  pub exception_details: Option<cdp::ExceptionDetails>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeapUsage {
  pub used_size: f64,
  pub total_size: f64,
}

/// What the core needs from the engine while servicing the protocol.
/// Implementations are driven from the inspected thread only.
pub trait JsEngine {
  /// Current call stack depth, 0 when idle.
  fn stack_depth(&self) -> usize;

  /// Position of the currently executing statement, if any.
  fn current_location(&self) -> Option<Location>;

  /// Call stack for `Debugger.paused`, innermost frame first.
  fn call_frames(&self) -> Vec<cdp::CallFrame>;

  fn evaluate_on_call_frame(
    &mut self,
    call_frame_id: &str,
    expression: &str,
  ) -> EvalOutcome;

  fn evaluate(&mut self, expression: &str) -> EvalOutcome;

  fn get_properties(&mut self, object_id: &str) -> Vec<cdp::PropertyDescriptor>;

  /// Evaluates a breakpoint condition in the paused frame. Errors count
  /// as false.
  fn condition_holds(&mut self, condition: &str) -> bool;

  fn heap_usage(&self) -> HeapUsage {
    HeapUsage::default()
  }
}

/// A script the engine just compiled, as reported to `script_parsed`.
#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
  pub url: String,
  pub source: String,
  pub end_line: i64,
  pub hash: Option<String>,
  pub source_map_url: Option<String>,
}

/// Maps engine handles to live contexts. Owned by the embedding; there
/// is no process-global registry.
#[derive(Default)]
pub struct ContextRegistry {
  contexts: RefCell<HashMap<u64, Weak<InspectedContext>>>,
}

impl ContextRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&self, handle: ContextHandle, context: &Rc<InspectedContext>) {
    self
      .contexts
      .borrow_mut()
      .insert(handle.0, Rc::downgrade(context));
  }

  pub fn unregister(&self, handle: ContextHandle) {
    self.contexts.borrow_mut().remove(&handle.0);
  }

  /// Upgrades a handle. Returns `None` for stale handles: an engine may
  /// keep firing callbacks during its own teardown.
  pub fn get(&self, handle: ContextHandle) -> Option<Rc<InspectedContext>> {
    self.contexts.borrow().get(&handle.0).and_then(Weak::upgrade)
  }
}

/// The callbacks an engine build registers once at startup. Each entry
/// is a plain `fn`; the default table routes through the registry to
/// the context's debugger.
#[derive(Clone, Copy)]
pub struct CallbackTable {
  /// Engine reached a pause point; block here pumping messages until
  /// the front-end resumes.
  pub run_message_loop_on_pause: fn(&ContextRegistry, ContextHandle),
  pub quit_message_loop_on_pause: fn(&ContextRegistry, ContextHandle),
  /// Deliver a response for `call_id` to session `session_id`.
  pub send_response: fn(&ContextRegistry, ContextHandle, i32, i64, &str),
  /// Deliver an event to session `session_id`, or broadcast when the
  /// session id is [`crate::queue::BROADCAST_SESSION_ID`].
  pub send_notification: fn(&ContextRegistry, ContextHandle, i32, &str),
  /// Statement boundary hook: drain pending messages, run breakpoint
  /// and step checks, maybe pause.
  pub inspector_check: fn(&ContextRegistry, ContextHandle),
  /// A thrown exception; `uncaught` is true when nothing will catch it.
  pub debugger_exception:
    fn(&ContextRegistry, ContextHandle, cdp::ExceptionDetails, bool),
  pub console_api_called:
    fn(&ContextRegistry, ContextHandle, cdp::ConsoleApiCalledParams, Option<i64>),
  pub script_parsed: fn(&ContextRegistry, ContextHandle, ParsedScript),
  pub script_fail_to_parse: fn(&ContextRegistry, ContextHandle, ParsedScript),
}

impl Default for CallbackTable {
  fn default() -> Self {
    CallbackTable {
      run_message_loop_on_pause: |registry, handle| {
        if let Some(context) = registry.get(handle) {
          context.debugger().run_message_loop_on_pause();
        }
      },
      quit_message_loop_on_pause: |registry, handle| {
        if let Some(context) = registry.get(handle) {
          context.debugger().quit_message_loop_on_pause();
        }
      },
      send_response: |registry, handle, session_id, call_id, message| {
        if let Some(context) = registry.get(handle) {
          context.debugger().send_response(session_id, call_id, message);
        }
      },
      send_notification: |registry, handle, session_id, message| {
        if let Some(context) = registry.get(handle) {
          context.debugger().send_notification(session_id, message);
        }
      },
      inspector_check: |registry, handle| {
        if let Some(context) = registry.get(handle) {
          context.debugger().inspector_check();
        }
      },
      debugger_exception: |registry, handle, details, uncaught| {
        if let Some(context) = registry.get(handle) {
          context.debugger().exception_thrown(details, uncaught);
        }
      },
      console_api_called: |registry, handle, params, runtime_id| {
        if let Some(context) = registry.get(handle) {
          context.console_api_called(params, runtime_id);
        }
      },
      script_parsed: |registry, handle, script| {
        if let Some(context) = registry.get(handle) {
          context.script_parsed(script);
        }
      },
      script_fail_to_parse: |registry, handle, script| {
        if let Some(context) = registry.get(handle) {
          context.script_fail_to_parse(script);
        }
      },
    }
  }
}
