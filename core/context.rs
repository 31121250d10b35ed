// Copyright 2018-2026 the Deno authors. MIT license.

//! Per-engine-context debugger state.
//!
//! One [`InspectedContext`] couples one engine context to the protocol
//! layer. It owns the script, breakpoint and console tables, the
//! inbound message queue, and the per-session domain-enable bits.
//! Everything except [`MessageQueue::push_back`] runs on the inspected
//! thread, so the state sits behind a `RefCell` rather than a lock.

use crate::cdp;
use crate::breakpoint::BreakpointTable;
use crate::console::ConsoleEntry;
use crate::console::ConsoleRing;
use crate::debug_info::LepusNgDebugInfo;
use crate::debugger::Debugger;
use crate::engine::ContextHandle;
use crate::engine::JsEngine;
use crate::engine::Location;
use crate::engine::ParsedScript;
use crate::engine::VariantKind;
use crate::error::generic_error;
use crate::error::AnyError;
use crate::inspector::Inspector;
use crate::profiler::ProfilerState;
use crate::queue::MessageQueue;
use crate::script::ScriptSource;
use crate::script::ScriptTable;
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::rc::Weak;

/// Url of REPL-style one-off evaluations. Such scripts are registered
/// but never replayed to late-attaching front-ends.
pub const INPUT_SCRIPT_URL: &str = "<input>";

/// Which domains a session has enabled on this context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainBits {
  pub debugger: bool,
  pub runtime: bool,
  pub profiler: bool,
  /// Console mirroring toggled by the embedder, independent of the
  /// protocol-level Runtime enable.
  pub console_inspect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
  Over,
  Into,
  Out,
}

/// Recorded when a step command is issued, cleared on the next pause.
#[derive(Debug, Clone, Copy)]
pub struct StepState {
  pub mode: StepMode,
  /// Stack depth at issuance.
  pub depth: usize,
  /// Location at issuance.
  pub location: Option<Location>,
}

pub struct DebuggerState {
  pub scripts: ScriptTable,
  pub breakpoints: BreakpointTable,
  pub console: ConsoleRing,
  pub sessions: HashMap<i32, DomainBits>,
  pub profiler: ProfilerState,
  pub paused: bool,
  /// Wire reason of the current pause, e.g. `"other"`.
  pub pause_reason: Option<String>,
  /// Breakpoint ids reported with the current pause.
  pub hit_breakpoints: Vec<String>,
  pub stepping: Option<StepState>,
  /// Wire reason of a pause requested for the next statement boundary.
  pub pause_pending: Option<String>,
  /// Where the last step-triggered pause landed. A `debugger` keyword
  /// at the same position is suppressed.
  pub last_step_pause: Option<Location>,
  pub exception_pause: cdp::ExceptionPauseState,
  exception_pause_before: cdp::ExceptionPauseState,
  pub skip_all_pauses: bool,
  /// True while the engine is running script, i.e. between the first
  /// statement and top-level completion. Scheduled pauses fire only
  /// during execution.
  pub executing: bool,
  /// Set once top-level execution completed. A scheduled pause arriving
  /// after that is dropped; one arriving before the first statement
  /// latches and fires on entry.
  pub top_level_done: bool,
  /// LepusNG sidecar received before the top-level function existed.
  pub pending_debug_info: Option<LepusNgDebugInfo>,
}

impl Default for DebuggerState {
  fn default() -> Self {
    Self {
      scripts: ScriptTable::new(),
      breakpoints: BreakpointTable::new(),
      console: ConsoleRing::new(),
      sessions: HashMap::new(),
      profiler: ProfilerState::new(),
      paused: false,
      pause_reason: None,
      hit_breakpoints: Vec::new(),
      stepping: None,
      pause_pending: None,
      last_step_pause: None,
      exception_pause: cdp::ExceptionPauseState::None,
      exception_pause_before: cdp::ExceptionPauseState::None,
      skip_all_pauses: false,
      executing: false,
      top_level_done: false,
      pending_debug_info: None,
    }
  }
}

impl DebuggerState {
  /// `setSkipAllPauses` also mutes exception pausing; lifting the skip
  /// restores the previous policy.
  pub fn set_skip_all_pauses(&mut self, skip: bool) {
    if skip == self.skip_all_pauses {
      return;
    }
    self.skip_all_pauses = skip;
    self.breakpoints.set_skip_all(skip);
    if skip {
      self.exception_pause_before = self.exception_pause;
      self.exception_pause = cdp::ExceptionPauseState::None;
    } else {
      self.exception_pause = self.exception_pause_before;
    }
  }
}

pub struct InspectedContext {
  pub handle: ContextHandle,
  pub name: String,
  pub variant: VariantKind,
  pub execution_context_id: i32,
  inspector: RefCell<Weak<Inspector>>,
  engine: RefCell<Box<dyn JsEngine>>,
  queue: MessageQueue,
  state: RefCell<DebuggerState>,
  destroyed: Cell<bool>,
}

impl InspectedContext {
  pub fn new(
    handle: ContextHandle,
    name: impl Into<String>,
    variant: VariantKind,
    execution_context_id: i32,
    engine: Box<dyn JsEngine>,
  ) -> Rc<InspectedContext> {
    Rc::new(InspectedContext {
      handle,
      name: name.into(),
      variant,
      execution_context_id,
      inspector: RefCell::new(Weak::new()),
      engine: RefCell::new(engine),
      queue: MessageQueue::new(),
      state: RefCell::new(DebuggerState::default()),
      destroyed: Cell::new(false),
    })
  }

  pub(crate) fn attach_inspector(&self, inspector: &Rc<Inspector>) {
    *self.inspector.borrow_mut() = Rc::downgrade(inspector);
  }

  pub fn inspector(&self) -> Option<Rc<Inspector>> {
    self.inspector.borrow().upgrade()
  }

  /// Cheap dispatch handle over this context.
  pub fn debugger(self: &Rc<Self>) -> Debugger {
    Debugger::new(self.clone())
  }

  pub fn queue(&self) -> &MessageQueue {
    &self.queue
  }

  pub fn state(&self) -> &RefCell<DebuggerState> {
    &self.state
  }

  pub fn engine(&self) -> &RefCell<Box<dyn JsEngine>> {
    &self.engine
  }

  pub fn is_destroyed(&self) -> bool {
    self.destroyed.get()
  }

  /// Marks the context dead. Subsequent dispatches answer `-32000`;
  /// callbacks become no-ops. Idempotent.
  pub fn destroy(&self) {
    self.destroyed.set(true);
  }

  // -------------------------------------------------------------------
  // Engine event entry points.

  /// Registers a parsed script, binds waiting breakpoints, announces it
  /// to every Debugger-enabled session.
  pub fn script_parsed(self: &Rc<Self>, script: ParsedScript) {
    self.register_script(script, false)
  }

  /// Same bookkeeping as [`script_parsed`](Self::script_parsed), but
  /// announced as `Debugger.scriptFailedToParse`.
  pub fn script_fail_to_parse(self: &Rc<Self>, script: ParsedScript) {
    self.register_script(script, true)
  }

  fn register_script(self: &Rc<Self>, script: ParsedScript, failed: bool) {
    if self.is_destroyed() {
      return;
    }
    let (record, resolved) = {
      let mut state = self.state.borrow_mut();
      let id = state.scripts.insert(ScriptSource {
        id: 0,
        url: script.url,
        source: script.source,
        end_line: script.end_line,
        hash: script.hash,
        source_map_url: script.source_map_url,
        parse_failed: failed,
        functions: Vec::new(),
      });
      // LepusNG scripts registered after the sidecar arrived hydrate
      // immediately.
      if let Some(info) = state.pending_debug_info.take() {
        Self::hydrate_debug_info(&mut state, id, info);
      }
      let record = state.scripts.by_id(id).cloned();
      let resolved = match &record {
        Some(record) if !failed => {
          state.breakpoints.resolve_against(record)
        }
        _ => Vec::new(),
      };
      (record, resolved)
    };
    if let Some(record) = record {
      self.debugger().announce_script(&record, failed, None);
      self.debugger().announce_resolved_breakpoints(&resolved, &record);
    }
  }

  /// Records a console call and fans it out to sessions with the
  /// Runtime domain (or console mirroring) enabled.
  pub fn console_api_called(
    self: &Rc<Self>,
    params: cdp::ConsoleApiCalledParams,
    runtime_id: Option<i64>,
  ) {
    if self.is_destroyed() {
      return;
    }
    self.state.borrow_mut().console.push(ConsoleEntry {
      params: params.clone(),
      runtime_id,
    });
    self.debugger().announce_console_call(&params, runtime_id);
  }

  /// Drops the buffered console entries tagged with `runtime_id`, so a
  /// later Runtime enable no longer replays them. Returns how many were
  /// dropped. Lynx calls this when a card's runtime is torn down.
  pub fn delete_console_messages_with_rid(
    self: &Rc<Self>,
    runtime_id: i64,
  ) -> usize {
    self
      .state
      .borrow_mut()
      .console
      .delete_with_runtime_id(runtime_id)
  }

  // -------------------------------------------------------------------
  // LepusNG debug info.

  /// Accepts the out-of-band debug-info sidecar. Only LepusNG contexts
  /// compiled with the sidecar convention take one; anything else is
  /// rejected. If no script is registered yet the sidecar is parked
  /// until
  /// [`on_top_level_function_ready`](Self::on_top_level_function_ready).
  pub fn set_debug_info(
    self: &Rc<Self>,
    url: &str,
    json: &str,
  ) -> Result<(), AnyError> {
    if !self.variant.debug_info_outside() {
      return Err(generic_error(
        "context variant does not take out-of-band debug info",
      ));
    }
    let info = crate::debug_info::parse_debug_info(json)
      .map_err(|e| generic_error(format!("bad debug info: {e}")))?;
    let mut state = self.state.borrow_mut();
    let script_id = state.scripts.by_url(url).map(|s| s.id);
    match script_id {
      Some(id) => Self::hydrate_debug_info(&mut state, id, info),
      None => state.pending_debug_info = Some(info),
    }
    Ok(())
  }

  /// LepusNG notifies the core once the top-level function exists; any
  /// parked sidecar hydrates against the newest script. Other variants
  /// never park a sidecar, so this is a no-op for them.
  pub fn on_top_level_function_ready(self: &Rc<Self>) {
    if !self.variant.is_lepus_ng() {
      return;
    }
    let mut state = self.state.borrow_mut();
    let Some(info) = state.pending_debug_info.take() else {
      return;
    };
    let newest = state.scripts.iter().map(|s| s.id).max();
    if let Some(id) = newest {
      Self::hydrate_debug_info(&mut state, id, info);
    } else {
      state.pending_debug_info = Some(info);
    }
  }

  fn hydrate_debug_info(
    state: &mut DebuggerState,
    script_id: i32,
    info: LepusNgDebugInfo,
  ) {
    if let Some(script) = state.scripts.by_id_mut(script_id) {
      if script.source.is_empty() {
        script.source = info.function_source.clone();
      }
      if info.end_line_num > 0 {
        script.end_line = info.end_line_num;
      }
      script.functions =
        info.function_info.into_iter().map(Into::into).collect();
    }
  }

  /// Drops every script registered under `url`. Breakpoints on the url
  /// go back to unresolved so a reload re-binds them against the fresh
  /// script id. Used on template reload.
  pub fn delete_script_by_url(self: &Rc<Self>, url: &str) -> usize {
    let mut state = self.state.borrow_mut();
    state.breakpoints.unbind_url(url);
    state.scripts.remove_by_url(url)
  }
}
