// Copyright 2018-2026 the Deno authors. MIT license.

//! Protocol dispatch and pause control.
//!
//! [`Debugger`] is a cheap handle over one [`InspectedContext`]; every
//! protocol message and every engine callback funnels through it on the
//! inspected thread. A pause is a blocking call into the embedder's
//! `run_message_loop_on_pause`, during which inbound messages keep
//! being dispatched; `Debugger.resume` (and the step commands) answer
//! first, then ask the embedder to quit the loop, so the command's
//! response is always written before `Debugger.resumed`.

use crate::cdp;
use crate::cdp::Domain;
use crate::cdp::Method;
use crate::context::DomainBits;
use crate::context::InspectedContext;
use crate::context::StepMode;
use crate::context::StepState;
use crate::context::INPUT_SCRIPT_URL;
use crate::engine::Location;
use crate::error::DispatchError;
use crate::queue::DrainControl;
use crate::queue::QueuedMessage;
use crate::queue::BROADCAST_SESSION_ID;
use crate::script::ScriptSource;
use serde::de::DeserializeOwned;
use serde_json::json;
use serde_json::Value;
use std::rc::Rc;

/// `Debugger.enable` answers this fixed debugger id.
const DEBUGGER_ID: &str = "-1";

/// What a command handler produced.
enum Outcome {
  /// Send `result` as the response.
  Reply(Value),
  /// Send `result`, then leave the pause loop.
  ReplyAndResume(Value),
  /// The handler already sent everything it wanted to.
  AlreadySent,
}

#[derive(Clone)]
pub struct Debugger {
  context: Rc<InspectedContext>,
}

impl Debugger {
  pub fn new(context: Rc<InspectedContext>) -> Debugger {
    Debugger { context }
  }

  // -------------------------------------------------------------------
  // Inbound path.

  /// Entry point for a protocol message arriving on the inspected
  /// thread. The message is queued and the queue drained immediately;
  /// draining stops early when a handler resumes execution.
  pub fn dispatch_protocol_message(&self, session_id: i32, raw: &str) {
    if self.context.is_destroyed() {
      self.reject_destroyed(session_id, raw);
      return;
    }
    self.context.queue().push_back(session_id, raw);
    self.pump_queued_messages();
  }

  /// Drains messages pushed from the transport thread. Called from the
  /// statement boundary hook and from the pause loop.
  pub fn pump_queued_messages(&self) -> DrainControl {
    self
      .context
      .queue()
      .drain(|message| self.dispatch_message(&message))
  }

  fn reject_destroyed(&self, session_id: i32, raw: &str) {
    if let Ok(msg) = cdp::parse_message(raw) {
      if msg.expects_response() {
        self.send_response(
          session_id,
          msg.id,
          &cdp::error_response(
            msg.id,
            crate::error::SERVER_ERROR,
            "context is destroyed",
          ),
        );
      }
    }
  }

  fn dispatch_message(&self, queued: &QueuedMessage) -> DrainControl {
    let session_id = queued.session_id;
    let msg = match cdp::parse_message(&queued.content) {
      Ok(msg) => msg,
      Err(err) => {
        let id = recover_id(&queued.content);
        self.send_response(
          session_id,
          id,
          &cdp::error_response(id, err.code(), &err.to_string()),
        );
        return DrainControl::Continue;
      }
    };
    let method = match Method::parse(&msg.method) {
      Some(method) => method,
      None => {
        self.debug_log(&format!("unknown method: {}", msg.method));
        if msg.expects_response() {
          self.send_response(
            session_id,
            msg.id,
            &cdp::error_response(
              msg.id,
              crate::error::METHOD_NOT_FOUND,
              &format!("'{}' wasn't found", msg.method),
            ),
          );
        }
        return DrainControl::Continue;
      }
    };

    let call_id = msg.id;
    let expects_response = msg.expects_response();
    let outcome = self.handle(method, session_id, call_id, msg.params);
    match outcome {
      Ok(Outcome::Reply(result)) => {
        self.send_response(
          session_id,
          call_id,
          &cdp::response(call_id, result),
        );
        DrainControl::Continue
      }
      Ok(Outcome::ReplyAndResume(result)) => {
        self.send_response(
          session_id,
          call_id,
          &cdp::response(call_id, result),
        );
        self.quit_message_loop_on_pause();
        DrainControl::Resume
      }
      Ok(Outcome::AlreadySent) => DrainControl::Continue,
      Err(err) => {
        if expects_response {
          self.send_response(
            session_id,
            call_id,
            &cdp::error_response(call_id, err.code(), &err.to_string()),
          );
        }
        DrainControl::Continue
      }
    }
  }

  fn handle(
    &self,
    method: Method,
    session_id: i32,
    call_id: i64,
    params: Value,
  ) -> Result<Outcome, DispatchError> {
    match method {
      Method::DebuggerEnable => self.enable_debugger(session_id, call_id),
      Method::DebuggerDisable => {
        self.with_bits(session_id, |bits| bits.debugger = false);
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerSetBreakpointByUrl => {
        self.set_breakpoint_by_url(parse_params(params)?)
      }
      Method::DebuggerSetBreakpoint => {
        self.set_breakpoint(parse_params(params)?)
      }
      Method::DebuggerRemoveBreakpoint => {
        let args: cdp::RemoveBreakpointArgs = parse_params(params)?;
        self
          .context
          .state()
          .borrow_mut()
          .breakpoints
          .remove(&args.breakpoint_id);
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerSetBreakpointsActive => {
        let args: cdp::SetBreakpointsActiveArgs = parse_params(params)?;
        self
          .context
          .state()
          .borrow_mut()
          .breakpoints
          .set_active(args.active);
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerGetPossibleBreakpoints => {
        self.get_possible_breakpoints(parse_params(params)?)
      }
      Method::DebuggerContinueToLocation => {
        self.continue_to_location(parse_params(params)?)
      }
      Method::DebuggerResume => Ok(self.resume_or_noop(None)),
      Method::DebuggerStepOver => Ok(self.step(StepMode::Over)),
      Method::DebuggerStepInto => Ok(self.step(StepMode::Into)),
      Method::DebuggerStepOut => Ok(self.step(StepMode::Out)),
      Method::DebuggerPause => {
        let mut state = self.context.state().borrow_mut();
        if !state.paused {
          state.pause_pending = Some("other".to_string());
        }
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerPauseOnNextStatement => {
        let args: cdp::PauseOnNextStatementArgs = parse_params(params)?;
        let mut state = self.context.state().borrow_mut();
        // A frame drained after top-level execution already finished is
        // dropped on the floor; one drained before the script runs
        // latches and fires on the first statement.
        if !state.paused && !state.top_level_done {
          state.pause_pending =
            Some(args.reason.unwrap_or_else(|| "stopAtEntry".to_string()));
        }
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerStopAtEntry => {
        let mut state = self.context.state().borrow_mut();
        if !state.paused {
          state.pause_pending = Some("stopAtEntry".to_string());
        }
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerSetPauseOnExceptions => {
        let args: cdp::SetPauseOnExceptionsArgs = parse_params(params)?;
        self.context.state().borrow_mut().exception_pause = args.state;
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerSetSkipAllPauses => {
        let args: cdp::SetSkipAllPausesArgs = parse_params(params)?;
        self
          .context
          .state()
          .borrow_mut()
          .set_skip_all_pauses(args.skip);
        Ok(Outcome::Reply(json!({})))
      }
      Method::DebuggerEvaluateOnCallFrame => {
        let args: cdp::EvaluateOnCallFrameArgs = parse_params(params)?;
        if !self.context.state().borrow().paused {
          return Err(DispatchError::server("not paused"));
        }
        let outcome = self
          .context
          .engine()
          .borrow_mut()
          .evaluate_on_call_frame(&args.call_frame_id, &args.expression);
        Ok(Outcome::Reply(eval_result(outcome)))
      }
      Method::DebuggerGetScriptSource => {
        let args: cdp::GetScriptSourceArgs = parse_params(params)?;
        let script_id = parse_script_id(&args.script_id)?;
        let state = self.context.state().borrow();
        match state.scripts.by_id(script_id) {
          Some(script) => {
            Ok(Outcome::Reply(json!({ "scriptSource": script.source })))
          }
          None => Err(DispatchError::server(format!(
            "No script for id: {}",
            args.script_id
          ))),
        }
      }
      Method::RuntimeEnable => self.enable_runtime(session_id, call_id),
      Method::RuntimeDisable => {
        self.with_bits(session_id, |bits| bits.runtime = false);
        Ok(Outcome::Reply(json!({})))
      }
      Method::RuntimeEvaluate => {
        let args: cdp::EvaluateArgs = parse_params(params)?;
        let outcome =
          self.context.engine().borrow_mut().evaluate(&args.expression);
        Ok(Outcome::Reply(eval_result(outcome)))
      }
      Method::RuntimeGetProperties => {
        let args: cdp::GetPropertiesArgs = parse_params(params)?;
        let descriptors = self
          .context
          .engine()
          .borrow_mut()
          .get_properties(&args.object_id);
        Ok(Outcome::Reply(json!({
          "result": serde_json::to_value(descriptors)
            .map_err(|e| DispatchError::server(e.to_string()))?
        })))
      }
      Method::RuntimeDiscardConsoleEntries => {
        self.context.state().borrow_mut().console.clear();
        Ok(Outcome::Reply(json!({})))
      }
      Method::RuntimeGetHeapUsage => {
        let usage = self.context.engine().borrow().heap_usage();
        Ok(Outcome::Reply(json!({
          "usedSize": usage.used_size,
          "totalSize": usage.total_size,
        })))
      }
      Method::ProfilerEnable => {
        self.with_bits(session_id, |bits| bits.profiler = true);
        self.context.state().borrow_mut().profiler.enabled = true;
        Ok(Outcome::Reply(json!({})))
      }
      Method::ProfilerDisable => {
        self.with_bits(session_id, |bits| bits.profiler = false);
        Ok(Outcome::Reply(json!({})))
      }
      Method::ProfilerStart => {
        self.context.state().borrow_mut().profiler.start();
        Ok(Outcome::Reply(json!({})))
      }
      Method::ProfilerStop => {
        let profile = self.context.state().borrow_mut().profiler.stop();
        Ok(Outcome::Reply(json!({
          "profile": serde_json::to_value(profile)
            .map_err(|e| DispatchError::server(e.to_string()))?
        })))
      }
      Method::ProfilerSetSamplingInterval => {
        let args: cdp::SetSamplingIntervalArgs = parse_params(params)?;
        self
          .context
          .state()
          .borrow_mut()
          .profiler
          .set_sampling_interval(args.interval);
        Ok(Outcome::Reply(json!({})))
      }
    }
  }

  // -------------------------------------------------------------------
  // Domain enables.

  fn enable_debugger(
    &self,
    session_id: i32,
    call_id: i64,
  ) -> Result<Outcome, DispatchError> {
    let first = {
      let mut state = self.context.state().borrow_mut();
      let bits = state.sessions.entry(session_id).or_default();
      let first = !bits.debugger;
      bits.debugger = true;
      first
    };
    self.send_response(
      session_id,
      call_id,
      &cdp::response(call_id, json!({ "debuggerId": DEBUGGER_ID })),
    );
    if first {
      // Late attach: replay the scripts this session missed. One-off
      // evaluation scripts are not replayed.
      let scripts: Vec<ScriptSource> = self
        .context
        .state()
        .borrow()
        .scripts
        .iter()
        .filter(|s| s.url != INPUT_SCRIPT_URL)
        .cloned()
        .collect();
      for script in &scripts {
        self.announce_script(script, script.parse_failed, Some(session_id));
      }
      // If the engine is already sitting in a pause, the new front-end
      // gets a paused event describing it without a fresh pause.
      let paused = self.context.state().borrow().paused;
      if paused {
        let params = self.paused_params();
        self.send_to_session(
          session_id,
          &cdp::notification(
            "Debugger.paused",
            serde_json::to_value(params).unwrap_or_default(),
          ),
        );
      }
    }
    Ok(Outcome::AlreadySent)
  }

  fn enable_runtime(
    &self,
    session_id: i32,
    call_id: i64,
  ) -> Result<Outcome, DispatchError> {
    let first = {
      let mut state = self.context.state().borrow_mut();
      let bits = state.sessions.entry(session_id).or_default();
      let first = !bits.runtime;
      bits.runtime = true;
      first
    };
    self.send_response(
      session_id,
      call_id,
      &cdp::response(call_id, json!({})),
    );
    if first {
      self.send_to_session(
        session_id,
        &cdp::notification(
          "Runtime.executionContextCreated",
          json!({
            "context": {
              "id": self.context.execution_context_id,
              "origin": "",
              "name": self.context.name,
            }
          }),
        ),
      );
      let entries: Vec<cdp::ConsoleApiCalledParams> = self
        .context
        .state()
        .borrow()
        .console
        .replay()
        .map(|e| e.params.clone())
        .collect();
      for params in entries {
        self.send_to_session(
          session_id,
          &cdp::notification(
            "Runtime.consoleAPICalled",
            serde_json::to_value(params).unwrap_or_default(),
          ),
        );
      }
    }
    Ok(Outcome::AlreadySent)
  }

  // -------------------------------------------------------------------
  // Breakpoints.

  fn set_breakpoint_by_url(
    &self,
    args: cdp::SetBreakpointByUrlArgs,
  ) -> Result<Outcome, DispatchError> {
    let url = args
      .url
      .ok_or_else(|| DispatchError::InvalidParams("url required".into()))?;
    let column = args.column_number.unwrap_or(0);
    let (id, resolved, locations) = {
      let mut state = self.context.state().borrow_mut();
      let id = state
        .breakpoints
        .set_by_url(&url, args.line_number, column, args.condition)
        .id
        .clone();
      let matching: Vec<ScriptSource> = state
        .scripts
        .iter()
        .filter(|s| s.url == url && !s.parse_failed)
        .cloned()
        .collect();
      let mut resolved: Vec<(Vec<String>, ScriptSource)> = Vec::new();
      for script in matching {
        let ids = state.breakpoints.resolve_against(&script);
        if !ids.is_empty() {
          resolved.push((ids, script));
        }
      }
      let locations: Vec<cdp::Location> = state
        .breakpoints
        .iter()
        .filter(|b| b.id == id && b.script_id.is_some())
        .map(|b| cdp::Location {
          script_id: b.script_id.unwrap_or_default().to_string(),
          line_number: b.line,
          column_number: Some(b.column),
        })
        .collect();
      (id, resolved, locations)
    };
    for (ids, script) in &resolved {
      self.announce_resolved_breakpoints(ids, script);
    }
    Ok(Outcome::Reply(json!({
      "breakpointId": id,
      "locations": serde_json::to_value(locations)
        .map_err(|e| DispatchError::server(e.to_string()))?,
    })))
  }

  fn set_breakpoint(
    &self,
    args: cdp::SetBreakpointArgs,
  ) -> Result<Outcome, DispatchError> {
    let script_id = parse_script_id(&args.location.script_id)?;
    let mut state = self.context.state().borrow_mut();
    let script = state
      .scripts
      .by_id(script_id)
      .cloned()
      .ok_or_else(|| DispatchError::server("unknown script"))?;
    let column = args.location.column_number.unwrap_or(0);
    let id = state
      .breakpoints
      .set_by_url(
        &script.url,
        args.location.line_number,
        column,
        args.condition,
      )
      .id
      .clone();
    state.breakpoints.resolve_against(&script);
    Ok(Outcome::Reply(json!({
      "breakpointId": id,
      "actualLocation": serde_json::to_value(cdp::Location {
        script_id: script.id.to_string(),
        line_number: args.location.line_number,
        column_number: Some(column),
      })
      .map_err(|e| DispatchError::server(e.to_string()))?,
    })))
  }

  fn get_possible_breakpoints(
    &self,
    args: cdp::GetPossibleBreakpointsArgs,
  ) -> Result<Outcome, DispatchError> {
    let script_id = parse_script_id(&args.start.script_id)?;
    let state = self.context.state().borrow();
    let script = state
      .scripts
      .by_id(script_id)
      .ok_or_else(|| DispatchError::server("unknown script"))?;
    let first = args.start.line_number.max(0);
    let last = args
      .end
      .as_ref()
      .map(|e| e.line_number)
      .unwrap_or(script.end_line)
      .min(script.end_line);
    let locations: Vec<cdp::Location> = (first..=last)
      .map(|line| cdp::Location {
        script_id: script.id.to_string(),
        line_number: line,
        column_number: Some(0),
      })
      .collect();
    Ok(Outcome::Reply(json!({
      "locations": serde_json::to_value(locations)
        .map_err(|e| DispatchError::server(e.to_string()))?
    })))
  }

  fn continue_to_location(
    &self,
    args: cdp::ContinueToLocationArgs,
  ) -> Result<Outcome, DispatchError> {
    let script_id = parse_script_id(&args.location.script_id)?;
    {
      let mut state = self.context.state().borrow_mut();
      let url = state
        .scripts
        .by_id(script_id)
        .map(|s| s.url.clone())
        .ok_or_else(|| DispatchError::server("unknown script"))?;
      state.breakpoints.set_one_shot(
        &url,
        script_id,
        args.location.line_number,
      );
    }
    Ok(self.resume_or_noop(None))
  }

  // -------------------------------------------------------------------
  // Execution control.

  fn resume_or_noop(&self, step: Option<StepState>) -> Outcome {
    let mut state = self.context.state().borrow_mut();
    if !state.paused {
      return Outcome::Reply(json!({}));
    }
    state.stepping = step;
    Outcome::ReplyAndResume(json!({}))
  }

  fn step(&self, mode: StepMode) -> Outcome {
    if !self.context.state().borrow().paused {
      return Outcome::Reply(json!({}));
    }
    let engine = self.context.engine().borrow();
    let step = StepState {
      mode,
      depth: engine.stack_depth(),
      location: engine.current_location(),
    };
    drop(engine);
    self.resume_or_noop(Some(step))
  }

  /// Statement boundary hook. Drains the queue, feeds the profiler,
  /// then decides whether this statement pauses.
  pub fn inspector_check(&self) {
    if self.context.is_destroyed() {
      return;
    }
    self.pump_queued_messages();
    self.sample_profiler();

    if self.context.state().borrow().paused {
      return;
    }
    if !self.is_full_func_enabled() || !self.any_session_with_debugger() {
      return;
    }

    let location = self.context.engine().borrow().current_location();
    let (reason, hits, is_step) = {
      let mut state = self.context.state().borrow_mut();
      let hits = match location {
        Some(loc) if !state.skip_all_pauses => {
          let mut hits =
            state.breakpoints.hits_at(loc.script_id, loc.line, loc.column);
          hits.retain(|bp| match &bp.condition {
            None => true,
            Some(condition) => self
              .context
              .engine()
              .borrow_mut()
              .condition_holds(condition),
          });
          hits
        }
        _ => Vec::new(),
      };
      let pending = if state.executing {
        state.pause_pending.take()
      } else {
        None
      };
      if let Some(reason) = pending {
        (Some(wire_reason(&reason)), hits, false)
      } else if step_fires(state.stepping, &self.context, location) {
        (Some("debugCommand".to_string()), hits, true)
      } else if !hits.is_empty() {
        (Some("other".to_string()), hits, false)
      } else {
        (None, hits, false)
      }
    };
    let Some(reason) = reason else {
      return;
    };
    if is_step {
      self.context.state().borrow_mut().last_step_pause = location;
    } else {
      self.context.state().borrow_mut().last_step_pause = None;
    }
    let hit_ids: Vec<String> = hits.iter().map(|b| b.id.clone()).collect();
    self.trigger_pause(&reason, hit_ids);
  }

  /// A `debugger` statement. Suppressed when a step command just paused
  /// at the same position, so single-stepping over the keyword does not
  /// pause twice.
  pub fn pause_on_debugger_keyword(&self) {
    if self.context.is_destroyed()
      || !self.is_full_func_enabled()
      || !self.any_session_with_debugger()
    {
      return;
    }
    let location = self.context.engine().borrow().current_location();
    {
      let state = self.context.state().borrow();
      if state.paused || state.skip_all_pauses {
        return;
      }
      if let (Some(last), Some(current)) = (state.last_step_pause, location) {
        if last.script_id == current.script_id && last.line == current.line {
          return;
        }
      }
    }
    self.trigger_pause("debugCommand", Vec::new());
  }

  /// An exception crossed the engine's throw path.
  pub fn exception_thrown(
    &self,
    details: cdp::ExceptionDetails,
    uncaught: bool,
  ) {
    if self.context.is_destroyed() {
      return;
    }
    if uncaught {
      self.broadcast(
        Domain::Runtime,
        &cdp::notification(
          "Runtime.exceptionThrown",
          json!({
            "timestamp": 0.0,
            "exceptionDetails": serde_json::to_value(&details)
              .unwrap_or_default(),
          }),
        ),
      );
    }
    let should_pause = {
      let state = self.context.state().borrow();
      !state.paused
        && match state.exception_pause {
          cdp::ExceptionPauseState::None => false,
          cdp::ExceptionPauseState::Uncaught => uncaught,
          cdp::ExceptionPauseState::All => true,
        }
    };
    if should_pause
      && self.is_full_func_enabled()
      && self.any_session_with_debugger()
    {
      self.trigger_pause("exception", Vec::new());
    }
  }

  fn trigger_pause(&self, reason: &str, hit_breakpoints: Vec<String>) {
    {
      let mut state = self.context.state().borrow_mut();
      state.paused = true;
      state.pause_reason = Some(reason.to_string());
      state.hit_breakpoints = hit_breakpoints;
      state.stepping = None;
      state.pause_pending = None;
    }
    self.debug_log(&format!("pausing, reason: {}", reason));
    let params = self.paused_params();
    self.broadcast(
      Domain::Debugger,
      &cdp::notification(
        "Debugger.paused",
        serde_json::to_value(params).unwrap_or_default(),
      ),
    );
    self.run_message_loop_on_pause();
    {
      let mut state = self.context.state().borrow_mut();
      state.paused = false;
      state.pause_reason = None;
      state.hit_breakpoints.clear();
    }
    self.broadcast(
      Domain::Debugger,
      &cdp::notification("Debugger.resumed", json!({})),
    );
    self.debug_log("resumed");
  }

  fn paused_params(&self) -> cdp::PausedParams {
    let call_frames = self.context.engine().borrow().call_frames();
    let state = self.context.state().borrow();
    cdp::PausedParams {
      call_frames,
      reason: state
        .pause_reason
        .clone()
        .unwrap_or_else(|| "other".to_string()),
      hit_breakpoints: if state.hit_breakpoints.is_empty() {
        None
      } else {
        Some(state.hit_breakpoints.clone())
      },
    }
  }

  fn sample_profiler(&self) {
    let started = self.context.state().borrow().profiler.is_started();
    if !started {
      return;
    }
    let frame = self
      .context
      .engine()
      .borrow()
      .call_frames()
      .into_iter()
      .next()
      .map(|f| cdp::RuntimeCallFrame {
        function_name: f.function_name,
        script_id: f.location.script_id,
        url: f.url,
        line_number: f.location.line_number,
        column_number: f.location.column_number.unwrap_or(0),
      });
    self.context.state().borrow_mut().profiler.maybe_sample(frame);
  }

  // -------------------------------------------------------------------
  // Outbound path.

  pub fn run_message_loop_on_pause(&self) {
    if let Some(inspector) = self.context.inspector() {
      let group_id = inspector.group_id().to_string();
      inspector.client().run_message_loop_on_pause(&group_id);
    }
  }

  pub fn quit_message_loop_on_pause(&self) {
    if let Some(inspector) = self.context.inspector() {
      inspector.client().quit_message_loop_on_pause();
    }
  }

  fn is_full_func_enabled(&self) -> bool {
    self
      .context
      .inspector()
      .map(|i| i.client().full_func_enabled())
      .unwrap_or(false)
  }

  /// Debug-level trace of dispatch and pause traffic. Goes through the
  /// inspector's observer fan-out when one is attached, and always
  /// through the `log` facade.
  fn debug_log(&self, message: &str) {
    let logging = self
      .context
      .inspector()
      .and_then(|inspector| inspector.logging_context());
    match logging {
      Some(logging) => logging.debug(message),
      None => log::debug!("{}", message),
    }
  }

  fn any_session_with_debugger(&self) -> bool {
    self
      .context
      .state()
      .borrow()
      .sessions
      .values()
      .any(|bits| bits.debugger)
  }

  /// Routes a response to its session. Call id 0 means no response was
  /// expected; broadcast-tagged messages answer every Debugger-enabled
  /// session.
  pub fn send_response(&self, session_id: i32, call_id: i64, message: &str) {
    if call_id == cdp::NO_RESPONSE_ID {
      return;
    }
    if session_id == BROADCAST_SESSION_ID {
      self.broadcast(Domain::Debugger, message);
      return;
    }
    if let Some(inspector) = self.context.inspector() {
      if let Some(session) = inspector.get_session(session_id) {
        session.channel().send_response(call_id, message);
      }
    }
  }

  /// Routes an event. A non-negative session id addresses one session
  /// directly; [`BROADCAST_SESSION_ID`] fans out to every session with
  /// the event's domain enabled.
  pub fn send_notification(&self, session_id: i32, message: &str) {
    if session_id == BROADCAST_SESSION_ID {
      let domain = serde_json::from_str::<Value>(message)
        .ok()
        .and_then(|v| {
          v.get("method").and_then(|m| m.as_str()).map(Domain::of_method)
        })
        .unwrap_or(Domain::Debugger);
      self.broadcast(domain, message);
    } else {
      self.send_to_session(session_id, message);
    }
  }

  fn send_to_session(&self, session_id: i32, message: &str) {
    if let Some(inspector) = self.context.inspector() {
      if let Some(session) = inspector.get_session(session_id) {
        session.channel().send_notification(message);
      }
    }
  }

  fn broadcast(&self, domain: Domain, message: &str) {
    let ids: Vec<i32> = {
      let state = self.context.state().borrow();
      state
        .sessions
        .iter()
        .filter(|(_, bits)| match domain {
          Domain::Debugger => bits.debugger,
          Domain::Runtime => bits.runtime,
          Domain::Profiler => bits.profiler,
          Domain::Console => bits.runtime || bits.console_inspect,
        })
        .map(|(id, _)| *id)
        .collect()
    };
    for id in ids {
      self.send_to_session(id, message);
    }
  }

  pub(crate) fn announce_script(
    &self,
    script: &ScriptSource,
    failed: bool,
    only_session: Option<i32>,
  ) {
    let params = cdp::ScriptParsedParams {
      script_id: script.id.to_string(),
      url: script.url.clone(),
      has_source_url: !script.url.is_empty(),
      start_line: 0,
      start_column: 0,
      // Devtools expects the exclusive end, one past the last line.
      end_line: script.end_line + 1,
      end_column: 0,
      execution_context_id: self.context.execution_context_id,
      hash: script.hash.clone(),
      length: script.source.len() as i64,
      script_language: "JavaScript".to_string(),
      source_map_url: script.source_map_url.clone().unwrap_or_default(),
    };
    let method = if failed {
      "Debugger.scriptFailedToParse"
    } else {
      "Debugger.scriptParsed"
    };
    let message = cdp::notification(
      method,
      serde_json::to_value(params).unwrap_or_default(),
    );
    match only_session {
      Some(session_id) => self.send_to_session(session_id, &message),
      None => self.broadcast(Domain::Debugger, &message),
    }
  }

  pub(crate) fn announce_resolved_breakpoints(
    &self,
    breakpoint_ids: &[String],
    script: &ScriptSource,
  ) {
    for id in breakpoint_ids {
      let location = {
        let state = self.context.state().borrow();
        let found = state.breakpoints.iter().find(|b| &b.id == id).map(|b| {
          cdp::Location {
            script_id: script.id.to_string(),
            line_number: b.line,
            column_number: Some(b.column),
          }
        });
        found
      };
      let Some(location) = location else {
        continue;
      };
      self.broadcast(
        Domain::Debugger,
        &cdp::notification(
          "Debugger.breakpointResolved",
          json!({
            "breakpointId": id,
            "location": serde_json::to_value(location).unwrap_or_default(),
          }),
        ),
      );
    }
  }

  pub(crate) fn announce_console_call(
    &self,
    params: &cdp::ConsoleApiCalledParams,
    runtime_id: Option<i64>,
  ) {
    let message = cdp::notification(
      "Runtime.consoleAPICalled",
      serde_json::to_value(params).unwrap_or_default(),
    );
    self.broadcast(Domain::Runtime, &message);
    // Sessions with embedder-side console mirroring get the raw event
    // through the channel hook even when Runtime is not enabled.
    let mirror_ids: Vec<i32> = {
      let state = self.context.state().borrow();
      state
        .sessions
        .iter()
        .filter(|(_, bits)| bits.console_inspect && !bits.runtime)
        .map(|(id, _)| *id)
        .collect()
    };
    if !mirror_ids.is_empty() {
      if let Some(inspector) = self.context.inspector() {
        for id in mirror_ids {
          if let Some(session) = inspector.get_session(id) {
            session.channel().on_console_message(&message, runtime_id);
          }
        }
      }
    }
  }

  // -------------------------------------------------------------------
  // Execution lifecycle.

  /// Engine entered top-level script execution.
  pub fn execution_started(&self) {
    let mut state = self.context.state().borrow_mut();
    state.executing = true;
    state.top_level_done = false;
  }

  /// Engine finished top-level script execution.
  pub fn execution_finished(&self) {
    let mut state = self.context.state().borrow_mut();
    state.executing = false;
    state.top_level_done = true;
    state.pause_pending = None;
    state.stepping = None;
  }

  fn with_bits(&self, session_id: i32, f: impl FnOnce(&mut DomainBits)) {
    let mut state = self.context.state().borrow_mut();
    f(state.sessions.entry(session_id).or_default());
  }
}

/// Whether an armed step command fires at `location`.
fn step_fires(
  step: Option<StepState>,
  context: &Rc<InspectedContext>,
  location: Option<Location>,
) -> bool {
  let Some(step) = step else {
    return false;
  };
  let depth = context.engine().borrow().stack_depth();
  match step.mode {
    StepMode::Out => depth < step.depth,
    StepMode::Into => match (step.location, location) {
      (Some(issued), Some(current)) => issued != current,
      _ => true,
    },
    StepMode::Over => {
      if depth < step.depth {
        return true;
      }
      if depth > step.depth {
        return false;
      }
      match (step.location, location) {
        (Some(issued), Some(current)) => {
          issued.script_id != current.script_id || issued.line != current.line
        }
        _ => true,
      }
    }
  }
}

fn wire_reason(reason: &str) -> String {
  match reason {
    "breakpoint" | "pause" => "other".to_string(),
    "step" | "debuggerStatement" => "debugCommand".to_string(),
    other => other.to_string(),
  }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, DispatchError> {
  serde_json::from_value(params)
    .map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

fn parse_script_id(script_id: &str) -> Result<i32, DispatchError> {
  script_id
    .parse::<i32>()
    .map_err(|_| DispatchError::InvalidParams("bad scriptId".into()))
}

fn eval_result(outcome: crate::engine::EvalOutcome) -> Value {
  let mut result = json!({
    "result": serde_json::to_value(&outcome.result).unwrap_or_default(),
  });
  if let Some(details) = outcome.exception_details {
    result["exceptionDetails"] =
      serde_json::to_value(details).unwrap_or_default();
  }
  result
}

fn recover_id(raw: &str) -> i64 {
  serde_json::from_str::<Value>(raw)
    .ok()
    .and_then(|v| v.get("id").and_then(|id| id.as_i64()))
    .unwrap_or(cdp::NO_RESPONSE_ID)
}
