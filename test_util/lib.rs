// Copyright 2018-2026 the Deno authors. MIT license.

//! Scripted doubles for driving the debugger core in tests: an engine
//! whose position and stack depth the test controls, a channel that
//! records everything sent to the front-end, and a client whose pause
//! loop replays queued test actions instead of blocking on a socket.

use lynx_js_inspect::cdp;
use lynx_js_inspect::engine::EvalOutcome;
use lynx_js_inspect::engine::HeapUsage;
use lynx_js_inspect::engine::Location;
use lynx_js_inspect::Channel;
use lynx_js_inspect::InspectorClient;
use lynx_js_inspect::JsEngine;
use parking_lot::Mutex;
use serde_json::Value;
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::rc::Rc;

/// Shared knobs of a [`TestEngine`]. The test keeps a clone of the
/// `Rc` and moves the "engine" around between dispatches.
pub struct EngineProbe {
  pub depth: Cell<usize>,
  pub location: Cell<Option<Location>>,
  pub function_name: RefCell<String>,
  pub url: RefCell<String>,
  eval_results: RefCell<HashMap<String, Value>>,
  condition_results: RefCell<HashMap<String, bool>>,
  properties: RefCell<Vec<cdp::PropertyDescriptor>>,
  pub heap: Cell<(f64, f64)>,
}

impl Default for EngineProbe {
  fn default() -> Self {
    Self {
      depth: Cell::new(0),
      location: Cell::new(None),
      function_name: RefCell::new("global".to_string()),
      url: RefCell::new("test.js".to_string()),
      eval_results: RefCell::new(HashMap::new()),
      condition_results: RefCell::new(HashMap::new()),
      properties: RefCell::new(Vec::new()),
      heap: Cell::new((0.0, 0.0)),
    }
  }
}

impl EngineProbe {
  pub fn new() -> Rc<EngineProbe> {
    Rc::new(EngineProbe::default())
  }

  /// Positions the engine at `script_id:line:column` with `depth`
  /// frames on the stack.
  pub fn move_to(&self, script_id: i32, line: i64, column: i64, depth: usize) {
    self.location.set(Some(Location {
      script_id,
      line,
      column,
    }));
    self.depth.set(depth);
  }

  pub fn set_eval_result(&self, expression: &str, value: Value) {
    self
      .eval_results
      .borrow_mut()
      .insert(expression.to_string(), value);
  }

  pub fn set_condition_result(&self, condition: &str, holds: bool) {
    self
      .condition_results
      .borrow_mut()
      .insert(condition.to_string(), holds);
  }

  pub fn set_properties(&self, properties: Vec<cdp::PropertyDescriptor>) {
    *self.properties.borrow_mut() = properties;
  }
}

/// A [`JsEngine`] whose behavior is entirely scripted by the test.
pub struct TestEngine {
  probe: Rc<EngineProbe>,
}

impl TestEngine {
  pub fn new(probe: Rc<EngineProbe>) -> TestEngine {
    TestEngine { probe }
  }
}

impl JsEngine for TestEngine {
  fn stack_depth(&self) -> usize {
    self.probe.depth.get()
  }

  fn current_location(&self) -> Option<Location> {
    self.probe.location.get()
  }

  fn call_frames(&self) -> Vec<cdp::CallFrame> {
    let Some(location) = self.probe.location.get() else {
      return Vec::new();
    };
    vec![cdp::CallFrame {
      call_frame_id: "0".to_string(),
      function_name: self.probe.function_name.borrow().clone(),
      location: cdp::Location {
        script_id: location.script_id.to_string(),
        line_number: location.line,
        column_number: Some(location.column),
      },
      url: self.probe.url.borrow().clone(),
      scope_chain: Vec::new(),
      this: cdp::RemoteObject::undefined(),
    }]
  }

  fn evaluate_on_call_frame(
    &mut self,
    _call_frame_id: &str,
    expression: &str,
  ) -> EvalOutcome {
    self.evaluate(expression)
  }

  fn evaluate(&mut self, expression: &str) -> EvalOutcome {
    let result = match self.probe.eval_results.borrow().get(expression) {
      Some(value) => cdp::RemoteObject::from_value(value.clone()),
      None => cdp::RemoteObject::undefined(),
    };
    EvalOutcome {
      result,
      exception_details: None,
    }
  }

  fn get_properties(
    &mut self,
    _object_id: &str,
  ) -> Vec<cdp::PropertyDescriptor> {
    self.probe.properties.borrow().clone()
  }

  fn condition_holds(&mut self, condition: &str) -> bool {
    *self
      .probe
      .condition_results
      .borrow()
      .get(condition)
      .unwrap_or(&false)
  }

  fn heap_usage(&self) -> HeapUsage {
    let (used_size, total_size) = self.probe.heap.get();
    HeapUsage {
      used_size,
      total_size,
    }
  }
}

/// Records everything the core sends to a front-end. Panics if two
/// responses ever carry the same call id.
#[derive(Default)]
pub struct RecordingChannel {
  responses: Mutex<Vec<(i64, String)>>,
  notifications: Mutex<Vec<String>>,
  console: Mutex<Vec<(String, Option<i64>)>>,
  /// Responses and notifications interleaved in arrival order, for
  /// ordering assertions.
  events: Mutex<Vec<String>>,
  seen_ids: Mutex<HashSet<i64>>,
}

impl RecordingChannel {
  pub fn new() -> Rc<RecordingChannel> {
    Rc::new(RecordingChannel::default())
  }

  pub fn responses(&self) -> Vec<(i64, String)> {
    self.responses.lock().clone()
  }

  pub fn notifications(&self) -> Vec<String> {
    self.notifications.lock().clone()
  }

  pub fn console_messages(&self) -> Vec<(String, Option<i64>)> {
    self.console.lock().clone()
  }

  /// Method names of recorded notifications, in arrival order.
  pub fn notification_methods(&self) -> Vec<String> {
    self
      .notifications
      .lock()
      .iter()
      .filter_map(|n| {
        serde_json::from_str::<Value>(n)
          .ok()?
          .get("method")?
          .as_str()
          .map(String::from)
      })
      .collect()
  }

  /// The response recorded for `call_id`, parsed.
  pub fn response(&self, call_id: i64) -> Option<Value> {
    self
      .responses
      .lock()
      .iter()
      .find(|(id, _)| *id == call_id)
      .and_then(|(_, raw)| serde_json::from_str(raw).ok())
  }

  pub fn event_log(&self) -> Vec<String> {
    self.events.lock().clone()
  }

  pub fn clear(&self) {
    self.responses.lock().clear();
    self.notifications.lock().clear();
    self.console.lock().clear();
    self.events.lock().clear();
  }
}

impl Channel for RecordingChannel {
  fn send_response(&self, call_id: i64, message: &str) {
    assert!(
      self.seen_ids.lock().insert(call_id),
      "duplicate response for call id {call_id}: {message}"
    );
    self.responses.lock().push((call_id, message.to_string()));
    self.events.lock().push(message.to_string());
  }

  fn send_notification(&self, message: &str) {
    self.notifications.lock().push(message.to_string());
    self.events.lock().push(message.to_string());
  }

  fn on_console_message(&self, message: &str, runtime_id: Option<i64>) {
    self.console.lock().push((message.to_string(), runtime_id));
  }
}

type PauseAction = Box<dyn Fn()>;

/// An [`InspectorClient`] whose pause loop runs queued test actions
/// (usually `dispatch_protocol_message` calls) until one of them quits
/// the loop. A pause that runs out of actions without a quit panics
/// instead of hanging the test.
pub struct PumpingClient {
  actions: RefCell<VecDeque<PauseAction>>,
  quit: Cell<bool>,
  pub pause_count: Cell<usize>,
  pub full_func: Cell<bool>,
  pub last_group_id: RefCell<Option<String>>,
}

impl Default for PumpingClient {
  fn default() -> Self {
    Self {
      actions: RefCell::new(VecDeque::new()),
      quit: Cell::new(false),
      pause_count: Cell::new(0),
      full_func: Cell::new(true),
      last_group_id: RefCell::new(None),
    }
  }
}

impl PumpingClient {
  pub fn new() -> Rc<PumpingClient> {
    Rc::new(PumpingClient::default())
  }

  /// Queues an action for the next pause loop.
  pub fn on_pause(&self, action: impl Fn() + 'static) {
    self.actions.borrow_mut().push_back(Box::new(action));
  }
}

impl InspectorClient for PumpingClient {
  fn run_message_loop_on_pause(&self, group_id: &str) {
    self.pause_count.set(self.pause_count.get() + 1);
    *self.last_group_id.borrow_mut() = Some(group_id.to_string());
    loop {
      if self.quit.replace(false) {
        return;
      }
      let action = self.actions.borrow_mut().pop_front();
      match action {
        Some(action) => action(),
        None => panic!("pause loop starved: no action resumed execution"),
      }
    }
  }

  fn quit_message_loop_on_pause(&self) {
    self.quit.set(true);
  }

  fn full_func_enabled(&self) -> bool {
    self.full_func.get()
  }
}
