// Copyright 2018-2026 the Deno authors. MIT license.

//! Typed model of the Chrome DevTools Protocol subset the debugger core
//! speaks.
//!
//! <https://chromedevtools.github.io/devtools-protocol/>
//!
//! Inbound messages are JSON objects `{ "id": <int>, "method":
//! "<Domain>.<op>", "params": {...} }`. Method strings are parsed into
//! the closed [`Method`] union; anything unrecognized answers
//! `-32601`. Call id `0` is a sentinel meaning "no response expected",
//! used for synthetic frames the core injects on its own behalf.

use crate::error::DispatchError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

/// Sentinel call id: the engine must not produce a response for it.
pub const NO_RESPONSE_ID: i64 = 0;

/// The CDP domains the core multiplexes per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
  Debugger,
  Runtime,
  Profiler,
  Console,
}

impl Domain {
  /// Domain of an outbound `"Domain.event"` method string. Unknown
  /// prefixes fall back to `Debugger`, the domain every front-end
  /// enables first.
  pub fn of_method(method: &str) -> Domain {
    match method.split('.').next() {
      Some("Runtime") => Domain::Runtime,
      Some("Profiler") => Domain::Profiler,
      Some("Console") => Domain::Console,
      _ => Domain::Debugger,
    }
  }
}

/// Closed union of the inbound operations the core handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  DebuggerEnable,
  DebuggerDisable,
  DebuggerSetBreakpoint,
  DebuggerSetBreakpointByUrl,
  DebuggerRemoveBreakpoint,
  DebuggerSetBreakpointsActive,
  DebuggerGetPossibleBreakpoints,
  DebuggerContinueToLocation,
  DebuggerResume,
  DebuggerStepOver,
  DebuggerStepInto,
  DebuggerStepOut,
  DebuggerPause,
  DebuggerPauseOnNextStatement,
  DebuggerStopAtEntry,
  DebuggerSetPauseOnExceptions,
  DebuggerSetSkipAllPauses,
  DebuggerEvaluateOnCallFrame,
  DebuggerGetScriptSource,
  RuntimeEnable,
  RuntimeDisable,
  RuntimeEvaluate,
  RuntimeGetProperties,
  RuntimeDiscardConsoleEntries,
  RuntimeGetHeapUsage,
  ProfilerEnable,
  ProfilerDisable,
  ProfilerStart,
  ProfilerStop,
  ProfilerSetSamplingInterval,
}

impl Method {
  pub fn parse(method: &str) -> Option<Method> {
    let method = match method {
      "Debugger.enable" => Method::DebuggerEnable,
      "Debugger.disable" => Method::DebuggerDisable,
      "Debugger.setBreakpoint" => Method::DebuggerSetBreakpoint,
      "Debugger.setBreakpointByUrl" => Method::DebuggerSetBreakpointByUrl,
      "Debugger.removeBreakpoint" => Method::DebuggerRemoveBreakpoint,
      "Debugger.setBreakpointsActive" => Method::DebuggerSetBreakpointsActive,
      "Debugger.getPossibleBreakpoints" => {
        Method::DebuggerGetPossibleBreakpoints
      }
      "Debugger.continueToLocation" => Method::DebuggerContinueToLocation,
      "Debugger.resume" => Method::DebuggerResume,
      "Debugger.stepOver" => Method::DebuggerStepOver,
      "Debugger.stepInto" => Method::DebuggerStepInto,
      "Debugger.stepOut" => Method::DebuggerStepOut,
      "Debugger.pause" => Method::DebuggerPause,
      "Debugger.pauseOnNextStatement" => Method::DebuggerPauseOnNextStatement,
      "Debugger.stopAtEntry" => Method::DebuggerStopAtEntry,
      "Debugger.setPauseOnExceptions" => Method::DebuggerSetPauseOnExceptions,
      "Debugger.setSkipAllPauses" => Method::DebuggerSetSkipAllPauses,
      "Debugger.evaluateOnCallFrame" => Method::DebuggerEvaluateOnCallFrame,
      "Debugger.getScriptSource" => Method::DebuggerGetScriptSource,
      "Runtime.enable" => Method::RuntimeEnable,
      "Runtime.disable" => Method::RuntimeDisable,
      "Runtime.evaluate" => Method::RuntimeEvaluate,
      "Runtime.getProperties" => Method::RuntimeGetProperties,
      "Runtime.discardConsoleEntries" => Method::RuntimeDiscardConsoleEntries,
      "Runtime.getHeapUsage" => Method::RuntimeGetHeapUsage,
      "Profiler.enable" => Method::ProfilerEnable,
      "Profiler.disable" => Method::ProfilerDisable,
      "Profiler.start" => Method::ProfilerStart,
      "Profiler.stop" => Method::ProfilerStop,
      "Profiler.setSamplingInterval" => Method::ProfilerSetSamplingInterval,
      _ => return None,
    };
    Some(method)
  }

  pub fn domain(&self) -> Domain {
    use Method::*;
    match self {
      RuntimeEnable | RuntimeDisable | RuntimeEvaluate
      | RuntimeGetProperties | RuntimeDiscardConsoleEntries
      | RuntimeGetHeapUsage => Domain::Runtime,
      ProfilerEnable | ProfilerDisable | ProfilerStart | ProfilerStop
      | ProfilerSetSamplingInterval => Domain::Profiler,
      _ => Domain::Debugger,
    }
  }
}

/// A parsed inbound message envelope.
#[derive(Debug, Clone)]
pub struct InboundMessage {
  /// Absent or zero means no response is expected.
  pub id: i64,
  pub method: String,
  pub params: Value,
}

impl InboundMessage {
  pub fn expects_response(&self) -> bool {
    self.id != NO_RESPONSE_ID
  }
}

/// Parses an inbound message. Bad JSON is a `Parse` error; JSON that is
/// not a `{"method": "..."}` object is an `Invalid Request`.
pub fn parse_message(raw: &str) -> Result<InboundMessage, DispatchError> {
  let value: Value =
    serde_json::from_str(raw).map_err(|_| DispatchError::Parse)?;
  let obj = value.as_object().ok_or(DispatchError::InvalidRequest)?;
  let method = obj
    .get("method")
    .and_then(|m| m.as_str())
    .ok_or(DispatchError::InvalidRequest)?
    .to_string();
  let id = match obj.get("id") {
    None => NO_RESPONSE_ID,
    Some(id) => id.as_i64().ok_or(DispatchError::InvalidRequest)?,
  };
  let params = obj.get("params").cloned().unwrap_or(Value::Null);
  Ok(InboundMessage { id, method, params })
}

pub fn response(id: i64, result: Value) -> String {
  json!({ "id": id, "result": result }).to_string()
}

pub fn error_response(id: i64, code: i32, message: &str) -> String {
  json!({ "id": id, "error": { "code": code, "message": message } })
    .to_string()
}

pub fn notification(method: &str, params: Value) -> String {
  json!({ "method": method, "params": params }).to_string()
}

/// Builds the synthetic frame a scheduled pause travels in. Id 0: the
/// engine treats it as "no response expected".
pub fn pause_on_next_statement_frame(reason: &str) -> String {
  json!({
    "id": NO_RESPONSE_ID,
    "method": "Debugger.pauseOnNextStatement",
    "params": { "reason": reason },
  })
  .to_string()
}

// ---------------------------------------------------------------------
// Shared protocol objects.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub script_id: String,
  pub line_number: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub column_number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subtype: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub class_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub object_id: Option<String>,
}

impl RemoteObject {
  pub fn undefined() -> RemoteObject {
    RemoteObject {
      kind: "undefined".to_string(),
      ..Default::default()
    }
  }

  pub fn from_value(value: Value) -> RemoteObject {
    let kind = match &value {
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Array(_) | Value::Object(_) => "object",
    };
    let subtype = match &value {
      Value::Null => Some("null".to_string()),
      Value::Array(_) => Some("array".to_string()),
      _ => None,
    };
    RemoteObject {
      kind: kind.to_string(),
      subtype,
      description: Some(value.to_string()),
      value: Some(value),
      ..Default::default()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
  pub exception_id: i64,
  pub text: String,
  pub line_number: i64,
  pub column_number: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub script_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exception: Option<RemoteObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
  #[serde(rename = "type")]
  pub kind: String,
  pub object: RemoteObject,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
  pub call_frame_id: String,
  pub function_name: String,
  pub location: Location,
  pub url: String,
  pub scope_chain: Vec<Scope>,
  pub this: RemoteObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCallFrame {
  pub function_name: String,
  pub script_id: String,
  pub url: String,
  pub line_number: i64,
  pub column_number: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
  pub call_frames: Vec<RuntimeCallFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<RemoteObject>,
  pub writable: bool,
  pub configurable: bool,
  pub enumerable: bool,
  pub is_own: bool,
}

// ---------------------------------------------------------------------
// Inbound argument payloads.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointArgs {
  pub location: Location,
  pub condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlArgs {
  pub line_number: i64,
  pub url: Option<String>,
  #[serde(default)]
  pub column_number: Option<i64>,
  pub condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointArgs {
  pub breakpoint_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsActiveArgs {
  pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPossibleBreakpointsArgs {
  pub start: Location,
  pub end: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueToLocationArgs {
  pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionPauseState {
  #[default]
  None,
  Uncaught,
  All,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPauseOnExceptionsArgs {
  pub state: ExceptionPauseState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSkipAllPausesArgs {
  pub skip: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameArgs {
  pub call_frame_id: String,
  pub expression: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceArgs {
  pub script_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseOnNextStatementArgs {
  #[serde(default)]
  pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateArgs {
  pub expression: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesArgs {
  pub object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSamplingIntervalArgs {
  pub interval: u32,
}

// ---------------------------------------------------------------------
// Outbound event payloads.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedParams {
  pub script_id: String,
  pub url: String,
  pub has_source_url: bool,
  pub start_line: i64,
  pub start_column: i64,
  pub end_line: i64,
  pub end_column: i64,
  pub execution_context_id: i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  pub length: i64,
  pub script_language: String,
  pub source_map_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedParams {
  pub call_frames: Vec<CallFrame>,
  pub reason: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hit_breakpoints: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalledParams {
  #[serde(rename = "type")]
  pub kind: String,
  pub args: Vec<RemoteObject>,
  pub execution_context_id: i32,
  pub timestamp: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stack_trace: Option<StackTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNode {
  pub id: i64,
  pub call_frame: RuntimeCallFrame,
  pub hit_count: i64,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub children: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub nodes: Vec<ProfileNode>,
  pub start_time: f64,
  pub end_time: f64,
  pub samples: Vec<i64>,
  pub time_deltas: Vec<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn parse_well_formed_message() {
    let msg = parse_message(
      r#"{"id":3,"method":"Debugger.setBreakpointByUrl","params":{"url":"a.js","lineNumber":1}}"#,
    )
    .unwrap();
    assert_eq!(msg.id, 3);
    assert_eq!(msg.method, "Debugger.setBreakpointByUrl");
    assert!(msg.expects_response());
    let args: SetBreakpointByUrlArgs =
      serde_json::from_value(msg.params).unwrap();
    assert_eq!(args.url.as_deref(), Some("a.js"));
    assert_eq!(args.line_number, 1);
    assert_eq!(args.column_number, None);
  }

  #[test]
  fn parse_rejects_bad_json() {
    let err = parse_message("{not json").unwrap_err();
    assert_eq!(err.code(), -32700);
  }

  #[test]
  fn parse_rejects_missing_method() {
    let err = parse_message(r#"{"id":1}"#).unwrap_err();
    assert_eq!(err.code(), -32600);
    let err = parse_message(r#"[1,2,3]"#).unwrap_err();
    assert_eq!(err.code(), -32600);
  }

  #[test]
  fn id_zero_expects_no_response() {
    let msg =
      parse_message(&pause_on_next_statement_frame("stopAtEntry")).unwrap();
    assert!(!msg.expects_response());
    let args: PauseOnNextStatementArgs =
      serde_json::from_value(msg.params).unwrap();
    assert_eq!(args.reason.as_deref(), Some("stopAtEntry"));
  }

  #[test]
  fn unknown_method_is_not_in_the_union() {
    assert_eq!(Method::parse("Debugger.nonesuch"), None);
    assert_eq!(Method::parse("HeapProfiler.takeHeapSnapshot"), None);
    assert_eq!(
      Method::parse("Debugger.stepInto"),
      Some(Method::DebuggerStepInto)
    );
  }

  #[test]
  fn method_domains() {
    assert_eq!(Method::DebuggerResume.domain(), Domain::Debugger);
    assert_eq!(Method::RuntimeEvaluate.domain(), Domain::Runtime);
    assert_eq!(Method::ProfilerStart.domain(), Domain::Profiler);
    assert_eq!(Domain::of_method("Runtime.consoleAPICalled"), Domain::Runtime);
    assert_eq!(Domain::of_method("Debugger.paused"), Domain::Debugger);
  }

  #[test]
  fn remote_object_from_value() {
    let obj = RemoteObject::from_value(serde_json::json!(42));
    assert_eq!(obj.kind, "number");
    let null = RemoteObject::from_value(Value::Null);
    assert_eq!(null.kind, "object");
    assert_eq!(null.subtype.as_deref(), Some("null"));
  }

  #[test]
  fn envelope_builders() {
    assert_eq!(
      response(7, serde_json::json!({})),
      r#"{"id":7,"result":{}}"#
    );
    let err = error_response(7, -32601, "Method not found");
    let v: Value = serde_json::from_str(&err).unwrap();
    assert_eq!(v["error"]["code"], -32601);
    let n = notification("Debugger.resumed", serde_json::json!({}));
    let v: Value = serde_json::from_str(&n).unwrap();
    assert!(v.get("id").is_none());
  }
}
