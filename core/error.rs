// Copyright 2018-2026 the Deno authors. MIT license.

use std::borrow::Cow;

/// A generic wrapper that can encapsulate any concrete error type.
pub type AnyError = anyhow::Error;

/// JSON-RPC error codes used by the Chrome DevTools Protocol.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const SERVER_ERROR: i32 = -32000;

/// Errors produced while dispatching an inbound protocol message. Each
/// variant maps onto one JSON-RPC error code; the session that sent the
/// offending message stays alive in every case.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error("Parse error")]
  Parse,
  #[error("Invalid Request")]
  InvalidRequest,
  #[error("Method not found")]
  MethodNotFound,
  #[error("Invalid params: {0}")]
  InvalidParams(String),
  #[error("{0}")]
  Server(Cow<'static, str>),
}

impl DispatchError {
  pub fn code(&self) -> i32 {
    match self {
      DispatchError::Parse => PARSE_ERROR,
      DispatchError::InvalidRequest => INVALID_REQUEST,
      DispatchError::MethodNotFound => METHOD_NOT_FOUND,
      DispatchError::InvalidParams(_) => INVALID_PARAMS,
      DispatchError::Server(_) => SERVER_ERROR,
    }
  }

  pub fn server(message: impl Into<Cow<'static, str>>) -> Self {
    DispatchError::Server(message.into())
  }
}

pub fn generic_error(message: impl Into<Cow<'static, str>>) -> AnyError {
  AnyError::msg(message.into())
}
