// Copyright 2018-2026 the Deno authors. MIT license.

//! Multiplexer root: one engine context, many front-end sessions.

use crate::context::InspectedContext;
use crate::engine::ContextHandle;
use crate::engine::ContextRegistry;
use crate::engine::JsEngine;
use crate::engine::VariantKind;
use crate::logging::LoggingContext;
use crate::session::Channel;
use crate::session::InspectorSession;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// The hooks an embedding provides for pause control. The pause loop
/// blocks inside `run_message_loop_on_pause` pumping its transport;
/// `quit_message_loop_on_pause` asks it to return.
pub trait InspectorClient {
  fn run_message_loop_on_pause(&self, group_id: &str);
  fn quit_message_loop_on_pause(&self);
  /// Gate for all pausing. Builds that ship a reduced debugger return
  /// false: breakpoint bookkeeping still works, but nothing ever
  /// blocks.
  fn full_func_enabled(&self) -> bool {
    true
  }
}

pub struct Inspector {
  context: Rc<InspectedContext>,
  client: Rc<dyn InspectorClient>,
  group_id: String,
  sessions: RefCell<HashMap<i32, Rc<InspectorSession>>>,
  logging: RefCell<Option<Arc<LoggingContext>>>,
}

impl Inspector {
  /// Builds the inspector for one engine context and registers the
  /// context under `handle` so the engine callback table can find it.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    registry: &ContextRegistry,
    handle: ContextHandle,
    name: impl Into<String>,
    variant: VariantKind,
    execution_context_id: i32,
    engine: Box<dyn JsEngine>,
    client: Rc<dyn InspectorClient>,
    group_id: impl Into<String>,
  ) -> Rc<Inspector> {
    let context =
      InspectedContext::new(handle, name, variant, execution_context_id, engine);
    registry.register(handle, &context);
    let inspector = Rc::new(Inspector {
      context: context.clone(),
      client,
      group_id: group_id.into(),
      sessions: RefCell::new(HashMap::new()),
      logging: RefCell::new(None),
    });
    context.attach_inspector(&inspector);
    inspector
  }

  /// Attaches a front-end under `session_id`. Ids are chosen by the
  /// embedder and must be non-negative; reconnecting under a live id
  /// replaces the old session.
  pub fn connect(
    self: &Rc<Self>,
    session_id: i32,
    channel: Rc<dyn Channel>,
  ) -> Rc<InspectorSession> {
    let session = InspectorSession::new(
      session_id,
      self.context.clone(),
      Rc::downgrade(self),
      channel,
    );
    // All domains start disabled; the front-end enables what it wants.
    self
      .context
      .state()
      .borrow_mut()
      .sessions
      .entry(session_id)
      .or_default();
    self.sessions.borrow_mut().insert(session_id, session.clone());
    session
  }

  pub fn get_session(&self, session_id: i32) -> Option<Rc<InspectorSession>> {
    self.sessions.borrow().get(&session_id).cloned()
  }

  pub fn session_count(&self) -> usize {
    self.sessions.borrow().len()
  }

  /// Closes and detaches the session registered under `session_id`.
  /// Unknown ids are a no-op; the transport may disconnect twice.
  pub fn remove_session(&self, session_id: i32) {
    let session = self.get_session(session_id);
    if let Some(session) = session {
      session.close();
    }
  }

  /// Removes the bookkeeping entry for a session that is closing.
  pub(crate) fn forget_session(&self, session_id: i32) {
    self.sessions.borrow_mut().remove(&session_id);
  }

  /// Routes debugger-core log traffic through an observer fan-out in
  /// addition to the `log` facade.
  pub fn set_logging_context(&self, logging: Arc<LoggingContext>) {
    *self.logging.borrow_mut() = Some(logging);
  }

  pub fn logging_context(&self) -> Option<Arc<LoggingContext>> {
    self.logging.borrow().clone()
  }

  pub fn context(&self) -> &Rc<InspectedContext> {
    &self.context
  }

  pub fn client(&self) -> &Rc<dyn InspectorClient> {
    &self.client
  }

  pub fn group_id(&self) -> &str {
    &self.group_id
  }

  pub fn is_full_func_enabled(&self) -> bool {
    self.client.full_func_enabled()
  }

  /// Tears the context down: sessions detach, the handle is
  /// unregistered, later dispatches answer with a server error.
  pub fn destroy(&self, registry: &ContextRegistry) {
    let sessions: Vec<Rc<InspectorSession>> =
      self.sessions.borrow().values().cloned().collect();
    for session in sessions {
      session.close();
    }
    self.context.destroy();
    registry.unregister(self.context.handle);
  }
}
