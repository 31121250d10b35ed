// Copyright 2018-2026 the Deno authors. MIT license.

//! Chrome DevTools Protocol debugger core for the Lynx PrimJS and
//! LepusNG scripting engines.
//!
//! The crate sits between an engine context and any number of devtools
//! front-ends. The engine drives it through a callback table at
//! statement boundaries; front-ends drive it through
//! [`InspectorSession`]s carrying protocol messages. Everything runs on
//! the inspected thread except [`MessageQueue::push_back`], which a
//! transport thread may call directly.
//!
//! [`InspectorSession`]: session::InspectorSession
//! [`MessageQueue::push_back`]: queue::MessageQueue::push_back

pub mod breakpoint;
pub mod cdp;
pub mod console;
pub mod context;
pub mod debug_info;
pub mod debugger;
pub mod engine;
pub mod error;
pub mod inspector;
pub mod logging;
pub mod profiler;
pub mod queue;
pub mod script;
pub mod session;

pub use crate::context::InspectedContext;
pub use crate::debugger::Debugger;
pub use crate::engine::CallbackTable;
pub use crate::engine::ContextHandle;
pub use crate::engine::ContextRegistry;
pub use crate::engine::JsEngine;
pub use crate::engine::VariantKind;
pub use crate::error::AnyError;
pub use crate::inspector::Inspector;
pub use crate::inspector::InspectorClient;
pub use crate::session::Channel;
pub use crate::session::InspectorSession;
