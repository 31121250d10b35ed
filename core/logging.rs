// Copyright 2018-2026 the Deno authors. MIT license.

//! Log observer fan-out for the debugger core.
//!
//! The embedding can attach any number of observers (console pipes,
//! devtools overlays, test probes) to one `LoggingContext`. Observers
//! get stable numeric ids so they can be detached again. The context is
//! passed explicitly to the components that emit through it; there is
//! no process-wide install-once registry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub trait LogObserver {
  fn on_message(&self, level: log::Level, message: &str);
}

pub struct LoggingContext {
  observers: Mutex<HashMap<u32, Arc<dyn LogObserver + Send + Sync>>>,
  next_id: Mutex<u32>,
}

impl Default for LoggingContext {
  fn default() -> Self {
    Self::new()
  }
}

impl LoggingContext {
  pub fn new() -> Self {
    Self {
      observers: Mutex::new(HashMap::new()),
      next_id: Mutex::new(1),
    }
  }

  /// Attaches an observer and returns the id under which it can be
  /// detached later. Ids are never reused within one context.
  pub fn register(&self, observer: Arc<dyn LogObserver + Send + Sync>) -> u32 {
    let mut next_id = self.next_id.lock();
    let id = *next_id;
    *next_id += 1;
    self.observers.lock().insert(id, observer);
    id
  }

  /// Detaches an observer. Returns false if the id is unknown, which is
  /// not an error: teardown paths may race with explicit detach.
  pub fn unregister(&self, id: u32) -> bool {
    self.observers.lock().remove(&id).is_some()
  }

  pub fn observer_count(&self) -> usize {
    self.observers.lock().len()
  }

  /// Fans a message out to every registered observer. Also forwards to
  /// the `log` facade so embedders that only configure a global logger
  /// still see debugger traffic.
  pub fn log(&self, level: log::Level, message: &str) {
    log::log!(level, "{}", message);
    let observers = self.observers.lock();
    for observer in observers.values() {
      observer.on_message(level, message);
    }
  }

  pub fn debug(&self, message: &str) {
    self.log(log::Level::Debug, message);
  }
}
