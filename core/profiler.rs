// Copyright 2018-2026 the Deno authors. MIT license.

//! Statement-sampling CPU profiler.
//!
//! A real sampling profiler interrupts on a timer; this one piggybacks
//! on the engine's statement boundary hook and records the current
//! location each time the sampling interval has elapsed since the last
//! sample. The default interval matches the engine default of 100
//! microseconds.

use crate::cdp;
use std::collections::HashMap;
use std::time::Instant;

pub const DEFAULT_SAMPLING_INTERVAL_US: u32 = 100;

const ROOT_NODE_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
  function_name: String,
  script_id: String,
  line: i64,
}

pub struct ProfilerState {
  pub enabled: bool,
  started: bool,
  interval_us: u32,
  start: Option<Instant>,
  last_sample: Option<Instant>,
  nodes: Vec<cdp::ProfileNode>,
  node_ids: HashMap<NodeKey, i64>,
  samples: Vec<i64>,
  time_deltas: Vec<i64>,
}

impl Default for ProfilerState {
  fn default() -> Self {
    Self::new()
  }
}

impl ProfilerState {
  pub fn new() -> Self {
    Self {
      enabled: false,
      started: false,
      interval_us: DEFAULT_SAMPLING_INTERVAL_US,
      start: None,
      last_sample: None,
      nodes: Vec::new(),
      node_ids: HashMap::new(),
      samples: Vec::new(),
      time_deltas: Vec::new(),
    }
  }

  pub fn set_sampling_interval(&mut self, interval_us: u32) {
    if !self.started {
      self.interval_us = interval_us.max(1);
    }
  }

  pub fn interval_us(&self) -> u32 {
    self.interval_us
  }

  pub fn is_started(&self) -> bool {
    self.started
  }

  pub fn start(&mut self) {
    if self.started {
      return;
    }
    self.started = true;
    self.start = Some(Instant::now());
    self.last_sample = self.start;
    self.nodes = vec![cdp::ProfileNode {
      id: ROOT_NODE_ID,
      call_frame: cdp::RuntimeCallFrame {
        function_name: "(root)".to_string(),
        script_id: "0".to_string(),
        url: String::new(),
        line_number: -1,
        column_number: -1,
      },
      hit_count: 0,
      children: Vec::new(),
    }];
    self.node_ids.clear();
    self.samples.clear();
    self.time_deltas.clear();
  }

  /// Records a sample if the interval elapsed. Called from the
  /// statement boundary hook with the current frame, outermost script
  /// position if the engine is between calls.
  pub fn maybe_sample(&mut self, frame: Option<cdp::RuntimeCallFrame>) {
    if !self.started {
      return;
    }
    let now = Instant::now();
    let last = match self.last_sample {
      Some(last) => last,
      None => return,
    };
    let elapsed_us = now.duration_since(last).as_micros() as i64;
    if elapsed_us < self.interval_us as i64 {
      return;
    }
    self.last_sample = Some(now);

    let node_id = match frame {
      None => ROOT_NODE_ID,
      Some(frame) => self.intern_node(frame),
    };
    if let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) {
      node.hit_count += 1;
    }
    self.samples.push(node_id);
    self.time_deltas.push(elapsed_us);
  }

  fn intern_node(&mut self, frame: cdp::RuntimeCallFrame) -> i64 {
    let key = NodeKey {
      function_name: frame.function_name.clone(),
      script_id: frame.script_id.clone(),
      line: frame.line_number,
    };
    if let Some(id) = self.node_ids.get(&key) {
      return *id;
    }
    let id = self.nodes.len() as i64 + 1;
    self.nodes.push(cdp::ProfileNode {
      id,
      call_frame: frame,
      hit_count: 0,
      children: Vec::new(),
    });
    self.node_ids.insert(key, id);
    if let Some(root) = self.nodes.iter_mut().find(|n| n.id == ROOT_NODE_ID) {
      root.children.push(id);
    }
    id
  }

  /// Stops sampling and hands the accumulated profile over. `Profiler.stop`
  /// without a prior start yields an empty profile rather than an error.
  pub fn stop(&mut self) -> cdp::Profile {
    let start = self.start.take();
    self.started = false;
    self.last_sample = None;
    let start_time = 0.0;
    let end_time = start
      .map(|s| s.elapsed().as_micros() as f64)
      .unwrap_or(0.0);
    cdp::Profile {
      nodes: std::mem::take(&mut self.nodes),
      start_time,
      end_time,
      samples: std::mem::take(&mut self.samples),
      time_deltas: std::mem::take(&mut self.time_deltas),
    }
  }
}
