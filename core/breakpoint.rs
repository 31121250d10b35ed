// Copyright 2018-2026 the Deno authors. MIT license.

//! Breakpoint store.
//!
//! Breakpoint ids follow the devtools convention `"<url>:<line>:<column>"`.
//! Breakpoints set by url before the script is parsed stay unresolved
//! until a matching `scriptParsed` arrives; hit checks ignore
//! unresolved entries.

use crate::script::ScriptSource;

#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
  pub id: String,
  pub url: String,
  /// Engine script id once the url resolved against a parsed script.
  pub script_id: Option<i32>,
  pub line: i64,
  pub column: i64,
  pub condition: Option<String>,
  pub hit_count: u64,
  pub enabled: bool,
  /// Removed after the first hit. Used by `continueToLocation`.
  pub one_shot: bool,
}

pub fn breakpoint_id(url: &str, line: i64, column: i64) -> String {
  format!("{}:{}:{}", url, line, column)
}

#[derive(Default)]
pub struct BreakpointTable {
  breakpoints: Vec<Breakpoint>,
  /// `Debugger.setBreakpointsActive`. When false, every hit check
  /// misses but the table itself is untouched.
  active: bool,
  /// `setSkipAllPauses` stashes the previous flag here so disabling the
  /// skip restores it.
  active_before: bool,
}

impl BreakpointTable {
  pub fn new() -> Self {
    Self {
      breakpoints: Vec::new(),
      active: true,
      active_before: true,
    }
  }

  /// Registers a breakpoint keyed by url. A second registration at the
  /// same `{url, line, column}` returns the existing id without
  /// duplicating the entry.
  pub fn set_by_url(
    &mut self,
    url: &str,
    line: i64,
    column: i64,
    condition: Option<String>,
  ) -> &Breakpoint {
    let position = self
      .breakpoints
      .iter()
      .position(|b| b.url == url && b.line == line && b.column == column);
    let index = match position {
      Some(index) => index,
      None => {
        self.breakpoints.push(Breakpoint {
          id: breakpoint_id(url, line, column),
          url: url.to_string(),
          script_id: None,
          line,
          column,
          condition,
          hit_count: 0,
          enabled: true,
          one_shot: false,
        });
        self.breakpoints.len() - 1
      }
    };
    &self.breakpoints[index]
  }

  /// Registers a one-shot breakpoint for `continueToLocation`. It is
  /// deleted on first hit and never reported by id.
  pub fn set_one_shot(&mut self, url: &str, script_id: i32, line: i64) {
    self.breakpoints.push(Breakpoint {
      id: breakpoint_id(url, line, 0),
      url: url.to_string(),
      script_id: Some(script_id),
      line,
      column: 0,
      condition: None,
      hit_count: 0,
      enabled: true,
      one_shot: true,
    });
  }

  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.breakpoints.len();
    self.breakpoints.retain(|b| b.id != id);
    before != self.breakpoints.len()
  }

  /// Binds unresolved breakpoints whose url matches a newly parsed
  /// script. Returns the ids that resolved.
  pub fn resolve_against(&mut self, script: &ScriptSource) -> Vec<String> {
    let mut resolved = Vec::new();
    for bp in &mut self.breakpoints {
      if bp.script_id.is_none() && bp.url == script.url {
        bp.script_id = Some(script.id);
        resolved.push(bp.id.clone());
      }
    }
    resolved
  }

  /// Breakpoints matching an execution location. A breakpoint matches
  /// when the script and line are equal and the stored column is either
  /// zero (line breakpoint) or equal to the execution column.
  /// Conditions are not evaluated here; the caller owns that.
  pub fn hits_at(
    &mut self,
    script_id: i32,
    line: i64,
    column: i64,
  ) -> Vec<Breakpoint> {
    if !self.active {
      return Vec::new();
    }
    let mut hits = Vec::new();
    for bp in &mut self.breakpoints {
      if bp.enabled
        && bp.script_id == Some(script_id)
        && bp.line == line
        && (bp.column == 0 || bp.column == column)
      {
        bp.hit_count += 1;
        hits.push(bp.clone());
      }
    }
    self.breakpoints.retain(|b| !(b.one_shot && b.hit_count > 0));
    hits
  }

  /// Returns breakpoints on `url` to the unresolved state. One-shots
  /// are dropped outright.
  pub fn unbind_url(&mut self, url: &str) {
    self.breakpoints.retain(|b| !(b.one_shot && b.url == url));
    for bp in &mut self.breakpoints {
      if bp.url == url {
        bp.script_id = None;
      }
    }
  }

  pub fn set_active(&mut self, active: bool) {
    self.active = active;
    self.active_before = active;
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// `setSkipAllPauses(true)` forces hit checks off without losing the
  /// front-end's own `setBreakpointsActive` choice.
  pub fn set_skip_all(&mut self, skip: bool) {
    if skip {
      self.active_before = self.active;
      self.active = false;
    } else {
      self.active = self.active_before;
    }
  }

  pub fn clear(&mut self) {
    self.breakpoints.clear();
  }

  pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
    self.breakpoints.iter()
  }

  pub fn len(&self) -> usize {
    self.breakpoints.len()
  }

  pub fn is_empty(&self) -> bool {
    self.breakpoints.is_empty()
  }
}
