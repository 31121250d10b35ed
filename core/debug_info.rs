// Copyright 2018-2026 the Deno authors. MIT license.

//! LepusNG out-of-band debug info.
//!
//! LepusNG templates ship compiled bytecode with the source stripped
//! out; the toolchain emits a JSON sidecar describing the original
//! functions, their positions, and a pc-to-line table. The embedder
//! hands the sidecar to the context as a JSON string; unknown fields
//! are ignored so newer toolchains stay compatible.

use serde::Deserialize;

/// Top-level sidecar document: `{"lepusNG_debug_info": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugInfoDocument {
  #[serde(rename = "lepusNG_debug_info", default)]
  pub lepus_ng_debug_info: LepusNgDebugInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LepusNgDebugInfo {
  #[serde(default)]
  pub function_number: u32,
  #[serde(default)]
  pub function_info: Vec<RawFunctionInfo>,
  /// Reconstructed whole-template source, shown as script source.
  #[serde(default)]
  pub function_source: String,
  #[serde(default)]
  pub end_line_num: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFunctionInfo {
  #[serde(default)]
  pub function_id: i64,
  #[serde(default)]
  pub file_name: String,
  #[serde(default)]
  pub line_number: i64,
  #[serde(default)]
  pub column_number: i64,
  #[serde(default)]
  pub pc2line_len: usize,
  #[serde(default)]
  pub pc2line_buf: Vec<u8>,
  #[serde(default)]
  pub function_source: String,
  #[serde(default)]
  pub function_source_len: usize,
}

/// Hydrated per-function record stored on the script.
#[derive(Debug, Clone, Default)]
pub struct FunctionDebugInfo {
  pub function_id: i64,
  pub file_name: String,
  pub line_number: i64,
  pub column_number: i64,
  pub pc2line: Vec<u8>,
  pub source: String,
}

impl From<RawFunctionInfo> for FunctionDebugInfo {
  fn from(raw: RawFunctionInfo) -> Self {
    FunctionDebugInfo {
      function_id: raw.function_id,
      file_name: raw.file_name,
      line_number: raw.line_number,
      column_number: raw.column_number,
      pc2line: raw.pc2line_buf,
      source: raw.function_source,
    }
  }
}

pub fn parse_debug_info(
  json: &str,
) -> Result<LepusNgDebugInfo, serde_json::Error> {
  let doc: DebugInfoDocument = serde_json::from_str(json)?;
  Ok(doc.lepus_ng_debug_info)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_sidecar_and_ignores_unknown_fields() {
    let info = parse_debug_info(
      r#"{
        "lepusNG_debug_info": {
          "function_number": 1,
          "function_info": [{
            "function_id": 0,
            "file_name": "card.js",
            "line_number": 4,
            "column_number": 2,
            "pc2line_len": 3,
            "pc2line_buf": [1, 2, 3],
            "function_source": "function a() {}",
            "function_source_len": 15,
            "future_field": true
          }],
          "function_source": "function a() {}\n",
          "end_line_num": 12
        },
        "tool_version": "9.9"
      }"#,
    )
    .unwrap();
    assert_eq!(info.function_number, 1);
    assert_eq!(info.end_line_num, 12);
    let func = FunctionDebugInfo::from(info.function_info[0].clone());
    assert_eq!(func.file_name, "card.js");
    assert_eq!(func.pc2line, vec![1, 2, 3]);
  }

  #[test]
  fn missing_fields_default() {
    let info = parse_debug_info(r#"{"lepusNG_debug_info": {}}"#).unwrap();
    assert_eq!(info.function_number, 0);
    assert!(info.function_info.is_empty());
    let empty = parse_debug_info("{}").unwrap();
    assert_eq!(empty.end_line_num, 0);
  }

  #[test]
  fn malformed_sidecar_is_an_error() {
    assert!(parse_debug_info("not json").is_err());
  }
}
