//! Minimal HCL writer

use super::{BlockKind, CodeEmitter, HclBlock, HclValue};
use crate::domain::{OctoformError, Result};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Default [`CodeEmitter`] producing HCL text
#[derive(Debug, Default, Clone)]
pub struct HclWriter;

impl HclWriter {
    pub fn new() -> Self {
        Self
    }

    fn write_block(&self, out: &mut String, block: &HclBlock, depth: usize) -> std::fmt::Result {
        let pad = INDENT.repeat(depth);
        write!(out, "{pad}{}", block.kind.keyword())?;
        for label in &block.labels {
            write!(out, " \"{}\"", escape_string(label))?;
        }
        out.push_str(" {\n");

        for (key, value) in &block.attributes {
            write!(out, "{pad}{INDENT}{} = ", attribute_key(key))?;
            self.write_value(out, value, depth + 1)?;
            out.push('\n');
        }

        for nested in &block.blocks {
            if !block.attributes.is_empty() || !matches!(nested.kind, BlockKind::Nested(_)) {
                out.push('\n');
            }
            self.write_block(out, nested, depth + 1)?;
        }

        writeln!(out, "{pad}}}")
    }

    fn write_value(&self, out: &mut String, value: &HclValue, depth: usize) -> std::fmt::Result {
        match value {
            HclValue::Null => out.push_str("null"),
            HclValue::Bool(b) => write!(out, "{b}")?,
            HclValue::Number(n) => write!(out, "{n}")?,
            HclValue::Template(text) => write!(out, "\"{}\"", escape_string(text))?,
            HclValue::Expression(expr) => out.push_str(expr),
            HclValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(out, item, depth)?;
                }
                out.push(']');
            }
            HclValue::Map(entries) => {
                if entries.is_empty() {
                    out.push_str("{}");
                    return Ok(());
                }
                let pad = INDENT.repeat(depth);
                out.push_str("{\n");
                for (key, item) in entries {
                    write!(out, "{pad}{INDENT}{} = ", attribute_key(key))?;
                    self.write_value(out, item, depth + 1)?;
                    out.push('\n');
                }
                write!(out, "{pad}}}")?;
            }
        }
        Ok(())
    }
}

impl CodeEmitter for HclWriter {
    fn emit(&self, block: &HclBlock) -> Result<String> {
        if matches!(block.kind, BlockKind::Nested(_)) {
            return Err(OctoformError::Validation(format!(
                "'{}' blocks can only be emitted inside another block",
                block.kind.keyword()
            )));
        }

        let mut out = String::new();
        self.write_block(&mut out, block, 0)
            .map_err(|e| OctoformError::Other(format!("Failed to write HCL: {e}")))?;
        Ok(out)
    }
}

/// Escapes characters that are not allowed raw in a quoted HCL string
fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Map keys that aren't plain identifiers must be quoted
fn attribute_key(key: &str) -> String {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if is_identifier {
        key.to_string()
    } else {
        format!("\"{}\"", escape_string(key))
    }
}
