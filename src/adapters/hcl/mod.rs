//! Code emitter for the output configuration language
//!
//! Converters never write HCL text themselves. They populate [`HclBlock`] records and hand
//! them to a [`CodeEmitter`] at render time; [`HclWriter`] is the default emitter.

pub mod writer;

pub use writer::HclWriter;

use crate::domain::Result;

/// Tag of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Resource,
    Data,
    Variable,
    Output,
    /// Block nested inside another one, e.g. `lifecycle` or `phase`
    Nested(&'static str),
}

impl BlockKind {
    /// Keyword opening the block
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::Resource => "resource",
            BlockKind::Data => "data",
            BlockKind::Variable => "variable",
            BlockKind::Output => "output",
            BlockKind::Nested(name) => name,
        }
    }
}

/// An attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum HclValue {
    Null,
    Bool(bool),
    Number(i64),
    /// Quoted template string; `${...}` sequences are kept as interpolations
    Template(String),
    /// Bare expression written verbatim
    Expression(String),
    List(Vec<HclValue>),
    Map(Vec<(String, HclValue)>),
}

impl HclValue {
    /// A quoted string whose content is user text: interpolation openers are escaped
    pub fn literal(text: impl AsRef<str>) -> Self {
        HclValue::Template(escape_interpolation(text.as_ref()))
    }

    /// A quoted string that may contain reference expressions
    pub fn template(text: impl Into<String>) -> Self {
        HclValue::Template(text.into())
    }

    /// A bare expression
    pub fn expression(text: impl Into<String>) -> Self {
        HclValue::Expression(text.into())
    }

    /// An optional literal, `null` when absent
    pub fn optional_literal(text: Option<&str>) -> Self {
        text.map_or(HclValue::Null, HclValue::literal)
    }

    /// A list of quoted template strings
    pub fn template_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HclValue::List(items.into_iter().map(|s| HclValue::Template(s.into())).collect())
    }

    /// A list of quoted literal strings
    pub fn literal_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        HclValue::List(items.into_iter().map(HclValue::literal).collect())
    }
}

/// Doubles `${` and `%{` so free-form text is never parsed as a template directive
pub fn escape_interpolation(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

/// A populated block record
#[derive(Debug, Clone, PartialEq)]
pub struct HclBlock {
    pub kind: BlockKind,
    pub labels: Vec<String>,
    pub attributes: Vec<(String, HclValue)>,
    pub blocks: Vec<HclBlock>,
}

impl HclBlock {
    fn new(kind: BlockKind, labels: Vec<String>) -> Self {
        Self {
            kind,
            labels,
            attributes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// `resource "<type>" "<name>"`
    pub fn resource(resource_type: &str, name: &str) -> Self {
        Self::new(
            BlockKind::Resource,
            vec![resource_type.to_string(), name.to_string()],
        )
    }

    /// `data "<type>" "<name>"`
    pub fn data(data_type: &str, name: &str) -> Self {
        Self::new(
            BlockKind::Data,
            vec![data_type.to_string(), name.to_string()],
        )
    }

    /// `variable "<name>"`
    pub fn variable(name: &str) -> Self {
        Self::new(BlockKind::Variable, vec![name.to_string()])
    }

    /// `output "<name>"`
    pub fn output(name: &str) -> Self {
        Self::new(BlockKind::Output, vec![name.to_string()])
    }

    /// Unlabelled nested block such as `lifecycle`
    pub fn nested(name: &'static str) -> Self {
        Self::new(BlockKind::Nested(name), Vec::new())
    }

    /// Adds or replaces an attribute
    pub fn attr(mut self, key: &str, value: HclValue) -> Self {
        self.set(key, value);
        self
    }

    /// Adds or replaces an attribute in place
    pub fn set(&mut self, key: &str, value: HclValue) {
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.attributes.push((key.to_string(), value));
        }
    }

    /// Adds a nested block
    pub fn block(mut self, block: HclBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Value of an attribute
    pub fn get(&self, key: &str) -> Option<&HclValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Turns populated records into configuration text
pub trait CodeEmitter: Send + Sync {
    /// Serializes a single top-level block
    fn emit(&self, block: &HclBlock) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_escapes_interpolation() {
        assert_eq!(
            HclValue::literal("echo ${HOME} %{ if x }"),
            HclValue::Template("echo $${HOME} %%{ if x }".to_string())
        );
    }

    #[test]
    fn test_template_keeps_interpolation() {
        assert_eq!(
            HclValue::template("${octopusdeploy_feed.f.id}"),
            HclValue::Template("${octopusdeploy_feed.f.id}".to_string())
        );
    }

    #[test]
    fn test_set_replaces_existing_attribute() {
        let block = HclBlock::resource("t", "n")
            .attr("name", HclValue::literal("a"))
            .attr("name", HclValue::literal("b"));
        assert_eq!(block.attributes.len(), 1);
        assert_eq!(block.get("name"), Some(&HclValue::literal("b")));
    }
}
