//! Addresses and lookup expressions
//!
//! Every generated block's address is `(resource type, label)`, both known before the body
//! is rendered, so the lookup expressions below can be computed at registration time.
//!
//! | mode      | lookup                                                                   |
//! |-----------|--------------------------------------------------------------------------|
//! | create    | `${R.n.id}`                                                              |
//! | lookup    | `${data.D.n.c[0].id}`                                                    |
//! | stateless | `${length(data.D.n.c) != 0 ? data.D.n.c[0].id : R.n[0].id}`             |

use crate::adapters::hcl::{BlockKind, HclBlock, HclValue};
use crate::domain::{DataSource, ExportMode};
use std::path::PathBuf;

/// Directory, under the output directory, holding the generated space configuration
pub const SPACE_DIR: &str = "space_population";

/// Where and how one entity appears in the generated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub mode: ExportMode,
    pub resource_type: &'static str,
    pub data_source: DataSource,
    /// Block label, unique per resource kind
    pub label: String,
}

impl Placement {
    pub fn new(
        mode: ExportMode,
        resource_type: &'static str,
        data_source: DataSource,
        label: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            resource_type,
            data_source,
            label: label.into(),
        }
    }

    /// Expression resolving to the entity's id
    pub fn lookup(&self) -> String {
        self.attribute("id")
    }

    /// Expression resolving to any attribute of the entity
    pub fn attribute(&self, name: &str) -> String {
        let resource = format!("{}.{}", self.resource_type, self.label);
        let data = format!(
            "data.{}.{}.{}",
            self.data_source.data_type, self.label, self.data_source.collection
        );
        match self.mode {
            ExportMode::Create => format!("${{{resource}.{name}}}"),
            ExportMode::Lookup => format!("${{{data}[0].{name}}}"),
            ExportMode::Stateless => format!(
                "${{length({data}) != 0 ? {data}[0].{name} : {resource}[0].{name}}}"
            ),
        }
    }

    /// Bare address of the creatable block
    pub fn dependency(&self) -> Option<String> {
        match self.mode {
            ExportMode::Lookup => None,
            ExportMode::Create | ExportMode::Stateless => {
                Some(format!("{}.{}", self.resource_type, self.label))
            }
        }
    }

    /// `count` expression of the creatable block in stateless mode
    pub fn count(&self) -> Option<String> {
        match self.mode {
            ExportMode::Stateless => Some(format!(
                "length(data.{}.{}.{}) != 0 ? 0 : 1",
                self.data_source.data_type, self.label, self.data_source.collection
            )),
            ExportMode::Create | ExportMode::Lookup => None,
        }
    }

    /// `space_population/<resource type>_<label>.tf`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(SPACE_DIR).join(format!("{}_{}.tf", self.resource_type, self.label))
    }

    /// Data block finding the entity by name
    ///
    /// In lookup mode a postcondition fails the plan when nothing matches; in stateless mode
    /// an empty result is what triggers creation.
    pub fn lookup_block(&self, name: &str) -> HclBlock {
        let mut block = HclBlock::data(self.data_source.data_type, &self.label)
            .attr("partial_name", HclValue::literal(name))
            .attr("skip", HclValue::Number(0))
            .attr("take", HclValue::Number(1));

        if self.mode == ExportMode::Lookup {
            block = block.block(
                HclBlock::nested("lifecycle").block(
                    HclBlock::nested("postcondition")
                        .attr(
                            "error_message",
                            HclValue::literal(format!(
                                "Failed to resolve an existing entity called \"{name}\""
                            )),
                        )
                        .attr(
                            "condition",
                            HclValue::expression(format!(
                                "length(self.{}) != 0",
                                self.data_source.collection
                            )),
                        ),
                ),
            );
        }
        block
    }

    /// Wraps resource bodies for the current mode
    ///
    /// Lookup mode discards them in favour of the data block. Stateless mode prepends the
    /// data block and guards every `resource` block with `count` and `prevent_destroy`.
    pub fn finish(&self, name: &str, blocks: Vec<HclBlock>) -> Vec<HclBlock> {
        match self.mode {
            ExportMode::Create => blocks,
            ExportMode::Lookup => vec![self.lookup_block(name)],
            ExportMode::Stateless => {
                let count = self.count().unwrap_or_default();
                std::iter::once(self.lookup_block(name))
                    .chain(blocks.into_iter().map(|block| guard(block, &count)))
                    .collect()
            }
        }
    }
}

/// Address of a record owned by another entity (runbooks, process parts)
///
/// Owned records have no data source of their own. They are created whenever their owner is
/// created, and carry the owner's `count` guard when the owner is exported statelessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub resource_type: &'static str,
    pub label: String,
    pub count: Option<String>,
}

impl Address {
    pub fn new(resource_type: &'static str, label: impl Into<String>, count: Option<String>) -> Self {
        Self {
            resource_type,
            label: label.into(),
            count,
        }
    }

    fn reference(&self) -> String {
        match self.count {
            Some(_) => format!("{}.{}[0]", self.resource_type, self.label),
            None => format!("{}.{}", self.resource_type, self.label),
        }
    }

    pub fn lookup(&self) -> String {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> String {
        format!("${{{}.{name}}}", self.reference())
    }

    pub fn dependency(&self) -> String {
        format!("{}.{}", self.resource_type, self.label)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(SPACE_DIR).join(format!("{}_{}.tf", self.resource_type, self.label))
    }

    /// Applies the owner's guard, if any
    pub fn finish(&self, blocks: Vec<HclBlock>) -> Vec<HclBlock> {
        match &self.count {
            Some(count) => blocks.into_iter().map(|block| guard(block, count)).collect(),
            None => blocks,
        }
    }
}

/// Adds `count` and `lifecycle { prevent_destroy = true }` to a resource block
///
/// Other block kinds pass through unchanged.
pub fn guard(mut block: HclBlock, count: &str) -> HclBlock {
    if block.kind != BlockKind::Resource {
        return block;
    }
    block
        .attributes
        .insert(0, ("count".to_string(), HclValue::expression(count)));
    block.block(HclBlock::nested("lifecycle").attr("prevent_destroy", HclValue::Bool(true)))
}
