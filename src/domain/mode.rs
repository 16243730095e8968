//! Export modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an entity is represented in the generated configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// A resource block that creates the entity
    #[default]
    Create,
    /// A data block that finds an entity that already exists in the target space
    Lookup,
    /// A data block plus a resource guarded by `count`, created only when the lookup is empty
    Stateless,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Create => "create",
            ExportMode::Lookup => "lookup",
            ExportMode::Stateless => "stateless",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(ExportMode::Create),
            "lookup" => Ok(ExportMode::Lookup),
            "stateless" => Ok(ExportMode::Stateless),
            other => Err(format!(
                "Invalid export mode '{other}'. Must be one of: create, lookup, stateless"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Stateless".parse::<ExportMode>().unwrap(), ExportMode::Stateless);
        assert_eq!(" lookup ".parse::<ExportMode>().unwrap(), ExportMode::Lookup);
        assert!("full".parse::<ExportMode>().is_err());
    }
}
