//! Output files
//!
//! Rendered bodies are grouped per output path in memory and only written once every
//! descriptor rendered successfully.

use crate::core::convert::placement::SPACE_DIR;
use crate::domain::{OctoformError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Rendered configuration keyed by path relative to the output directory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderedFiles {
    files: BTreeMap<PathBuf, String>,
}

impl RenderedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rendered body to a file, separated from earlier bodies by a blank line
    pub fn append(&mut self, path: impl Into<PathBuf>, body: &str) {
        if body.trim().is_empty() {
            return;
        }
        let contents = self.files.entry(path.into()).or_default();
        if !contents.is_empty() {
            contents.push('\n');
        }
        contents.push_str(body);
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every file under `output_dir`, creating directories as needed
    pub fn write_to(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (relative, contents) in &self.files {
            let path = output_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OctoformError::Io(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
            std::fs::write(&path, contents).map_err(|e| {
                OctoformError::Io(format!("Failed to write {}: {e}", path.display()))
            })?;
            tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
            written.push(relative.clone());
        }
        Ok(written)
    }
}

/// Provider requirements, provider block and the `octopus_space_id` variable
pub fn provider_file(provider_version: &str) -> String {
    format!(
        r#"terraform {{
  required_providers {{
    octopusdeploy = {{
      source  = "OctopusDeployLabs/octopusdeploy"
      version = "{provider_version}"
    }}
  }}
}}

provider "octopusdeploy" {{
  space_id = var.octopus_space_id
}}

variable "octopus_space_id" {{
  type        = string
  nullable    = false
  description = "The ID of the space to populate."
}}
"#
    )
}

/// Path of the provider file relative to the output directory
pub fn provider_path() -> PathBuf {
    PathBuf::from(SPACE_DIR).join("provider.tf")
}
