//! The soul file: a markdown identity document with `## Section` headers.

use std::path::{Path, PathBuf};

use crate::error::Result;

const DEFAULT_SOUL: &str = "\
# Soul of the User

## Identity
- Name: Unknown
- Role: Unknown
- Context: New arrival

## Values
(Not yet discovered)

## Goals
(Not yet defined)

## Personality Notes
(Still learning about this person)
";

/// Read/write access to the soul file under the workspace directory.
#[derive(Debug, Clone)]
pub struct SoulFile {
    path: PathBuf,
}

impl SoulFile {
    pub fn new(workspace_dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: workspace_dir.as_ref().join(file_name),
        }
    }

    /// Read the soul file, returning the default template when missing.
    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_else(|_| DEFAULT_SOUL.to_string())
    }

    /// Write the full soul file, creating parent directories as needed.
    pub fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        tracing::info!(path = %self.path.display(), "Soul file updated");
        Ok(())
    }

    /// Create the soul file with the default template if it does not exist.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.path.exists() {
            self.write(DEFAULT_SOUL)?;
            tracing::info!(path = %self.path.display(), "Created default soul file");
        }
        Ok(())
    }

    /// Replace the body of `## <section>`, or append the section when it
    /// does not exist yet. Returns the updated text.
    pub fn update_section(&self, section: &str, content: &str) -> Result<String> {
        let soul = self.read();
        let header = format!("## {section}");

        let mut new_lines: Vec<String> = Vec::new();
        let mut in_section = false;
        let mut section_found = false;

        for line in soul.lines() {
            if line.trim_start().starts_with("## ") {
                if line.trim() == header {
                    in_section = true;
                    section_found = true;
                    new_lines.push(line.to_string());
                    new_lines.push(content.to_string());
                    continue;
                }
                in_section = false;
            }
            if !in_section {
                new_lines.push(line.to_string());
            }
        }

        if !section_found {
            new_lines.push(String::new());
            new_lines.push(header);
            new_lines.push(content.to_string());
        }

        let updated = new_lines.join("\n");
        self.write(&updated)?;
        Ok(updated)
    }
}
