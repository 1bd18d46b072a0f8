use std::path::Path;
use std::process::Command;

use serde_json::Value;

use super::{MetadataMap, MetadataService};
use crate::error::ServiceError;

/// Metadata through an external `exiftool` process, one process per file.
#[derive(Debug, Clone)]
pub struct ExiftoolMetadata {
    program: String,
}

impl Default for ExiftoolMetadata {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl ExiftoolMetadata {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `exiftool -ver` and return the reported version.
    pub fn probe(&self) -> Result<String, ServiceError> {
        let output = Command::new(&self.program)
            .arg("-ver")
            .output()
            .map_err(|source| ServiceError::Unavailable {
                tool: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ServiceError::Failed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl MetadataService for ExiftoolMetadata {
    fn extract(&self, path: &Path) -> Result<MetadataMap, ServiceError> {
        let output = Command::new(&self.program)
            .args(["-json", "-G", "-fast", "-d", "%Y:%m:%d %H:%M:%S"])
            .arg(path)
            .output()
            .map_err(|source| ServiceError::Unavailable {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ServiceError::Failed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_output(&output.stdout)
    }
}

/// Flatten the first object of exiftool's `-json` output into strings.
fn parse_output(stdout: &[u8]) -> Result<MetadataMap, ServiceError> {
    let parsed: Value =
        serde_json::from_slice(stdout).map_err(|e| ServiceError::Output(e.to_string()))?;

    let object = parsed
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|first| first.as_object())
        .ok_or_else(|| ServiceError::Output("expected a JSON array of objects".to_string()))?;

    let mut map = MetadataMap::new();
    for (key, value) in object {
        if key == "SourceFile" {
            continue;
        }
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => other.to_string(),
        };
        map.insert(key.clone(), text);
    }
    Ok(map)
}
