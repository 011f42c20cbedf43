//! Session logging.
//!
//! Every simulation operation is recorded with a timestamp, a
//! human-readable description, and its parameter values, in sequence.
//! The log can be exported as plain text or JSON so a session's results
//! can be traced back to the peak data and settings that produced them.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A single log entry representing one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sequential operation number (1-based)
    pub sequence: usize,
    /// Timestamp when the operation was performed
    pub timestamp: DateTime<Local>,
    /// Human-readable operation name
    pub operation: String,
    /// Detailed description of what was done
    pub description: String,
    /// Parameter values in `key=value` form
    pub parameters: String,
}

impl LogEntry {
    /// Format as a human-readable text line
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}\n      Parameters: {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.description,
            if self.parameters.is_empty() {
                "(n/a)".to_string()
            } else {
                self.parameters.clone()
            }
        )
    }
}

/// The session log — records all operations in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    /// Session metadata
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub source: String,
    pub software_version: String,
    /// Ordered list of operations
    pub entries: Vec<LogEntry>,
}

impl SessionLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    /// Set the data source for this session (compound name, import file)
    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    /// Add an operation to the log
    pub fn add_entry(&mut self, operation: &str, description: &str, parameters: &str) {
        let seq = self.entries.len() + 1;
        self.entries.push(LogEntry {
            sequence: seq,
            timestamp: Local::now(),
            operation: operation.to_string(),
            description: description.to_string(),
            parameters: parameters.to_string(),
        });
        log::info!("[LOG {:03}] {} — {}", seq, operation, description);
    }

    /// Remove the last entry (for undo)
    pub fn pop_entry(&mut self) -> Option<LogEntry> {
        self.entries.pop()
    }

    /// Get the number of operations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  NMR Simulation Session Log\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  Source:      {}\n", self.source));
        out.push_str(&format!("  Software:    nmr-sim v{}\n", self.software_version));
        out.push_str(&format!("  Operations:  {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push_str("\n\n");
        }

        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out
    }

    /// Export as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// Save log as a text file
    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    /// Save log as a JSON file
    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_json())
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
