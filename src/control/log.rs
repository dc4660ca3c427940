//! Control outcome logging
//!
//! Records the outcome of every dispatched control request for the headless
//! harness and post-run analysis.

use bevy::prelude::*;
use serde::Serialize;
use std::path::Path;

/// A single entry in the control log
#[derive(Debug, Clone, Serialize)]
pub struct ControlLogEntry {
    /// Seconds since the log was cleared
    pub timestamp: f32,
    pub event_type: ControlLogEventType,
    /// Human-readable description of the outcome
    pub message: String,
}

/// Types of control log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlLogEventType {
    /// Stay, Follow, Attack, Abandon
    Command,
    /// Reaction mode changed
    Reaction,
    /// Ability handed to the resolution engine
    CastCommitted,
    /// Cast refused and reported
    CastRejected,
    /// Cast converted into closing distance
    CastChase,
    /// Action bar or autocast change
    ActionBar,
    /// Rename, name query
    Naming,
    /// Talent request forwarded
    Talents,
    /// Request dropped without feedback
    Dropped,
    /// Run start, run end
    Session,
}

#[derive(Resource, Default, Serialize)]
pub struct ControlLog {
    /// All log entries in chronological order
    pub entries: Vec<ControlLogEntry>,
    /// Current run time
    pub elapsed: f32,
}

impl ControlLog {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.elapsed = 0.0;
    }

    pub fn log(&mut self, event_type: ControlLogEventType, message: String) {
        self.entries.push(ControlLogEntry {
            timestamp: self.elapsed,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: ControlLogEventType) -> Vec<&ControlLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Count entries of one type
    pub fn count(&self, event_type: ControlLogEventType) -> usize {
        self.entries.iter().filter(|e| e.event_type == event_type).count()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&ControlLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize control log: {}", e))
    }

    /// Write the log as JSON to `path`
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let contents = self.to_json()?;
        std::fs::write(path, contents).map_err(|e| format!("Failed to write {:?}: {}", path, e))?;
        info!("Saved control log ({} entries) to {:?}", self.entries.len(), path);
        Ok(())
    }
}

/// Advance the log clock
pub fn track_log_time(time: Res<Time>, mut log: ResMut<ControlLog>) {
    log.elapsed += time.delta_secs();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_and_recent() {
        let mut log = ControlLog::default();
        log.log(ControlLogEventType::Command, "Stay".into());
        log.elapsed = 1.0;
        log.log(ControlLogEventType::CastRejected, "Bite: OutOfRange".into());
        log.log(ControlLogEventType::Command, "Follow".into());

        assert_eq!(log.filter_by_type(ControlLogEventType::Command).len(), 2);
        assert_eq!(log.count(ControlLogEventType::CastRejected), 1);
        let recent = log.recent(2);
        assert_eq!(recent[0].message, "Bite: OutOfRange");
        assert_eq!(recent[1].timestamp, 1.0);
    }

    #[test]
    fn test_json_export() {
        let mut log = ControlLog::default();
        log.log(ControlLogEventType::Reaction, "Passive".into());
        let json = log.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"][0]["event_type"], "Reaction");
        assert_eq!(value["entries"][0]["message"], "Passive");
    }
}
