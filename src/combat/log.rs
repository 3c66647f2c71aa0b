//! Combat logging
//!
//! Records notable trial events (cast start, procs, activations, exhaustion)
//! for debug output. Entries can also be forwarded to a callback as they are
//! written, for external log rendering.

use std::fmt;

/// A single entry in the combat log
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    /// Timestamp in simulated seconds since the pull
    pub timestamp: f64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatLogEventType {
    /// Cast begun
    CastStarted,
    /// Cast landed
    CastLanded,
    /// Cast missed
    Missed,
    /// Proc triggered
    Proc,
    /// Buff applied
    AuraApplied,
    /// Buff removed
    AuraRemoved,
    /// Cooldown, racial, consumable or trinket used
    Activation,
    /// Mana returned
    ManaRestored,
    /// Not enough mana for the chosen spell
    Exhaustion,
    /// Rotation decision worth noting
    AgentDecision,
    /// Encounter event (start, end)
    EncounterEvent,
}

pub type LogSink = Box<dyn FnMut(&CombatLogEntry) + Send>;

#[derive(Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulated time
    pub match_time: f64,
    sink: Option<LogSink>,
}

impl fmt::Debug for CombatLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatLog")
            .field("entries", &self.entries.len())
            .field("match_time", &self.match_time)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that also forwards every entry to `sink` as it is written.
    pub fn with_sink(sink: impl FnMut(&CombatLogEntry) + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::default()
        }
    }

    /// Clear the log for a new trial
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        let entry = CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        };
        if let Some(sink) = self.sink.as_mut() {
            sink(&entry);
        }
        self.entries.push(entry);
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }
}

impl fmt::Display for CombatLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:7.2}]{}", self.timestamp, self.message)
    }
}
