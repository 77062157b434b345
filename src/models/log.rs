use std::fmt;

/// Where a log line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirection {
    /// Line decoded from the link
    Received,
    /// Text written to the link
    Sent,
    /// Connection problem reported to the user
    Error,
}

/// One line of the session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub direction: LogDirection,
    pub text: String,
}

impl LogEntry {
    pub fn received(text: impl Into<String>) -> Self {
        Self {
            direction: LogDirection::Received,
            text: text.into(),
        }
    }

    pub fn sent(text: impl Into<String>) -> Self {
        Self {
            direction: LogDirection::Sent,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            direction: LogDirection::Error,
            text: text.into(),
        }
    }
}

/// Renders the line as it appears in the log view and in exported files
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            LogDirection::Received => write!(f, ">> {}", self.text),
            LogDirection::Sent => write!(f, "<< {}", self.text),
            LogDirection::Error => write!(f, "Error: {}", self.text),
        }
    }
}

/// Append-only, in-memory session log.
///
/// `generation` increases every time the log is cleared so observers can tell
/// a cleared-and-refilled log apart from one that only grew.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
    generation: u64,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Full log as plain text, one rendered entry per line
    pub fn to_plain_text(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
