//! Execution gateway boundary.
//!
//! The core never opens connections itself. It talks to the server through
//! [`QueryGateway`], a narrow capability trait: submit one statement, receive
//! rows or a typed [`ServerError`]. Connection management, credentials, and
//! retry policy all live behind the implementation.

use async_trait::async_trait;
use thiserror::Error;

/// A single value in a result row.
///
/// Covers the column types the observer reads from the ClickHouse system
/// tables: counters, names, and the `apply_to_list` string array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned integer (e.g. `count()`).
    UInt(u64),
    /// Text column.
    Text(String),
    /// Array of text (e.g. `system.quotas.apply_to_list`).
    TextArray(Vec<String>),
    /// NULL (e.g. a settings profile element with no inherited profile).
    Null,
}

impl Value {
    /// Interpret as an unsigned integer, if possible.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret as text, if possible.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a text array, if possible.
    pub fn as_text_array(&self) -> Option<&[String]> {
        match self {
            Value::TextArray(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

/// One result row.
pub type Row = Vec<Value>;

/// Failure reported by the server or the driver for a single statement.
///
/// Produced at the gateway boundary; implementations should run raw driver
/// messages through [`ServerError::classify`] so the structured
/// `DB::Exception` sub-message is surfaced instead of driver framing.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ServerError {
    /// Server-reported error code, when the driver exposes one.
    pub code: Option<i32>,
    /// Classified error message.
    pub message: String,
}

impl ServerError {
    /// Classify a raw driver message into a structured server error.
    ///
    /// ClickHouse server exceptions embed a `DB::Exception: …` sentence in
    /// the driver-level message. When present, that sub-message (through its
    /// final period) is extracted; otherwise the raw text is surfaced
    /// verbatim.
    pub fn classify(code: Option<i32>, raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        let message = match raw.find("DB::Exception") {
            Some(start) => {
                let tail = &raw[start..];
                let line = tail.split('\n').next().unwrap_or(tail);
                match line.rfind('.') {
                    Some(end) => line[..=end].to_string(),
                    None => line.to_string(),
                }
            }
            None => raw.to_string(),
        };
        ServerError { code, message }
    }
}

/// Capability to execute a statement against the target server.
///
/// Implementations MUST execute statements one at a time, in the order they
/// are submitted, without batching or reordering: the replace-option
/// semantics of the diff engine attach to the first emitted statement of a
/// batch and break if execution order differs from emission order.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Execute one statement and return its result rows.
    ///
    /// Mutating statements return an empty row set.
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, ServerError>;
}
