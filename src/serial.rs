use std::fmt;
use std::io;

use crate::trie::Trie;

/// Error raised when trie state cannot be written out or read back.
#[derive(Debug)]
pub struct SerialError(serde_json::Error);

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trie serialization failed: {}", self.0)
    }
}

impl std::error::Error for SerialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<serde_json::Error> for SerialError {
    fn from(err: serde_json::Error) -> Self {
        SerialError(err)
    }
}

impl Trie {
    /// Writes the complete trie state — arrays, block registry, reject
    /// table, and scalars — as self-describing JSON.
    pub fn save<W: io::Write>(&self, writer: W) -> Result<(), SerialError> {
        serde_json::to_writer(writer, self).map_err(SerialError::from)
    }

    /// Reloads a trie previously written by [`Trie::save`].
    pub fn load<R: io::Read>(reader: R) -> Result<Trie, SerialError> {
        serde_json::from_reader(reader).map_err(SerialError::from)
    }
}
