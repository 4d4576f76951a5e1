//! Memory access kind definitions.
//!
//! This module categorizes guest memory operations for the translation cache,
//! which tags cached pages independently per access kind.

/// The kind of memory access being performed.
///
/// The translation cache keeps a separate virtual-page tag per kind, since a
/// page may be cached as readable without being cached as writable or
/// executable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Data load.
    Read,
    /// Data store.
    Write,
    /// Instruction fetch.
    Execute,
}

impl AccessKind {
    /// Returns the human-readable name of the access kind.
    pub fn name(self) -> &'static str {
        match self {
            AccessKind::Read => "read",
            AccessKind::Write => "write",
            AccessKind::Execute => "execute",
        }
    }
}
