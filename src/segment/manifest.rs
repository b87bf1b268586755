//! Index manifest
//!
//! The manifest names the snapshot file of the current generation. Commits
//! follow a fixed order so a crash never exposes a partial generation:
//! 1. Write the snapshot file → fsync
//! 2. Write manifest.json.tmp → fsync
//! 3. Atomic rename to manifest.json → fsync directory
//! 4. Only then publish the new generation to searchers

use std::io;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SCHEMA_FILE: &str = "schema.json";

/// Snapshot file name for a generation
pub fn snapshot_file_name(generation: u64) -> String {
    format!("snapshot_{:08}.bin", generation)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Manifest version (for format upgrades)
    pub version: u32,
    /// Generation number (incremented on each commit)
    pub generation: u64,
    pub snapshot_file: String,
    /// CRC32 of the snapshot file
    pub checksum: u32,
    pub doc_count: u64,
    /// Timestamp of the commit, seconds since the epoch
    pub updated_at: u64,
}

impl IndexManifest {
    pub const VERSION: u32 = 1;

    pub fn new(generation: u64, snapshot_data: &[u8], doc_count: u64) -> Self {
        Self {
            version: Self::VERSION,
            generation,
            snapshot_file: snapshot_file_name(generation),
            checksum: crc32fast::hash(snapshot_data),
            doc_count,
            updated_at: current_timestamp(),
        }
    }

    /// Check snapshot bytes against the recorded checksum
    pub fn verify(&self, snapshot_data: &[u8]) -> bool {
        crc32fast::hash(snapshot_data) == self.checksum
    }

    pub fn to_json(&self) -> io::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn from_json(data: &[u8]) -> io::Result<Self> {
        serde_json::from_slice(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
