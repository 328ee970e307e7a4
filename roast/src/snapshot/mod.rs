use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calltree::Frame;

pub use self::proc_source::ProcSource;

mod proc_source;

/// Stack of one live thread, frames ordered outermost first.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct ThreadStack {
    pub thread: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl ThreadStack {
    pub fn new(thread: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            thread: thread.into(),
            frames,
        }
    }
}

/// One instantaneous capture of every live thread.
pub type Snapshot = Vec<ThreadStack>;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("unable to attach to process {pid}: {source}")]
    Attach {
        pid: i32,
        #[source]
        source: procfs::ProcError,
    },

    #[error("unable to read replay file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed replay file: {0}")]
    Replay(#[from] serde_json::Error),
}

/// Something that can capture the stacks of every thread of the target on demand.
pub trait SnapshotSource: Send {
    /// `None` when no snapshot is available right now, the caller skips the tick
    fn sample(&mut self) -> Option<Snapshot>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Box<S> {
    fn sample(&mut self) -> Option<Snapshot> {
        (**self).sample()
    }
}

/// Replays a fixed sequence of snapshots, one per call, then reports unavailable.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    snapshots: VecDeque<Snapshot>,
}

impl ScriptedSource {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: snapshots.into(),
        }
    }

    /// read a JSON array of snapshots
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshots: Vec<Snapshot> = serde_json::from_reader(reader)?;
        Ok(Self::new(snapshots))
    }

    pub fn remaining(&self) -> usize {
        self.snapshots.len()
    }
}

impl SnapshotSource for ScriptedSource {
    fn sample(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_front()
    }
}
