use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub use self::inner::CallTree;

mod inner;

/// Call tree shared between the sampler (single writer) and renderers.
/// A tick folds its whole snapshot under one write guard and a render holds
/// one read guard for its whole traversal.
pub type SharedCallTree = Arc<RwLock<CallTree>>;

/// One call site in a captured stack.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Hash)]
pub struct Frame {
    pub class: String,
    pub method: String,
}

impl Frame {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }

    /// canonical `class.method()` identity, two frames share a node iff these are equal
    pub fn identity(&self) -> String {
        format!("{}.{}()", self.class, self.method)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}()", self.class, self.method)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FrameKind {
    Thread,
    Call(Frame),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CallTreeFrame {
    pub kind: FrameKind,
    pub name: String,
    pub total_time: u64,
}

impl CallTreeFrame {
    pub fn thread(name: &str) -> Self {
        Self {
            kind: FrameKind::Thread,
            name: name.to_owned(),
            total_time: 0,
        }
    }

    pub fn call(frame: Frame) -> Self {
        Self {
            name: frame.identity(),
            kind: FrameKind::Call(frame),
            total_time: 0,
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(self.kind, FrameKind::Thread)
    }
}
