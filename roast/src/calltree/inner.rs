use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indextree::{Arena, NodeId};
use parking_lot::RwLock;

use super::{CallTreeFrame, Frame, SharedCallTree};

/// Per-thread call trees. Every node holds inclusive time: a sample adds its
/// duration to the thread root and to every frame on its path.
pub struct CallTree {
    pub arena: Arena<CallTreeFrame>,
    roots: BTreeMap<String, NodeId>,
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CallTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: BTreeMap::new(),
        }
    }

    pub fn shared() -> SharedCallTree {
        Arc::new(RwLock::new(Self::new()))
    }

    /// record that `thread` spent `duration_ms` somewhere along `frames` (outermost first)
    pub fn observe(&mut self, thread: &str, frames: &[Frame], duration_ms: u64) {
        let mut curr = self.thread_root(thread);
        self.arena[curr].get_mut().total_time += duration_ms;

        for frame in frames {
            curr = self.child_or_insert(curr, frame);
            self.arena[curr].get_mut().total_time += duration_ms;
        }
    }

    fn thread_root(&mut self, thread: &str) -> NodeId {
        if let Some(id) = self.roots.get(thread) {
            return *id;
        }
        let id = self.arena.new_node(CallTreeFrame::thread(thread));
        self.roots.insert(thread.to_owned(), id);
        id
    }

    fn child_or_insert(&mut self, parent: NodeId, frame: &Frame) -> NodeId {
        let name = frame.identity();
        if let Some(id) = self.child(parent, &name) {
            return id;
        }
        let id = self.arena.new_node(CallTreeFrame::call(frame.clone()));
        parent.append(id, &mut self.arena);
        id
    }

    /// thread roots in ascending name order
    pub fn roots(&self) -> Vec<NodeId> {
        self.roots.values().copied().collect()
    }

    pub fn thread(&self, name: &str) -> Option<NodeId> {
        self.roots.get(name).copied()
    }

    pub fn get(&self, id: NodeId) -> &CallTreeFrame {
        self.arena[id].get()
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        parent
            .children(&self.arena)
            .find(|c| self.arena[*c].get().name == name)
    }

    /// children ordered hottest first, ties broken by ascending name
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children = parent.children(&self.arena).collect::<Vec<_>>();
        children.sort_by(|a, b| {
            let (a, b) = (self.get(*a), self.get(*b));
            b.total_time
                .cmp(&a.total_time)
                .then_with(|| a.name.cmp(&b.name))
        });
        children
    }

    /// thread root that owns `id`
    pub fn root_of(&self, id: NodeId) -> NodeId {
        id.ancestors(&self.arena).last().unwrap_or(id)
    }

    /// share of the owning thread's time spent in `id`, in percent; 0 for an empty thread
    pub fn percent(&self, id: NodeId) -> f64 {
        let root_time = self.get(self.root_of(id)).total_time;
        if root_time == 0 {
            return 0.0;
        }
        self.get(id).total_time as f64 / root_time as f64 * 100.0
    }

    pub fn total_time(&self) -> u64 {
        self.roots.values().map(|id| self.get(*id).total_time).sum()
    }

    pub fn node_count(&self) -> usize {
        self.arena.count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.get(id);
        writeln!(f, "{:indent$}{} {}ms", "", node.name, node.total_time, indent = depth)?;
        for child in self.children(id) {
            self.write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for CallTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in self.roots.values() {
            self.write_node(f, *root, 0)?;
        }
        Ok(())
    }
}
