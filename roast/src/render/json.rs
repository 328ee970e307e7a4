use std::io;

use indextree::NodeId;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::ser::Formatter;

use super::format_percent;
use crate::calltree::{CallTree, FrameKind};
use crate::symbolication::Symbols;

/// JSON document for `id` and all of its descendants:
/// `{"name", "percent", "timeMs", "children"}`, plus `candidates` for
/// ambiguous method names.
pub fn to_json(tree: &CallTree, id: NodeId, symbols: &Symbols) -> serde_json::Result<String> {
    to_string(&Node::new(tree, id, symbols))
}

/// array of every thread document, in name order
pub fn threads_json(tree: &CallTree, symbols: &Symbols) -> serde_json::Result<String> {
    to_string(&Threads { tree, symbols })
}

fn to_string<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut ser = serde_json::Serializer::with_formatter(Vec::new(), LossyFormatter);
    value.serialize(&mut ser)?;
    // the formatter only ever emits ascii
    Ok(String::from_utf8_lossy(&ser.into_inner()).into_owned())
}

/// Compact formatter that also escapes `/`, drops every character above
/// 0x7f, and prints floats (percentages) with two decimals.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossyFormatter;

impl Formatter for LossyFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c == '/' || !c.is_ascii() {
                writer.write_all(fragment[start..i].as_bytes())?;
                if c == '/' {
                    writer.write_all(b"\\/")?;
                }
                start = i + c.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_percent(value).as_bytes())
    }
}

struct Node<'a> {
    tree: &'a CallTree,
    id: NodeId,
    symbols: &'a Symbols,
}

impl<'a> Node<'a> {
    fn new(tree: &'a CallTree, id: NodeId, symbols: &'a Symbols) -> Self {
        Self { tree, id, symbols }
    }
}

impl Serialize for Node<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.get(self.id);
        let (name, candidates) = match &node.kind {
            FrameKind::Thread => (node.name.clone(), vec![]),
            FrameKind::Call(frame) => {
                let resolved = self.symbols.resolve_frame(frame);
                (resolved.display(), resolved.candidates().to_vec())
            }
        };

        let len = if candidates.is_empty() { 4 } else { 5 };
        let mut st = serializer.serialize_struct("Node", len)?;
        st.serialize_field("name", &name)?;
        st.serialize_field("percent", &self.tree.percent(self.id))?;
        st.serialize_field("timeMs", &node.total_time)?;
        if !candidates.is_empty() {
            st.serialize_field("candidates", &candidates)?;
        }
        st.serialize_field("children", &Children::new(self.tree, self.id, self.symbols))?;
        st.end()
    }
}

/// Children of a node, in render order.
struct Children<'a> {
    tree: &'a CallTree,
    parent: NodeId,
    symbols: &'a Symbols,
}

impl<'a> Children<'a> {
    fn new(tree: &'a CallTree, parent: NodeId, symbols: &'a Symbols) -> Self {
        Self { tree, parent, symbols }
    }
}

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children = self.tree.children(self.parent);
        let mut seq = serializer.serialize_seq(Some(children.len()))?;
        for child in children {
            seq.serialize_element(&Node::new(self.tree, child, self.symbols))?;
        }
        seq.end()
    }
}

struct Threads<'a> {
    tree: &'a CallTree,
    symbols: &'a Symbols,
}

impl Serialize for Threads<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let roots = self.tree.roots();
        let mut seq = serializer.serialize_seq(Some(roots.len()))?;
        for root in roots {
            seq.serialize_element(&Node::new(self.tree, root, self.symbols))?;
        }
        seq.end()
    }
}
