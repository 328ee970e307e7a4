use indextree::NodeId;

use super::{escape_html, format_percent};
use crate::calltree::{CallTree, FrameKind};
use crate::symbolication::{MethodResolution, Symbols};

/// Nested `<div class="node">` fragment for `id` and all of its descendants.
pub fn to_html(tree: &CallTree, id: NodeId, symbols: &Symbols) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, id, symbols);
    out
}

/// every thread, in name order
pub fn threads_html(tree: &CallTree, symbols: &Symbols) -> String {
    let mut out = String::new();
    for root in tree.roots() {
        write_node(&mut out, tree, root, symbols);
    }
    out
}

fn write_node(out: &mut String, tree: &CallTree, id: NodeId, symbols: &Symbols) {
    let node = tree.get(id);
    let percent = format_percent(tree.percent(id));

    out.push_str(r#"<div class="node collapsed"><div class="name">"#);
    out.push_str(&name_html(tree, id, symbols));
    out.push_str(&format!(r#"<span class="percent">{percent}%</span>"#));
    out.push_str(&format!(r#"<span class="time">{}ms</span>"#, node.total_time));
    out.push_str(&format!(
        r#"<span class="bar"><span class="bar-inner" style="width:{percent}%"></span></span>"#
    ));
    out.push_str(r#"</div><ul class="children">"#);
    for child in tree.children(id) {
        out.push_str("<li>");
        write_node(out, tree, child, symbols);
        out.push_str("</li>");
    }
    out.push_str("</ul></div>");
}

fn matched(title: &str, text: &str) -> String {
    format!(
        r#"<span class="matched" title="{}">{}</span>"#,
        escape_html(title),
        escape_html(text)
    )
}

pub(crate) fn name_html(tree: &CallTree, id: NodeId, symbols: &Symbols) -> String {
    let node = tree.get(id);
    let frame = match &node.kind {
        FrameKind::Thread => return escape_html(&node.name),
        FrameKind::Call(frame) => frame,
    };

    let resolved = symbols.resolve_frame(frame);
    let class = match resolved.class {
        Some(actual) => matched(&frame.class, actual),
        None => escape_html(&frame.class),
    };
    let method = match &resolved.method {
        MethodResolution::Unmapped => escape_html(&frame.method),
        MethodResolution::Matched(actual) => matched(&frame.method, actual),
        MethodResolution::Ambiguous(candidates) => format!(
            r#"<span class="multiple-matches" title="{}">{}</span>"#,
            escape_html(&candidates.join(" ")),
            escape_html(&frame.method)
        ),
    };
    format!("{class}.{method}()")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calltree::Frame;

    fn app(method: &str) -> Frame {
        Frame::new("pkg.App", method)
    }

    #[test]
    fn test_end_to_end() {
        let mut ct = CallTree::new();
        ct.observe("main", &[app("run"), app("loop")], 1000);
        ct.observe("main", &[app("run"), app("tick")], 1000);

        let html = to_html(&ct, ct.thread("main").unwrap(), &Symbols::new());
        let expected = concat!(
            r#"<div class="node collapsed"><div class="name">main<span class="percent">100.00%</span><span class="time">2000ms</span>"#,
            r#"<span class="bar"><span class="bar-inner" style="width:100.00%"></span></span></div><ul class="children">"#,
            r#"<li><div class="node collapsed"><div class="name">pkg.App.run()<span class="percent">100.00%</span><span class="time">2000ms</span>"#,
            r#"<span class="bar"><span class="bar-inner" style="width:100.00%"></span></span></div><ul class="children">"#,
            r#"<li><div class="node collapsed"><div class="name">pkg.App.loop()<span class="percent">50.00%</span><span class="time">1000ms</span>"#,
            r#"<span class="bar"><span class="bar-inner" style="width:50.00%"></span></span></div><ul class="children"></ul></div></li>"#,
            r#"<li><div class="node collapsed"><div class="name">pkg.App.tick()<span class="percent">50.00%</span><span class="time">1000ms</span>"#,
            r#"<span class="bar"><span class="bar-inner" style="width:50.00%"></span></span></div><ul class="children"></ul></div></li>"#,
            r#"</ul></div></li></ul></div>"#,
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_quarter_percent() {
        let mut ct = CallTree::new();
        ct.observe("main", &[app("hot")], 25);
        ct.observe("main", &[], 75);

        let html = to_html(&ct, ct.thread("main").unwrap(), &Symbols::new());
        assert!(html.contains(r#"pkg.App.hot()<span class="percent">25.00%</span><span class="time">25ms</span>"#));
        assert!(html.contains(r#"style="width:25.00%""#));
    }

    #[test]
    fn test_unsampled_root() {
        let mut ct = CallTree::new();
        ct.observe("fresh", &[], 0);
        let html = to_html(&ct, ct.thread("fresh").unwrap(), &Symbols::new());
        assert!(html.contains(r#"<span class="percent">0.00%</span><span class="time">0ms</span>"#));
    }

    #[test]
    fn test_threads_in_name_order() {
        let mut ct = CallTree::new();
        ct.observe("main", &[], 1);
        ct.observe("Thread-2", &[], 100);
        ct.observe("Async", &[], 10);

        let html = threads_html(&ct, &Symbols::new());
        let a = html.find(">Async<").unwrap();
        let t = html.find(">Thread-2<").unwrap();
        let m = html.find(">main<").unwrap();
        assert!(a < t && t < m);
    }

    #[test]
    fn test_names_are_escaped() {
        let mut ct = CallTree::new();
        ct.observe("<worker & co>", &[Frame::new("pkg.Gen<T>", "call")], 1);

        let html = threads_html(&ct, &Symbols::new());
        assert!(html.contains("&lt;worker &amp; co&gt;"));
        assert!(html.contains("pkg.Gen&lt;T&gt;.call()"));
    }

    #[test]
    fn test_resolution_states() {
        let mut syms = Symbols::new();
        let class = syms.class_mut("abc", "net.World");
        class.add_method("a", "tick");
        class.add_method("b", "getBlock");
        class.add_method("b", "getBlockAt");
        syms.add_method_id("func_1_a", "update");

        let mut ct = CallTree::new();
        let frames = [
            Frame::new("abc", "a"),
            Frame::new("abc", "b"),
            Frame::new("abc", "c"),
            Frame::new("pkg.Other", "func_1_a"),
            Frame::new("pkg.Other", "run"),
        ];
        ct.observe("main", &frames, 1);

        let root = ct.thread("main").unwrap();
        let mut names = vec![];
        let mut curr = root;
        while let Some(child) = ct.children(curr).first().copied() {
            names.push(name_html(&ct, child, &syms));
            curr = child;
        }

        let class = r#"<span class="matched" title="abc">net.World</span>"#;
        assert_eq!(names[0], format!(r#"{class}.<span class="matched" title="a">tick</span>()"#));
        assert_eq!(
            names[1],
            format!(r#"{class}.<span class="multiple-matches" title="getBlock getBlockAt">b</span>()"#)
        );
        assert_eq!(names[2], format!("{class}.c()"));
        assert_eq!(names[3], r#"pkg.Other.<span class="matched" title="func_1_a">update</span>()"#);
        assert_eq!(names[4], "pkg.Other.run()");
    }
}
