use axum::extract::State;
use axum::response::Html;
use roast::render::html;

use crate::state::AppState;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>roast</title>
<style>
.node .name { font-family: monospace; white-space: nowrap; }
.node .percent, .node .time { margin-left: 1em; color: #666; }
.bar { display: inline-block; width: 10em; height: 0.6em; margin-left: 1em; background: #eee; }
.bar-inner { display: block; height: 100%; background: #e25822; }
.matched { color: #2a6; }
.multiple-matches { color: #c60; text-decoration: underline dotted; }
.children { list-style: none; padding-left: 1.2em; margin: 0; }
.node > .name { cursor: pointer; }
.collapsed > .children { display: none; }
</style>
</head>
<body>
"#;

// clicking a name expands or collapses its children
const TAIL: &str = r#"
<script>
document.addEventListener("click", function (e) {
  var name = e.target.closest(".node > .name");
  if (name) {
    name.parentElement.classList.toggle("collapsed");
  }
});
</script>
</body>
</html>
"#;

pub(crate) async fn index(State(st): State<AppState>) -> Html<String> {
    let fragment = {
        let calltree = st.calltree.read();
        html::threads_html(&calltree, &st.symbols)
    };
    Html(format!("{HEAD}{fragment}{TAIL}"))
}
