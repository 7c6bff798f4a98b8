//! HTML rendering of the view model.

use std::fmt::Write as _;

use super::{ClientAction, Element, Event, Node, Page, PostScript};

/// Render a complete document.
pub fn render_page(page: &Page) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", html_escape(&page.title));
    out.push_str("</head>\n<body>\n");

    for node in &page.body {
        render_node(node, &mut out);
        out.push('\n');
    }

    if !page.post_scripts.is_empty() {
        out.push_str("<script type=\"text/javascript\">\n");
        out.push_str("window.addEventListener(\"load\", function() {\n");
        for script in &page.post_scripts {
            out.push_str(&render_post_script(script));
            out.push('\n');
        }
        out.push_str("});\n</script>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

/// Render one node and its subtree.
pub fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&html_escape(text)),
        Node::Element(element) => render_element(element, out),
    }
}

fn render_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.tag);

    for (name, value) in &element.attrs {
        let _ = write!(out, " {name}=\"{}\"", html_escape(value));
    }

    for event in [Event::Click, Event::MouseOver] {
        let handlers: Vec<String> = element
            .events
            .iter()
            .filter(|b| b.event == event)
            .map(|b| render_action(&b.action))
            .collect();
        if !handlers.is_empty() {
            let _ = write!(
                out,
                " {}=\"javascript: {}\"",
                event.attribute(),
                html_escape(&handlers.join(" "))
            );
        }
    }

    out.push('>');
    if element.is_void() {
        return;
    }

    for child in &element.children {
        render_node(child, out);
    }
    let _ = write!(out, "</{}>", element.tag);
}

/// Script text of a client action.
pub fn render_action(action: &ClientAction) -> String {
    match action {
        ClientAction::Call { function, args } => format!("{function}({});", js_args(args)),
        ClientAction::ConfirmThen {
            prompt,
            function,
            args,
        } => format!(
            "if (confirm({})) {function}({}); return false;",
            js_string(prompt),
            js_args(args)
        ),
        ClientAction::Popup { url } => format!("return PopUp({});", js_string(url)),
        ClientAction::PointerCursor => "this.style.cursor = \"pointer\";".to_string(),
        ClientAction::CloseWindow => "self.close();".to_string(),
    }
}

fn render_post_script(script: &PostScript) -> String {
    match script {
        PostScript::SetCounter { name, value } => format!("{name}={value};"),
        PostScript::Call { function } => format!("{function}();"),
        PostScript::CloseForm { opener } => format!("closeForm({});", js_string(opener)),
    }
}

fn js_args(args: &[String]) -> String {
    args.iter()
        .map(|a| js_string(a))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace("</", "<\\/")
}

/// Escape text for HTML content and double-quoted attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
