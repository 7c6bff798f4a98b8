//! Declarative view model for the HTML pages.
//!
//! Pages are built as a tree of typed [`Node`]s. Client behaviour is attached
//! as [`EventBinding`]s naming a [`ClientAction`] rather than as script text,
//! and page-level scripts are [`PostScript`] values. [`render`] turns the
//! tree into HTML; nothing in the tree knows about HTTP or request state.

pub mod render;
pub mod trigger_form;
pub mod widgets;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on render.
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub events: Vec<EventBinding>,
    pub children: Vec<Node>,
}

/// Elements rendered without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            events: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag)
    }

    /// Set an attribute, replacing any earlier value for the same name.
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// Set a valueless attribute such as `disabled` or `checked`.
    pub fn flag(self, name: &'static str) -> Self {
        self.attr(name, name)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn on(mut self, event: Event, action: ClientAction) -> Self {
        self.events.push(EventBinding { event, action });
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client behaviour
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Click,
    MouseOver,
}

impl Event {
    pub fn attribute(self) -> &'static str {
        match self {
            Event::Click => "onclick",
            Event::MouseOver => "onmouseover",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event: Event,
    pub action: ClientAction,
}

/// What the browser does when an event fires. Arguments are passed as
/// string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Call a page script function.
    Call {
        function: &'static str,
        args: Vec<String>,
    },
    /// Ask for confirmation, then call a page script function.
    ConfirmThen {
        prompt: String,
        function: &'static str,
        args: Vec<String>,
    },
    /// Open a popup window on `url`.
    Popup { url: String },
    /// Show a pointer cursor over the element.
    PointerCursor,
    /// Close the current window.
    CloseWindow,
}

impl ClientAction {
    pub fn call(function: &'static str) -> Self {
        ClientAction::Call {
            function,
            args: Vec::new(),
        }
    }

    pub fn call_with(function: &'static str, arg: impl Into<String>) -> Self {
        ClientAction::Call {
            function,
            args: vec![arg.into()],
        }
    }

    pub fn confirm_then(
        prompt: impl Into<String>,
        function: &'static str,
        arg: impl Into<String>,
    ) -> Self {
        ClientAction::ConfirmThen {
            prompt: prompt.into(),
            function,
            args: vec![arg.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Script statements run once the page has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScript {
    /// `<name>=<value>;`
    SetCounter { name: &'static str, value: u32 },
    /// `<function>();`
    Call { function: &'static str },
    /// Close the popup and reload `opener` in the parent window.
    CloseForm { opener: String },
}

/// A complete HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub title: String,
    pub body: Vec<Node>,
    pub post_scripts: Vec<PostScript>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.body.push(node.into());
    }

    pub fn push_script(&mut self, script: PostScript) {
        self.post_scripts.push(script);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_replaces_existing_value() {
        let el = Element::new("input").attr("value", "a").attr("value", "b");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.get_attr("value"), Some("b"));
    }

    #[test]
    fn input_is_void_and_div_is_not() {
        assert!(Element::new("input").is_void());
        assert!(!Element::new("div").is_void());
    }
}
