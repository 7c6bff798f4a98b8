//! Form controls and layout blocks used by the pages.

use super::{ClientAction, Element, Event, Node};

pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Element {
    Element::new("input")
        .attr("type", "hidden")
        .attr("name", name)
        .attr("value", value)
}

pub fn text_box(name: &str, value: &str, size: u16) -> Element {
    Element::new("input")
        .attr("type", "text")
        .attr("name", name)
        .id(name)
        .attr("value", value)
        .attr("size", size.to_string())
}

pub fn text_area(name: &str, value: &str) -> Element {
    Element::new("textarea")
        .attr("name", name)
        .id(name)
        .attr("rows", "7")
        .attr("cols", "80")
        .text(value)
}

/// Checkbox posting `1` when ticked.
pub fn checkbox(name: &str, checked: bool) -> Element {
    let el = Element::new("input")
        .attr("type", "checkbox")
        .attr("name", name)
        .id(name)
        .attr("value", "1");
    if checked {
        el.flag("checked")
    } else {
        el
    }
}

/// `<select>` with `(value, label)` options.
pub fn select<I>(name: &str, options: I, selected: &str) -> Element
where
    I: IntoIterator<Item = (String, String)>,
{
    let options = options.into_iter().map(|(value, label)| {
        let option = Element::new("option").attr("value", value.as_str()).text(label);
        if value == selected {
            option.flag("selected")
        } else {
            option
        }
    });
    Element::new("select")
        .attr("name", name)
        .id(name)
        .children(options)
}

pub fn button(name: &str, label: &str, action: ClientAction) -> Element {
    Element::new("input")
        .attr("type", "button")
        .attr("name", name)
        .id(name)
        .attr("value", label)
        .on(Event::Click, action)
}

pub fn submit(name: &str, label: &str) -> Element {
    Element::new("input")
        .attr("type", "submit")
        .attr("name", name)
        .id(name)
        .attr("value", label)
}

/// Clickable "Delete" text guarded by a confirmation prompt.
pub fn delete_link(prompt: &str, function: &'static str, row_id: &str) -> Element {
    Element::new("span")
        .class("link")
        .on(
            Event::Click,
            ClientAction::confirm_then(prompt, function, row_id),
        )
        .text("Delete")
}

/// Up/down arrow that moves a table row.
pub fn reorder_arrow(direction: &'static str, function: &'static str, row_id: &str) -> Element {
    Element::new("img")
        .class("updown")
        .attr("src", format!("images/general/arrow_{direction}.png"))
        .attr("alt", direction)
        .attr("width", "12")
        .attr("height", "14")
        .on(Event::Click, ClientAction::call_with(function, row_id))
        .on(Event::MouseOver, ClientAction::PointerCursor)
}

/// Inline status message above the form.
pub fn message_bad(text: &str) -> Element {
    Element::new("div").class("msg-bad").text(text)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A list table with a header row and `id`-carrying body rows.
pub fn info_table(id: &str, headers: &[&str], rows: Vec<Element>) -> Element {
    let header = Element::new("tr")
        .class("header")
        .children(headers.iter().map(|h| Element::new("th").text(*h)));

    Element::new("table")
        .class("tableinfo")
        .id(id)
        .child(Element::new("thead").child(header))
        .child(Element::new("tbody").children(rows))
}

pub fn table_row(id: impl Into<String>, cells: Vec<Vec<Node>>) -> Element {
    Element::new("tr")
        .id(id)
        .children(cells.into_iter().map(|cell| Element::new("td").children(cell)))
}

/// Two-column labelled form layout.
pub struct FormTable {
    name: &'static str,
    title: String,
    hidden: Vec<Element>,
    rows: Vec<Element>,
    bottom: Vec<Node>,
}

impl FormTable {
    pub fn new(name: &'static str, title: impl Into<String>) -> Self {
        Self {
            name,
            title: title.into(),
            hidden: Vec::new(),
            rows: Vec::new(),
            bottom: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn add_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.hidden.push(hidden(name, value));
    }

    pub fn add_row(&mut self, label: &str, content: Vec<Node>) {
        let row = Element::new("tr")
            .child(Element::new("td").class("form_row_l").text(label))
            .child(Element::new("td").class("form_row_r").children(content));
        self.rows.push(row);
    }

    pub fn add_bottom(&mut self, node: impl Into<Node>) {
        self.bottom.push(node.into());
    }

    pub fn build(self) -> Element {
        let title = Element::new("tr").child(
            Element::new("td")
                .class("form_row_first")
                .attr("colspan", "2")
                .text(self.title),
        );
        let bottom = Element::new("tr").child(
            Element::new("td")
                .class("form_row_last")
                .attr("colspan", "2")
                .children(self.bottom),
        );

        let table = Element::new("table")
            .class("formtable formlongtable")
            .child(title)
            .children(self.rows)
            .child(bottom);

        Element::new("form")
            .attr("method", "post")
            .attr("name", self.name)
            .id(self.name)
            .children(self.hidden)
            .child(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_marks_only_the_chosen_option() {
        let el = select(
            "expr_type",
            [("0".to_string(), "Include".to_string()), ("1".to_string(), "Exclude".to_string())],
            "1",
        );
        let selected: Vec<bool> = el
            .children
            .iter()
            .map(|n| match n {
                Node::Element(o) => o.get_attr("selected").is_some(),
                Node::Text(_) => false,
            })
            .collect();
        assert_eq!(selected, [false, true]);
    }

    #[test]
    fn unchecked_checkbox_has_no_checked_attribute() {
        assert!(checkbox("status", false).get_attr("checked").is_none());
        assert!(checkbox("status", true).get_attr("checked").is_some());
    }

    #[test]
    fn form_puts_hidden_fields_before_the_table() {
        let mut form = FormTable::new("sform", "Trigger");
        form.add_var("itemid", "100");
        let el = form.build();
        assert_eq!(el.tag, "form");
        match &el.children[0] {
            Node::Element(input) => assert_eq!(input.get_attr("name"), Some("itemid")),
            Node::Text(_) => panic!("expected hidden input"),
        }
    }
}
