//! Pages of the log trigger form.
//!
//! [`TriggerFormModel`] carries everything the form shows; the handler fills
//! it from the request or from the stored trigger and never touches markup.

use logtrigger_core::trigger::{
    next_entry_id, ExpressionPart, ExpressionType, Keyed, KeywordEntry, Severity, SeverityNames,
    TriggerStatus,
};
use logtrigger_core::types::DbId;

use super::widgets::{
    button, checkbox, delete_link, info_table, message_bad, reorder_arrow, select, submit,
    table_row, text_area, text_box, FormTable,
};
use super::{ClientAction, Element, Event, Node, Page, PostScript};

const FORM_NAME: &str = "sform";
const PAGE_TITLE: &str = "Configuration of triggers";
const TEXT_BOX_SIZE: u16 = 80;

/// Data shown by the trigger form.
#[derive(Debug, Clone)]
pub struct TriggerFormModel {
    /// Set when editing an existing trigger.
    pub triggerid: Option<DbId>,
    pub itemid: Option<DbId>,
    /// `<host>: <item>` label of the selected item.
    pub item_label: String,
    pub description: String,
    pub priority: Severity,
    pub status: TriggerStatus,
    pub comments: String,
    pub url: String,
    pub expressions: Vec<Keyed<ExpressionPart>>,
    pub keys: Vec<Keyed<KeywordEntry>>,
    pub severity_names: SeverityNames,
    /// Failure of the last add/update, shown above the form.
    pub error: Option<String>,
}

/// Build the form page.
pub fn form_page(model: &TriggerFormModel) -> Page {
    let mut page = Page::new(PAGE_TITLE);
    if let Some(error) = &model.error {
        page.push(message_bad(error));
    }

    let mut form = FormTable::new(FORM_NAME, "Trigger");
    form.add_var("sform", "1");
    form.add_var("form_refresh", "1");
    if let Some(id) = model.triggerid {
        form.add_var("triggerid", id.to_string());
    }

    form.add_row(
        "Description",
        vec![text_box("description", &model.description, TEXT_BOX_SIZE).into()],
    );

    let item_box = text_box("item", &model.item_label, TEXT_BOX_SIZE).flag("disabled");
    let popup_url = format!(
        "popup.php?dstfrm={}&dstfld1=itemid&dstfld2=item&srctbl=items&srcfld1=itemid&srcfld2=name",
        form.name()
    );
    let select_item = submit("select_item", "Select")
        .on(Event::Click, ClientAction::Popup { url: popup_url });
    form.add_row("Item", vec![item_box.into(), select_item.into()]);
    if let Some(id) = model.itemid {
        form.add_var("itemid", id.to_string());
    }

    form.add_row("Expression", expression_input_row());

    let key_rows: Vec<Element> = model.keys.iter().map(keyword_row).collect();
    for key in &model.keys {
        form.add_var(format!("keys[{}][value]", key.id), key.entry.value.as_str());
        form.add_var(format!("keys[{}][type]", key.id), key.entry.kind.as_str());
    }

    let expression_rows: Vec<Element> = model.expressions.iter().map(expression_row).collect();
    for expr in &model.expressions {
        form.add_var(
            format!("expressions[{}][value]", expr.id),
            expr.entry.value.as_str(),
        );
        form.add_var(
            format!("expressions[{}][type]", expr.id),
            expr.entry.kind.code().to_string(),
        );
    }
    page.push_script(PostScript::SetCounter {
        name: "logexpr_count",
        value: next_entry_id(&model.expressions),
    });
    page.push_script(PostScript::Call {
        function: "processExpressionList",
    });
    page.push_script(PostScript::SetCounter {
        name: "key_count",
        value: next_entry_id(&model.keys),
    });

    form.add_row(
        "",
        vec![info_table("key_list", &["Keyword", "Type", "Action"], key_rows).into()],
    );
    form.add_row(
        "",
        vec![info_table(
            "exp_list",
            &["Expression", "Type", "Position", "Action"],
            expression_rows,
        )
        .into()],
    );

    form.add_row("Severity", vec![severity_select(model).into()]);
    form.add_row("Comments", vec![text_area("comments", &model.comments).into()]);
    form.add_row("URL", vec![text_box("url", &model.url, TEXT_BOX_SIZE).into()]);
    form.add_row(
        "Disabled",
        vec![checkbox("status", model.status == TriggerStatus::Disabled).into()],
    );

    if model.triggerid.is_some() {
        form.add_bottom(submit("update", "Update"));
    } else {
        form.add_bottom(submit("add", "Add"));
    }
    form.add_bottom(Node::text(" "));
    form.add_bottom(button("cancel", "Cancel", ClientAction::CloseWindow));

    page.push(form.build());
    page
}

/// Pattern box, `iregexp` flag, AND/OR keyword buttons, type selector and
/// the Add button.
fn expression_input_row() -> Vec<Node> {
    let pattern = text_box("expression", "", TEXT_BOX_SIZE).id("logexpr");
    let iregexp = checkbox("iregexp", false);
    let and = button("add_key_and", "AND", ClientAction::call("add_keyword_and"));
    let or = button("add_key_or", "OR", ClientAction::call("add_keyword_or"));
    let expr_type = select(
        "expr_type",
        [ExpressionType::Match, ExpressionType::NoMatch]
            .map(|t| (t.code().to_string(), t.label().to_string())),
        &ExpressionType::Match.code().to_string(),
    );
    let add = button("add_exp", "Add", ClientAction::call("add_logexpr"));

    vec![
        pattern.into(),
        Element::new("br").into(),
        iregexp.into(),
        Node::text("iregexp "),
        and.into(),
        Node::text(" "),
        or.into(),
        Node::text(" "),
        expr_type.into(),
        Node::text(" "),
        add.into(),
    ]
}

fn expression_row(expr: &Keyed<ExpressionPart>) -> Element {
    let row_id = format!("logtr{}", expr.id);
    let arrows = vec![
        reorder_arrow("up", "element_up", &row_id).into(),
        Node::text(" "),
        reorder_arrow("down", "element_down", &row_id).into(),
    ];
    let delete = delete_link("Delete expression?", "remove_expression", &row_id);

    table_row(
        row_id.as_str(),
        vec![
            vec![Node::text(expr.entry.value.as_str())],
            vec![Node::text(expr.entry.kind.label())],
            arrows,
            vec![delete.into()],
        ],
    )
}

fn keyword_row(key: &Keyed<KeywordEntry>) -> Element {
    let row_id = format!("keytr{}", key.id);
    let delete = delete_link("Delete keyword?", "remove_keyword", &row_id);

    table_row(
        row_id.as_str(),
        vec![
            vec![Node::text(key.entry.value.as_str())],
            vec![Node::text(key.entry.kind.as_str())],
            vec![delete.into()],
        ],
    )
}

fn severity_select(model: &TriggerFormModel) -> Element {
    let options = model
        .severity_names
        .entries()
        .map(|(severity, name)| (severity.code().to_string(), name.to_string()));
    select("priority", options, &model.priority.code().to_string())
}

/// Page returned after a successful save: closes the popup and reloads
/// `opener` in the parent window.
pub fn close_form_page(opener: &str) -> Page {
    let mut page = Page::new(PAGE_TITLE);
    page.push_script(PostScript::CloseForm {
        opener: opener.to_string(),
    });
    page
}

/// Page for a request that did not ask for the form.
pub fn blank_page(error: Option<&str>) -> Page {
    let mut page = Page::new(PAGE_TITLE);
    if let Some(error) = error {
        page.push(message_bad(error));
    }
    page
}

/// Terminal error page.
pub fn error_page(title: &str, message: &str) -> Page {
    let mut page = Page::new(title);
    page.push(Element::new("h1").text(title));
    page.push(message_bad(message));
    page
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use logtrigger_core::trigger::number_entries;

    use super::*;
    use crate::view::render::render_page;

    fn model() -> TriggerFormModel {
        TriggerFormModel {
            triggerid: None,
            itemid: Some(100),
            item_label: "Server 1: Syslog".to_string(),
            description: "High CPU log".to_string(),
            priority: Severity::Average,
            status: TriggerStatus::Enabled,
            comments: String::new(),
            url: String::new(),
            expressions: number_entries(vec![
                ExpressionPart::new("regexp(ERROR)", ExpressionType::Match),
                ExpressionPart::new("iregexp(debug)", ExpressionType::NoMatch),
            ]),
            keys: vec![Keyed {
                id: 4,
                entry: KeywordEntry {
                    value: "<fail>".to_string(),
                    kind: "and".to_string(),
                },
            }],
            severity_names: SeverityNames::default(),
            error: None,
        }
    }

    #[test]
    fn counters_follow_highest_row_ids() {
        let page = form_page(&model());
        assert!(page.post_scripts.contains(&PostScript::SetCounter {
            name: "logexpr_count",
            value: 2
        }));
        assert!(page.post_scripts.contains(&PostScript::SetCounter {
            name: "key_count",
            value: 5
        }));
        assert!(page.post_scripts.contains(&PostScript::Call {
            function: "processExpressionList"
        }));
    }

    #[test]
    fn rows_survive_as_hidden_fields() {
        let html = render_page(&form_page(&model()));
        assert!(html.contains("name=\"expressions[1][value]\" value=\"iregexp(debug)\""));
        assert!(html.contains("name=\"expressions[1][type]\" value=\"1\""));
        assert!(html.contains("name=\"keys[4][value]\" value=\"&lt;fail&gt;\""));
    }

    #[test]
    fn keyword_value_is_escaped_in_table() {
        let html = render_page(&form_page(&model()));
        assert!(html.contains("<td>&lt;fail&gt;</td>"));
        assert!(!html.contains("<fail>"));
    }

    #[test]
    fn new_trigger_gets_add_button_and_edit_gets_update() {
        let html = render_page(&form_page(&model()));
        assert!(html.contains("name=\"add\""));
        assert!(!html.contains("name=\"update\""));

        let mut edit = model();
        edit.triggerid = Some(9);
        let html = render_page(&form_page(&edit));
        assert!(html.contains("name=\"update\""));
        assert!(html.contains("name=\"triggerid\" value=\"9\""));
    }

    #[test]
    fn expression_rows_label_types() {
        let html = render_page(&form_page(&model()));
        assert!(html.contains("<tr id=\"logtr0\"><td>regexp(ERROR)</td><td>Include</td>"));
        assert!(html.contains("<tr id=\"logtr1\"><td>iregexp(debug)</td><td>Exclude</td>"));
    }

    #[test]
    fn disabled_status_ticks_checkbox() {
        let mut m = model();
        m.status = TriggerStatus::Disabled;
        let html = render_page(&form_page(&m));
        assert!(html.contains("name=\"status\" id=\"status\" value=\"1\" checked=\"checked\""));
    }
}
