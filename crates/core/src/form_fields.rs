//! Request parameters and the declarative field schema of the trigger form.
//!
//! The raw query/body pairs are collected once into an immutable
//! [`RequestParams`] value, checked against [`FIELD_SCHEMA`], and only then
//! converted into the typed [`TriggerForm`] the handlers work with.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::Validate;

use crate::error::CoreError;
use crate::trigger::{
    EntryId, ExpressionPart, ExpressionType, Keyed, KeywordEntry, Severity, TriggerStatus,
    TriggerType,
};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Raw request parameters
// ---------------------------------------------------------------------------

/// One `name[ID][...]` row as posted, before any type checking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

/// All request parameters of one request. Scalars keep the last value
/// posted for a name; list rows keep the order in which their ids first
/// appeared.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    scalars: BTreeMap<String, String>,
    lists: BTreeMap<String, Vec<RawEntry>>,
}

impl RequestParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = RequestParams::default();
        for (name, value) in pairs {
            params.insert(name.into(), value.into());
        }
        params
    }

    /// Merge `other` over `self`; names present in both take `other`'s value.
    pub fn merged_with(mut self, other: RequestParams) -> Self {
        self.scalars.extend(other.scalars);
        for (name, entries) in other.lists {
            self.lists.insert(name, entries);
        }
        self
    }

    fn insert(&mut self, name: String, value: String) {
        let Some(open) = name.find('[') else {
            self.scalars.insert(name, value);
            return;
        };

        let base = name[..open].to_string();
        let indices: Vec<&str> = name[open..]
            .split(']')
            .filter_map(|s| s.strip_prefix('['))
            .collect();

        let (id, field) = match indices.as_slice() {
            [id, field] => (id.to_string(), field.to_string()),
            [id] => (id.to_string(), String::new()),
            _ => (String::new(), String::new()),
        };

        let entries = self.lists.entry(base).or_default();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.fields.insert(field, value);
            }
            None => {
                let mut entry = RawEntry {
                    id,
                    fields: BTreeMap::new(),
                };
                entry.fields.insert(field, value);
                entries.push(entry);
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.scalars.contains_key(name) || self.lists.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.scalars.get(name).map(String::as_str)
    }

    pub fn entries(&self, name: &str) -> Option<&[RawEntry]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    /// Whether an add or update action was posted.
    pub fn is_save_action(&self) -> bool {
        self.has("add") || self.has("update")
    }
}

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    /// `name[ID][value]` / `name[ID][type]` rows.
    Entries(EntryTypeRule),
}

/// Constraint on the `type` column of an entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTypeRule {
    /// Any string.
    Free,
    /// An integer from the given set.
    Code(&'static [i64]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    None,
    NotEmpty,
    DbId,
    OneOf(&'static [i64]),
}

#[derive(Clone, Copy)]
pub enum Requirement {
    Optional,
    /// Required whenever the predicate holds for the request.
    When(fn(&RequestParams) -> bool),
}

#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rule: Rule,
    pub requirement: Requirement,
    /// Set on fields the page itself carries between requests.
    pub system: bool,
    /// Set on the submit buttons.
    pub action: bool,
}

const BOOL_CODES: &[i64] = &[0, 1];
const SEVERITY_CODES: &[i64] = &[0, 1, 2, 3, 4, 5];

const fn field(name: &'static str, kind: FieldKind, rule: Rule) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        rule,
        requirement: Requirement::Optional,
        system: false,
        action: false,
    }
}

const fn on_save(mut spec: FieldSpec) -> FieldSpec {
    spec.requirement = Requirement::When(RequestParams::is_save_action);
    spec
}

const fn system(mut spec: FieldSpec) -> FieldSpec {
    spec.system = true;
    spec
}

const fn action(mut spec: FieldSpec) -> FieldSpec {
    spec.system = true;
    spec.action = true;
    spec
}

/// Every parameter the trigger form accepts.
pub static FIELD_SCHEMA: &[FieldSpec] = &[
    on_save(field("description", FieldKind::Str, Rule::NotEmpty)),
    on_save(system(field("itemid", FieldKind::Int, Rule::DbId))),
    field("sform", FieldKind::Int, Rule::OneOf(BOOL_CODES)),
    field("sitems", FieldKind::Int, Rule::OneOf(BOOL_CODES)),
    system(field("triggerid", FieldKind::Int, Rule::DbId)),
    field("type", FieldKind::Int, Rule::OneOf(BOOL_CODES)),
    on_save(field("priority", FieldKind::Int, Rule::OneOf(SEVERITY_CODES))),
    on_save(field(
        "expressions",
        FieldKind::Entries(EntryTypeRule::Code(BOOL_CODES)),
        Rule::NotEmpty,
    )),
    field("expr_type", FieldKind::Int, Rule::OneOf(BOOL_CODES)),
    field("comments", FieldKind::Str, Rule::None),
    field("url", FieldKind::Str, Rule::None),
    field("status", FieldKind::Int, Rule::OneOf(BOOL_CODES)),
    field("form_refresh", FieldKind::Int, Rule::None),
    action(field("add", FieldKind::Str, Rule::None)),
    action(field("update", FieldKind::Str, Rule::None)),
    field("keys", FieldKind::Entries(EntryTypeRule::Free), Rule::None),
];

/// Check `params` against `schema`, failing on the first violation.
pub fn check_fields(schema: &[FieldSpec], params: &RequestParams) -> Result<(), CoreError> {
    for spec in schema {
        let required = match spec.requirement {
            Requirement::Optional => false,
            Requirement::When(predicate) => predicate(params),
        };

        if !params.has(spec.name) {
            if required {
                return Err(CoreError::invalid_field(spec.name, "is mandatory"));
            }
            continue;
        }

        check_field(spec, params)?;
    }
    Ok(())
}

fn check_field(spec: &FieldSpec, params: &RequestParams) -> Result<(), CoreError> {
    let name = spec.name;

    match spec.kind {
        FieldKind::Str => {
            let value = params
                .get(name)
                .ok_or_else(|| CoreError::invalid_field(name, "is not a string"))?;
            if spec.rule == Rule::NotEmpty && value.trim().is_empty() {
                return Err(CoreError::invalid_field(name, "cannot be empty"));
            }
        }
        FieldKind::Int => {
            let raw = params
                .get(name)
                .ok_or_else(|| CoreError::invalid_field(name, "is not integer"))?;
            let value: i64 = raw
                .trim()
                .parse()
                .map_err(|_| CoreError::invalid_field(name, "is not integer"))?;
            match spec.rule {
                Rule::DbId if value < 0 => {
                    return Err(CoreError::invalid_field(name, "is not a valid id"));
                }
                Rule::OneOf(allowed) if !allowed.contains(&value) => {
                    return Err(CoreError::invalid_field(
                        name,
                        format!("must be one of {allowed:?}"),
                    ));
                }
                _ => {}
            }
        }
        FieldKind::Entries(type_rule) => {
            let entries = params
                .entries(name)
                .ok_or_else(|| CoreError::invalid_field(name, "is not a list"))?;
            if spec.rule == Rule::NotEmpty && entries.is_empty() {
                return Err(CoreError::invalid_field(name, "cannot be empty"));
            }
            for entry in entries {
                check_entry(name, entry, type_rule)?;
            }
        }
    }
    Ok(())
}

fn check_entry(name: &str, entry: &RawEntry, type_rule: EntryTypeRule) -> Result<(), CoreError> {
    if entry.id.parse::<EntryId>().is_err() {
        return Err(CoreError::invalid_field(name, "has an invalid row id"));
    }
    if !entry.fields.contains_key("value") {
        return Err(CoreError::invalid_field(
            name,
            format!("row {} has no value", entry.id),
        ));
    }
    if let EntryTypeRule::Code(allowed) = type_rule {
        let code = entry
            .fields
            .get("type")
            .and_then(|t| t.trim().parse::<i64>().ok())
            .filter(|c| allowed.contains(c));
        if code.is_none() {
            return Err(CoreError::invalid_field(
                name,
                format!("row {} has an invalid type", entry.id),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Typed form
// ---------------------------------------------------------------------------

/// The trigger form request after [`check_fields`] succeeded.
#[derive(Debug, Clone, Default)]
pub struct TriggerForm {
    pub save_requested: bool,
    pub show_form: bool,
    pub form_refresh: bool,
    pub triggerid: Option<DbId>,
    pub itemid: Option<DbId>,
    pub description: Option<String>,
    pub priority: Option<Severity>,
    pub trigger_type: Option<TriggerType>,
    /// Set whenever the *Disabled* checkbox was posted.
    pub status: Option<TriggerStatus>,
    pub comments: Option<String>,
    pub url: Option<String>,
    pub expressions: Vec<Keyed<ExpressionPart>>,
    pub keys: Vec<Keyed<KeywordEntry>>,
}

impl TriggerForm {
    /// Validate `params` against [`FIELD_SCHEMA`] and convert them.
    pub fn from_params(params: &RequestParams) -> Result<Self, CoreError> {
        check_fields(FIELD_SCHEMA, params)?;

        let int = |name: &str| params.get(name).and_then(|v| v.trim().parse::<i64>().ok());

        Ok(TriggerForm {
            save_requested: params.is_save_action(),
            show_form: params.has("sform"),
            form_refresh: params.has("form_refresh"),
            triggerid: int("triggerid"),
            itemid: int("itemid"),
            description: params.get("description").map(str::to_string),
            priority: int("priority").map(Severity::from_code).transpose()?,
            trigger_type: int("type").map(TriggerType::from_code),
            status: int("status").map(TriggerStatus::from_code),
            comments: params.get("comments").map(str::to_string),
            url: params.get("url").map(str::to_string),
            expressions: expression_entries(params.entries("expressions").unwrap_or(&[]))?,
            keys: keyword_entries(params.entries("keys").unwrap_or(&[])),
        })
    }

    /// Build the payload of an add/update action.
    pub fn save_payload(&self) -> Result<TriggerSave, CoreError> {
        let payload = TriggerSave {
            description: self.description.clone().unwrap_or_default(),
            itemid: self.itemid.unwrap_or(-1),
            priority: self.priority.unwrap_or(Severity::NotClassified).code().into(),
            parts: self.expressions.iter().map(|k| k.entry.clone()).collect(),
            comments: self.comments.clone().unwrap_or_default(),
            url: self.url.clone().unwrap_or_default(),
            // The checkbox only posts when ticked, so presence alone disables.
            status: if self.status.is_some() {
                TriggerStatus::Disabled
            } else {
                TriggerStatus::Enabled
            },
        };

        payload
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(payload)
    }
}

fn expression_entries(raw: &[RawEntry]) -> Result<Vec<Keyed<ExpressionPart>>, CoreError> {
    raw.iter()
        .filter_map(|entry| Some((entry.id.parse::<EntryId>().ok()?, entry)))
        .map(|(id, entry)| -> Result<Keyed<ExpressionPart>, CoreError> {
            let code = entry
                .fields
                .get("type")
                .and_then(|t| t.trim().parse::<i64>().ok())
                .unwrap_or(0);
            Ok(Keyed {
                id,
                entry: ExpressionPart {
                    value: entry.fields.get("value").cloned().unwrap_or_default(),
                    kind: ExpressionType::from_code(code)?,
                },
            })
        })
        .collect()
}

fn keyword_entries(raw: &[RawEntry]) -> Vec<Keyed<KeywordEntry>> {
    raw.iter()
        .filter_map(|entry| {
            Some(Keyed {
                id: entry.id.parse::<EntryId>().ok()?,
                entry: KeywordEntry {
                    value: entry.fields.get("value").cloned().unwrap_or_default(),
                    kind: entry.fields.get("type").cloned().unwrap_or_default(),
                },
            })
        })
        .collect()
}

/// Fields persisted by an add/update action.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct TriggerSave {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[validate(range(min = 0, message = "Item id is not valid"))]
    pub itemid: DbId,
    #[validate(range(min = 0, max = 5))]
    pub priority: i64,
    #[validate(length(min = 1, message = "Expression cannot be empty"))]
    pub parts: Vec<ExpressionPart>,
    pub comments: String,
    pub url: String,
    pub status: TriggerStatus,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        RequestParams::from_pairs(pairs.iter().copied())
    }

    fn save_request() -> Vec<(&'static str, &'static str)> {
        vec![
            ("add", "1"),
            ("description", "High CPU log"),
            ("itemid", "100"),
            ("priority", "3"),
            ("expressions[0][value]", "ERROR"),
            ("expressions[0][type]", "0"),
        ]
    }

    #[test]
    fn list_rows_keep_first_appearance_order() {
        let p = params(&[
            ("expressions[7][value]", "b"),
            ("expressions[2][value]", "a"),
            ("expressions[7][type]", "1"),
            ("expressions[2][type]", "0"),
        ]);
        let ids: Vec<&str> = p
            .entries("expressions")
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, ["7", "2"]);
    }

    #[test]
    fn display_request_needs_nothing() {
        assert!(check_fields(FIELD_SCHEMA, &params(&[("sform", "1")])).is_ok());
    }

    #[test]
    fn add_without_description_is_rejected() {
        let pairs: Vec<_> = save_request()
            .into_iter()
            .filter(|(k, _)| *k != "description")
            .collect();
        let err = check_fields(FIELD_SCHEMA, &params(&pairs)).unwrap_err();
        assert_matches!(err, CoreError::InvalidField { ref field, .. } if field == "description");
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut pairs = save_request();
        pairs[1] = ("description", "   ");
        assert!(check_fields(FIELD_SCHEMA, &params(&pairs)).is_err());
    }

    #[test]
    fn update_requires_expressions() {
        let pairs: Vec<_> = save_request()
            .into_iter()
            .filter(|(k, _)| !k.starts_with("expressions"))
            .map(|(k, v)| if k == "add" { ("update", v) } else { (k, v) })
            .collect();
        let err = check_fields(FIELD_SCHEMA, &params(&pairs)).unwrap_err();
        assert_matches!(err, CoreError::InvalidField { ref field, .. } if field == "expressions");
    }

    #[test]
    fn priority_outside_range_is_rejected() {
        let mut pairs = save_request();
        pairs[3] = ("priority", "6");
        assert!(check_fields(FIELD_SCHEMA, &params(&pairs)).is_err());
    }

    #[test]
    fn non_integer_itemid_is_rejected() {
        let mut pairs = save_request();
        pairs[2] = ("itemid", "abc");
        assert!(check_fields(FIELD_SCHEMA, &params(&pairs)).is_err());
    }

    #[test]
    fn negative_triggerid_is_rejected() {
        assert!(check_fields(FIELD_SCHEMA, &params(&[("triggerid", "-4")])).is_err());
    }

    #[test]
    fn expression_row_with_bad_type_is_rejected() {
        let mut pairs = save_request();
        pairs[5] = ("expressions[0][type]", "2");
        assert!(check_fields(FIELD_SCHEMA, &params(&pairs)).is_err());
    }

    #[test]
    fn keyword_rows_accept_free_types() {
        let p = params(&[("keys[3][value]", "disk"), ("keys[3][type]", "AND")]);
        let form = TriggerForm::from_params(&p).unwrap();
        assert_eq!(form.keys.len(), 1);
        assert_eq!(form.keys[0].id, 3);
        assert_eq!(form.keys[0].entry.kind, "AND");
    }

    #[test]
    fn status_flag_out_of_range_is_rejected() {
        assert!(check_fields(FIELD_SCHEMA, &params(&[("status", "3")])).is_err());
    }

    #[test]
    fn typed_form_carries_save_fields() {
        let form = TriggerForm::from_params(&params(&save_request())).unwrap();
        assert!(form.save_requested);
        assert_eq!(form.itemid, Some(100));
        assert_eq!(form.priority, Some(Severity::Average));
        assert_eq!(form.expressions.len(), 1);
        assert_eq!(form.expressions[0].entry.kind, ExpressionType::Match);
    }

    #[test]
    fn save_payload_defaults_to_enabled() {
        let form = TriggerForm::from_params(&params(&save_request())).unwrap();
        let payload = form.save_payload().unwrap();
        assert_eq!(payload.status, TriggerStatus::Enabled);
        assert_eq!(payload.priority, 3);
        assert_eq!(payload.comments, "");
    }

    #[test]
    fn posted_status_disables() {
        let mut pairs = save_request();
        pairs.push(("status", "1"));
        let payload = TriggerForm::from_params(&params(&pairs))
            .unwrap()
            .save_payload()
            .unwrap();
        assert_eq!(payload.status, TriggerStatus::Disabled);
    }

    #[test]
    fn body_overrides_query_on_merge() {
        let query = params(&[("triggerid", "5"), ("sform", "1")]);
        let body = params(&[("triggerid", "6")]);
        let merged = query.merged_with(body);
        assert_eq!(merged.get("triggerid"), Some("6"));
        assert!(merged.has("sform"));
    }
}
