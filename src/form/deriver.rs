use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{Configuration, FieldDefinition, FieldKind, FieldValue};

/// One flat `{code, value}` pair of the form's value list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldEntry {
    pub code: String,
    pub value: FieldValue,
}

impl FieldEntry {
    pub fn new(code: impl Into<String>, value: FieldValue) -> Self {
        Self {
            code: code.into(),
            value,
        }
    }
}

/// Code of the count sub-value an action-tracker keeps per action.
pub fn action_count_code(field: &str, action: &str) -> String {
    format!("{field}_{action}_count")
}

/// Code of the timestamps sub-value an action-tracker keeps per action.
pub fn action_times_code(field: &str, action: &str) -> String {
    format!("{field}_{action}_times")
}

/// Initial entries for a single field.
///
/// Action trackers expand into a count/times pair per action (in declared order);
/// every other kind yields one entry holding the field's default.
pub fn derive_field(field: &FieldDefinition) -> Vec<FieldEntry> {
    match field.kind {
        FieldKind::ActionTracker => field
            .actions()
            .iter()
            .flat_map(|action| {
                [
                    FieldEntry::new(
                        action_count_code(&field.code, &action.code),
                        FieldValue::Number(0.0),
                    ),
                    FieldEntry::new(
                        action_times_code(&field.code, &action.code),
                        FieldValue::Text(String::new()),
                    ),
                ]
            })
            .collect(),
        _ => vec![FieldEntry::new(field.code.clone(), field.initial_value())],
    }
}

/// Derive the full, ordered value list for a configuration.
///
/// Order mirrors section -> field -> action declaration order so exports are stable
/// across reloads. If two entries share a code the later value replaces the earlier
/// one in place.
pub fn derive(config: &Configuration) -> Vec<FieldEntry> {
    let mut out: Vec<FieldEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in config.fields().flat_map(derive_field) {
        match index.get(&entry.code) {
            Some(&i) => out[i].value = entry.value,
            None => {
                index.insert(entry.code.clone(), out.len());
                out.push(entry);
            }
        }
    }
    out
}
