//! Structural validation of untyped configuration documents.
//!
//! Serde alone stops at the first mismatch, which forces a configuration author
//! into a fix-one-rerun loop. Instead we walk the raw `serde_json::Value`, record
//! every violation with its path, and only deserialize into [`Configuration`]
//! once the document is known to be well-formed.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::error::{ConfigError, Violation};
use super::models::{Configuration, FieldKind, FieldValue, ResetBehavior, ThemeMode, ValueShape};

/// Validate a raw JSON document and convert it into a [`Configuration`].
///
/// Returns [`ConfigError::Schema`] with every violation found, never just the first.
pub fn validate(raw: &Value) -> Result<Configuration, ConfigError> {
    let mut v = Validator::default();
    v.root(raw);

    if !v.violations.is_empty() {
        debug!(
            target: "qrscout::config",
            violations = v.violations.len(),
            "Configuration rejected"
        );
        return Err(ConfigError::Schema {
            violations: v.violations,
        });
    }

    // The walk above covers every key serde looks at; a failure here means the
    // two have drifted apart, so still report it as a schema problem.
    serde_json::from_value::<Configuration>(raw.clone()).map_err(|e| ConfigError::Schema {
        violations: vec![Violation::new("$", e.to_string())],
    })
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
    /// Every value code seen so far (plain and derived) -> path of first use.
    codes: BTreeMap<String, String>,
}

impl Validator {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let violation = Violation::new(path, message);
        trace!(target: "qrscout::config", %violation, "Violation");
        self.violations.push(violation);
    }

    fn root(&mut self, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            self.push("$", format!("expected an object, found {}", type_name(raw)));
            return;
        };

        self.required_string(obj, "", "title", false);
        self.required_string(obj, "", "page_title", false);
        self.required_string(obj, "", "delimiter", false);

        if let Some(mode) = self.required(obj, "", "defaultTheme") {
            match mode.as_str() {
                Some(s) if ThemeMode::NAMES.contains(&s) => {}
                Some(s) => self.push(
                    "defaultTheme",
                    format!("expected one of {}, found \"{s}\"", quoted(&ThemeMode::NAMES)),
                ),
                None => self.push(
                    "defaultTheme",
                    format!("expected a string, found {}", type_name(mode)),
                ),
            }
        }

        self.optional_integer(obj, "", "teamNumber");
        self.optional_integer(obj, "", "year");

        if let Some(ff) = obj.get("floatingField") {
            self.floating_field(ff);
        }

        if let Some(theme) = self.required(obj, "", "theme") {
            self.theme(theme);
        }

        if let Some(sections) = self.required(obj, "", "sections") {
            match sections.as_array() {
                Some(list) => self.sections(list),
                None => self.push(
                    "sections",
                    format!("expected an array, found {}", type_name(sections)),
                ),
            }
        }
    }

    fn floating_field(&mut self, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            self.push(
                "floatingField",
                format!("expected an object, found {}", type_name(raw)),
            );
            return;
        };
        if let Some(show) = self.required(obj, "floatingField", "show") {
            if !show.is_boolean() {
                self.push(
                    "floatingField.show",
                    format!("expected a boolean, found {}", type_name(show)),
                );
            }
        }
        self.required_string(obj, "floatingField", "codeValue", false);
    }

    fn theme(&mut self, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            self.push("theme", format!("expected an object, found {}", type_name(raw)));
            return;
        };
        for mode in ["light", "dark"] {
            let path = format!("theme.{mode}");
            let Some(palette) = self.required(obj, "theme", mode) else {
                continue;
            };
            let Some(entries) = palette.as_object() else {
                self.push(path, format!("expected an object, found {}", type_name(palette)));
                continue;
            };
            for (key, value) in entries {
                if !value.is_string() {
                    self.push(
                        format!("{path}.{key}"),
                        format!("expected a string, found {}", type_name(value)),
                    );
                }
            }
        }
    }

    fn sections(&mut self, list: &[Value]) {
        let mut names = HashSet::new();
        for (i, section) in list.iter().enumerate() {
            let path = format!("sections[{i}]");
            let Some(obj) = section.as_object() else {
                self.push(path, format!("expected an object, found {}", type_name(section)));
                continue;
            };

            if let Some(name) = self.required_string(obj, &path, "name", true) {
                if !names.insert(name.to_string()) {
                    self.push(
                        format!("{path}.name"),
                        format!("duplicate section name \"{name}\""),
                    );
                }
            }

            if let Some(fields) = self.required(obj, &path, "fields") {
                match fields.as_array() {
                    Some(fields) => {
                        for (j, field) in fields.iter().enumerate() {
                            self.field(&format!("{path}.fields[{j}]"), field);
                        }
                    }
                    None => self.push(
                        format!("{path}.fields"),
                        format!("expected an array, found {}", type_name(fields)),
                    ),
                }
            }
        }
    }

    fn field(&mut self, path: &str, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            self.push(path, format!("expected an object, found {}", type_name(raw)));
            return;
        };

        self.required_string(obj, path, "title", false);
        let code = self.required_string(obj, path, "code", true).map(str::to_string);

        if let Some(required) = self.required(obj, path, "required") {
            if !required.is_boolean() {
                self.push(
                    format!("{path}.required"),
                    format!("expected a boolean, found {}", type_name(required)),
                );
            }
        }

        let kind = self.required(obj, path, "type").and_then(|t| match t.as_str() {
            Some(s) => {
                let kind = FieldKind::parse(s);
                if kind.is_none() {
                    let names: Vec<&str> = FieldKind::ALL.iter().map(|k| k.as_str()).collect();
                    self.push(
                        format!("{path}.type"),
                        format!("expected one of {}, found \"{s}\"", quoted(&names)),
                    );
                }
                kind
            }
            None => {
                self.push(
                    format!("{path}.type"),
                    format!("expected a string, found {}", type_name(t)),
                );
                None
            }
        });

        if let Some(behavior) = self.required(obj, path, "formResetBehavior") {
            match behavior.as_str() {
                Some(s) if ResetBehavior::parse(s).is_some() => {}
                Some(s) => {
                    let names: Vec<&str> = ResetBehavior::ALL.iter().map(|b| b.as_str()).collect();
                    self.push(
                        format!("{path}.formResetBehavior"),
                        format!("expected one of {}, found \"{s}\"", quoted(&names)),
                    );
                }
                None => self.push(
                    format!("{path}.formResetBehavior"),
                    format!("expected a string, found {}", type_name(behavior)),
                ),
            }
        }

        if let Some(description) = obj.get("description") {
            if !description.is_string() {
                self.push(
                    format!("{path}.description"),
                    format!("expected a string, found {}", type_name(description)),
                );
            }
        }

        for key in ["min", "max", "step"] {
            if let Some(n) = obj.get(key) {
                if !n.is_number() {
                    self.push(
                        format!("{path}.{key}"),
                        format!("expected a number, found {}", type_name(n)),
                    );
                }
            }
        }
        if let (Some(min), Some(max)) = (
            obj.get("min").and_then(Value::as_f64),
            obj.get("max").and_then(Value::as_f64),
        ) {
            if min > max {
                self.push(format!("{path}.min"), format!("min ({min}) exceeds max ({max})"));
            }
        }

        if let Some(choices) = obj.get("choices") {
            match choices.as_object() {
                Some(map) => {
                    for (key, label) in map {
                        if !label.is_string() {
                            self.push(
                                format!("{path}.choices.{key}"),
                                format!("expected a string, found {}", type_name(label)),
                            );
                        }
                    }
                }
                None => self.push(
                    format!("{path}.choices"),
                    format!("expected an object, found {}", type_name(choices)),
                ),
            }
        }

        if let Some(kind) = kind {
            self.default_value(path, obj, kind);
        }

        let is_tracker = kind == Some(FieldKind::ActionTracker);
        let action_codes = self.actions(path, obj, is_tracker);

        let Some(code) = code else {
            return;
        };
        if is_tracker {
            for action in action_codes {
                for suffix in ["count", "times"] {
                    self.claim_code(format!("{code}_{action}_{suffix}"), path);
                }
            }
        } else {
            self.claim_code(code, path);
        }
    }

    fn default_value(&mut self, path: &str, obj: &Map<String, Value>, kind: FieldKind) {
        let Some(raw) = obj.get("defaultValue") else {
            return;
        };
        let shape = kind.value_shape();
        if shape == ValueShape::None {
            if !raw.is_null() {
                self.push(
                    format!("{path}.defaultValue"),
                    format!("{kind} fields do not take a defaultValue"),
                );
            }
            return;
        }
        let fits = serde_json::from_value::<FieldValue>(raw.clone())
            .map(|v| v.fits(shape))
            .unwrap_or(false);
        if !fits {
            self.push(
                format!("{path}.defaultValue"),
                format!(
                    "expected {} for {kind} fields, found {}",
                    shape.describe(),
                    type_name(raw)
                ),
            );
        }
    }

    /// Check the `actions` list and return the valid action codes.
    fn actions(&mut self, path: &str, obj: &Map<String, Value>, is_tracker: bool) -> Vec<String> {
        let mut out = Vec::new();
        let Some(raw) = obj.get("actions") else {
            if is_tracker {
                self.push(format!("{path}.actions"), "is required for action-tracker fields");
            }
            return out;
        };
        let Some(list) = raw.as_array() else {
            self.push(
                format!("{path}.actions"),
                format!("expected an array, found {}", type_name(raw)),
            );
            return out;
        };
        if is_tracker && list.is_empty() {
            self.push(format!("{path}.actions"), "must list at least one action");
        }
        for (k, action) in list.iter().enumerate() {
            let apath = format!("{path}.actions[{k}]");
            let Some(aobj) = action.as_object() else {
                self.push(apath, format!("expected an object, found {}", type_name(action)));
                continue;
            };
            if let Some(title) = aobj.get("title") {
                if !title.is_string() {
                    self.push(
                        format!("{apath}.title"),
                        format!("expected a string, found {}", type_name(title)),
                    );
                }
            }
            if let Some(code) = self.required_string(aobj, &apath, "code", true) {
                out.push(code.to_string());
            }
        }
        out
    }

    fn claim_code(&mut self, code: String, path: &str) {
        if let Some(first) = self.codes.get(&code) {
            let message = format!("value code \"{code}\" is already used by {first}");
            self.push(format!("{path}.code"), message);
        } else {
            self.codes.insert(code, path.to_string());
        }
    }

    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.push(join(parent, key), "is required");
        }
        value
    }

    fn required_string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
        non_empty: bool,
    ) -> Option<&'a str> {
        let value = self.required(obj, parent, key)?;
        match value.as_str() {
            Some(s) if non_empty && s.trim().is_empty() => {
                self.push(join(parent, key), "must not be empty");
                None
            }
            Some(s) => Some(s),
            None => {
                self.push(
                    join(parent, key),
                    format!("expected a string, found {}", type_name(value)),
                );
                None
            }
        }
    }

    fn optional_integer(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(value) = obj.get(key) {
            if value.as_u64().is_none_or(|n| n > u64::from(u32::MAX)) {
                self.push(
                    join(parent, key),
                    format!("expected a non-negative integer, found {}", type_name(value)),
                );
            }
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn quoted(names: &[&str]) -> String {
    let inner = names
        .iter()
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "title": "Scouting",
            "page_title": "2025 Scouting",
            "defaultTheme": "dark",
            "delimiter": "\t",
            "theme": { "light": {"background": "0 0% 100%"}, "dark": {"background": "0 0% 0%"} },
            "sections": [
                {
                    "name": "Auto",
                    "fields": [
                        {
                            "title": "Score",
                            "type": "number",
                            "code": "score",
                            "required": true,
                            "formResetBehavior": "reset",
                            "defaultValue": 0
                        },
                        {
                            "title": "Pickup",
                            "type": "action-tracker",
                            "code": "pickup",
                            "required": false,
                            "formResetBehavior": "reset",
                            "actions": [{"code": "cone"}, {"code": "cube", "title": "Cube"}]
                        }
                    ]
                }
            ]
        })
    }

    fn paths(err: &ConfigError) -> Vec<&str> {
        err.violations().iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_config() {
        let cfg = validate(&minimal()).unwrap();
        assert_eq!(cfg.sections.len(), 1);
        assert_eq!(cfg.sections[0].fields[1].kind, FieldKind::ActionTracker);
        assert_eq!(cfg.default_theme, ThemeMode::Dark);
    }

    #[test]
    fn rejects_non_object_root() {
        let err = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn sections_type_violation_is_reported_with_missing_keys() {
        let err = validate(&json!({"sections": "not-an-array"})).unwrap_err();
        let p = paths(&err);
        assert!(p.contains(&"sections"));
        assert!(p.contains(&"title"));
        assert!(p.contains(&"theme"));
        let msg = err.to_string();
        assert!(msg.contains("sections: expected an array, found a string"));
    }

    #[test]
    fn aggregates_field_violations() {
        let mut raw = minimal();
        raw["sections"][0]["fields"][0]["type"] = json!("slider");
        raw["sections"][0]["fields"][0]["formResetBehavior"] = json!("wipe");
        raw["sections"][0]["fields"][1]["code"] = json!("");
        raw["sections"][0]["name"] = json!("");

        let err = validate(&raw).unwrap_err();
        let p = paths(&err);
        assert!(p.contains(&"sections[0].name"));
        assert!(p.contains(&"sections[0].fields[0].type"));
        assert!(p.contains(&"sections[0].fields[0].formResetBehavior"));
        assert!(p.contains(&"sections[0].fields[1].code"));
        assert_eq!(err.violations().len(), 4);
    }

    #[test]
    fn rejects_duplicate_codes_and_section_names() {
        let mut raw = minimal();
        let section = raw["sections"][0].clone();
        raw["sections"].as_array_mut().unwrap().push(section);

        let err = validate(&raw).unwrap_err();
        let p = paths(&err);
        assert!(p.contains(&"sections[1].name"));
        assert!(p.contains(&"sections[1].fields[0].code"));
        assert!(p.contains(&"sections[1].fields[1].code"));
    }

    #[test]
    fn rejects_field_code_colliding_with_derived_code() {
        let mut raw = minimal();
        raw["sections"][0]["fields"][0]["code"] = json!("pickup_cone_count");
        let err = validate(&raw).unwrap_err();
        assert_eq!(paths(&err), vec!["sections[0].fields[1].code"]);
    }

    #[test]
    fn action_tracker_requires_actions() {
        let mut raw = minimal();
        raw["sections"][0]["fields"][1]
            .as_object_mut()
            .unwrap()
            .remove("actions");
        let err = validate(&raw).unwrap_err();
        assert_eq!(paths(&err), vec!["sections[0].fields[1].actions"]);
    }

    #[test]
    fn default_value_must_match_kind() {
        let mut raw = minimal();
        raw["sections"][0]["fields"][0]["defaultValue"] = json!("zero");
        let err = validate(&raw).unwrap_err();
        assert_eq!(paths(&err), vec!["sections[0].fields[0].defaultValue"]);
        assert!(err.violations()[0].message.contains("expected a number"));

        let mut raw = minimal();
        raw["sections"][0]["fields"][0]["defaultValue"] = Value::Null;
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn checks_optional_keys_and_theme() {
        let mut raw = minimal();
        raw["theme"]["dark"]["background"] = json!(3);
        raw["floatingField"] = json!({"show": "yes"});
        raw["teamNumber"] = json!(-4);
        raw["sections"][0]["fields"][0]["min"] = json!(10);
        raw["sections"][0]["fields"][0]["max"] = json!(1);

        let err = validate(&raw).unwrap_err();
        let p = paths(&err);
        assert!(p.contains(&"theme.dark.background"));
        assert!(p.contains(&"floatingField.show"));
        assert!(p.contains(&"floatingField.codeValue"));
        assert!(p.contains(&"teamNumber"));
        assert!(p.contains(&"sections[0].fields[0].min"));
    }
}
