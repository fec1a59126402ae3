use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root form configuration.
///
/// This structure is deserialized from the JSON configuration document that drives
/// the form. It captures everything the store needs:
/// - page metadata (`title`, `page_title`)
/// - export settings (`delimiter`)
/// - theme palettes (`defaultTheme`, `theme`)
/// - the ordered `sections` and their typed fields
///
/// Key names follow the document exactly (mixed snake/camel case) so existing
/// configuration files keep working unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Configuration {
    /// Form title (shown in headers and exports).
    pub title: String,

    /// Browser tab / page title.
    pub page_title: String,

    /// Theme used when the user has not chosen one.
    #[serde(rename = "defaultTheme")]
    pub default_theme: ThemeMode,

    /// Separator placed between values in the exported string.
    pub delimiter: String,

    /// Owning team number, used by the match-data prefill collaborator.
    #[serde(rename = "teamNumber", default, skip_serializing_if = "Option::is_none")]
    pub team_number: Option<u32>,

    /// Competition year, used by the match-data prefill collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    /// Optional value pinned on screen while scrolling the form.
    #[serde(
        rename = "floatingField",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub floating_field: Option<FloatingField>,

    /// Light and dark palettes (CSS variable name -> value).
    pub theme: ThemePalettes,

    /// Form sections in display order.
    pub sections: Vec<SectionDefinition>,
}

impl Configuration {
    /// Iterate over every field of every section, in document order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Find a field by its code anywhere in the configuration.
    pub fn find_field(&self, code: &str) -> Option<&FieldDefinition> {
        self.fields().find(|f| f.code == code)
    }

    /// Find a field by section name and code.
    pub fn field_in_section(&self, section: &str, code: &str) -> Option<&FieldDefinition> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.fields.iter().find(|f| f.code == code))
    }
}

/// A named group of fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SectionDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// A single input on the form.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FieldDefinition {
    /// Label shown next to the input.
    pub title: String,

    /// Input kind. Selects both the widget and the shape of its value.
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Stable identifier used to key this field's value.
    pub code: String,

    pub required: bool,

    /// What the widget does when the user resets the form.
    #[serde(rename = "formResetBehavior")]
    pub form_reset_behavior: ResetBehavior,

    /// Initial value. Absent or `null` means unset.
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Choice key -> label, for `select` and `multi-select`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Tracked actions, only meaningful for `action-tracker`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionDefinition>>,
}

impl FieldDefinition {
    /// The value this field starts with (and returns to on reset).
    pub fn initial_value(&self) -> FieldValue {
        self.default_value.clone().unwrap_or(FieldValue::Unset)
    }

    /// Declared actions, empty for non-tracker fields.
    pub fn actions(&self) -> &[ActionDefinition] {
        self.actions.as_deref().unwrap_or(&[])
    }
}

/// One action counted by an `action-tracker` field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActionDefinition {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Closed set of supported input kinds.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum FieldKind {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "counter")]
    Counter,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "timer")]
    Timer,
    #[serde(rename = "multi-select")]
    MultiSelect,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "action-tracker")]
    ActionTracker,
    #[serde(rename = "TBA-team-and-robot")]
    TeamAndRobot,
    #[serde(rename = "TBA-match-number")]
    MatchNumber,
}

impl FieldKind {
    pub const ALL: [FieldKind; 12] = [
        FieldKind::Number,
        FieldKind::Boolean,
        FieldKind::Text,
        FieldKind::Select,
        FieldKind::Counter,
        FieldKind::Range,
        FieldKind::Timer,
        FieldKind::MultiSelect,
        FieldKind::Image,
        FieldKind::ActionTracker,
        FieldKind::TeamAndRobot,
        FieldKind::MatchNumber,
    ];

    /// Name used in the configuration document.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::Counter => "counter",
            FieldKind::Range => "range",
            FieldKind::Timer => "timer",
            FieldKind::MultiSelect => "multi-select",
            FieldKind::Image => "image",
            FieldKind::ActionTracker => "action-tracker",
            FieldKind::TeamAndRobot => "TBA-team-and-robot",
            FieldKind::MatchNumber => "TBA-match-number",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Kinds whose value is a number (and therefore can be incremented).
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldKind::Number
                | FieldKind::Counter
                | FieldKind::Range
                | FieldKind::Timer
                | FieldKind::MatchNumber
        )
    }

    /// Shape a `defaultValue` must have for this kind.
    pub const fn value_shape(self) -> ValueShape {
        match self {
            FieldKind::Number
            | FieldKind::Counter
            | FieldKind::Range
            | FieldKind::Timer
            | FieldKind::MatchNumber => ValueShape::Number,
            FieldKind::Boolean => ValueShape::Bool,
            FieldKind::Text | FieldKind::Select | FieldKind::Image => ValueShape::Text,
            FieldKind::MultiSelect => ValueShape::List,
            FieldKind::TeamAndRobot => ValueShape::Team,
            FieldKind::ActionTracker => ValueShape::None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected JSON shape of a field's value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueShape {
    Number,
    Bool,
    Text,
    List,
    Team,
    /// Composite fields carry no value of their own.
    None,
}

impl ValueShape {
    pub const fn describe(self) -> &'static str {
        match self {
            ValueShape::Number => "a number",
            ValueShape::Bool => "a boolean",
            ValueShape::Text => "a string",
            ValueShape::List => "an array of strings",
            ValueShape::Team => "an object with teamNumber and robotPosition",
            ValueShape::None => "absent",
        }
    }
}

/// How a widget reacts to a user-initiated form reset.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResetBehavior {
    Reset,
    Preserve,
    Increment,
}

impl ResetBehavior {
    pub const ALL: [ResetBehavior; 3] = [
        ResetBehavior::Reset,
        ResetBehavior::Preserve,
        ResetBehavior::Increment,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ResetBehavior::Reset => "reset",
            ResetBehavior::Preserve => "preserve",
            ResetBehavior::Increment => "increment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    Light,
    System,
}

impl ThemeMode {
    pub const NAMES: [&'static str; 3] = ["dark", "light", "system"];
}

/// Light/dark palettes (CSS custom property name -> value).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ThemePalettes {
    pub light: BTreeMap<String, String>,
    pub dark: BTreeMap<String, String>,
}

/// A value kept visible while scrolling (e.g. the scouted team number).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FloatingField {
    pub show: bool,
    #[serde(rename = "codeValue")]
    pub code_value: String,
}

/// Current value of a field.
///
/// The variant is determined by the field's declared [`FieldKind`] (see
/// [`FieldKind::value_shape`]). Serialization is untagged so values look exactly
/// like the plain JSON the configuration document uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Unset,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Team(TeamAndRobot),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    /// Whether this value has the shape a field of `kind` expects.
    /// `Unset` fits every kind.
    pub fn fits(&self, shape: ValueShape) -> bool {
        matches!(
            (self, shape),
            (FieldValue::Unset, _)
                | (FieldValue::Number(_), ValueShape::Number)
                | (FieldValue::Bool(_), ValueShape::Bool)
                | (FieldValue::Text(_), ValueShape::Text)
                | (FieldValue::List(_), ValueShape::List)
                | (FieldValue::Team(_), ValueShape::Team)
        )
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Team selection produced by the team/robot selector.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TeamAndRobot {
    #[serde(rename = "teamNumber")]
    pub team_number: u32,
    #[serde(rename = "robotPosition")]
    pub robot_position: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_kind_names_round_trip() {
        for kind in FieldKind::ALL {
            let v = serde_json::to_value(kind).unwrap();
            assert_eq!(v, json!(kind.as_str()));
            assert_eq!(FieldKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FieldKind::parse("slider"), None);
    }

    #[test]
    fn field_value_untagged_shapes() {
        let v: FieldValue = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(v, FieldValue::Number(3.0));
        let v: FieldValue = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(v, FieldValue::List(vec!["a".into(), "b".into()]));
        let v: FieldValue =
            serde_json::from_value(json!({"teamNumber": 254, "robotPosition": "R1"})).unwrap();
        assert_eq!(
            v,
            FieldValue::Team(TeamAndRobot {
                team_number: 254,
                robot_position: "R1".into()
            })
        );
        assert_eq!(serde_json::to_value(FieldValue::Unset).unwrap(), json!(null));
    }

    #[test]
    fn fits_checks_shape() {
        assert!(FieldValue::Number(1.0).fits(FieldKind::Counter.value_shape()));
        assert!(!FieldValue::Text("1".into()).fits(FieldKind::Counter.value_shape()));
        assert!(FieldValue::Unset.fits(FieldKind::Boolean.value_shape()));
    }
}
