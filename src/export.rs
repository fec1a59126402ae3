//! Flattening of the value list into the delimited string handed to the QR encoder.

use crate::config::FieldValue;
use crate::form::FieldEntry;

/// Text form of a single value as it appears in the export.
pub fn export_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Unset => String::new(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Number(n) => format_number(*n),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => items.join(","),
        FieldValue::Team(team) => team.team_number.to_string(),
    }
}

/// Values joined by `delimiter`, in list order.
pub fn export_string(values: &[FieldEntry], delimiter: &str) -> String {
    values
        .iter()
        .map(|e| export_value(&e.value))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Codes joined by `delimiter`; matches the column order of [`export_string`].
pub fn header_string(values: &[FieldEntry], delimiter: &str) -> String {
    values
        .iter()
        .map(|e| e.code.as_str())
        .collect::<Vec<_>>()
        .join(delimiter)
}

// Whole numbers print without a trailing ".0".
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamAndRobot;

    #[test]
    fn renders_each_value_kind() {
        assert_eq!(export_value(&FieldValue::Unset), "");
        assert_eq!(export_value(&FieldValue::Bool(true)), "true");
        assert_eq!(export_value(&FieldValue::Number(3.0)), "3");
        assert_eq!(export_value(&FieldValue::Number(2.5)), "2.5");
        assert_eq!(
            export_value(&FieldValue::List(vec!["p".into(), "dc".into()])),
            "p,dc"
        );
        assert_eq!(
            export_value(&FieldValue::Team(TeamAndRobot {
                team_number: 2713,
                robot_position: "R2".into()
            })),
            "2713"
        );
    }

    #[test]
    fn joins_in_order() {
        let values = vec![
            FieldEntry::new("a", FieldValue::Number(1.0)),
            FieldEntry::new("b", FieldValue::Unset),
            FieldEntry::new("c", FieldValue::Text("x".into())),
        ];
        assert_eq!(export_string(&values, "\t"), "1\t\tx");
        assert_eq!(header_string(&values, "\t"), "a\tb\tc");
    }
}
