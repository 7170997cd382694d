use argentry::{ParseError, Parsed};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::schema::BoundEntry;

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub program: String,
    pub values: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rest: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
}

impl ParseReport {
    pub fn new(parsed: &Parsed, bound: &[BoundEntry]) -> Self {
        let values = bound
            .iter()
            .map(|b| (b.name.clone(), b.value(parsed).unwrap_or(Value::Null)))
            .collect();
        let unrecognized = parsed
            .diagnostics()
            .iter()
            .filter_map(|d| match d {
                ParseError::UnrecognizedKey { key } => Some(key.clone()),
                _ => None,
            })
            .collect();
        Self {
            program: parsed.program_name().to_string(),
            values,
            rest: parsed.rest().to_vec(),
            unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Declaration;
    use argentry::{Args, ParseOutcome};

    #[test]
    fn report_keeps_declaration_order_and_diagnostics() {
        let decl: Declaration = serde_json::from_str(
            r#"{"entries":[
                {"kind":"keyword","keys":"z","type":"int"},
                {"kind":"keyword","keys":"a","default":"x"},
                {"kind":"positional","name":"input"}
            ]}"#,
        )
        .unwrap();
        let mut args = Args::new(["tool", "--what", "-z", "-3", "in", "extra"]);
        let bound = decl.register(&mut args);
        let ParseOutcome::Matches(parsed) = args.parse() else {
            panic!("expected Matches");
        };

        let report = ParseReport::new(&parsed, &bound);
        let keys: Vec<&str> = report.values.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "input"]);
        assert_eq!(report.values["z"], serde_json::json!(-3));
        assert_eq!(report.values["a"], serde_json::json!("x"));
        assert_eq!(report.rest, ["extra"]);
        assert_eq!(report.unrecognized, ["what"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["program"], "tool");
    }
}
