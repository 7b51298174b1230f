use std::{collections::BTreeMap, io::Read};

use serde_json::Value;

use crate::error::{Error, Result};

/// A single usage of a component. The path is `None` when the scanner didn't
/// provide a usable file location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInstance {
    pub file: Option<String>,
}

impl UsageInstance {
    pub fn at(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
        }
    }

    fn from_value(value: &Value) -> Self {
        let file = value
            .get("location")
            .and_then(|location| location.get("file"))
            .and_then(Value::as_str)
            .filter(|file| !file.is_empty())
            .map(str::to_owned);
        Self { file }
    }
}

/// Raw component usage as reported by the scanner: component name to the
/// instances where it is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageReport {
    components: BTreeMap<String, Vec<UsageInstance>>,
}

impl UsageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a report shaped like
    /// `{"Button": {"instances": [{"location": {"file": "src/a.jsx"}}]}}`.
    pub fn from_json_str(source: &str) -> Result<UsageReport> {
        Self::from_value(serde_json::from_str(source)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<UsageReport> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    /// Only the overall shape is validated. Instances without a file location
    /// are kept so they can be reported as unattributed.
    pub fn from_value(value: Value) -> Result<UsageReport> {
        let entries = match value {
            Value::Object(entries) => entries,
            other => {
                return Err(Error::malformed_report(format!(
                    "expected an object mapping component names to usage, found {}",
                    type_name(&other)
                )))
            }
        };

        let mut report = UsageReport::new();
        for (name, usage) in entries {
            let instances = usage
                .get("instances")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::malformed_report(format!(
                        "component `{}` has no `instances` array",
                        name
                    ))
                })?;
            let instances = instances.iter().map(UsageInstance::from_value).collect();
            report.insert(name, instances);
        }
        Ok(report)
    }

    pub fn insert(&mut self, component: impl Into<String>, instances: Vec<UsageInstance>) {
        self.components.insert(component.into(), instances);
    }

    pub fn get(&self, component: &str) -> Option<&[UsageInstance]> {
        self.components.get(component).map(Vec::as_slice)
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, &[UsageInstance])> {
        self.components
            .iter()
            .map(|(name, instances)| (name.as_str(), instances.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
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

    #[test]
    fn test_decode() {
        let report = UsageReport::from_json_str(
            r#"{
                "Button": {"instances": [
                    {"location": {"file": "src/a.jsx", "start": {"line": 1}}},
                    {"location": {"file": ""}},
                    {"location": {}},
                    {"importInfo": {}},
                    {"location": {"file": 42}}
                ]},
                "Icon": {"instances": []}
            }"#,
        )
        .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.instance_count(), 5);
        assert_eq!(
            report.get("Button").unwrap(),
            &[
                UsageInstance::at("src/a.jsx"),
                UsageInstance::default(),
                UsageInstance::default(),
                UsageInstance::default(),
                UsageInstance::default(),
            ]
        );
        assert!(report.get("Icon").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_shapes() {
        let examples = [
            ("[]", "found an array"),
            ("null", "found null"),
            (r#"{"Button": []}"#, "component `Button` has no `instances` array"),
            (r#"{"Button": {"instances": {}}}"#, "component `Button`"),
            ("{", "EOF"),
        ];
        for (source, message) in examples {
            match UsageReport::from_json_str(source) {
                Err(Error::MalformedReport { message: actual }) => assert!(
                    actual.contains(message),
                    "expected `{}` to mention `{}`, got `{}`",
                    source,
                    message,
                    actual
                ),
                other => panic!("expected malformed report for `{}`, got {:?}", source, other),
            }
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "connection reset",
            ))
        }
    }

    #[test]
    fn test_read_failure() {
        match UsageReport::from_reader(FailingReader) {
            Err(Error::Io { location, source }) => {
                assert_eq!(location, "usage report");
                assert_eq!(source.kind(), std::io::ErrorKind::Other);
                assert_eq!(source.to_string(), "connection reset");
            }
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
