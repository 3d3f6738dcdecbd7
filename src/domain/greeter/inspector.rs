//! Debug dumps of panel state objects

use serde::Serialize;

/// Names of the operations an inspected object currently offers
pub trait Callables {
    fn callables(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Rendered inspector block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorView {
    pub name: String,
    pub dump: String,
    pub functions: Vec<String>,
}

pub struct ObjectInspector;

impl ObjectInspector {
    /// Pretty-print `object` and list its callables
    ///
    /// A serializer error keeps whatever was written before the failure and
    /// appends a marker line.
    pub fn inspect<T>(name: &str, object: &T) -> InspectorView
    where
        T: Serialize + Callables + ?Sized,
    {
        let mut buf = Vec::new();
        let dump = match serde_json::to_writer_pretty(&mut buf, object) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(err) => {
                let mut partial = String::from_utf8_lossy(&buf).into_owned();
                if !partial.is_empty() {
                    partial.push('\n');
                }
                partial.push_str(&format!("<unserializable: {err}>"));
                partial
            }
        };

        InspectorView {
            name: name.to_string(),
            dump,
            functions: object
                .callables()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl InspectorView {
    /// Text lines of the block; collapsed shows only the summary
    pub fn lines(&self, expanded: bool) -> Vec<String> {
        let marker = if expanded { "▾" } else { "▸" };
        let mut lines = vec![format!("{marker} {}", self.name)];
        if !expanded {
            return lines;
        }
        lines.extend(self.dump.lines().map(|line| format!("  {line}")));
        if !self.functions.is_empty() {
            lines.push("  Functions:".to_string());
            lines.extend(self.functions.iter().map(|f| format!("  - {f}")));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Serialize)]
    struct Sample {
        data: Option<String>,
        is_loading: bool,
    }

    impl Callables for Sample {
        fn callables(&self) -> Vec<&'static str> {
            vec!["refetch", "remove"]
        }
    }

    #[derive(Serialize)]
    struct Broken {
        before: u8,
        map: BTreeMap<(u8, u8), u8>,
    }

    impl Callables for Broken {}

    #[test]
    fn test_dump_and_functions_in_order() {
        let sample = Sample {
            data: Some("hello".into()),
            is_loading: false,
        };
        let view = ObjectInspector::inspect("readResults", &sample);
        assert_eq!(view.name, "readResults");
        assert!(view.dump.contains("\"data\": \"hello\""));
        assert!(view.dump.contains("\"is_loading\": false"));
        assert_eq!(view.functions, vec!["refetch", "remove"]);
    }

    #[test]
    fn test_serializer_error_degrades_to_partial_output() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), 3);
        let view = ObjectInspector::inspect("broken", &Broken { before: 7, map });
        assert!(view.dump.contains("\"before\": 7"));
        assert!(view.dump.contains("<unserializable:"));
        assert!(view.functions.is_empty());
    }

    #[test]
    fn test_collapsed_lines_show_only_summary() {
        let view = ObjectInspector::inspect(
            "x",
            &Sample {
                data: None,
                is_loading: true,
            },
        );
        assert_eq!(view.lines(false), vec!["▸ x".to_string()]);

        let expanded = view.lines(true);
        assert_eq!(expanded[0], "▾ x");
        assert!(expanded.contains(&"  Functions:".to_string()));
        assert_eq!(expanded.last().unwrap(), "  - remove");
    }

    #[test]
    fn test_inspect_does_not_touch_input() {
        let sample = Sample {
            data: Some("a".into()),
            is_loading: false,
        };
        let first = ObjectInspector::inspect("s", &sample);
        let second = ObjectInspector::inspect("s", &sample);
        assert_eq!(first, second);
    }
}
