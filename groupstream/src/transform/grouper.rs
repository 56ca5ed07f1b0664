//! Nest flat, schema-less rows into parent objects with a child array.
//!
//! Works on any header layout: a [`NestSpec`] names the key column, the
//! column identifying a child, and the columns belonging to a child. Every
//! other column is a parent column, read from the first row of the group.
//!
//! ```text
//! order_id | customer | item_id | item_qty        {"order_id":"1","customer":"ann",
//! 1        | ann      | a       | 2          →     "items":[{"item_id":"a","item_qty":"2"},
//! 1        | ann      | b       | 1                          {"item_id":"b","item_qty":"1"}]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TransformError, TransformResult};
use crate::models::Record;
use crate::sequence::Group;

/// Default name of the array holding the children.
pub const DEFAULT_CHILDREN_FIELD: &str = "children";

/// How to nest a flat row layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NestSpec {
    /// Grouping key column. Rows must be sorted by it.
    pub key: String,
    /// Column identifying a child row; null means "no child on this row".
    pub child_id: String,
    /// Other columns belonging to the child.
    pub child_fields: Vec<String>,
    /// Name of the child array in the output object.
    pub children_field: String,
}

impl NestSpec {
    pub fn new(
        key: impl Into<String>,
        child_id: impl Into<String>,
        child_fields: Vec<String>,
    ) -> Self {
        Self {
            key: key.into(),
            child_id: child_id.into(),
            child_fields,
            children_field: DEFAULT_CHILDREN_FIELD.to_string(),
        }
    }

    pub fn with_children_field(mut self, name: impl Into<String>) -> Self {
        self.children_field = name.into();
        self
    }

    /// Columns the source must provide.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.key.as_str(), self.child_id.as_str()];
        columns.extend(self.child_fields.iter().map(String::as_str));
        columns
    }

    /// Grouping key of a record. A missing key column reads as `null`.
    pub fn key_of(&self, record: &Record) -> Value {
        record.get(&self.key).cloned().unwrap_or(Value::Null)
    }

    fn is_child_column(&self, column: &str) -> bool {
        column == self.child_id || self.child_fields.iter().any(|f| f == column)
    }
}

/// Nest one group of records into a single JSON object.
pub fn nest_group(spec: &NestSpec, group: Group<Value, Record>) -> TransformResult<Value> {
    let (key, records) = group.into_parts();
    let key = display_key(&key);

    let mut parent = Map::new();
    let mut children = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        if index == 0 {
            for (column, value) in &record {
                if !spec.is_child_column(column) {
                    parent.insert(column.clone(), value.clone());
                }
            }
        } else {
            check_parent(&key, &parent, &record)?;
        }

        if let Some(child) = child_of(spec, &key, record)? {
            children.push(child);
        }
    }

    parent.insert(spec.children_field.clone(), Value::Array(children));
    Ok(Value::Object(parent))
}

/// Every parent column of a later row must match the first row.
fn check_parent(key: &str, parent: &Map<String, Value>, record: &Record) -> TransformResult<()> {
    for (column, expected) in parent {
        if record.get(column).unwrap_or(&Value::Null) != expected {
            return Err(TransformError::InconsistentParent {
                key: key.to_string(),
                field: column.clone(),
            });
        }
    }
    Ok(())
}

fn child_of(spec: &NestSpec, key: &str, mut record: Record) -> TransformResult<Option<Value>> {
    let id = record.remove(&spec.child_id).unwrap_or(Value::Null);

    if id.is_null() {
        let stray = spec
            .child_fields
            .iter()
            .find(|f| record.get(f.as_str()).is_some_and(|v| !v.is_null()));
        return match stray {
            Some(other) => Err(TransformError::PartialChildRow {
                key: key.to_string(),
                field: spec.child_id.clone(),
                other: other.clone(),
            }),
            None => Ok(None),
        };
    }

    let mut child = Map::new();
    child.insert(spec.child_id.clone(), id);
    for field in &spec.child_fields {
        let value = record.remove(field).unwrap_or(Value::Null);
        child.insert(field.clone(), value);
    }
    Ok(Some(Value::Object(child)))
}

fn display_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceExt;
    use serde_json::json;

    fn spec() -> NestSpec {
        NestSpec::new("order_id", "item_id", vec!["item_qty".to_string()])
            .with_children_field("items")
    }

    fn records(rows: Vec<Value>) -> Vec<Record> {
        rows.into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("not an object"),
            })
            .collect()
    }

    fn nest_all(spec: &NestSpec, rows: Vec<Value>) -> Vec<TransformResult<Value>> {
        records(rows)
            .into_iter()
            .map(Ok::<_, TransformError>)
            .group_by_key(|r| spec.key_of(r))
            .map(|g| nest_group(spec, g?))
            .collect()
    }

    #[test]
    fn test_nests_children_under_parent() {
        let spec = spec();
        let out = nest_all(
            &spec,
            vec![
                json!({"order_id": "1", "customer": "ann", "item_id": "a", "item_qty": "2"}),
                json!({"order_id": "1", "customer": "ann", "item_id": "b", "item_qty": "1"}),
                json!({"order_id": "2", "customer": "bob", "item_id": null, "item_qty": null}),
            ],
        );

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].as_ref().unwrap(),
            &json!({
                "order_id": "1",
                "customer": "ann",
                "items": [
                    {"item_id": "a", "item_qty": "2"},
                    {"item_id": "b", "item_qty": "1"}
                ]
            })
        );
        assert_eq!(
            out[1].as_ref().unwrap(),
            &json!({"order_id": "2", "customer": "bob", "items": []})
        );
    }

    #[test]
    fn test_default_children_field() {
        let spec = NestSpec::new("k", "c", vec![]);
        let out = nest_all(&spec, vec![json!({"k": "1", "c": "x"})]);
        assert_eq!(out[0].as_ref().unwrap()["children"], json!([{"c": "x"}]));
    }

    #[test]
    fn test_partial_child_row_is_rejected() {
        let spec = spec();
        let out = nest_all(
            &spec,
            vec![json!({"order_id": "3", "customer": "cid", "item_id": null, "item_qty": "4"})],
        );
        assert!(matches!(
            out[0],
            Err(TransformError::PartialChildRow { ref other, .. }) if other == "item_qty"
        ));
    }

    #[test]
    fn test_parent_mismatch_is_rejected() {
        let spec = spec();
        let out = nest_all(
            &spec,
            vec![
                json!({"order_id": "1", "customer": "ann", "item_id": "a", "item_qty": "1"}),
                json!({"order_id": "1", "customer": "eve", "item_id": "b", "item_qty": "1"}),
            ],
        );
        assert!(matches!(
            out[0],
            Err(TransformError::InconsistentParent { ref field, .. }) if field == "customer"
        ));
    }

    #[test]
    fn test_required_columns() {
        assert_eq!(spec().required_columns(), vec!["order_id", "item_id", "item_qty"]);
    }
}
