//! Structured queries for the document store.
//!
//! Mirrors the `runQuery` request shape: a collection selector, an
//! optional filter tree, and an ordering list. The builder folds multiple
//! `filter()` calls into a single `AND` composite, which is all this
//! application needs.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A `structuredQuery` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(
        default,
        rename = "where",
        skip_serializing_if = "Option::is_none"
    )]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,
}

/// Selects the collection the query runs over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

/// A filter node: either a single field comparison or an `AND` of several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    #[serde(rename = "fieldFilter")]
    Field(FieldFilter),
    #[serde(rename = "compositeFilter")]
    Composite(CompositeFilter),
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOp,
    pub value: Value,
}

/// Names the field a filter or ordering applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

/// Comparison operators used by this application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOp {
    #[serde(rename = "EQUAL")]
    Equal,
    #[serde(rename = "GREATER_THAN_OR_EQUAL")]
    GreaterThanOrEqual,
    #[serde(rename = "LESS_THAN_OR_EQUAL")]
    LessThanOrEqual,
}

/// An `AND` of several filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeFilter {
    pub op: CompositeOp,
    pub filters: Vec<Filter>,
}

/// Composite operator; only `AND` is used here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeOp {
    #[serde(rename = "AND")]
    And,
}

/// One ordering clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub field: FieldReference,
    pub direction: Direction,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ASCENDING")]
    Ascending,
    #[serde(rename = "DESCENDING")]
    Descending,
}

impl StructuredQuery {
    /// Start a query over one collection.
    #[must_use]
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
            }],
            filter: None,
            order_by: Vec::new(),
        }
    }

    /// Add a field comparison. Multiple comparisons combine with `AND`.
    #[must_use]
    pub fn filter(mut self, field_path: impl Into<String>, op: FieldOp, value: Value) -> Self {
        let next = Filter::Field(FieldFilter {
            field: FieldReference {
                field_path: field_path.into(),
            },
            op,
            value,
        });

        self.filter = Some(match self.filter.take() {
            None => next,
            Some(Filter::Composite(mut composite)) => {
                composite.filters.push(next);
                Filter::Composite(composite)
            }
            Some(existing) => Filter::Composite(CompositeFilter {
                op: CompositeOp::And,
                filters: vec![existing, next],
            }),
        });
        self
    }

    /// Add an ordering clause.
    #[must_use]
    pub fn order_by(mut self, field_path: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(Order {
            field: FieldReference {
                field_path: field_path.into(),
            },
            direction,
        });
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_wire_shape() {
        let query = StructuredQuery::collection("cars").filter(
            "uid",
            FieldOp::Equal,
            Value::string("u1"),
        );

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": [{"collectionId": "cars"}],
                "where": {
                    "fieldFilter": {
                        "field": {"fieldPath": "uid"},
                        "op": "EQUAL",
                        "value": {"stringValue": "u1"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_two_filters_fold_into_and_composite() {
        let query = StructuredQuery::collection("cars")
            .filter("name", FieldOp::GreaterThanOrEqual, Value::string("ONIX"))
            .filter(
                "name",
                FieldOp::LessThanOrEqual,
                Value::string("ONIX\u{f8ff}"),
            );

        let json = serde_json::to_value(&query).unwrap();
        let composite = json
            .get("where")
            .and_then(|w| w.get("compositeFilter"))
            .unwrap();
        assert_eq!(composite.get("op").unwrap(), "AND");
        assert_eq!(
            composite.get("filters").and_then(|f| f.as_array()).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_order_by_wire_shape() {
        let query = StructuredQuery::collection("cars").order_by("created", Direction::Descending);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json.get("orderBy").unwrap(),
            &serde_json::json!([
                {"field": {"fieldPath": "created"}, "direction": "DESCENDING"}
            ])
        );
        assert!(json.get("where").is_none());
    }
}
