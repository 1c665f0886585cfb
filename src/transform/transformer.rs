// Fri Jan 23 2026 - Alex

use crate::config::SchemaConfig;
use crate::source::{Batch, PartitionKey, Row};
use serde_json::Value;

/// Numeric view of one batch: feature matrix plus target vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    pub source: String,
    pub key: PartitionKey,
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub target: Vec<f64>,
    pub dropped_rows: usize,
    pub filled_values: usize,
}

impl FeatureBatch {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Deterministic schema normalization; owns no state beyond its schema.
#[derive(Debug, Clone)]
pub struct BatchTransformer {
    schema: SchemaConfig,
}

impl BatchTransformer {
    pub fn new(schema: SchemaConfig) -> Self {
        Self { schema }
    }

    /// Feature names in matrix column order: mandatory features, then optionals.
    pub fn feature_names(&self) -> Vec<String> {
        self.schema.feature_columns.iter()
            .chain(self.schema.optional_columns.iter())
            .cloned()
            .collect()
    }

    pub fn transform(&self, batch: &Batch) -> FeatureBatch {
        let mut features = Vec::with_capacity(batch.len());
        let mut target = Vec::with_capacity(batch.len());
        let mut dropped_rows = 0;
        let mut filled_values = 0;

        for (index, row) in batch.rows().iter().enumerate() {
            match self.transform_row(row) {
                Some((values, y, filled)) => {
                    features.push(values);
                    target.push(y);
                    filled_values += filled;
                }
                None => {
                    dropped_rows += 1;
                    log::debug!("{}/{}: dropped row {} (missing mandatory field)",
                        batch.source(), batch.key(), index);
                }
            }
        }

        if dropped_rows > 0 {
            log::debug!("{}/{}: {} of {} rows dropped",
                batch.source(), batch.key(), dropped_rows, batch.len());
        }

        FeatureBatch {
            source: batch.source().to_string(),
            key: batch.key().clone(),
            feature_names: self.feature_names(),
            features,
            target,
            dropped_rows,
            filled_values,
        }
    }

    fn transform_row(&self, row: &Row) -> Option<(Vec<f64>, f64, usize)> {
        let y = row.get(&self.schema.target_column).and_then(parse_numeric)?;

        let mut values = Vec::with_capacity(self.schema.feature_columns.len() + self.schema.optional_columns.len());
        for column in &self.schema.feature_columns {
            values.push(row.get(column).and_then(parse_numeric)?);
        }

        let mut filled = 0;
        for column in &self.schema.optional_columns {
            match row.get(column).and_then(parse_numeric) {
                Some(v) => values.push(v),
                None => {
                    values.push(self.schema.sentinel);
                    filled += 1;
                }
            }
        }

        Some((values, y, filled))
    }
}

/// Finite number from a JSON number, numeric string or boolean.
pub fn parse_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(rows: Vec<Value>) -> Batch {
        Batch::new(
            "mem://t",
            PartitionKey::from("k"),
            rows.into_iter().map(|v| v.as_object().cloned().unwrap()).collect(),
        )
    }

    fn transformer() -> BatchTransformer {
        BatchTransformer::new(
            SchemaConfig::new("y")
                .with_features(&["a", "b"])
                .with_optional(&["c"], -1.0),
        )
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric(&json!(2)), Some(2.0));
        assert_eq!(parse_numeric(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(parse_numeric(&json!(true)), Some(1.0));
        assert_eq!(parse_numeric(&json!("NaN")), None);
        assert_eq!(parse_numeric(&json!("abc")), None);
        assert_eq!(parse_numeric(&json!(null)), None);
        assert_eq!(parse_numeric(&json!([1])), None);
    }

    #[test]
    fn test_transform_drops_and_fills() {
        let input = batch(vec![
            json!({"a": 1, "b": "2", "c": 3, "y": 10}),
            json!({"a": 1, "y": 10}),
            json!({"a": 1, "b": 2, "c": null, "y": "11"}),
            json!({"a": 1, "b": 2, "c": "oops", "y": 12}),
            json!({"a": 1, "b": 2, "c": 0}),
        ]);
        let out = transformer().transform(&input);

        assert_eq!(out.len(), 3);
        assert_eq!(out.dropped_rows, 2);
        assert_eq!(out.filled_values, 2);
        assert_eq!(out.feature_names, vec!["a", "b", "c"]);
        assert_eq!(out.features[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(out.features[1], vec![1.0, 2.0, -1.0]);
        assert_eq!(out.target, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let input = batch(vec![
            json!({"a": 0.5, "b": 1, "y": 1}),
            json!({"a": 1.5, "b": 2, "c": 7, "y": 2}),
        ]);
        let t = transformer();
        assert_eq!(t.transform(&input), t.transform(&input));
    }

    #[test]
    fn test_empty_batch() {
        let out = transformer().transform(&batch(vec![]));
        assert!(out.is_empty());
        assert_eq!(out.dropped_rows, 0);
    }
}
