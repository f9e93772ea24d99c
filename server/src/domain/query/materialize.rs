//! Execute compiled queries and label the rows

use serde_json::{Map, Value};

use crate::data::error::StoreError;
use crate::data::traits::{Store, StoreRow};

use super::compile::CompiledQuery;

/// One labeled result row, fields in projection order
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub fields: Vec<String>,
    pub records: Vec<Record>,
}

/// Run `query` and zip each row with the projected field names.
pub async fn materialize(store: &dyn Store, query: &CompiledQuery) -> Result<Materialized, StoreError> {
    let rows = store.fetch_rows(query.sql(), query.params()).await?;
    let records = rows
        .into_iter()
        .map(|row| label(query.fields(), row))
        .collect();

    Ok(Materialized {
        fields: query.fields().to_vec(),
        records,
    })
}

/// Run a count query and return the scalar
pub async fn count(store: &dyn Store, query: &CompiledQuery) -> Result<u64, StoreError> {
    store.fetch_count(query.sql(), query.params()).await
}

pub(crate) fn label(fields: &[String], row: StoreRow) -> Record {
    fields.iter().cloned().zip(row).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::config::QueryConfig;
    use crate::data::sqlite::test_support::dogs_store;
    use crate::domain::query::compile::{QueryMode, compile};
    use crate::domain::query::request::{RawRequest, Schema};
    use crate::domain::query::validate::validate;

    async fn compiled(store: &dyn Store, pairs: &[(&str, &str)], mode: QueryMode) -> CompiledQuery {
        let schema = Schema::new("dogs", store.columns("dogs").await.unwrap());
        let raw: RawRequest = pairs.iter().copied().collect();
        compile(&validate(&raw, &schema, &QueryConfig::default()).unwrap(), mode)
    }

    #[test]
    fn test_label_keeps_projection_order() {
        let record = label(
            &["name".to_string(), "id".to_string()],
            vec![json!("Rex"), json!("0001")],
        );
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "id"]);
        assert_eq!(record["id"], json!("0001"));
    }

    #[tokio::test]
    async fn test_materialize_prefix_filter() {
        let (_dir, store) = dogs_store().await;
        let query = compiled(&store, &[("id", "0001")], QueryMode::Select).await;

        let result = materialize(&store, &query).await.unwrap();
        assert_eq!(result.fields, vec!["id", "name", "age"]);
        assert_eq!(result.records.len(), 1);
        assert_eq!(
            Value::Object(result.records[0].clone()),
            json!({"id": "0001", "name": "Rex", "age": "5"})
        );
    }

    #[tokio::test]
    async fn test_materialize_null_values() {
        let (_dir, store) = dogs_store().await;
        let query = compiled(&store, &[("age", "null"), ("fields", "name,age")], QueryMode::Select).await;

        let result = materialize(&store, &query).await.unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0]["name"], json!("Toby"));
        assert_eq!(result.records[0]["age"], Value::Null);
    }

    #[tokio::test]
    async fn test_materialize_empty_result_is_ok() {
        let (_dir, store) = dogs_store().await;
        let query = compiled(&store, &[("name", "Zorro")], QueryMode::Select).await;

        let result = materialize(&store, &query).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.fields, vec!["id", "name", "age"]);
    }

    #[tokio::test]
    async fn test_materialize_operational_error() {
        let (_dir, store) = dogs_store().await;
        let query = compiled(
            &store,
            &[("order_by", "name"), ("group_by", "age")],
            QueryMode::Select,
        )
        .await;

        let err = materialize(&store, &query).await.unwrap_err();
        assert!(matches!(err, StoreError::Operational(_)));
    }

    #[tokio::test]
    async fn test_count() {
        let (_dir, store) = dogs_store().await;
        let query = compiled(&store, &[("age", "!null")], QueryMode::Count).await;
        assert_eq!(count(&store, &query).await.unwrap(), 3);

        let query = compiled(&store, &[], QueryMode::Count).await;
        assert_eq!(count(&store, &query).await.unwrap(), 4);
    }
}
