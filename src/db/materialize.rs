//! Result materialization.
//!
//! Converts a result cursor into caller-owned values: bare scalars for
//! one-column results, fixed-length tuples for wider results, or generic
//! records built through the configuration's container factory. Every
//! entry point consumes its cursor exactly once and drops it before
//! returning, so a cursor is never read twice.

use crate::db::connection::Rows;
use crate::error::DbResult;
use crate::models::record::{ContainerFactory, Record};
use crate::models::value::{QueryRows, Value};

/// Drain a cursor into the dual scalar/tuple shape. Zero-column results
/// (failed queries surface these) are treated as zero rows.
pub(crate) async fn collect_values(mut rows: Box<dyn Rows + Send>) -> DbResult<QueryRows> {
    let column_count = rows.columns().len();
    if column_count == 0 {
        return Ok(QueryRows::Scalars(Vec::new()));
    }
    if column_count == 1 {
        let mut out = Vec::new();
        while let Some(mut row) = rows.next().await? {
            out.push(if row.is_empty() {
                Value::Null
            } else {
                row.swap_remove(0)
            });
        }
        Ok(QueryRows::Scalars(out))
    } else {
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row);
        }
        Ok(QueryRows::Tuples(out))
    }
}

/// First row's first column, consuming the cursor.
pub(crate) async fn first_scalar(mut rows: Box<dyn Rows + Send>) -> DbResult<Option<Value>> {
    match rows.next().await? {
        Some(mut row) if !row.is_empty() => Ok(Some(row.swap_remove(0))),
        _ => Ok(None),
    }
}

/// Drain a cursor into records, one per row, columns in result order.
pub(crate) async fn collect_records(
    mut rows: Box<dyn Rows + Send>,
    factory: &dyn ContainerFactory,
) -> DbResult<Vec<Record>> {
    let columns = rows.columns().to_vec();
    let mut out = Vec::new();
    while let Some(values) = rows.next().await? {
        out.push(build_record(factory, &columns, values));
    }
    Ok(out)
}

/// First row as a record, or `None` when the result is empty
/// ("find first" semantics). The cursor is dropped either way.
pub(crate) async fn first_record(
    mut rows: Box<dyn Rows + Send>,
    factory: &dyn ContainerFactory,
) -> DbResult<Option<Record>> {
    let columns = rows.columns().to_vec();
    Ok(rows
        .next()
        .await?
        .map(|values| build_record(factory, &columns, values)))
}

fn build_record(factory: &dyn ContainerFactory, columns: &[String], values: Vec<Value>) -> Record {
    let mut record = factory.new_record();
    for (name, value) in columns.iter().zip(values) {
        record.set(name.clone(), value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::MaterializedRows;
    use crate::models::record::OrderedContainerFactory;

    fn one_column() -> Box<dyn Rows + Send> {
        Box::new(MaterializedRows::new(
            vec!["name".to_string()],
            vec![
                vec![Value::Text("a".to_string())],
                vec![Value::Text("b".to_string())],
                vec![Value::Text("c".to_string())],
            ],
        ))
    }

    fn two_columns() -> Box<dyn Rows + Send> {
        Box::new(MaterializedRows::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::Text("a".to_string())],
                vec![Value::Int(2), Value::Text("b".to_string())],
                vec![Value::Int(3), Value::Text("c".to_string())],
            ],
        ))
    }

    #[tokio::test]
    async fn test_single_column_yields_scalars() {
        let result = collect_values(one_column()).await.unwrap();
        let scalars = result.into_scalars().unwrap();
        assert_eq!(scalars.len(), 3);
        assert_eq!(scalars[0], Value::Text("a".to_string()));
    }

    #[tokio::test]
    async fn test_multi_column_yields_tuples() {
        let result = collect_values(two_columns()).await.unwrap();
        let tuples = result.into_tuples().unwrap();
        assert_eq!(tuples.len(), 3);
        assert_eq!(tuples[1], vec![Value::Int(2), Value::Text("b".to_string())]);
    }

    #[tokio::test]
    async fn test_zero_columns_is_zero_rows() {
        let rows: Box<dyn Rows + Send> = Box::new(MaterializedRows::empty());
        let result = collect_values(rows).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_records_preserve_column_order() {
        let records = collect_records(two_columns(), &OrderedContainerFactory)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        let names: Vec<&str> = records[0].column_names().collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(records[2].get("id"), Some(&Value::Int(3)));
    }

    #[tokio::test]
    async fn test_first_record_empty_result() {
        let rows: Box<dyn Rows + Send> = Box::new(MaterializedRows::new(
            vec!["id".to_string()],
            Vec::new(),
        ));
        let record = first_record(rows, &OrderedContainerFactory).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_first_scalar() {
        assert_eq!(
            first_scalar(one_column()).await.unwrap(),
            Some(Value::Text("a".to_string()))
        );
    }
}
