//! In-memory store
//!
//! An ordered collection of JSON records behind a `tokio` lock. It honors
//! every option the adapter assembles (conditions, sort, range, overwrite,
//! placement, delete-after-query), which makes it a complete backing store
//! for demos and tests.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{FieldError, OperationError, QueryOutcome, Store, StoreDescriptor};
use crate::operation::Operation;
use crate::options::{Options, Placement, PlacementMode, SortDirection, SortSpec};
use crate::request::{CanonicalRequest, Record};

/// Store keeping records in memory, in insertion order
pub struct MemoryStore {
    descriptor: StoreDescriptor,
    required_fields: BTreeSet<String>,
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(descriptor: StoreDescriptor) -> Self {
        Self {
            descriptor,
            required_fields: BTreeSet::new(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Seed the store; values that aren't JSON objects are skipped
    #[must_use]
    pub fn with_records(self, records: impl IntoIterator<Item = Value>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect();
        Self {
            records: RwLock::new(records),
            ..self
        }
    }

    /// Fields every written record must carry
    #[must_use]
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Copy of every record, in collection order
    pub async fn snapshot(&self) -> Vec<Value> {
        self.records
            .read()
            .await
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    fn ensure_handled(&self, operation: Operation) -> Result<(), OperationError> {
        if self.descriptor.handles.handles(operation) {
            Ok(())
        } else {
            Err(OperationError::not_implemented(format!(
                "Store '{}' does not handle {operation}",
                self.descriptor.name
            )))
        }
    }

    fn id_param<'a>(&self, request: &'a CanonicalRequest) -> Result<&'a str, OperationError> {
        request.param(&self.descriptor.id_field).ok_or_else(|| {
            OperationError::bad_request(format!(
                "Field required in the URL: {}",
                self.descriptor.id_field
            ))
        })
    }

    fn validate(&self, record: &Record) -> Result<(), OperationError> {
        let errors: Vec<_> = self
            .required_fields
            .iter()
            .filter(|field| record.get(*field).map_or(true, Value::is_null))
            .map(|field| FieldError::new(field.clone(), "Field required"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OperationError::validation(errors))
        }
    }

    fn position(&self, records: &[Record], id: &str) -> Option<usize> {
        let id_field = &self.descriptor.id_field;
        records
            .iter()
            .position(|record| record.get(id_field).map(value_string).as_deref() == Some(id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    async fn get(&self, request: &CanonicalRequest) -> Result<Value, OperationError> {
        self.ensure_handled(Operation::Get)?;
        let id = self.id_param(request)?;

        let records = self.records.read().await;
        let index = self
            .position(&records, id)
            .ok_or_else(|| OperationError::not_found(format!("Record {id} not found")))?;

        Ok(Value::Object(records[index].clone()))
    }

    async fn get_query(&self, request: &CanonicalRequest) -> Result<QueryOutcome, OperationError> {
        self.ensure_handled(Operation::GetQuery)?;
        let options = &request.options;

        let mut records = self.records.write().await;
        let mut matching: Vec<&Record> = records
            .iter()
            .filter(|record| matches_conditions(record, options))
            .collect();

        if let Some(sort) = &options.sort {
            matching.sort_by(|a, b| compare_records(a, b, sort));
        }

        let grand_total = matching.len() as u64;
        let skip = usize::try_from(options.skip()).unwrap_or(usize::MAX);
        let page: Vec<Record> = matching
            .into_iter()
            .skip(skip)
            .take(
                options
                    .limit()
                    .and_then(|l| usize::try_from(l).ok())
                    .unwrap_or(usize::MAX),
            )
            .cloned()
            .collect();

        if options.delete_after_query {
            let id_field = &self.descriptor.id_field;
            let returned: BTreeSet<String> = page
                .iter()
                .filter_map(|record| record.get(id_field).map(value_string))
                .collect();
            records.retain(|record| {
                record
                    .get(id_field)
                    .map(value_string)
                    .map_or(true, |id| !returned.contains(&id))
            });
            debug!(
                store = %self.descriptor.name,
                removed = returned.len(),
                "Deleted queried records"
            );
        }

        Ok(QueryOutcome::new(
            page.into_iter().map(Value::Object).collect(),
            Some(grand_total),
        ))
    }

    async fn put(&self, request: &CanonicalRequest) -> Result<Value, OperationError> {
        self.ensure_handled(Operation::Put)?;
        let id = self.id_param(request)?.to_string();

        let mut record = request.body.clone();
        // The URL id always wins over one in the body
        record.insert(self.descriptor.id_field.clone(), Value::String(id.clone()));
        self.validate(&record)?;

        let mut records = self.records.write().await;
        let existing = self.position(&records, &id);

        match (request.options.overwrite, existing) {
            (Some(true), None) => {
                return Err(OperationError::precondition_failed(format!(
                    "Record {id} does not exist and overwrite was required"
                )))
            }
            (Some(false), Some(_)) => {
                return Err(OperationError::precondition_failed(format!(
                    "Record {id} already exists and overwrite was forbidden"
                )))
            }
            _ => {}
        }

        match (existing, &request.options.placement) {
            (Some(index), None) => records[index] = record.clone(),
            (Some(index), Some(placement)) => {
                records.remove(index);
                self.place(&mut records, record.clone(), placement);
            }
            (None, Some(placement)) => self.place(&mut records, record.clone(), placement),
            (None, None) => records.push(record.clone()),
        }

        Ok(Value::Object(record))
    }

    async fn post(&self, request: &CanonicalRequest) -> Result<Value, OperationError> {
        self.ensure_handled(Operation::Post)?;

        let mut record = request.body.clone();
        let id_field = self.descriptor.id_field.clone();
        if record.get(&id_field).map_or(true, Value::is_null) {
            record.insert(id_field.clone(), Value::String(Uuid::new_v4().to_string()));
        }
        self.validate(&record)?;

        let id = record.get(&id_field).map(value_string).unwrap_or_default();
        let mut records = self.records.write().await;
        if self.position(&records, &id).is_some() {
            return Err(OperationError::precondition_failed(format!(
                "Record {id} already exists"
            )));
        }

        match &request.options.placement {
            Some(placement) => self.place(&mut records, record.clone(), placement),
            None => records.push(record.clone()),
        }

        Ok(Value::Object(record))
    }

    async fn delete(&self, request: &CanonicalRequest) -> Result<Value, OperationError> {
        self.ensure_handled(Operation::Delete)?;
        let id = self.id_param(request)?;

        let mut records = self.records.write().await;
        let index = self
            .position(&records, id)
            .ok_or_else(|| OperationError::not_found(format!("Record {id} not found")))?;

        Ok(Value::Object(records.remove(index)))
    }
}

impl MemoryStore {
    fn place(&self, records: &mut Vec<Record>, record: Record, placement: &Placement) {
        let index = match placement.mode {
            PlacementMode::Start => 0,
            PlacementMode::End => records.len(),
            // Unknown anchors append
            PlacementMode::After => placement
                .after_id
                .as_deref()
                .and_then(|anchor| self.position(records, anchor))
                .map_or(records.len(), |i| i + 1),
        };
        records.insert(index, record);
    }
}

/// String form used for id and condition comparisons
fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_conditions(record: &Record, options: &Options) -> bool {
    options
        .conditions
        .iter()
        .all(|(field, expected)| record.get(field).map(value_string).as_deref() == Some(expected))
}

fn compare_records(a: &Record, b: &Record, sort: &SortSpec) -> Ordering {
    for (field, direction) in sort.iter() {
        let ordering = compare_values(a.get(field), b.get(field));
        let ordering = match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing values sort first, numbers numerically, everything else as text
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => value_string(x).cmp(&value_string(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Conditions, Range};
    use crate::request::HttpContext;
    use crate::store::HandledOperations;
    use serde_json::json;

    fn people() -> MemoryStore {
        MemoryStore::new(StoreDescriptor::new("people", "/people/:id")).with_records([
            json!({ "id": "1", "name": "Tony", "age": 40 }),
            json!({ "id": "2", "name": "Chiara", "age": 9 }),
            json!({ "id": "3", "name": "Julian", "age": 12 }),
            json!({ "id": "4", "name": "Tony", "age": 70 }),
        ])
    }

    fn request(operation: Operation) -> CanonicalRequest {
        CanonicalRequest::new(operation, HttpContext::default())
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(record) => record,
            _ => panic!("not an object"),
        }
    }

    fn ids(outcome: &QueryOutcome) -> Vec<&str> {
        outcome
            .records
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let store = people();
        let found = store
            .get(&request(Operation::Get).with_param("id", "2"))
            .await
            .unwrap();
        assert_eq!(found["name"], "Chiara");

        let err = store
            .get(&request(Operation::Get).with_param("id", "99"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(404));
    }

    #[tokio::test]
    async fn test_get_without_id_param() {
        let err = people().get(&request(Operation::Get)).await.unwrap_err();
        assert_eq!(err.status, Some(400));
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_pages() {
        let store = people();
        let options = Options {
            sort: Some(SortSpec::new().with("age", SortDirection::Descending)),
            range: Some(Range::bounded(1, 2)),
            ..Options::default()
        };
        let outcome = store
            .get_query(&request(Operation::GetQuery).with_options(options))
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["1", "3"]);
        assert_eq!(outcome.grand_total, Some(4));
    }

    #[tokio::test]
    async fn test_query_conditions() {
        let mut conditions = Conditions::new();
        conditions.insert("name", "Tony");
        conditions.insert("age", "70");
        let options = Options {
            conditions,
            ..Options::default()
        };
        let outcome = people()
            .get_query(&request(Operation::GetQuery).with_options(options))
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["4"]);
        assert_eq!(outcome.grand_total, Some(1));
    }

    #[tokio::test]
    async fn test_query_multi_key_sort() {
        let options = Options {
            sort: Some(
                SortSpec::new()
                    .with("name", SortDirection::Descending)
                    .with("age", SortDirection::Ascending),
            ),
            ..Options::default()
        };
        let outcome = people()
            .get_query(&request(Operation::GetQuery).with_options(options))
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec!["1", "4", "3", "2"]);
    }

    #[tokio::test]
    async fn test_query_delete_after() {
        let store = people();
        let options = Options {
            range: Some(Range::bounded(0, 2)),
            delete_after_query: true,
            ..Options::default()
        };
        let outcome = store
            .get_query(&request(Operation::GetQuery).with_options(options))
            .await
            .unwrap();

        assert_eq!(ids(&outcome), vec!["1", "2"]);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_put_upserts_with_url_id() {
        let store = people();
        let saved = store
            .put(
                &request(Operation::Put)
                    .with_param("id", "2")
                    .with_body(record(json!({ "id": "ignored", "name": "Chiara", "age": 10 }))),
            )
            .await
            .unwrap();
        assert_eq!(saved["id"], "2");
        assert_eq!(store.len().await, 4);

        store
            .put(
                &request(Operation::Put)
                    .with_param("id", "5")
                    .with_body(record(json!({ "name": "Sara" }))),
            )
            .await
            .unwrap();
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_put_overwrite_preconditions() {
        let store = people();

        let must_exist = Options {
            overwrite: Some(true),
            ..Options::default()
        };
        let err = store
            .put(
                &request(Operation::Put)
                    .with_param("id", "99")
                    .with_options(must_exist),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(412));

        let must_not_exist = Options {
            overwrite: Some(false),
            ..Options::default()
        };
        let err = store
            .put(
                &request(Operation::Put)
                    .with_param("id", "1")
                    .with_options(must_not_exist),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(412));
    }

    #[tokio::test]
    async fn test_post_generates_id_and_places() {
        let store = people();
        let options = Options {
            placement: Some(Placement {
                mode: PlacementMode::After,
                after_id: Some("1".to_string()),
            }),
            ..Options::default()
        };
        let saved = store
            .post(
                &request(Operation::Post)
                    .with_body(record(json!({ "name": "Sara" })))
                    .with_options(options),
            )
            .await
            .unwrap();

        let id = saved["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(store.snapshot().await[1]["id"], id);

        let options = Options {
            placement: Some(Placement {
                mode: PlacementMode::Start,
                after_id: None,
            }),
            ..Options::default()
        };
        store
            .post(
                &request(Operation::Post)
                    .with_body(record(json!({ "id": "first" })))
                    .with_options(options),
            )
            .await
            .unwrap();
        assert_eq!(store.snapshot().await[0]["id"], "first");
    }

    #[tokio::test]
    async fn test_post_duplicate_id() {
        let err = people()
            .post(&request(Operation::Post).with_body(record(json!({ "id": "1" }))))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(412));
    }

    #[tokio::test]
    async fn test_required_fields_validation() {
        let store = people().with_required_fields(["name", "age"]);
        let err = store
            .post(&request(Operation::Post).with_body(record(json!({ "name": "Sara" }))))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(422));
        assert_eq!(err.errors, vec![FieldError::new("age", "Field required")]);
    }

    #[tokio::test]
    async fn test_delete_returns_record() {
        let store = people();
        let deleted = store
            .delete(&request(Operation::Delete).with_param("id", "3"))
            .await
            .unwrap();
        assert_eq!(deleted["name"], "Julian");
        assert_eq!(store.len().await, 3);

        let err = store
            .delete(&request(Operation::Delete).with_param("id", "3"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(404));
    }

    #[tokio::test]
    async fn test_unhandled_operation_is_501() {
        let descriptor = StoreDescriptor::new("people", "/people/:id")
            .with_handles(HandledOperations::default().without(Operation::Delete));
        let store = MemoryStore::new(descriptor);
        let err = store
            .delete(&request(Operation::Delete).with_param("id", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(501));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(9)), Some(&json!(12))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("9")), Some(&json!("12"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
    }
}
