//! Matching, ordering and mutation rules shared by every backend.
//!
//! Backends own persistence; everything that decides *which* records a call
//! touches and *how* they change lives here, so both backends behave
//! identically.

use std::cmp::Ordering;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::Record;

/// Field holding the record's primary key.
pub const ID_FIELD: &str = "id";
/// Field stamped on create and never changed afterwards.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field stamped on every create and update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Exact-equality filter over top-level fields. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query(Record);

impl Query {
    /// Match every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Add another equality constraint.
    #[must_use]
    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Whether `record` satisfies every constraint. A missing field never matches.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Top-level field to compare.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

impl SortKey {
    /// Ascending on `field`.
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Ascending,
        }
    }

    /// Descending on `field`.
    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Descending,
        }
    }
}

/// Options applied to `find_many` results, in order: sort, skip, limit, select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Sort criteria, most significant first.
    pub sort: Vec<SortKey>,
    /// Records to drop from the front.
    pub skip: Option<usize>,
    /// Maximum records to return. Zero means no limit.
    pub limit: Option<usize>,
    /// Fields to keep. Empty keeps every field.
    pub select: Vec<String>,
}

impl FindOptions {
    /// Sort by the given keys.
    #[must_use]
    pub fn sorted(sort: Vec<SortKey>) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Skip/limit window for a 1-based page.
    #[must_use]
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.skip = Some(page.saturating_sub(1).saturating_mul(per_page));
        self.limit = Some(per_page);
        self
    }
}

/// Current time as stored in `createdAt`/`updatedAt`.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over optional JSON values.
///
/// Missing sorts as null. Values of different types order by
/// null < bool < number < string < array < object; arrays and objects
/// compare equal among themselves.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Sort (stable), skip, limit, then project.
#[must_use]
pub fn apply_options(mut records: Vec<Record>, options: &FindOptions) -> Vec<Record> {
    if !options.sort.is_empty() {
        records.sort_by(|a, b| {
            options
                .sort
                .iter()
                .map(|key| {
                    let ord = compare_values(a.get(&key.field), b.get(&key.field));
                    match key.order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    let skip = options.skip.unwrap_or(0);
    let limit = options.limit.filter(|l| *l > 0).unwrap_or(usize::MAX);
    let window = records.into_iter().skip(skip).take(limit);

    if options.select.is_empty() {
        return window.collect();
    }

    window
        .map(|record| {
            options
                .select
                .iter()
                .filter_map(|field| record.get(field).map(|v| (field.clone(), v.clone())))
                .collect()
        })
        .collect()
}

/// Render an ID for error messages and logs.
#[must_use]
pub fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append a new record, assigning an ID if absent and stamping both timestamps.
///
/// # Errors
///
/// Returns `StoreError::DuplicateId` if the ID is already present.
pub fn insert(collection: &str, records: &mut Vec<Record>, mut record: Record) -> Result<Record> {
    let id = match record.get(ID_FIELD) {
        None | Some(Value::Null) => Value::String(uuid::Uuid::new_v4().to_string()),
        Some(id) => id.clone(),
    };

    if records.iter().any(|r| r.get(ID_FIELD) == Some(&id)) {
        return Err(StoreError::DuplicateId {
            collection: collection.to_string(),
            id: display_id(&id),
        });
    }

    let now = timestamp();
    record.insert(ID_FIELD.to_string(), id);
    record.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
    record.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));

    records.push(record.clone());
    Ok(record)
}

/// Shallow-merge `patch` into `record`, keeping `id` and `createdAt`, and
/// refresh `updatedAt`.
pub fn merge(record: &mut Record, patch: &Record, now: &str) {
    for (field, value) in patch {
        if field == ID_FIELD || field == CREATED_AT_FIELD {
            continue;
        }
        record.insert(field.clone(), value.clone());
    }
    record.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.to_string()));
}

/// Merge `patch` into the record with `id`. Returns the updated record.
pub fn update_by_id(records: &mut [Record], id: &Value, patch: &Record) -> Option<Record> {
    let record = records.iter_mut().find(|r| r.get(ID_FIELD) == Some(id))?;
    merge(record, patch, &timestamp());
    Some(record.clone())
}

/// Merge `patch` into every matching record. Returns the number updated.
pub fn update_matching(records: &mut [Record], query: &Query, patch: &Record) -> usize {
    let now = timestamp();
    let mut count = 0;
    for record in records.iter_mut().filter(|r| query.matches(r)) {
        merge(record, patch, &now);
        count += 1;
    }
    count
}

/// Remove the record with `id`. Returns whether one was removed.
pub fn remove_by_id(records: &mut Vec<Record>, id: &Value) -> bool {
    match records.iter().position(|r| r.get(ID_FIELD) == Some(id)) {
        Some(index) => {
            records.remove(index);
            true
        }
        None => false,
    }
}

/// Remove every matching record. Returns the number removed.
pub fn remove_matching(records: &mut Vec<Record>, query: &Query) -> usize {
    let before = records.len();
    records.retain(|r| !query.matches(r));
    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn people() -> Vec<Record> {
        vec![
            record(json!({"id": 1, "name": "b", "age": 30})),
            record(json!({"id": 2, "name": "a", "age": 25})),
            record(json!({"id": 3, "name": "c", "age": 30})),
            record(json!({"id": 4, "name": "d"})),
        ]
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(people().iter().all(|r| Query::all().matches(r)));
    }

    #[test]
    fn equality_is_exact() {
        let q = Query::eq("age", 30);
        let matched: Vec<_> = people().into_iter().filter(|r| q.matches(r)).collect();
        assert_eq!(ids(&matched), vec![1, 3]);

        assert!(!Query::eq("age", "30").matches(&people()[0]));
        assert!(!Query::eq("missing", Value::Null).matches(&people()[0]));
        assert!(Query::eq("age", 30).and("name", "c").matches(&people()[2]));
    }

    #[test]
    fn multi_key_sort_is_stable() {
        let sorted = apply_options(
            people(),
            &FindOptions::sorted(vec![SortKey::desc("age"), SortKey::asc("name")]),
        );
        assert_eq!(ids(&sorted), vec![1, 3, 2, 4]);

        let ties = apply_options(people(), &FindOptions::sorted(vec![SortKey::asc("age")]));
        assert_eq!(ids(&ties), vec![4, 2, 1, 3]);
    }

    #[test]
    fn mixed_types_order_by_rank() {
        let values = [json!({"a": 1}), json!([1]), json!("x"), json!(2), json!(true), json!(null)];
        let mut sorted: Vec<&Value> = values.iter().collect();
        sorted.sort_by(|a, b| compare_values(Some(a), Some(b)));
        assert_eq!(
            sorted,
            vec![&json!(null), &json!(true), &json!(2), &json!("x"), &json!([1]), &json!({"a": 1})]
        );
        assert_eq!(compare_values(Some(&json!(10)), Some(&json!(9.5))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!("10")), Some(&json!("9"))), Ordering::Less);
    }

    #[test]
    fn skip_limit_select() {
        let options = FindOptions {
            sort: vec![SortKey::asc("id")],
            skip: Some(1),
            limit: Some(2),
            select: vec!["name".into(), "age".into(), "nope".into()],
        };
        let result = apply_options(people(), &options);
        assert_eq!(result.len(), 2);
        assert_eq!(Value::Object(result[0].clone()), json!({"name": "a", "age": 25}));
        assert_eq!(Value::Object(result[1].clone()), json!({"name": "c", "age": 30}));

        let unlimited = FindOptions {
            limit: Some(0),
            ..FindOptions::default()
        };
        assert_eq!(apply_options(people(), &unlimited).len(), 4);
    }

    #[test]
    fn page_window() {
        let options = FindOptions::default().page(2, 3);
        assert_eq!(options.skip, Some(3));
        assert_eq!(options.limit, Some(3));
        assert_eq!(ids(&apply_options(people(), &options)), vec![4]);
    }

    #[test]
    fn insert_assigns_id_and_rejects_duplicates() {
        let mut records = Vec::new();
        let created = insert("things", &mut records, record(json!({"name": "x"}))).unwrap();
        assert!(created["id"].is_string());
        assert!(created["createdAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let explicit = insert("things", &mut records, record(json!({"id": 7}))).unwrap();
        assert_eq!(explicit["id"], 7);

        let dup = insert("things", &mut records, record(json!({"id": 7})));
        assert!(matches!(dup, Err(StoreError::DuplicateId { .. })));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn merge_protects_identity() {
        let mut r = record(json!({"id": 1, "createdAt": "then", "updatedAt": "then", "a": 1}));
        let patch = record(json!({"id": 2, "createdAt": "now", "a": 2, "b": 3}));
        merge(&mut r, &patch, "now");
        assert_eq!(
            Value::Object(r),
            json!({"id": 1, "createdAt": "then", "updatedAt": "now", "a": 2, "b": 3})
        );
    }

    #[test]
    fn bulk_mutations_report_counts() {
        let mut records = people();
        let patch = record(json!({"senior": true}));
        assert_eq!(update_matching(&mut records, &Query::eq("age", 30), &patch), 2);
        assert_eq!(records[2]["senior"], true);
        assert_eq!(remove_matching(&mut records, &Query::eq("senior", true)), 2);
        assert_eq!(ids(&records), vec![2, 4]);
        assert!(remove_by_id(&mut records, &json!(2)));
        assert!(!remove_by_id(&mut records, &json!(2)));
        assert!(update_by_id(&mut records, &json!(99), &patch).is_none());
    }
}
