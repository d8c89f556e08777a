use std::cmp::Ordering;

use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::{Map, Value};

use super::{FindOptions, Hospital, HospitalStore, StoreError};
use crate::geo::GeoPoint;
use crate::query::{CmpOp, Condition, Filter, Order, Projection, Scalar, SortKey};

const MAX_PATH_DEPTH: usize = 32;

/// Hospitals held in process memory, queried with the same semantics the
/// MongoDB backend gets from the server.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Vec<Hospital>,
}

impl MemoryStore {
    /// Documents without an `_id` get a sequential 24-digit hex id.
    pub fn new(docs: Vec<Hospital>) -> Self {
        let docs = docs
            .into_iter()
            .enumerate()
            .map(|(i, mut doc)| {
                if !doc.contains_key("_id") {
                    doc.insert("_id".into(), Value::String(format!("{:024x}", i + 1)));
                }
                doc
            })
            .collect();
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Hospital> + 'a {
        self.docs.iter().filter(move |d| eval_filter(d, filter))
    }
}

#[async_trait]
impl HospitalStore for MemoryStore {
    async fn find_near(
        &self,
        point: GeoPoint,
        max_distance_m: f64,
        limit: u64,
    ) -> Result<Vec<Hospital>, StoreError> {
        let mut hits: Vec<(f64, &Hospital)> = self
            .docs
            .iter()
            .filter_map(|d| {
                let loc = GeoPoint::from_geojson(d.get("location")?)?;
                let dist = point.distance_m(&loc);
                (dist <= max_distance_m).then_some((dist, d))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits
            .into_iter()
            .take(limit as usize)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn search_name(&self, needle: &str) -> Result<Vec<Hospital>, StoreError> {
        let re = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()?;
        Ok(self
            .docs
            .iter()
            .filter(|d| d.get("name").and_then(Value::as_str).is_some_and(|n| re.is_match(n)))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.matching(filter).count() as u64)
    }

    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<Hospital>, StoreError> {
        let mut hits: Vec<&Hospital> = self.matching(filter).collect();
        if !opts.sort.is_empty() {
            hits.sort_by(|a, b| compare_docs(a, b, &opts.sort));
        }
        Ok(hits
            .into_iter()
            .skip(opts.skip as usize)
            .take(opts.limit as usize)
            .map(|d| match &opts.projection {
                Some(p) => project(d, p),
                None => d.clone(),
            })
            .collect())
    }
}

fn eval_filter(doc: &Hospital, filter: &Filter) -> bool {
    filter.fields.iter().all(|(path, cond)| {
        let Some(v) = get_path(doc, path) else {
            return false;
        };
        match cond {
            Condition::Eq(s) => any_element(v, |x| scalar_eq(x, s)),
            Condition::Ops { cmp, any_of } => {
                let in_range = cmp.iter().all(|(op, s)| {
                    any_element(v, |x| match compare_scalar(x, s) {
                        Some(ord) => match op {
                            CmpOp::Gt => ord == Ordering::Greater,
                            CmpOp::Gte => ord != Ordering::Less,
                            CmpOp::Lt => ord == Ordering::Less,
                            CmpOp::Lte => ord != Ordering::Greater,
                        },
                        None => false,
                    })
                });
                let in_set = any_of
                    .as_ref()
                    .is_none_or(|set| any_element(v, |x| set.iter().any(|s| scalar_eq(x, s))));
                in_range && in_set
            }
        }
    })
}

/// Arrays match when any element does, as in MongoDB.
fn any_element(v: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    match v {
        Value::Array(items) => items.iter().any(&pred),
        other => pred(other),
    }
}

fn scalar_eq(v: &Value, s: &Scalar) -> bool {
    compare_scalar(v, s) == Some(Ordering::Equal)
}

/// Comparisons only hold between values of the same type.
fn compare_scalar(v: &Value, s: &Scalar) -> Option<Ordering> {
    match (v, s) {
        (Value::String(a), Scalar::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Number(a), Scalar::Number(b)) => a.as_f64()?.partial_cmp(b),
        (Value::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn get_path<'a>(doc: &'a Hospital, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut cur = doc.get(parts.next()?)?;
    for (depth, part) in parts.enumerate() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

fn compare_docs(a: &Hospital, b: &Hospital, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ord = compare_values(get_path(a, &key.field), get_path(b, &key.field));
        if ord != Ordering::Equal {
            return match key.order {
                Order::Asc => ord,
                Order::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

// MongoDB's cross-type sort order; missing sorts with null.
fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Dotted fields select or drop the nested value and keep its parents,
/// as a MongoDB projection does.
fn project(doc: &Hospital, p: &Projection) -> Hospital {
    if p.include.is_empty() {
        let mut out = doc.clone();
        for f in &p.exclude {
            remove_path(&mut out, f);
        }
        return out;
    }
    let mut out = Map::new();
    if !p.exclude.iter().any(|f| f == "_id") {
        if let Some(id) = doc.get("_id") {
            out.insert("_id".into(), id.clone());
        }
    }
    for f in &p.include {
        if let Some(v) = get_path(doc, f) {
            insert_path(&mut out, f, v.clone());
        }
    }
    out
}

fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    let Some((head, rest)) = path.split_once('.') else {
        out.insert(path.to_string(), value);
        return;
    };
    let child = out
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(child) = child {
        insert_path(child, rest, value);
    }
}

fn remove_path(doc: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        Some((head, rest)) => {
            if let Some(Value::Object(child)) = doc.get_mut(head) {
                remove_path(child, rest);
            }
        }
        None => {
            doc.remove(path);
        }
    }
}
