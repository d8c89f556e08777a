use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::{Client, Collection, IndexModel};
use serde_json::Value;

use super::{FindOptions, Hospital, HospitalStore, StoreError};
use crate::geo::GeoPoint;
use crate::query::{CmpOp, Condition, Filter, Order, Projection, Scalar, SortKey};

#[derive(Clone)]
pub struct MongoStore {
    coll: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            coll: client.database(database).collection(collection),
        })
    }

    /// `$near` fails without a `2dsphere` index on `location`.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let geo = IndexModel::builder()
            .keys(doc! { "location": "2dsphere" })
            .build();
        self.coll.create_index(geo).await?;
        Ok(())
    }

    pub async fn insert_many(&self, docs: &[Hospital]) -> Result<u64, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let docs = docs
            .iter()
            .map(hospital_to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let res = self.coll.insert_many(docs).await?;
        Ok(res.inserted_ids.len() as u64)
    }

    pub async fn drop_collection(&self) -> Result<(), StoreError> {
        self.coll.drop().await?;
        Ok(())
    }

    async fn collect(&self, cursor: mongodb::Cursor<Document>) -> Result<Vec<Hospital>, StoreError> {
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(document_to_hospital).collect())
    }
}

#[async_trait]
impl HospitalStore for MongoStore {
    async fn find_near(
        &self,
        point: GeoPoint,
        max_distance_m: f64,
        limit: u64,
    ) -> Result<Vec<Hospital>, StoreError> {
        let cursor = self
            .coll
            .find(near_filter(point, max_distance_m))
            .limit(to_i64(limit))
            .await?;
        self.collect(cursor).await
    }

    async fn search_name(&self, needle: &str) -> Result<Vec<Hospital>, StoreError> {
        let cursor = self.coll.find(name_filter(needle)).await?;
        self.collect(cursor).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.coll.count_documents(filter_to_document(filter)).await?)
    }

    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<Hospital>, StoreError> {
        let mut find = self
            .coll
            .find(filter_to_document(filter))
            .skip(opts.skip)
            .limit(to_i64(opts.limit));
        if let Some(p) = &opts.projection {
            find = find.projection(projection_to_document(p));
        }
        if !opts.sort.is_empty() {
            find = find.sort(sort_to_document(&opts.sort));
        }
        let cursor = find.await?;
        self.collect(cursor).await
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn near_filter(point: GeoPoint, max_distance_m: f64) -> Document {
    doc! {
        "location": {
            "$near": {
                "$geometry": { "type": "Point", "coordinates": [point.lon, point.lat] },
                "$maxDistance": max_distance_m,
            }
        }
    }
}

fn name_filter(needle: &str) -> Document {
    doc! { "name": { "$regex": regex::escape(needle), "$options": "i" } }
}

fn scalar_to_bson(s: &Scalar) -> Bson {
    match s {
        Scalar::Text(t) => Bson::String(t.clone()),
        Scalar::Number(n) => Bson::Double(*n),
        Scalar::Bool(b) => Bson::Boolean(*b),
    }
}

fn cmp_operator(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Gt => "$gt",
        CmpOp::Gte => "$gte",
        CmpOp::Lt => "$lt",
        CmpOp::Lte => "$lte",
    }
}

pub fn filter_to_document(filter: &Filter) -> Document {
    let mut out = Document::new();
    for (field, cond) in &filter.fields {
        let value = match cond {
            Condition::Eq(s) => scalar_to_bson(s),
            Condition::Ops { cmp, any_of } => {
                let mut ops = Document::new();
                for (op, s) in cmp {
                    ops.insert(cmp_operator(*op), scalar_to_bson(s));
                }
                if let Some(set) = any_of {
                    ops.insert("$in", set.iter().map(scalar_to_bson).collect::<Vec<_>>());
                }
                Bson::Document(ops)
            }
        };
        out.insert(field.clone(), value);
    }
    out
}

fn projection_to_document(p: &Projection) -> Document {
    let mut out = Document::new();
    for f in &p.include {
        out.insert(f.clone(), 1);
    }
    for f in &p.exclude {
        out.insert(f.clone(), 0);
    }
    out
}

fn sort_to_document(keys: &[SortKey]) -> Document {
    let mut out = Document::new();
    for k in keys {
        let dir = match k.order {
            Order::Asc => 1,
            Order::Desc => -1,
        };
        out.insert(k.field.clone(), dir);
    }
    out
}

/// A 24-digit hex `_id` is stored as an ObjectId so it reads back unchanged.
fn hospital_to_document(h: &Hospital) -> Result<Document, bson::ser::Error> {
    let mut doc = bson::to_document(h)?;
    let oid = match doc.get("_id") {
        Some(Bson::String(id)) => ObjectId::parse_str(id).ok(),
        _ => None,
    };
    if let Some(oid) = oid {
        doc.insert("_id", oid);
    }
    Ok(doc)
}

pub fn document_to_hospital(d: Document) -> Hospital {
    d.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect()
}

fn bson_to_json(b: Bson) -> Value {
    match b {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(d) => Value::Object(document_to_hospital(d)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
