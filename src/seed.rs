use std::path::Path;

use anyhow::{Context, anyhow};
use serde_json::Value;

use crate::cli::SeedArgs;
use crate::geo::{GeoPoint, parse_coordinate};
use crate::store::Hospital;
use crate::store::mongo::MongoStore;

pub async fn run(opts: SeedArgs) -> anyhow::Result<()> {
    tracing::info!("hospital-finder seed");
    tracing::info!(
        "file={} database={} collection={}",
        opts.file,
        opts.mongo.database,
        opts.mongo.collection
    );

    let t0 = std::time::Instant::now();
    let hospitals = load_hospitals(Path::new(&opts.file))?;
    tracing::info!(
        "Parsed {} hospitals in {:.1}s",
        hospitals.len(),
        t0.elapsed().as_secs_f64()
    );

    let store = MongoStore::connect(
        &opts.mongo.uri,
        &opts.mongo.database,
        &opts.mongo.collection,
    )
    .await
    .context("connect to mongodb")?;

    if opts.drop {
        tracing::info!("drop=true (removing existing hospitals)");
        store.drop_collection().await.context("drop collection")?;
    }

    let inserted = store
        .insert_many(&hospitals)
        .await
        .context("insert hospitals")?;
    store.ensure_indexes().await.context("create indexes")?;
    tracing::info!("Inserted {} hospitals", inserted);
    Ok(())
}

pub fn load_hospitals(path: &Path) -> anyhow::Result<Vec<Hospital>> {
    let data = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_hospitals(&data).with_context(|| format!("parse {}", path.display()))
}

/// Accepts either a JSON array of hospital objects or newline-delimited JSON.
/// Every hospital needs a GeoJSON `location`; flat `latitude`/`longitude`
/// fields are folded into one.
pub fn parse_hospitals(data: &str) -> anyhow::Result<Vec<Hospital>> {
    let values: Vec<(usize, Value)> = if data.trim_start().starts_with('[') {
        let arr: Vec<Value> = serde_json::from_str(data).context("parse JSON array")?;
        arr.into_iter().enumerate().map(|(i, v)| (i + 1, v)).collect()
    } else {
        data.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map(|v| (i + 1, v))
                    .with_context(|| format!("parse line {}", i + 1))
            })
            .collect::<anyhow::Result<_>>()?
    };

    values
        .into_iter()
        .map(|(pos, v)| {
            let Value::Object(mut h) = v else {
                return Err(anyhow!("record {pos} is not a JSON object"));
            };
            normalize_location(&mut h).ok_or_else(|| {
                anyhow!("record {pos} has no valid location (GeoJSON Point or latitude/longitude)")
            })?;
            Ok(h)
        })
        .collect()
}

fn normalize_location(h: &mut Hospital) -> Option<()> {
    if let Some(loc) = h.get("location") {
        GeoPoint::from_geojson(loc)?;
        return Some(());
    }
    let lat = parse_coordinate(h.get("latitude")?)?;
    let lon = parse_coordinate(h.get("longitude")?)?;
    let point = GeoPoint::new(lat, lon)?;
    h.remove("latitude");
    h.remove("longitude");
    h.insert("location".into(), point.to_geojson());
    Some(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_json_array() {
        let data = r#"[
            {"name": "AB Hospital", "location": {"type": "Point", "coordinates": [77.59, 12.97]}},
            {"name": "City Care", "latitude": "12.93", "longitude": 77.62}
        ]"#;
        let hs = parse_hospitals(data).unwrap();
        assert_eq!(hs.len(), 2);
        assert_eq!(
            hs[1]["location"],
            json!({"type": "Point", "coordinates": [77.62, 12.93]})
        );
        assert!(!hs[1].contains_key("latitude"));
    }

    #[test]
    fn parses_ndjson_and_reports_line() {
        let data = "{\"name\": \"A\", \"latitude\": 1, \"longitude\": 2}\n\n{\"name\": \"B\"}\n";
        let err = parse_hospitals(data).unwrap_err();
        assert!(err.to_string().contains("record 3"), "{err}");

        let data = "{\"name\": \"A\", \"latitude\": 1, \"longitude\": 2}\nnot json\n";
        let err = parse_hospitals(data).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn rejects_bad_locations() {
        let data = r#"[{"name": "X", "location": {"type": "Point", "coordinates": [200, 0]}}]"#;
        assert!(parse_hospitals(data).is_err());
        assert!(parse_hospitals(r#"[42]"#).is_err());
    }
}
