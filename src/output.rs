//! Snapshot assembly and persistence.
//!
//! The snapshot is the JSON payload the dashboard frontend consumes:
//! the normalized listings plus the ranked barrio statistics.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{BarrioStats, aggregate};
use crate::listing::{Listing, RawListing, normalize};

/// The full payload served to the map frontend.
#[derive(Debug, Serialize)]
pub struct MarketSnapshot {
    pub listings: Vec<Listing>,
    pub neighborhoods: Vec<BarrioStats>,
}

impl MarketSnapshot {
    /// Runs the whole pipeline over a parsed batch: normalize each record
    /// independently (dropping rejects), then aggregate the survivors.
    pub fn from_batch(records: &[RawListing]) -> Self {
        let listings: Vec<Listing> = records.iter().filter_map(normalize).collect();

        debug!(
            raw = records.len(),
            kept = listings.len(),
            dropped = records.len() - listings.len(),
            "Batch normalized"
        );

        let neighborhoods = aggregate(&listings);

        MarketSnapshot {
            listings,
            neighborhoods,
        }
    }
}

/// Logs a serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes the snapshot as JSON, replacing any previous file at `path`.
pub fn write_snapshot(path: &str, snapshot: &MarketSnapshot) -> Result<()> {
    debug!(path, "Writing snapshot");
    let json = serde_json::to_vec(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn records() -> Vec<RawListing> {
        [
            json!({
                "id": 1, "titulo": "Casa Centro",
                "latitud": -38.0, "longitud": -57.5,
                "precio": "100000", "moneda": 2,
                "casa_sup_cubierta": "50", "casa_sup_terreno": "80",
                "barrio_nombre": "Centro"
            }),
            json!({
                "id": 2, "titulo": "Sin coordenadas",
                "latitud": null, "longitud": -57.5,
                "precio": "90000"
            }),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    #[test]
    fn test_from_batch_drops_rejects_and_aggregates() {
        let snapshot = MarketSnapshot::from_batch(&records());

        assert_eq!(snapshot.listings.len(), 1);
        assert_eq!(snapshot.neighborhoods.len(), 1);
        assert_eq!(snapshot.neighborhoods[0].barrio, "Centro");
        assert_eq!(snapshot.neighborhoods[0].count, 1);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let snapshot = MarketSnapshot::from_batch(&records());
        print_json(&snapshot).unwrap();
    }

    #[test]
    fn test_write_snapshot_creates_valid_json() {
        let path = temp_path("inmueble_stats_test_snapshot.json");
        let _ = fs::remove_file(&path); // clean up any prior run

        let snapshot = MarketSnapshot::from_batch(&records());
        write_snapshot(&path, &snapshot).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(parsed["listings"].is_array());
        assert!(parsed["neighborhoods"].is_array());
        assert_eq!(parsed["listings"][0]["priceUsd"], json!(100000.0));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_snapshot_overwrites() {
        let path = temp_path("inmueble_stats_test_overwrite.json");
        let _ = fs::remove_file(&path);

        let snapshot = MarketSnapshot::from_batch(&records());
        write_snapshot(&path, &snapshot).unwrap();
        write_snapshot(&path, &snapshot).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["listings"].as_array().unwrap().len(), 1);

        fs::remove_file(&path).unwrap();
    }
}
