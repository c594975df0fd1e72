//! Barrio-level aggregation of normalized listings.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::listing::Listing;

/// Group label for listings whose record carries no barrio.
pub const NO_BARRIO_LABEL: &str = "Sin barrio";

/// Per-barrio statistics, ranked by average price-per-m2. The count covers
/// every listing in the barrio; the average only the subset that has a
/// price-per-m2.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarrioStats {
    pub barrio: String,
    pub count: usize,
    pub avg_price_per_m2: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    with_m2: usize,
    total: usize,
}

/// Folds the whole listing collection into one [`BarrioStats`] per distinct
/// barrio, sorted descending by average price-per-m2 with barrios lacking an
/// average at the end.
///
/// Groups keep first-seen order before the sort, and the sort is stable, so
/// the output is deterministic for a given input order.
pub fn aggregate(listings: &[Listing]) -> Vec<BarrioStats> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<Accumulator> = Vec::new();

    for listing in listings {
        let key = listing
            .barrio
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(NO_BARRIO_LABEL);

        let slot = *index.entry(key.to_string()).or_insert_with(|| {
            keys.push(key.to_string());
            groups.push(Accumulator::default());
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total += 1;
        if let Some(ppm2) = listing.price_per_m2.filter(|v| v.is_finite()) {
            group.sum += ppm2;
            group.with_m2 += 1;
        }
    }

    let mut stats: Vec<BarrioStats> = keys
        .into_iter()
        .zip(groups)
        .map(|(barrio, acc)| BarrioStats {
            barrio,
            count: acc.total,
            avg_price_per_m2: (acc.with_m2 > 0).then(|| acc.sum / acc.with_m2 as f64),
        })
        .collect();

    // Descending by average, absent averages last. No secondary key: ties
    // keep their grouping order.
    stats.sort_by(|a, b| match (a.avg_price_per_m2, b.avg_price_per_m2) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    stats
}
