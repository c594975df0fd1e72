//! Listing normalization: untrusted raw API records into validated domain
//! listings with derived area and price-per-m2 metrics.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Currency code the upstream API uses for USD-denominated listings.
pub const USD_CURRENCY_CODE: i64 = 2;

/// Uncovered lot surface counts at 30% of covered surface in the weighted
/// area used as the price-per-m2 denominator.
pub const COVERED_AREA_WEIGHT: f64 = 1.0;
pub const UNCOVERED_AREA_WEIGHT: f64 = 0.3;

/// Listings with a weighted area at or below this floor (m²) do not get a
/// price-per-m2; tiny denominators produce ratios that swamp the averages.
pub const MIN_WEIGHTED_AREA_M2: f64 = 30.0;

const THUMBNAIL_BASE_URL: &str = "https://api.mardelinmueble.com/uploads/inmuebles/thumbnails/";

/// One raw record from the upstream listing API.
///
/// Every field is kept as a [`Value`] because the API is not trustworthy at
/// the field level: numbers arrive as strings, strings arrive as numbers,
/// and anything may be null or missing. [`normalize`] validates each field
/// on extraction instead of relying on typed deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub titulo: Value,
    #[serde(default)]
    pub latitud: Value,
    #[serde(default)]
    pub longitud: Value,
    #[serde(default)]
    pub precio: Value,
    #[serde(default)]
    pub moneda: Value,
    #[serde(default)]
    pub barrio_nombre: Value,
    #[serde(default)]
    pub imagen_principal: Value,
    #[serde(default)]
    pub casa_sup_cubierta: Value,
    #[serde(default)]
    pub casa_sup_terreno: Value,
    #[serde(default)]
    pub calle_nombre: Value,
    #[serde(default)]
    pub numero: Value,
    #[serde(default)]
    pub ambientes: Value,
    #[serde(default)]
    pub fecha_alta: Value,
    #[serde(default)]
    pub fecha_actualizacion: Value,
}

/// A validated listing. Always has finite coordinates and a positive price;
/// everything else is optional and serializes as `null` when absent so the
/// frontend filters can treat the fields as plain nullable numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub price_usd: f64,
    pub cover_image_url: Option<String>,
    pub covered_area_m2: Option<f64>,
    pub lot_area_m2: Option<f64>,
    pub weighted_area_m2: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub barrio: Option<String>,
    pub street_name: Option<String>,
    pub street_number: Option<String>,
    pub room_count: Option<u32>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Converts one raw record into a [`Listing`], or `None` when the record is
/// unusable. Rejection is silent: one bad record must never fail the batch.
///
/// Rejection rules, in order:
/// 1. latitude or longitude missing or not a finite number
/// 2. price missing, unparseable, non-finite, or ≤ 0
pub fn normalize(raw: &RawListing) -> Option<Listing> {
    let lat = finite_number(&raw.latitud)?;
    let lng = finite_number(&raw.longitud)?;

    let price = parse_decimal(&raw.precio).filter(|p| *p > 0.0)?;

    // Currency code 2 is USD upstream. No conversion table exists for the
    // other codes yet, so every code passes the parsed value through
    // unchanged (see DESIGN.md).
    let price_usd = match raw.moneda.as_i64() {
        Some(USD_CURRENCY_CODE) => price,
        _ => price,
    };

    let covered = parse_decimal(&raw.casa_sup_cubierta).filter(|a| *a > 0.0);
    let lot = parse_decimal(&raw.casa_sup_terreno).filter(|a| *a > 0.0);

    let weighted_area = weighted_area(covered, lot);

    // Without a covered surface the weighted figure is lot-only and too
    // weak a denominator, so the ratio additionally requires covered area.
    let price_per_m2 = match (covered, weighted_area) {
        (Some(_), Some(w)) if w > MIN_WEIGHTED_AREA_M2 => Some(price_usd / w),
        _ => None,
    };

    Some(Listing {
        id: raw.id.as_i64().unwrap_or_default(),
        title: raw.titulo.as_str().unwrap_or_default().to_string(),
        lat,
        lng,
        price_usd,
        cover_image_url: non_empty_str(&raw.imagen_principal).map(thumbnail_url),
        covered_area_m2: covered,
        lot_area_m2: lot,
        weighted_area_m2: weighted_area,
        price_per_m2,
        barrio: raw.barrio_nombre.as_str().map(str::to_string),
        street_name: non_empty_str(&raw.calle_nombre).map(title_case),
        street_number: display_string(&raw.numero),
        room_count: non_negative_int(&raw.ambientes),
        created_at: parse_timestamp(&raw.fecha_alta),
        updated_at: parse_timestamp(&raw.fecha_actualizacion),
    })
}

/// Combines covered and lot surface into one area figure. Lot surface beyond
/// the covered footprint counts at [`UNCOVERED_AREA_WEIGHT`]; lot smaller
/// than the covered footprint contributes nothing extra.
fn weighted_area(covered: Option<f64>, lot: Option<f64>) -> Option<f64> {
    if covered.is_none() && lot.is_none() {
        return None;
    }

    let covered = covered.unwrap_or(0.0);
    let uncovered = lot.map_or(0.0, |l| (l - covered).max(0.0));
    let weighted = COVERED_AREA_WEIGHT * covered + UNCOVERED_AREA_WEIGHT * uncovered;

    (weighted > 0.0).then_some(weighted)
}

/// Builds the public thumbnail URL for an upstream image filename.
pub fn thumbnail_url(name: &str) -> String {
    format!("{THUMBNAIL_BASE_URL}{name}")
}

/// Lowercases the input and capitalizes the first letter of every
/// space-separated token. Used for street names, which upstream stores in
/// assorted casings.
pub fn title_case(s: &str) -> String {
    s.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A JSON number that is actually finite. Coordinates must already be
/// numeric; numeric strings are not accepted here.
fn finite_number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| n.is_finite())
}

/// Parses a decimal that upstream may encode as a number or as a numeric
/// string. Anything else, including non-finite results, is absent.
fn parse_decimal(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.trim().is_empty())
}

/// String form of a field that may arrive as a string or a number, e.g.
/// street numbers.
fn display_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_negative_int(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|i| u32::try_from(i).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn parse_timestamp(v: &Value) -> Option<NaiveDateTime> {
    let s = v.as_str()?.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}
