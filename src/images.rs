//! Image URL expansion for a single listing's detail record.

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::listing::thumbnail_url;

/// Full image set for one listing, principal image first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingImages {
    pub id: i64,
    pub images: Vec<String>,
}

/// Expands a detail-endpoint response into thumbnail URLs.
///
/// The principal image leads, gallery images follow in upstream order,
/// empty names are dropped and duplicates collapse onto their first
/// occurrence. `fallback_id` stands in when the detail record itself has
/// no id.
///
/// # Errors
///
/// Returns an error when the envelope does not report success; a missing
/// image list is just an empty result.
pub fn expand_detail(detail: &Value, fallback_id: i64) -> Result<ListingImages> {
    if detail["success"].as_bool() != Some(true) {
        bail!("upstream detail response did not report success");
    }

    let principal = detail["inmueble"]["imagen_principal"].as_str();
    let gallery = detail["imagenes"]
        .as_array()
        .map(|imgs| imgs.iter().filter_map(|img| img["nombre"].as_str()))
        .into_iter()
        .flatten();

    let mut seen = HashSet::new();
    let images = principal
        .into_iter()
        .chain(gallery)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(thumbnail_url)
        .collect();

    let id = detail["inmueble"]["id"].as_i64().unwrap_or(fallback_id);

    Ok(ListingImages { id, images })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_principal_first_and_deduplicated() {
        let detail = json!({
            "success": true,
            "inmueble": {"id": 42, "imagen_principal": "cover.jpg"},
            "imagenes": [
                {"nombre": "a.jpg"},
                {"nombre": "cover.jpg"},
                {"nombre": "b.jpg"},
                {"nombre": "a.jpg"}
            ]
        });

        let result = expand_detail(&detail, 0).unwrap();
        assert_eq!(result.id, 42);
        assert_eq!(
            result.images,
            [
                "https://api.mardelinmueble.com/uploads/inmuebles/thumbnails/cover.jpg",
                "https://api.mardelinmueble.com/uploads/inmuebles/thumbnails/a.jpg",
                "https://api.mardelinmueble.com/uploads/inmuebles/thumbnails/b.jpg",
            ]
        );
    }

    #[test]
    fn test_empty_and_malformed_names_dropped() {
        let detail = json!({
            "success": true,
            "inmueble": {"id": 7},
            "imagenes": [
                {"nombre": ""},
                {"nombre": 12},
                {},
                {"nombre": "ok.jpg"}
            ]
        });

        let result = expand_detail(&detail, 0).unwrap();
        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].ends_with("/ok.jpg"));
    }

    #[test]
    fn test_missing_gallery_yields_principal_only() {
        let detail = json!({
            "success": true,
            "inmueble": {"id": 7, "imagen_principal": "c.jpg"}
        });

        let result = expand_detail(&detail, 0).unwrap();
        assert_eq!(result.images.len(), 1);
    }

    #[test]
    fn test_fallback_id_used_when_detail_has_none() {
        let detail = json!({"success": true, "imagenes": []});
        let result = expand_detail(&detail, 99).unwrap();
        assert_eq!(result.id, 99);
        assert!(result.images.is_empty());
    }

    #[test]
    fn test_unsuccessful_detail_is_an_error() {
        let detail = json!({"success": false});
        assert!(expand_detail(&detail, 1).is_err());
    }
}
