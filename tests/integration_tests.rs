use inmueble_stats::output::MarketSnapshot;
use inmueble_stats::parser::parse_batch;

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/sample_batch.json");
    let records = parse_batch(bytes).expect("Failed to parse batch");
    assert_eq!(records.len(), 8);

    let snapshot = MarketSnapshot::from_batch(&records);

    // Records 2 (null latitude), 3 (unparseable price) and 8 (zero price)
    // are dropped; input order is preserved for the rest.
    let ids: Vec<i64> = snapshot.listings.iter().map(|l| l.id).collect();
    assert_eq!(ids, [1, 4, 5, 6, 7]);

    let first = &snapshot.listings[0];
    assert_eq!(first.price_usd, 100000.0);
    assert_eq!(first.weighted_area_m2, Some(59.0));
    assert!((first.price_per_m2.unwrap() - 1694.9152542372882).abs() < 1e-9);
    assert_eq!(first.street_name.as_deref(), Some("Av. Colon"));
    assert_eq!(first.room_count, Some(3));
    assert!(
        first
            .cover_image_url
            .as_deref()
            .unwrap()
            .ends_with("/thumbnails/casa1.jpg")
    );

    // Counts partition the kept listings
    let total: usize = snapshot.neighborhoods.iter().map(|s| s.count).sum();
    assert_eq!(total, snapshot.listings.len());

    // Centro (avg ≈ 1847.5) > La Perla (1500.0) > Sin barrio (no average)
    let barrios: Vec<&str> = snapshot
        .neighborhoods
        .iter()
        .map(|s| s.barrio.as_str())
        .collect();
    assert_eq!(barrios, ["Centro", "La Perla", "Sin barrio"]);

    assert_eq!(snapshot.neighborhoods[0].count, 2);
    assert_eq!(snapshot.neighborhoods[1].count, 2);
    assert_eq!(snapshot.neighborhoods[1].avg_price_per_m2, Some(1500.0));
    assert_eq!(snapshot.neighborhoods[2].avg_price_per_m2, None);
}

#[test]
fn test_pipeline_is_deterministic() {
    let bytes = include_bytes!("fixtures/sample_batch.json");

    let first = MarketSnapshot::from_batch(&parse_batch(bytes).unwrap());
    let second = MarketSnapshot::from_batch(&parse_batch(bytes).unwrap());

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
