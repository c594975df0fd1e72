//! Trait for the upstream property-listing provider.

use anyhow::Result;
use inmueble_stats::images::ListingImages;
use inmueble_stats::listing::RawListing;

/// Abstraction over a listing provider (e.g. mardelinmueble).
#[async_trait::async_trait]
pub trait ListingApi {
    /// Returns the raw records for the configured city-wide batch query.
    ///
    /// Implementations validate the response envelope; a failed fetch or a
    /// malformed envelope is an error, never a partial batch.
    async fn fetch_batch(&self) -> Result<Vec<RawListing>>;

    /// Returns the expanded thumbnail URL set for a single listing.
    async fn fetch_images(&self, id: i64) -> Result<ListingImages>;
}
