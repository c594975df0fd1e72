pub mod listing_api;
