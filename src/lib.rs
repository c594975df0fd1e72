pub mod aggregate;
pub mod fetch;
pub mod images;
pub mod listing;
pub mod output;
pub mod parser;
