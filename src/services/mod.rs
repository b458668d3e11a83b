pub mod form_state;
pub mod parcel_enricher;
pub mod permit_crawler;
pub mod portal_markup;
pub mod report_cache;
pub mod result_table;

pub use parcel_enricher::*;
pub use permit_crawler::*;
pub use report_cache::*;
