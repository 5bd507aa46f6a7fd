pub mod crosswalk;
pub mod geocode;
pub mod search_strings;
pub mod states;
pub mod types;
pub mod zipcode;

pub use crosswalk::{CrosswalkCbsaQuerier, CrosswalkConfig, CrosswalkProvider, CrosswalkTables};
pub use geocode::{CbsaFinder, GeocodeCbsaQuerier, Geocoder};
pub use search_strings::job_posting_search_strings;
pub use types::{Cbsa, CbsaQuerier, JobPosting, PostalAddress};
