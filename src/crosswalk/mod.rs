//! CBSA lookups through static Census crosswalk tables.
//!
//! A job posting's locality is matched against a place → urban area table,
//! falling back to a county subdivision → urban area table, and the urban
//! area is then mapped to the CBSAs it belongs to.

mod querier;
mod tables;

pub use querier::CrosswalkCbsaQuerier;
pub use tables::{
    CbsaLookup, CrosswalkConfig, CrosswalkProvider, CrosswalkTables, UrbanAreaLookup,
    COUSUB_UA_FILE, PLACE_UA_FILE, UA_CBSA_FILE,
};
