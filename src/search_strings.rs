//! Candidate location strings for geocoding a job posting.

use crate::states::state_name;
use crate::types::JobPosting;
use crate::zipcode::lookup_zipcode;

/// Build the search strings a geocoder should try for a job posting.
///
/// - locality + known postal abbreviation: `"Salisbury, Pennsylvania"`, `"Salisbury, PA"`
/// - locality + any other region: `"Any City, Northeastern USA"`
/// - locality only: `"City"`
/// - no locality: the city/state of a US `postalCode`, if it resolves
///
/// Returns an empty list when the posting carries no usable location.
pub fn job_posting_search_strings(job_posting: &JobPosting) -> Vec<String> {
    let Some(address) = job_posting.address() else {
        return Vec::new();
    };

    match (address.locality(), address.region()) {
        (Some(locality), Some(region)) => locality_region_strings(locality, region),
        (Some(locality), None) => vec![locality.to_string()],
        (None, _) => match address.postal_code().and_then(lookup_zipcode) {
            Some((city, state)) => {
                tracing::debug!(
                    postal_code = address.postal_code(),
                    city = %city,
                    state = %state,
                    "Resolved missing locality from postal code"
                );
                locality_region_strings(&city, &state)
            }
            None => Vec::new(),
        },
    }
}

fn locality_region_strings(locality: &str, region: &str) -> Vec<String> {
    match state_name(region) {
        Some(name) => vec![
            format!("{}, {}", locality, name),
            format!("{}, {}", locality, region.to_ascii_uppercase()),
        ],
        None => vec![format!("{}, {}", locality, region)],
    }
}
