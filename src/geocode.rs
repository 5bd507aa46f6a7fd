//! CBSA lookups through an external geocoder.
//!
//! The geocoder and the CBSA finder are injected collaborators. The geocode
//! result is opaque here; only the paired [`CbsaFinder`] interprets it.

use crate::search_strings::job_posting_search_strings;
use crate::types::{Cbsa, CbsaQuerier, JobPosting};

/// Converts a free-text location into a geocode result
pub trait Geocoder {
    type Output;

    /// `None` when the location could not be geocoded
    fn geocode(&self, search_string: &str) -> Option<Self::Output>;
}

/// Resolves a geocode result to the CBSA containing it
pub trait CbsaFinder<T> {
    fn find(&self, geocode_result: &T) -> Option<Cbsa>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    type Output = G::Output;

    fn geocode(&self, search_string: &str) -> Option<Self::Output> {
        (**self).geocode(search_string)
    }
}

impl<T, F: CbsaFinder<T> + ?Sized> CbsaFinder<T> for &F {
    fn find(&self, geocode_result: &T) -> Option<Cbsa> {
        (**self).find(geocode_result)
    }
}

/// Finds a job posting's CBSA by geocoding its location
#[derive(Debug, Clone)]
pub struct GeocodeCbsaQuerier<G, F> {
    geocoder: G,
    cbsa_finder: F,
}

impl<G, F> GeocodeCbsaQuerier<G, F>
where
    G: Geocoder,
    F: CbsaFinder<G::Output>,
{
    pub fn new(geocoder: G, cbsa_finder: F) -> Self {
        Self {
            geocoder,
            cbsa_finder,
        }
    }

    /// Geocode the first candidate search string the geocoder recognizes
    pub fn geocode(&self, job_posting: &JobPosting) -> Option<G::Output> {
        let candidates = job_posting_search_strings(job_posting);
        if candidates.is_empty() {
            tracing::debug!("Job posting has no searchable location");
            return None;
        }

        let result = candidates.iter().find_map(|candidate| {
            let result = self.geocoder.geocode(candidate);
            if result.is_some() {
                tracing::debug!(search_string = %candidate, "Geocoded job location");
            }
            result
        });
        if result.is_none() {
            tracing::debug!(?candidates, "No geocode result for any search string");
        }
        result
    }
}

impl<G, F> CbsaQuerier for GeocodeCbsaQuerier<G, F>
where
    G: Geocoder,
    F: CbsaFinder<G::Output>,
{
    fn query(&self, job_posting: &JobPosting) -> Option<Cbsa> {
        let geocode_result = self.geocode(job_posting)?;
        self.cbsa_finder.find(&geocode_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    // Not what a real geocode result looks like; the finder only needs to
    // understand whatever the geocoder hands it.
    struct MockGeocoder {
        calls: RefCell<Vec<String>>,
    }

    impl MockGeocoder {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Geocoder for MockGeocoder {
        type Output = String;

        fn geocode(&self, search_string: &str) -> Option<String> {
            self.calls.borrow_mut().push(search_string.to_string());
            match search_string {
                "Elgin, Illinois" => Some("456".to_string()),
                "Elgin, TX" => Some("tx-geocode".to_string()),
                _ => None,
            }
        }
    }

    struct MockCbsaFinder;

    impl CbsaFinder<String> for MockCbsaFinder {
        fn find(&self, geocode_result: &String) -> Option<Cbsa> {
            (geocode_result == "456").then(|| Cbsa::new("456", "Chicago, IL Metro Area"))
        }
    }

    fn job(locality: &str, region: &str) -> JobPosting {
        serde_json::from_value(json!({
            "description": "We are looking for someone for a job",
            "jobLocation": {
                "@type": "Place",
                "address": {
                    "addressLocality": locality,
                    "addressRegion": region,
                    "@type": "PostalAddress"
                }
            },
            "@type": "JobPosting",
            "id": 5
        }))
        .unwrap()
    }

    #[test]
    fn test_querier_one_hit() {
        let geocoder = MockGeocoder::new();
        let querier = GeocodeCbsaQuerier::new(&geocoder, MockCbsaFinder);

        assert_eq!(
            querier.query(&job("Elgin", "IL")),
            Some(Cbsa::new("456", "Chicago, IL Metro Area"))
        );
        // Stops at the first successful geocode
        assert_eq!(*geocoder.calls.borrow(), vec!["Elgin, Illinois"]);
    }

    #[test]
    fn test_querier_hit_no_cbsa() {
        let geocoder = MockGeocoder::new();
        let querier = GeocodeCbsaQuerier::new(&geocoder, MockCbsaFinder);

        assert_eq!(querier.query(&job("Elgin", "TX")), None);
        assert_eq!(*geocoder.calls.borrow(), vec!["Elgin, Texas", "Elgin, TX"]);
    }

    #[test]
    fn test_querier_not_present() {
        let querier = GeocodeCbsaQuerier::new(MockGeocoder::new(), MockCbsaFinder);
        assert_eq!(querier.query(&job("Elgin", "ND")), None);
    }

    #[test]
    fn test_querier_no_location() {
        let geocoder = MockGeocoder::new();
        let querier = GeocodeCbsaQuerier::new(&geocoder, MockCbsaFinder);

        let job: JobPosting = serde_json::from_value(json!({"id": 5})).unwrap();
        assert_eq!(querier.query(&job), None);
        assert!(geocoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_later_candidate_is_used() {
        let geocoder = MockGeocoder::new();
        let querier = GeocodeCbsaQuerier::new(&geocoder, MockCbsaFinder);

        assert_eq!(
            querier.geocode(&job("Elgin", "TX")),
            Some("tx-geocode".to_string())
        );
    }
}
