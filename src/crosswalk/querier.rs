use crate::states::state_abbreviation;
use crate::types::{Cbsa, CbsaQuerier, JobPosting};

use super::tables::{CrosswalkProvider, CrosswalkTables, UrbanAreaLookup};

/// Finds a job posting's CBSA using only the crosswalk tables
#[derive(Debug, Clone)]
pub struct CrosswalkCbsaQuerier<P = CrosswalkTables> {
    provider: P,
}

impl<P: CrosswalkProvider> CrosswalkCbsaQuerier<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Urban area code for a locality, trying places before county subdivisions
    pub fn urban_area(&self, locality: &str, region: &str) -> Option<&str> {
        let region = normalize_region(region);
        let locality = locality.trim().to_lowercase();

        if let Some(ua) = lookup_ua(self.provider.place_ua(), &region, &locality) {
            return Some(ua);
        }

        let ua = lookup_ua(self.provider.cousub_ua(), &region, &locality);
        if ua.is_some() {
            tracing::debug!(%locality, %region, "Urban area found in county subdivision table");
        }
        ua
    }

    /// First CBSA listed for an urban area
    pub fn cbsa_for_urban_area(&self, ua: &str) -> Option<Cbsa> {
        let (code, name) = self.provider.ua_cbsa().get(ua)?.first()?;
        Some(Cbsa::new(code.as_str(), name.as_str()))
    }
}

impl<P: CrosswalkProvider> CbsaQuerier for CrosswalkCbsaQuerier<P> {
    fn query(&self, job_posting: &JobPosting) -> Option<Cbsa> {
        let (locality, region) = job_posting.locality_and_region()?;

        let Some(ua) = self.urban_area(locality, region) else {
            tracing::debug!(locality, region, "No urban area for locality");
            return None;
        };

        let cbsa = self.cbsa_for_urban_area(ua);
        if cbsa.is_none() {
            tracing::debug!(ua, "Urban area has no CBSA");
        }
        cbsa
    }
}

fn lookup_ua<'a>(table: &'a UrbanAreaLookup, region: &str, locality: &str) -> Option<&'a str> {
    table.get(region)?.get(locality).map(String::as_str)
}

/// Full state names are accepted in place of postal abbreviations
fn normalize_region(region: &str) -> String {
    let region = region.trim();
    state_abbreviation(region)
        .map(str::to_string)
        .unwrap_or_else(|| region.to_ascii_uppercase())
}
