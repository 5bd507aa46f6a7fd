use serde::{Deserialize, Serialize};
use std::fmt;

/// A `schema.org` JobPosting, reduced to the fields used for geography lookups
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_location: Option<JobLocationData>,
}

/// jobLocation can be either a single Place or a list of them
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum JobLocationData {
    // Listed first: a derived struct also accepts a JSON array
    Multiple(Vec<Place>),
    Single(Place),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl JobPosting {
    /// Address of the first listed place, if any
    pub fn address(&self) -> Option<&PostalAddress> {
        match self.job_location.as_ref()? {
            JobLocationData::Single(place) => place.address.as_ref(),
            JobLocationData::Multiple(places) => places.first()?.address.as_ref(),
        }
    }

    /// Locality and region, only when both are present
    pub fn locality_and_region(&self) -> Option<(&str, &str)> {
        let address = self.address()?;
        Some((address.locality()?, address.region()?))
    }
}

impl PostalAddress {
    pub fn locality(&self) -> Option<&str> {
        non_empty(self.address_locality.as_deref())
    }

    pub fn region(&self) -> Option<&str> {
        non_empty(self.address_region.as_deref())
    }

    pub fn postal_code(&self) -> Option<&str> {
        non_empty(self.postal_code.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// A Core-Based Statistical Area
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Cbsa {
    pub code: String,
    pub name: String,
}

impl Cbsa {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl From<(String, String)> for Cbsa {
    fn from((code, name): (String, String)) -> Self {
        Self { code, name }
    }
}

impl fmt::Display for Cbsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Resolves a job posting to the CBSA it is located in.
///
/// Every kind of miss (absent address fields, unknown place, no CBSA for the
/// urban area, collaborator returning nothing) is reported as `None`.
pub trait CbsaQuerier {
    fn query(&self, job_posting: &JobPosting) -> Option<Cbsa>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_posting() {
        let job: JobPosting = serde_json::from_value(json!({
            "description": "We are looking for someone for a job",
            "jobLocation": {
                "@type": "Place",
                "address": {
                    "addressLocality": "Elgin",
                    "addressRegion": "IL",
                    "@type": "PostalAddress"
                }
            },
            "@context": "http://schema.org",
            "alternateName": "Customer Service Representative",
            "datePosted": "2013-03-07",
            "@type": "JobPosting",
            "id": 5
        }))
        .unwrap();

        assert_eq!(job.id, Some(json!(5)));
        assert_eq!(job.locality_and_region(), Some(("Elgin", "IL")));
    }

    #[test]
    fn test_missing_location() {
        let job: JobPosting = serde_json::from_value(json!({"id": 5})).unwrap();
        assert!(job.address().is_none());
        assert!(job.locality_and_region().is_none());

        let job: JobPosting = serde_json::from_value(json!({"jobLocation": null})).unwrap();
        assert!(job.address().is_none());
    }

    #[test]
    fn test_location_list_uses_first_place() {
        let job: JobPosting = serde_json::from_value(json!({
            "jobLocation": [
                {"address": {"addressLocality": "Elgin", "addressRegion": "ND"}},
                {"address": {"addressLocality": "Fargo", "addressRegion": "ND"}}
            ]
        }))
        .unwrap();
        assert_eq!(job.locality_and_region(), Some(("Elgin", "ND")));

        let job: JobPosting = serde_json::from_value(json!({
            "jobLocation": [{"address": {"addressLocality": "Fargo", "addressRegion": "ND"}}]
        }))
        .unwrap();
        assert_eq!(job.locality_and_region(), Some(("Fargo", "ND")));

        let job: JobPosting = serde_json::from_value(json!({"jobLocation": []})).unwrap();
        assert!(job.address().is_none());
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let job: JobPosting = serde_json::from_value(json!({
            "jobLocation": {"address": {"addressLocality": "  ", "addressRegion": "IL"}}
        }))
        .unwrap();
        let address = job.address().unwrap();
        assert_eq!(address.locality(), None);
        assert_eq!(address.region(), Some("IL"));
        assert!(job.locality_and_region().is_none());
    }
}
