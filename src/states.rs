//! US state and territory postal abbreviations.

/// Full name for a 2-letter postal abbreviation (case-insensitive)
pub fn state_name(abbr: &str) -> Option<&'static str> {
    if abbr.len() != 2 {
        return None;
    }
    STATES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(abbr))
        .map(|(_, name)| *name)
}

/// Canonical uppercase abbreviation for a postal abbreviation or full name
pub fn state_abbreviation(region: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(code, name)| code.eq_ignore_ascii_case(region) || name.eq_ignore_ascii_case(region))
        .map(|(code, _)| *code)
}

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    // Territories
    ("AS", "American Samoa"),
    ("GU", "Guam"),
    ("MP", "Northern Mariana Islands"),
    ("PR", "Puerto Rico"),
    ("VI", "Virgin Islands"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_name() {
        assert_eq!(state_name("PA"), Some("Pennsylvania"));
        assert_eq!(state_name("il"), Some("Illinois"));
        assert_eq!(state_name("DC"), Some("District of Columbia"));
        assert_eq!(state_name("XX"), None);
        assert_eq!(state_name("Pennsylvania"), None);
        assert_eq!(state_name(""), None);
    }

    #[test]
    fn test_state_abbreviation() {
        assert_eq!(state_abbreviation("Illinois"), Some("IL"));
        assert_eq!(state_abbreviation("north dakota"), Some("ND"));
        assert_eq!(state_abbreviation("ma"), Some("MA"));
        assert_eq!(state_abbreviation("Northeastern USA"), None);
    }
}
