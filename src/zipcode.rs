/// Look up city and state from a US zip code
pub fn lookup_zipcode(zip: &str) -> Option<(String, String)> {
    // ZIP+4 codes resolve through their 5-digit prefix
    let zip = zip.trim().split('-').next()?;
    if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Avoid zipcodes::matching to suppress debug_print output.
    let results = zipcodes::filter_by(vec![|z: &zipcodes::Zipcode| z.zip_code == zip], None).ok()?;
    let info = results.first()?;
    Some((info.city.clone(), info.state.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_zip() {
        assert_eq!(lookup_zipcode(""), None);
        assert_eq!(lookup_zipcode("ABCDE"), None);
        assert_eq!(lookup_zipcode("1234"), None);
        assert_eq!(lookup_zipcode("123456"), None);
    }

    #[test]
    fn test_known_zip() {
        let (city, state) = lookup_zipcode("60120").unwrap();
        assert_eq!(city.to_lowercase(), "elgin");
        assert_eq!(state, "IL");
    }
}
