use serde::{Deserialize, Serialize};

/// Default actor for business lead scraping (Google Maps places with contact enrichment).
pub const DEFAULT_PLACES_ACTOR: &str = "compass~crawler-google-places";

/// Input for the Google Maps places actor.
#[derive(Debug, Clone, Serialize)]
pub struct PlacesScraperInput {
    #[serde(rename = "searchStringsArray")]
    pub search_strings_array: Vec<String>,
    #[serde(rename = "locationQuery", skip_serializing_if = "Option::is_none")]
    pub location_query: Option<String>,
    #[serde(rename = "maxCrawledPlacesPerSearch")]
    pub max_crawled_places_per_search: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Ask the actor to visit each website and collect emails and social profiles.
    #[serde(rename = "scrapeContacts")]
    pub scrape_contacts: bool,
}

/// A single place from the actor's dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Place {
    pub title: Option<String>,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "totalScore")]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(rename = "linkedIns", default)]
    pub linkedins: Vec<String>,
}

impl Place {
    /// Best human-readable location: full address, else "city, state".
    pub fn display_location(&self) -> String {
        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            return address.trim().to_string();
        }
        [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_deserializes_with_contact_arrays() {
        let json = r#"{
            "title": "Northside Plumbing",
            "categoryName": "Plumber",
            "city": "Minneapolis",
            "state": "Minnesota",
            "phone": "+1 612-555-0100",
            "website": "https://northside.example",
            "emails": ["owner@northside.co"],
            "linkedIns": ["https://linkedin.com/company/northside"]
        }"#;
        let place: Place = serde_json::from_str(json).unwrap();
        assert_eq!(place.title.as_deref(), Some("Northside Plumbing"));
        assert_eq!(place.emails.len(), 1);
        assert_eq!(place.display_location(), "Minneapolis, Minnesota");
    }

    #[test]
    fn place_without_contact_arrays_defaults_empty() {
        let place: Place = serde_json::from_str(r#"{"title": "Cafe"}"#).unwrap();
        assert!(place.emails.is_empty());
        assert!(place.linkedins.is_empty());
        assert_eq!(place.display_location(), "");
    }

    #[test]
    fn input_uses_actor_field_names() {
        let input = PlacesScraperInput {
            search_strings_array: vec!["dentist".into()],
            location_query: None,
            max_crawled_places_per_search: 25,
            language: None,
            scrape_contacts: true,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["searchStringsArray"][0], "dentist");
        assert_eq!(value["maxCrawledPlacesPerSearch"], 25);
        assert!(value.get("locationQuery").is_none());
    }
}
