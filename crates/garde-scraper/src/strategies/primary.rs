use garde_core::DraftRecord;
use regex::Regex;

use super::{is_plausible_name, ExtractionStrategy};
use crate::html::{collapse_whitespace, Document, Selector};
use crate::normalize::find_phone_shaped;

const CONTAINER_SELECTOR: &str = ".list__";
const NAME_SELECTOR: &str = ".list__label--name";
const BOILERPLATE_SUFFIX: &str = "Tangier Tanger Morocco";

/// Reads the listing markup of the current source page.
///
/// Each container holds a name element; the rest of the container text,
/// minus the name and the city boilerplate, is taken as the address.
#[derive(Debug, Clone)]
pub struct PrimarySelectorStrategy {
    container: Vec<Selector>,
    name: Vec<Selector>,
    boilerplate: Regex,
}

impl PrimarySelectorStrategy {
    #[must_use]
    pub fn new(container: &str, name: &str, boilerplate_suffix: &str) -> Self {
        let pattern = format!("(?i){}", regex::escape(boilerplate_suffix));
        Self {
            container: Selector::group(container),
            name: Selector::group(name),
            boilerplate: Regex::new(&pattern).expect("valid escaped boilerplate regex"),
        }
    }
}

impl Default for PrimarySelectorStrategy {
    fn default() -> Self {
        Self::new(CONTAINER_SELECTOR, NAME_SELECTOR, BOILERPLATE_SUFFIX)
    }
}

impl ExtractionStrategy for PrimarySelectorStrategy {
    fn name(&self) -> &'static str {
        "primary_selector"
    }

    fn extract(&self, document: &str) -> Vec<DraftRecord> {
        let doc = Document::parse(document);
        doc.select_all(&self.container)
            .into_iter()
            .filter_map(|item| {
                let name = item.first_text(&self.name);
                if !is_plausible_name(&name) {
                    return None;
                }

                let full_text = item.text();
                let without_name = full_text.replacen(&name, "", 1);
                let address =
                    collapse_whitespace(&self.boilerplate.replace_all(&without_name, ""));
                let raw_phone_text = find_phone_shaped(&full_text)
                    .unwrap_or_default()
                    .to_string();

                Some(DraftRecord {
                    name,
                    address,
                    raw_phone_text,
                    raw_day_text: String::new(),
                })
            })
            .collect()
    }
}
