use garde_core::DraftRecord;

use super::{is_plausible_name, ExtractionStrategy};
use crate::html::{Document, Element, Selector};
use crate::normalize::find_phone_shaped;

/// Container selectors, most specific first. The first one that matches any
/// element decides the item set.
const CONTAINER_SELECTORS: [&str; 7] = [
    ".pharmacy-item",
    ".pharmacie",
    "article.pharmacy",
    ".post",
    "article",
    ".entry",
    ".pharmacy-card",
];

const NAME_GROUPS: [&str; 3] = ["h2, h3, .pharmacy-name, .name, .title", "strong", "b"];
const ADDRESS_GROUPS: [&str; 2] = [".address, .location, .adresse", "p"];
const PHONE_GROUPS: [&str; 1] = [".phone, .tel, .telephone"];
const DAY_GROUPS: [&str; 2] = [".day, .jour", ".date"];

/// Reads pages built from common blog/listing markup.
#[derive(Debug, Clone)]
pub struct GenericSelectorStrategy {
    containers: Vec<Selector>,
    name: Vec<Vec<Selector>>,
    address: Vec<Vec<Selector>>,
    phone: Vec<Vec<Selector>>,
    day: Vec<Vec<Selector>>,
}

fn groups(raw: &[&str]) -> Vec<Vec<Selector>> {
    raw.iter().map(|g| Selector::group(g)).collect()
}

/// Text of the first group whose first match has non-empty text.
fn first_non_empty(item: &Element<'_>, fallbacks: &[Vec<Selector>]) -> String {
    fallbacks
        .iter()
        .map(|group| item.first_text(group))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

impl Default for GenericSelectorStrategy {
    fn default() -> Self {
        Self {
            containers: CONTAINER_SELECTORS.iter().map(|s| Selector::parse(s)).collect(),
            name: groups(&NAME_GROUPS),
            address: groups(&ADDRESS_GROUPS),
            phone: groups(&PHONE_GROUPS),
            day: groups(&DAY_GROUPS),
        }
    }
}

impl GenericSelectorStrategy {
    fn draft_from_item(&self, item: &Element<'_>) -> Option<DraftRecord> {
        let name = first_non_empty(item, &self.name);
        if !is_plausible_name(&name) {
            return None;
        }

        let mut raw_phone_text = first_non_empty(item, &self.phone);
        if raw_phone_text.is_empty() {
            raw_phone_text = find_phone_shaped(&item.text())
                .unwrap_or_default()
                .to_string();
        }

        Some(DraftRecord {
            name,
            address: first_non_empty(item, &self.address),
            raw_phone_text,
            raw_day_text: first_non_empty(item, &self.day),
        })
    }
}

impl ExtractionStrategy for GenericSelectorStrategy {
    fn name(&self) -> &'static str {
        "generic_selector"
    }

    fn extract(&self, document: &str) -> Vec<DraftRecord> {
        let doc = Document::parse(document);
        for container in &self.containers {
            let items = doc.select_all(std::slice::from_ref(container));
            if items.is_empty() {
                continue;
            }
            tracing::debug!(selector = ?container, count = items.len(), "matched containers");
            return items
                .iter()
                .filter_map(|item| self.draft_from_item(item))
                .collect();
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_from_labelled_children() {
        let html = r#"
            <div class="pharmacy-item">
              <h3>Pharmacie Ibn Khaldoun</h3>
              <span class="adresse">23 Rue Ibn Khaldoun</span>
              <span class="tel">Tél : 0539 93 22 11</span>
              <span class="jour">Ouvert le mardi</span>
            </div>
        "#;
        let drafts = GenericSelectorStrategy::default().extract(html);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Pharmacie Ibn Khaldoun");
        assert_eq!(drafts[0].address, "23 Rue Ibn Khaldoun");
        assert_eq!(drafts[0].raw_phone_text, "Tél : 0539 93 22 11");
        assert_eq!(drafts[0].raw_day_text, "Ouvert le mardi");
    }

    #[test]
    fn falls_back_to_bold_paragraph_and_phone_scan() {
        let html = r#"
            <article>
              <strong>Pharmacie Moulay Youssef</strong>
              <p>Quartier Branes, près de la mosquée</p>
              <p>Appelez le 0539-31-45-67 la nuit</p>
              <span class="date">15/03/2024</span>
            </article>
        "#;
        let drafts = GenericSelectorStrategy::default().extract(html);
        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.name, "Pharmacie Moulay Youssef");
        assert_eq!(d.address, "Quartier Branes, près de la mosquée");
        assert_eq!(d.raw_phone_text, "0539-31-45-67");
        assert_eq!(d.raw_day_text, "15/03/2024");
    }

    #[test]
    fn unclosed_paragraph_ends_at_the_next_one() {
        let html = "<article><strong>Pharmacie Gamma</strong><p>Rue C<p>Ouverte la nuit</article>";
        let drafts = GenericSelectorStrategy::default().extract(html);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].address, "Rue C");
    }

    #[test]
    fn first_matching_container_selector_decides() {
        // `.post` is tried before `article`, so the article outside the post is ignored.
        let html = r#"
            <div class="post"><h2>Pharmacie du Post</h2></div>
            <article><h2>Pharmacie Article</h2></article>
        "#;
        let drafts = GenericSelectorStrategy::default().extract(html);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Pharmacie du Post");
        assert!(drafts[0].address.is_empty());
    }

    #[test]
    fn short_names_are_dropped() {
        let html = "<article><h2>Abc</h2><p>Rue X</p></article>\
                    <article><h2>Pharmacie Rif</h2><p>Rue Y</p></article>";
        let drafts = GenericSelectorStrategy::default().extract(html);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Pharmacie Rif");
    }

    #[test]
    fn no_container_yields_nothing() {
        let html = "<div><p>Pharmacie Atlas</p></div>";
        assert!(GenericSelectorStrategy::default().extract(html).is_empty());
    }
}
