use std::sync::LazyLock;

use garde_core::DraftRecord;
use regex::Regex;

use super::{is_plausible_name, ExtractionStrategy};
use crate::html::Document;
use crate::normalize::find_phone_shaped;

static STREET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rue|avenue|boulevard|quartier|bd|av\.").expect("valid street regex")
});

const NAME_MARKER: &str = "pharmacie";
const MAX_NAME_LINE_CHARS: usize = 100;

/// Last-resort scan over the page's text lines.
///
/// A short line mentioning "pharmacie" opens a new draft; the following
/// lines fill in its address and phone. Drafts without an address are
/// dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineScanStrategy;

fn flush(drafts: &mut Vec<DraftRecord>, draft: Option<DraftRecord>) {
    if let Some(draft) = draft {
        if is_plausible_name(&draft.name) && !draft.address.is_empty() {
            drafts.push(draft);
        }
    }
}

impl ExtractionStrategy for LineScanStrategy {
    fn name(&self) -> &'static str {
        "line_scan"
    }

    fn extract(&self, document: &str) -> Vec<DraftRecord> {
        let mut drafts = Vec::new();
        let mut current: Option<DraftRecord> = None;

        for line in Document::parse(document).text_lines() {
            if line.to_lowercase().contains(NAME_MARKER)
                && line.chars().count() < MAX_NAME_LINE_CHARS
            {
                flush(&mut drafts, current.take());
                current = Some(DraftRecord {
                    name: line.clone(),
                    address: String::new(),
                    raw_phone_text: String::new(),
                    raw_day_text: String::new(),
                });
            }

            let Some(draft) = current.as_mut() else {
                continue;
            };
            if draft.address.is_empty() && STREET_RE.is_match(&line) {
                draft.address.clone_from(&line);
            }
            if draft.raw_phone_text.is_empty() {
                if let Some(phone) = find_phone_shaped(&line) {
                    draft.raw_phone_text = phone.to_string();
                }
            }
        }

        flush(&mut drafts, current);
        drafts
    }
}
