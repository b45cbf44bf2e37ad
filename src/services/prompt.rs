use crate::models::{Preferences, PubmedFilter};

/// Placeholder for an unset date bound
const ANY_DATE: &str = "any";

/// Appends the user's channel and PubMed constraints to a prompt
///
/// The base prompt comes first, then the channel restriction (when favorite
/// channels are set), then the PubMed requirements (when any PubMed setting is
/// set). Blocks are separated by a blank line.
pub fn enrich(prompt: &str, preferences: &Preferences) -> String {
    let mut enriched = prompt.to_string();

    if !preferences.favorite_channels.is_empty() {
        let channels = join(preferences.favorite_channels.iter());
        enriched.push_str(&format!(
            "\n\nIMPORTANT: Only consider YouTube channels from the following list in your answer: {}. Ignore any information from other channels.",
            channels
        ));
    }

    if let Some(block) = pubmed_block(&preferences.pubmed_filter) {
        enriched.push_str(&block);
    }

    enriched
}

fn pubmed_block(filter: &PubmedFilter) -> Option<String> {
    if !filter.is_active() {
        return None;
    }

    let mut block = String::from("\n\nPubMed Filter Requirements:");

    if filter.start_date.is_some() || filter.end_date.is_some() {
        let start = filter
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| ANY_DATE.to_string());
        let end = filter
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| ANY_DATE.to_string());
        block.push_str(&format!(
            " Only consider studies published between {} and {}.",
            start, end
        ));
    }

    if !filter.publication_types.is_empty() {
        block.push_str(&format!(
            " Only consider studies with publication types: {}.",
            join(filter.publication_types.iter())
        ));
    }

    Some(block)
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}
