// Prompt templates for the monitoring-list generators.
// Each prompt lists what is already tracked so the model suggests only new entries.

use crate::models::tracking::PresenceKind;

pub const KEYWORDS_SYSTEM: &str =
    "You are a helpful assistant that provides relevant keywords for diplomatic monitoring.";

pub const NEWS_SOURCES_SYSTEM: &str = "You are a helpful assistant that provides accurate \
    information about news sources in different countries.";

pub const INFLUENCERS_SYSTEM: &str = "You are a research assistant helping to populate a \
    spreadsheet of information for an OSINT aggregator focused on U.S. Embassy interests worldwide.";

pub const GOVERNMENT_SYSTEM: &str = "You are a research assistant helping to gather accurate \
    information about government communication channels for diplomatic monitoring.";

pub const LEADERSHIP_SYSTEM: &str = "You are a research assistant helping to gather accurate \
    information about government leadership for diplomatic monitoring.";

pub const PRESENCE_SYSTEM: &str = "You are a research assistant helping to gather accurate \
    information about U.S. diplomatic presence for embassy monitoring.";

const RECORD_FORMAT_RULES: &str = "Do not include any markdown formatting, bullets, or \
additional text. Just provide the entries in the exact format shown above, with a blank line \
between each one.";

fn already_tracked(noun: &str, existing: &[String]) -> String {
    if existing.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = existing.iter().map(|e| format!("- {e}")).collect();
    format!(
        "\n\nIMPORTANT: DO NOT include any of these existing {noun} we already track:\n{}",
        lines.join("\n")
    )
}

pub fn keywords_prompt(country: &str, existing: &[String]) -> String {
    format!(
        "List at least 3 keywords or phrases an American ambassador in {country} would be \
especially interested in monitoring.
Focus on political, security, economic, or cultural terms that might affect bilateral relations \
or U.S. interests.
Include any local-language terms if relevant (with brief translations).{}

Format each NEW keyword on a new line, without numbers or bullets. Keep each keyword/topic \
concise (1-3 words).",
        already_tracked("keywords", existing)
    )
}

pub fn news_sources_prompt(country: &str, existing: &[String]) -> String {
    format!(
        "List 3 popular or influential news websites that cover political, economic affairs, \
and social issues in {country}.
Include URL and, if known, any relevant notes (e.g., whether they are state-owned, independent, \
or private).{}

For each NEW source, provide their information in exactly this format:

name: [name]
notes: [notes]
url: [url]

{RECORD_FORMAT_RULES}

Include only real, existing news sources.",
        already_tracked("news sources", existing)
    )
}

pub fn influencers_prompt(country: &str, existing: &[String]) -> String {
    format!(
        "I'm gathering information on {country} to assist U.S. Embassy personnel with daily \
OSINT monitoring. Please provide the following data in English:

List 3 key influencers (journalists, political figures, activists, analysts) who discuss \
political, economic, or social issues in {country}.{}

For each NEW influencer, provide their information in exactly this format:

name: [full name]
handle: [twitter handle with @ symbol]
role: [their role/affiliation]
political leaning: [number between -3 and 3]
url: [twitter profile URL]

{RECORD_FORMAT_RULES}

Include only real, existing influencers with significant following.",
        already_tracked("influencers", existing)
    )
}

pub fn government_prompt(country: &str, existing: &[String]) -> String {
    format!(
        "Please provide the top 5 government entities in {country} that regularly communicate \
via Twitter. These should include relevant ministries or agencies (e.g., Ministry of Foreign \
Affairs, Ministry of Defense, Prime Minister's Office, Presidential Office).{}

For each NEW entity, provide their information in exactly this format:

name: [Name of the entity in English, plus local if known]
handle: [Twitter handle with @ symbol]
notes: [One-sentence note describing their primary role or focus]

{RECORD_FORMAT_RULES}

Include only real, existing government entities.",
        already_tracked("government entities", existing)
    )
}

pub fn leadership_prompt(country: &str, existing: &[String]) -> String {
    format!(
        "Please provide the top 5 individual government leaders or figures of power in \
{country} who have an active presence on Twitter. Examples include the President, Prime \
Minister, key ministers (e.g., Foreign Minister), monarchs, or other high-level officials.{}

For each NEW leader, provide their information in exactly this format:

name: [Full Name]
title: [Official Title]
handle: [Twitter handle with @ symbol]
political_leaning: [Brief note on political or ideological leaning, if publicly known (if \
uncertain, state \"Unknown\")]

{RECORD_FORMAT_RULES}

Include only real, existing government leaders.",
        already_tracked("leaders", existing)
    )
}

pub fn presence_prompt(country: &str, kind: PresenceKind, existing: Option<&str>) -> String {
    let task = match kind {
        PresenceKind::Embassy => format!(
            "please provide the official Twitter handle of the U.S. Embassy in {country}, if it exists."
        ),
        PresenceKind::Ambassador => format!(
            "please provide the Twitter handle of the current U.S. Ambassador to {country}, if available."
        ),
    };
    let avoid = existing
        .map(|h| format!("\nIMPORTANT: DO NOT return this existing handle we already track: {h}"))
        .unwrap_or_default();
    format!(
        "For {country}, {task}{avoid}

Provide ONLY the Twitter handle with @ symbol, or \"N/A\" if not publicly available.
Do not include any additional text, explanation, or formatting."
    )
}
