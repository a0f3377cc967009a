// Section prompt templates for the profile generator.
// One template per SectionKey; `{country}` is replaced before sending.

use crate::llm_client::prompts::BRIEFING_TONE;
use crate::models::country::SectionKey;

const OVERVIEW: &str = "Provide a concise and comprehensive overview of the country, detailing \
its geographical location, historical context, political developments, economic structure, and \
social diversity. Highlight key historical transformations, including governance changes and \
major conflicts, and explain their impact on the current political and social landscape. \
Discuss the economic foundations, significant industries, and challenges in development. \
Include an analysis of the population's diversity, mentioning ethnic, religious, or cultural \
groups, and how these contribute to both cultural heritage and potential sources of tension.";

const DEMOGRAPHICS: &str = "Provide a detailed overview of the demographic structure of the \
country, focusing on how historical events, conflict, or political and economic changes have \
shaped its population. Discuss major trends such as internal displacement, emigration, aging \
populations, or shifts in ethnic and religious diversity. Highlight the impact of these changes \
on social cohesion, economic sustainability, and political dynamics, and any government or \
societal efforts to address them. Conclude with the opportunities and challenges presented by \
the current demographic structure.";

const POLITICS: &str = "Provide a detailed overview of the political landscape of the country, \
focusing on its major political parties, factions, and alliances. Discuss how these groups shape \
governance and policy, noting their historical development, key leadership figures, and \
ideological orientations. Highlight significant parliamentary alliances or coalitions and their \
impact on domestic and regional politics, including smaller but influential movements. Conclude \
with a brief analysis of current political challenges and dynamics.";

const RELIGION: &str = "Provide a detailed overview of the country's religious landscape, \
focusing on the major faiths practiced, their historical significance, and their influence on \
culture and society. Highlight key traditions, festivals, and practices and how they shape daily \
life. Analyze the role of religion in governance, law, and social norms, and address significant \
interfaith dynamics, including cooperation, tensions, or conflicts.";

const ECONOMY: &str = "Provide a detailed and structured overview of the country's economy, \
covering: economic structure and key sectors; natural resources and export profile; economic \
challenges and vulnerabilities such as unemployment, inflation, public debt, or corruption; \
historical and political influences on the economy; diversification and development \
initiatives; socioeconomic indicators; foreign investment and international assistance; and \
the future outlook. Use specific examples and relevant data where appropriate.";

const CULTURE: &str = "Provide a detailed overview of the country's cultural norms, traditions, \
and etiquette, including social behavior, dining customs, and gift-giving practices. Discuss how \
cultural values influence interactions, such as respect for elders, gender roles, and \
hospitality, and include notable figures of the cultural heritage. Structure the response with \
sections such as 'Basic Etiquette', 'Visiting', 'Eating', 'Giving Gifts', and 'Cultural \
Heritage'.";

const MEDIA: &str = "Explain the media landscape, press freedom, and major media outlets of the \
country.";

const HUMAN_RIGHTS: &str = "Provide a detailed and structured overview of the country's human \
rights situation over recent decades: the record during the early 2000s; developments during \
the 2010s and the influence of regional or global movements; the impact of recent leadership on \
human rights policy; ongoing challenges, including the treatment of dissidents and political \
freedoms; and key cases that shaped international relations or drew advocacy attention.";

const HISTORY: &str = "Provide a detailed overview of the modern history of the given country, \
written to the standard of a US intelligence analyst. Highlight major events such as regime \
changes, conflicts, international interventions, and significant movements or tensions within \
the population, including their effects on governance, the economy, and stability.";

const HUMAN_DEVELOPMENT: &str = "Provide a detailed overview of the country's human development \
trends since the year 2000, focusing on social, cultural, and technological advancements. \
Highlight globalization, urbanization, and the rise of digital and social media, shifts in youth \
culture, arts, and literature, and challenges such as access to education, healthcare, \
traditional gender roles, and the impact of conflict or instability on development.";

const DIPLOMACY: &str = "Provide a detailed overview of the country's diplomatic relations and \
regional dynamics, focusing on how internal political changes, conflicts, or governance \
transitions have influenced its relationships with neighbors and global powers. Highlight key \
alliances, tensions, and how the country navigates major regional actors and international \
organizations. Conclude with its current diplomatic challenges and opportunities.";

const POLITICAL_LEADERSHIP: &str = "Provide a detailed and structured overview of the country's \
political leadership: the government structure and key positions; major political figures, \
their roles and backgrounds; prominent parties, coalitions, and opposition movements; recent \
political developments such as elections, protests, or leadership transitions; and the interplay \
of domestic and international dynamics. Include key dates where possible.";

const MILITARY_LEADERSHIP: &str = "Provide a detailed and structured overview of the country's \
military leadership: the structure of the armed forces and specialized units; key military \
leaders, their ranks and backgrounds; notable military institutions; the role of the military \
in governance; military alliances, peacekeeping missions, or defense agreements; and recent \
military developments, reforms, or controversies.";

/// The fixed template for a section, before country substitution.
pub fn section_template(section: SectionKey) -> &'static str {
    match section {
        SectionKey::Overview => OVERVIEW,
        SectionKey::Demographics => DEMOGRAPHICS,
        SectionKey::Politics => POLITICS,
        SectionKey::Religion => RELIGION,
        SectionKey::Economy => ECONOMY,
        SectionKey::Culture => CULTURE,
        SectionKey::Media => MEDIA,
        SectionKey::HumanRights => HUMAN_RIGHTS,
        SectionKey::History => HISTORY,
        SectionKey::HumanDevelopment => HUMAN_DEVELOPMENT,
        SectionKey::Diplomacy => DIPLOMACY,
        SectionKey::PoliticalLeadership => POLITICAL_LEADERSHIP,
        SectionKey::MilitaryLeadership => MILITARY_LEADERSHIP,
    }
}

/// Builds the user prompt for one section of one country.
pub fn section_prompt(section: SectionKey, country: &str) -> String {
    format!(
        "{} {BRIEFING_TONE} The country you're working on is {country}.",
        section_template(section)
    )
}
