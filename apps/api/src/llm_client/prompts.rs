// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System instruction used for every country-profile completion.
pub const ANALYST_SYSTEM: &str = "You are a US intelligence analyst and expert in geopolitics \
    helping to develop a country profile report with accurate, well-structured information. \
    Provide detailed, factual information in a clear, professional tone, \
    like a US intelligence analyst writing a report. \
    Format the response as HTML.";

/// Tone instruction appended to the section templates.
pub const BRIEFING_TONE: &str =
    "Ensure the tone is neutral, factual, and suitable for an informative briefing.";
