//! System instruction construction.
//!
//! `render_system_instruction` is a pure function of its inputs: the same
//! name, blob, and reference time always produce the same instruction. The
//! greeting-once rule lives in the instruction text itself; the model is
//! trusted to honor it, nothing enforces it programmatically.

use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::config::CoachOptions;

/// Fixed weekday → coaching theme mapping. Weekends have no theme.
pub fn weekday_theme(weekday: Weekday) -> Option<&'static str> {
    match weekday {
        Weekday::Mon => Some("Foundation & Pipeline Reset"),
        Weekday::Tue => Some("Contact Refresh & Market Awareness"),
        Weekday::Wed => Some("Video & Visibility"),
        Weekday::Thu => Some("Relationships & Gratitude"),
        Weekday::Fri => Some("Weekly Review & Score Submission"),
        Weekday::Sat | Weekday::Sun => None,
    }
}

/// Render the per-turn system instruction.
///
/// The knowledge blob is truncated to the configured character budget
/// before interpolation so an oversized upload cannot push the request
/// past the provider's size limit.
pub fn render_system_instruction(
    options: &CoachOptions,
    user_name: &str,
    knowledge_blob: &str,
    reference_time: DateTime<Utc>,
) -> String {
    let current_weekday = reference_time.format("%A").to_string();
    let current_date = reference_time.format("%B %d, %Y").to_string();

    let theme_line = match weekday_theme(reference_time.weekday()) {
        Some(theme) => format!("\nTODAY'S THEME: {theme}\n"),
        None => String::new(),
    };

    let knowledge = truncate_chars(knowledge_blob, options.max_knowledge_chars);
    let persona = &options.persona;

    format!(
        "\
You are {persona}, the Real Estate Productivity Coach.
User Name: {user_name}
Current Date: {current_weekday}, {current_date}

YOUR GOAL: Guide the user through the 5-4-3-2-1 System.
{theme_line}
MEMORY RULE:
If the chat history shows you already greeted them today, DO NOT repeat the intro.
Just continue the coaching conversation.

KNOWLEDGE BASE (Instructions & Scripts from reference documents):
{knowledge}

STRUCTURE:
1. Greeting (Only if first msg of day)
2. Affirmation (3x)
3. 5 Calls (Scripts)
4. 4 Texts (Templates)
5. 3 Emails (Templates)
6. 2 Social Actions
7. 1 CMA
8. MLS Check
9. Extra Task ({current_weekday} specific)
10. End: Accountability Check

TONE: Disciplined, Structured, Motivational."
    )
}

/// Throwaway instruction for the eager-greeting call made right after the
/// user supplies their name.
pub fn greeting_instruction(options: &CoachOptions, user_name: &str) -> String {
    let persona = &options.persona;
    format!(
        "You are {persona}, the Real Estate Productivity Coach. Greet {user_name} \
warmly in one short paragraph and invite them to start today's 5-4-3-2-1 \
coaching session. Do not list the session structure yet."
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}
