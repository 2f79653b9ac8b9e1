//! Instruction templates and prompt composition.
//!
//! Template selection and composition are pure functions; the dispatch core
//! calls them once per request.

use crate::models::Gender;

pub const MEN_SYSTEM: &str = include_str!("../data/prompts/system_men.txt");
pub const WOMEN_SYSTEM: &str = include_str!("../data/prompts/system_women.txt");
pub const UNISEX_SYSTEM: &str = include_str!("../data/prompts/system_unisex.txt");
pub const GREETING_SYSTEM: &str = include_str!("../data/prompts/system_greeting.txt");

const GREETING_TOKENS: [&str; 4] = ["hello", "hi", "hey", "greetings"];

/// Exact-match greeting detection after trimming and lowercasing.
///
/// Deliberately narrow: "hi!" is a styling request, not a greeting.
pub fn is_greeting(message: &str) -> bool {
    GREETING_TOKENS.contains(&message.to_lowercase().trim())
}

/// Select the system instruction for a request. Greeting detection runs
/// first and overrides the gender selector.
pub fn instruction_for(gender: Gender, message: &str) -> &'static str {
    if is_greeting(message) {
        return GREETING_SYSTEM;
    }
    match gender {
        Gender::Women => WOMEN_SYSTEM,
        Gender::Men => MEN_SYSTEM,
        Gender::Unisex => UNISEX_SYSTEM,
    }
}

/// Concatenate instruction and message into the linear prompt the model is
/// primed on. The framing is a format contract; do not change the role
/// markers or whitespace.
pub fn compose_prompt(instruction: &str, message: &str) -> String {
    format!("{}\nUser: {}\nAssistant:", instruction, message)
}
