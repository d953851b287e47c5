//! Prompts that work without the database: the fallback set used when the remote
//! source is down, and the short trial set shown before sign-in.

use rand::seq::SliceRandom;

use crate::models::prompt::Prompt;

/// (id, text, category). Ids are stable: entries store them.
const FALLBACK_PROMPTS: &[(&str, &str, &str)] = &[
    ("fallback-1", "Tell me about a childhood memory that still makes you smile.", "childhood"),
    (
        "fallback-2",
        "Describe your wedding day or a special celebration you'll never forget.",
        "celebrations",
    ),
    ("fallback-3", "What was your first job like? What do you remember most about it?", "career"),
    ("fallback-4", "Tell me about a time when you felt really proud of yourself.", "achievements"),
    ("fallback-5", "Describe your favorite family tradition or holiday memory.", "family"),
    ("fallback-6", "What was the best advice someone ever gave you? Who gave it to you?", "wisdom"),
    ("fallback-7", "Tell me about a place from your past that holds special meaning.", "places"),
    ("fallback-8", "Describe a friendship that has been important in your life.", "relationships"),
    ("fallback-9", "What was your favorite subject in school and why?", "education"),
    (
        "fallback-10",
        "Tell me about a time when you overcame a challenge or difficulty.",
        "resilience",
    ),
    ("fallback-11", "Describe your childhood home. What room was your favorite?", "childhood"),
    ("fallback-12", "What family recipe or meal brings back special memories?", "food"),
    (
        "fallback-13",
        "Tell me about a teacher, mentor, or person who influenced your life.",
        "influences",
    ),
    ("fallback-14", "Describe a vacation or trip that created lasting memories.", "travel"),
];

pub const TRIAL_PROMPTS: &[&str] = &[
    "What made you smile today, even if it was just for a moment?",
    "Describe a favorite memory from your childhood that still brings you joy.",
    "What's something you're grateful for right now?",
    "Tell me about a person who has made a positive impact on your life.",
    "What's a simple pleasure that you enjoyed recently?",
    "Describe a place that makes you feel peaceful and happy.",
    "What's something new you learned or discovered this week?",
    "Share a story about a time when someone showed you kindness.",
];

fn to_prompt(&(id, text, category): &(&str, &str, &str)) -> Prompt {
    Prompt {
        id: id.to_string(),
        text: text.to_string(),
        category: category.to_string(),
    }
}

pub fn fallback_prompts() -> Vec<Prompt> {
    FALLBACK_PROMPTS.iter().map(to_prompt).collect()
}

pub fn fallback_prompt(id: &str) -> Option<Prompt> {
    FALLBACK_PROMPTS
        .iter()
        .find(|(candidate, _, _)| *candidate == id)
        .map(to_prompt)
}

pub fn random_fallback_prompt() -> Prompt {
    let mut rng = rand::thread_rng();
    FALLBACK_PROMPTS
        .choose(&mut rng)
        .map(to_prompt)
        .unwrap_or_else(|| to_prompt(&FALLBACK_PROMPTS[0]))
}

pub fn random_trial_prompt() -> &'static str {
    let mut rng = rand::thread_rng();
    TRIAL_PROMPTS.choose(&mut rng).copied().unwrap_or(TRIAL_PROMPTS[0])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fallback_prompts_are_unique() {
        let prompts = fallback_prompts();
        let ids: HashSet<_> = prompts.iter().map(|p| p.id.clone()).collect();
        let texts: HashSet<_> = prompts.iter().map(|p| p.text.clone()).collect();
        assert_eq!(ids.len(), prompts.len());
        assert_eq!(texts.len(), prompts.len());
    }

    #[test]
    fn test_fallback_lookup() {
        assert_eq!(fallback_prompt("fallback-12").unwrap().category, "food");
        assert!(fallback_prompt("fallback-99").is_none());
    }

    #[test]
    fn test_random_picks_come_from_the_sets() {
        for _ in 0..20 {
            let p = random_fallback_prompt();
            assert!(fallback_prompt(&p.id).is_some());
            assert!(TRIAL_PROMPTS.contains(&random_trial_prompt()));
        }
    }
}
