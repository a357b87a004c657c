//! Goal actionability heuristic
//!
//! Decides whether a goal should be routed into the plan/act path or answered
//! as plain chat.

/// Verbs and domain nouns that mark a goal as buildable
pub const ACTION_KEYWORDS: &[&str] = &[
    "create",
    "build",
    "add",
    "draw",
    "make",
    "generate",
    "insert",
    "room",
    "wall",
    "door",
    "window",
    "column",
    "beam",
    "roof",
    "stair",
    "slab",
    "render",
    "token",
    "openings",
    "partition",
];

/// First keyword found in the goal, if any. Matching is a case-insensitive
/// substring test against [`ACTION_KEYWORDS`].
pub fn matched_keyword(goal: &str) -> Option<&'static str> {
    if goal.is_empty() {
        return None;
    }
    let lowered = goal.to_lowercase();
    ACTION_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}
