use std::sync::OnceLock;

use regex::Regex;
use shared::Platform;

use super::*;

pub static PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Codechef,
    success: &[
        SuccessSignal::ElementText("[class*=\"_status__container\"]", "Correct Answer"),
        SuccessSignal::ElementText(".status-container", "Correct Answer"),
        SuccessSignal::ElementText("[class*=\"verdict\"]", "Accepted"),
        SuccessSignal::ClassContains("correct-answer"),
        SuccessSignal::Text("Correct Answer"),
    ],
    problem_id: &[
        FieldStrategy::Derived(problem_code_from_url),
        FieldStrategy::Text("[class*=\"_problem__code\"]"),
        FieldStrategy::Derived(problem_code_from_link),
    ],
    code: &[
        FieldStrategy::Derived(ace_source),
        FieldStrategy::Text("pre code"),
        FieldStrategy::Text("textarea"),
    ],
    language: &[
        FieldStrategy::Text("[class*=\"_language__select\"] [class*=\"_selected\"]"),
        FieldStrategy::Attr("#language-select option[selected]", "value"),
        FieldStrategy::Text("#language-select option[selected]"),
    ],
    difficulty: &[
        FieldStrategy::Text("[class*=\"_difficulty__name\"]"),
        FieldStrategy::Derived(difficulty_from_rating),
    ],
    title: &[
        FieldStrategy::Text("[class*=\"_problem__title\"]"),
        FieldStrategy::Text("#problem-statement h1"),
        FieldStrategy::Text("h1"),
    ],
};

static PROBLEM_URL: OnceLock<Option<Regex>> = OnceLock::new();
static RATING: OnceLock<Option<Regex>> = OnceLock::new();

fn problem_code(path: &str) -> Option<String> {
    regex(&PROBLEM_URL, r"/problems(?:-old)?/([A-Za-z0-9_]+)")?
        .captures(path)
        .map(|captures| captures[1].to_string())
}

fn problem_code_from_url(doc: &Document) -> Option<String> {
    problem_code(doc.path())
}

fn problem_code_from_link(doc: &Document) -> Option<String> {
    problem_code(&doc.attr("a[href*=\"/problems/\"]", "href")?)
}

fn ace_source(doc: &Document) -> Option<String> {
    joined_lines(doc, ".ace_line")
}

/// Difficulty ratings below 1400 are easy, below 2000 medium.
fn difficulty_from_rating(doc: &Document) -> Option<String> {
    let text = doc.text("[class*=\"_difficulty__rating\"]")?;
    let rating: u32 = regex(&RATING, r"(\d+)")?.captures(&text)?[1].parse().ok()?;
    let level = match rating {
        0..=1399 => "easy",
        1400..=1999 => "medium",
        _ => "hard",
    };
    Some(level.to_string())
}
