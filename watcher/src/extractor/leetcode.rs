use std::sync::OnceLock;

use regex::Regex;
use shared::Platform;

use super::*;

pub static PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Leetcode,
    success: &[
        SuccessSignal::ElementText("[data-e2e-locator=\"submission-result\"]", "Accepted"),
        SuccessSignal::ElementText("[class*=\"success__\"]", "Accepted"),
        SuccessSignal::ClassContains("submission-result-accepted"),
        SuccessSignal::ElementText("[data-e2e-locator=\"console-result\"]", "Accepted"),
        // Runtime stats only show for accepted submissions
        SuccessSignal::Text("Runtime:"),
    ],
    problem_id: &[
        FieldStrategy::Derived(numbered_title_slug),
        FieldStrategy::Derived(problem_slug_from_url),
        FieldStrategy::Meta("og:url"),
    ],
    code: &[
        FieldStrategy::Derived(monaco_source),
        FieldStrategy::Text("pre code"),
        FieldStrategy::Text("textarea"),
    ],
    language: &[
        FieldStrategy::Text("[data-e2e-locator=\"submission-language\"]"),
        FieldStrategy::Attr("[data-mode-id]", "data-mode-id"),
        FieldStrategy::Derived(code_block_language),
    ],
    difficulty: &[
        FieldStrategy::Text("[class*=\"text-difficulty-\"]"),
        FieldStrategy::Text("[diff]"),
        FieldStrategy::Derived(difficulty_from_class),
    ],
    title: &[
        FieldStrategy::Text("[data-cy=\"question-title\"]"),
        FieldStrategy::Text("div.text-title-large a"),
        FieldStrategy::Derived(page_title),
    ],
};

static PROBLEM_URL: OnceLock<Option<Regex>> = OnceLock::new();
static NUMBER_PREFIX: OnceLock<Option<Regex>> = OnceLock::new();

fn problem_slug_from_url(doc: &Document) -> Option<String> {
    regex(&PROBLEM_URL, r"/problems/([A-Za-z0-9_-]+)")?
        .captures(doc.path())
        .map(|captures| captures[1].to_string())
}

/// "1. Two Sum" is the problem `two-sum`.
fn numbered_title_slug(doc: &Document) -> Option<String> {
    let title = doc
        .text("[data-cy=\"question-title\"]")
        .or_else(|| doc.text("div.text-title-large a"))?;
    let title = regex(&NUMBER_PREFIX, r"^\s*\d+\.\s*")?.replace(&title, "");
    Some(title.into_owned())
}

fn monaco_source(doc: &Document) -> Option<String> {
    joined_lines(doc, ".view-lines .view-line")
}

fn code_block_language(doc: &Document) -> Option<String> {
    let class = doc.attr("code[class*=\"language-\"]", "class")?;
    class
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}

fn difficulty_from_class(doc: &Document) -> Option<String> {
    ["easy", "medium", "hard"]
        .into_iter()
        .find(|level| doc.class_contains(&format!("text-difficulty-{level}")))
        .map(str::to_string)
}

fn page_title(doc: &Document) -> Option<String> {
    let title = doc.title()?;
    Some(title.trim_end_matches(" - LeetCode").trim().to_string())
}
