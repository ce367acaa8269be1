use shared::Platform;

use super::*;

/// Best effort for pages of platforms without a dedicated profile.
pub static PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Unknown,
    success: &[SuccessSignal::Text("Accepted"), SuccessSignal::Text("Success")],
    problem_id: &[
        FieldStrategy::Derived(last_path_segment),
        FieldStrategy::Text("h1"),
    ],
    code: &[
        FieldStrategy::Text("pre code"),
        FieldStrategy::Text("pre"),
        FieldStrategy::Text("textarea"),
    ],
    language: &[
        FieldStrategy::Derived(code_class_language),
        FieldStrategy::Attr("[data-language]", "data-language"),
    ],
    difficulty: &[],
    title: &[FieldStrategy::Text("h1"), FieldStrategy::Derived(Document::title)],
};

fn code_class_language(doc: &Document) -> Option<String> {
    doc.attr("code[class*=\"language-\"]", "class")?
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}
