use std::sync::OnceLock;

use regex::Regex;
use shared::{Difficulty, Platform};

use super::*;

pub static PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Codeforces,
    success: &[
        SuccessSignal::Element("span.verdict-accepted"),
        SuccessSignal::ClassContains("verdict-accepted"),
        SuccessSignal::ElementText(".status-verdict-cell", "Accepted"),
        SuccessSignal::ElementText("td", "Accepted"),
    ],
    problem_id: &[
        FieldStrategy::Derived(problem_from_url),
        FieldStrategy::Derived(problem_from_link),
        FieldStrategy::Derived(problem_from_statement),
    ],
    code: &[
        FieldStrategy::Text("pre#program-source-text"),
        FieldStrategy::Text("pre.prettyprint"),
        FieldStrategy::Text("#sourceCodeTextarea"),
    ],
    language: &[
        FieldStrategy::Derived(language_from_info_table),
        FieldStrategy::Text("td.status-small + td"),
        FieldStrategy::Text("select[name=\"programTypeId\"] option[selected]"),
    ],
    difficulty: &[FieldStrategy::Derived(difficulty_from_rating)],
    title: &[
        FieldStrategy::Text(".problem-statement .header .title"),
        FieldStrategy::Text(".problem-statement .title"),
        FieldStrategy::Derived(title_from_link),
    ],
};

static PROBLEM_PATH: OnceLock<Option<Regex>> = OnceLock::new();
static RATING: OnceLock<Option<Regex>> = OnceLock::new();
static INDEX_PREFIX: OnceLock<Option<Regex>> = OnceLock::new();

const PROBLEM_PATTERN: &str =
    r"/(?:(?:contest|gym)/(\d+)/problem|problemset/problem/(\d+))/([A-Za-z][A-Za-z0-9]*)";

/// `/contest/4/problem/A` and `/problemset/problem/4/A` are both problem `4a`.
fn problem_key(path: &str) -> Option<String> {
    let captures = regex(&PROBLEM_PATH, PROBLEM_PATTERN)?.captures(path)?;
    let contest = captures.get(1).or_else(|| captures.get(2))?;
    Some(format!("{}{}", contest.as_str(), &captures[3]))
}

fn problem_from_url(doc: &Document) -> Option<String> {
    problem_key(doc.path())
}

/// Submission pages link back to the problem.
fn problem_from_link(doc: &Document) -> Option<String> {
    let href = doc.attr("a[href*=\"/problem/\"]", "href")?;
    problem_key(&href)
}

/// "A. Watermelon" on a contest page whose address names only the contest.
fn problem_from_statement(doc: &Document) -> Option<String> {
    let title = doc.text(".problem-statement .title")?;
    let index = title.split('.').next()?.trim();
    let contest = doc
        .path()
        .split('/')
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))?;
    Some(format!("{contest}{index}"))
}

/// The submission info table lists the language in the column headed "Lang".
fn language_from_info_table(doc: &Document) -> Option<String> {
    let headers = doc.texts("table.datatable th, .datatable table th");
    let column = headers.iter().position(|header| header == "Lang")?;
    doc.texts("table.datatable tr td, .datatable table tr td")
        .get(column)
        .cloned()
}

/// Rating tags read like `*1500`.
pub fn rating_difficulty(rating: u32) -> Difficulty {
    match rating {
        0..=1200 => Difficulty::Easy,
        1201..=1900 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

fn difficulty_from_rating(doc: &Document) -> Option<String> {
    let pattern = regex(&RATING, r"^\*(\d+)$")?;
    doc.texts("span.tag-box")
        .iter()
        .find_map(|tag| pattern.captures(tag)?[1].parse::<u32>().ok())
        .map(|rating| rating_difficulty(rating).to_string())
}

fn title_from_link(doc: &Document) -> Option<String> {
    let text = doc.text("a[href*=\"/problem/\"]")?;
    let title = regex(&INDEX_PREFIX, r"^[A-Za-z][A-Za-z0-9]*\s*-\s*")?.replace(&text, "");
    Some(title.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION: &str = r#"
        <html><body>
          <div class="datatable">
            <table>
              <tr><th>#</th><th>Author</th><th>Problem</th><th>Lang</th><th>Verdict</th></tr>
              <tr>
                <td>123</td>
                <td>tourist</td>
                <td><a href="/contest/4/problem/A">A - Watermelon</a></td>
                <td>GNU C++17</td>
                <td><span class="verdict-accepted">Accepted</span></td>
              </tr>
            </table>
          </div>
          <pre id="program-source-text" class="prettyprint">int main() { return 0; }</pre>
          <span class="tag-box">math</span>
          <span class="tag-box">*800</span>
        </body></html>
    "#;

    fn extractor() -> Extractor {
        Extractor::for_platform(Platform::Codeforces)
    }

    #[test]
    fn extracts_submission_page() {
        let doc = Document::parse("https://codeforces.com/contest/4/submission/123", SUBMISSION);
        assert!(extractor().is_successful_submission(&doc));

        let record = extractor().extract(&doc).unwrap();
        assert_eq!(record.problem_id, "4a");
        assert_eq!(record.language, "gnu c++17");
        assert_eq!(record.extension(), "cpp");
        assert_eq!(record.difficulty, Some(Difficulty::Easy));
        assert_eq!(record.title.as_deref(), Some("Watermelon"));
        assert_eq!(record.code, "int main() { return 0; }");
    }

    #[test]
    fn problem_paths() {
        assert_eq!(problem_key("/contest/1927/problem/B1").as_deref(), Some("1927B1"));
        assert_eq!(problem_key("/problemset/problem/4/A").as_deref(), Some("4A"));
        assert_eq!(problem_key("/gym/102/problem/C").as_deref(), Some("102C"));
        assert_eq!(problem_key("/blog/entry/1"), None);
    }

    #[test]
    fn rating_buckets() {
        assert_eq!(rating_difficulty(800), Difficulty::Easy);
        assert_eq!(rating_difficulty(1200), Difficulty::Easy);
        assert_eq!(rating_difficulty(1201), Difficulty::Medium);
        assert_eq!(rating_difficulty(1900), Difficulty::Medium);
        assert_eq!(rating_difficulty(2400), Difficulty::Hard);
    }

    #[test]
    fn verdict_text_alone_is_a_success() {
        let html = "<html><body><table><tr><td>Accepted</td></tr></table></body></html>";
        let doc = Document::parse("https://codeforces.com/contest/4/submission/123", html);
        assert!(extractor().is_successful_submission(&doc));
    }

    #[test]
    fn pending_verdict_is_not_a_success() {
        let html = SUBMISSION.replace("verdict-accepted", "verdict-waiting").replace("Accepted", "Running");
        let doc = Document::parse("https://codeforces.com/contest/4/submission/123", &html);
        assert!(!extractor().is_successful_submission(&doc));
    }
}
