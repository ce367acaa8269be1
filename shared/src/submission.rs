use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::*;

/// Language used when nothing on the page told us which one was submitted.
pub const DEFAULT_LANGUAGE: &str = "text";
pub const DEFAULT_EXTENSION: &str = "txt";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    Leetcode,
    Codeforces,
    Codechef,
    Unknown,
}

impl Platform {
    /// Platforms that own a top-level folder in the solutions repository.
    pub const TRACKED: [Platform; 3] = [Platform::Leetcode, Platform::Codeforces, Platform::Codechef];

    pub fn from_url(url: &str) -> Self {
        let host = url
            .split("://")
            .nth(1)
            .unwrap_or(url)
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .split(':')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("leetcode.com") || matches("leetcode.cn") {
            Platform::Leetcode
        } else if matches("codeforces.com") {
            Platform::Codeforces
        } else if matches("codechef.com") {
            Platform::Codechef
        } else {
            Platform::Unknown
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Platform::Leetcode => "LeetCode",
            Platform::Codeforces => "Codeforces",
            Platform::Codechef => "CodeChef",
            Platform::Unknown => "Unknown platform",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Reads a difficulty out of free page text ("Easy", "MEDIUM", "Hard ").
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.contains("easy") {
            Some(Difficulty::Easy)
        } else if text.contains("medium") {
            Some(Difficulty::Medium)
        } else if text.contains("hard") {
            Some(Difficulty::Hard)
        } else {
            None
        }
    }
}

/// One captured accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub platform: Platform,
    pub problem_id: String,
    pub code: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SubmissionRecord {
    pub fn new(platform: Platform, problem_id: &str, code: String, language: &str) -> Self {
        let language = language.trim().to_lowercase();
        Self {
            platform,
            problem_id: slugify(problem_id),
            code,
            language: if language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                language
            },
            difficulty: None,
            title: None,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn is_complete(&self) -> bool {
        !self.problem_id.trim().is_empty()
            && !self.code.trim().is_empty()
            && !self.language.trim().is_empty()
    }

    pub fn extension(&self) -> &'static str {
        language_extension(&self.language)
    }

    pub fn path(&self) -> String {
        solution_path(self.platform, &self.problem_id, &self.language)
    }

    /// Identifies the problem across submissions, regardless of language or code.
    pub fn problem_key(&self) -> ProblemKey {
        format!("{}/{}", self.platform, sanitize_problem_id(&self.problem_id))
    }
}

/// Lower-cases, collapses every run of characters outside `[a-z0-9]` into one
/// hyphen and trims hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

pub fn sanitize_problem_id(problem_id: &str) -> String {
    let slug = slugify(problem_id);
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

pub fn solution_path(platform: Platform, problem_id: &str, language: &str) -> String {
    format!(
        "{}/{}.{}",
        platform,
        sanitize_problem_id(problem_id),
        language_extension(language)
    )
}

// Exact names as the platforms' language pickers report them, lower-cased.
const EXTENSIONS: &[(&str, &str)] = &[
    ("c", "c"),
    ("c++", "cpp"),
    ("cpp", "cpp"),
    ("c#", "cs"),
    ("csharp", "cs"),
    ("java", "java"),
    ("python", "py"),
    ("python2", "py"),
    ("python3", "py"),
    ("pypy", "py"),
    ("pypy3", "py"),
    ("javascript", "js"),
    ("node.js", "js"),
    ("nodejs", "js"),
    ("typescript", "ts"),
    ("php", "php"),
    ("swift", "swift"),
    ("kotlin", "kt"),
    ("dart", "dart"),
    ("go", "go"),
    ("golang", "go"),
    ("ruby", "rb"),
    ("scala", "scala"),
    ("rust", "rs"),
    ("racket", "rkt"),
    ("erlang", "erl"),
    ("elixir", "ex"),
    ("haskell", "hs"),
    ("ocaml", "ml"),
    ("perl", "pl"),
    ("r", "r"),
    ("pascal", "pas"),
    ("d", "d"),
    ("lua", "lua"),
    ("mysql", "sql"),
    ("mssql", "sql"),
    ("ms sql server", "sql"),
    ("oracle", "sql"),
    ("postgresql", "sql"),
    ("pandas", "py"),
    ("bash", "sh"),
    ("shell", "sh"),
    ("text", "txt"),
];

// Compiler labels such as "GNU C++17 (64)" or "PyPy 3.10 (7.3.15, 64bit)".
// Order matters: "javascript" has to win over "java".
const KEYWORDS: &[(&str, &str)] = &[
    ("c++", "cpp"),
    ("g++", "cpp"),
    ("clang++", "cpp"),
    ("c#", "cs"),
    ("mono", "cs"),
    ("pypy", "py"),
    ("python", "py"),
    ("javascript", "js"),
    ("node", "js"),
    ("typescript", "ts"),
    ("kotlin", "kt"),
    ("java", "java"),
    ("rust", "rs"),
    ("golang", "go"),
    ("haskell", "hs"),
    ("scala", "scala"),
    ("ruby", "rb"),
    ("php", "php"),
    ("perl", "pl"),
    ("pascal", "pas"),
    ("delphi", "pas"),
    ("ocaml", "ml"),
    ("swift", "swift"),
    ("dart", "dart"),
    ("gcc c", "c"),
];

pub fn language_extension(language: &str) -> &'static str {
    let language = language.trim().to_lowercase();
    if let Some((_, ext)) = EXTENSIONS.iter().find(|(name, _)| *name == language) {
        return ext;
    }

    if let Some((_, ext)) = KEYWORDS
        .iter()
        .find(|(keyword, _)| language.contains(keyword))
    {
        return ext;
    }

    let first_word = language.split_whitespace().next().unwrap_or_default();
    match first_word {
        "go" => "go",
        "c" | "c11" | "c17" => "c",
        _ => DEFAULT_EXTENSION,
    }
}
