//! Turns a page into a [`SubmissionRecord`].
//!
//! Every platform is described by a [`PlatformProfile`]: a list of success
//! signals, any one of which marks the page as accepted, and per-field lists of
//! strategies tried in order until one yields a non-empty value.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

use regex::Regex;
use shared::{slugify, Difficulty, Platform, SubmissionRecord, DEFAULT_LANGUAGE};
use tracing::{debug, trace};

use crate::page::Document;

pub mod codechef;
pub mod codeforces;
pub mod generic;
pub mod leetcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no source code found on the page")]
    MissingCode,
    #[error("no problem identifier found on the page")]
    MissingProblemId,
}

#[derive(Debug, Clone, Copy)]
pub enum SuccessSignal {
    /// Any element matches the selector.
    Element(&'static str),
    /// An element matching the selector contains the text.
    ElementText(&'static str, &'static str),
    ClassContains(&'static str),
    Text(&'static str),
}

impl SuccessSignal {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            SuccessSignal::Element(selector) => doc.has(selector),
            SuccessSignal::ElementText(selector, text) => doc.element_contains(selector, text),
            SuccessSignal::ClassContains(needle) => doc.class_contains(needle),
            SuccessSignal::Text(needle) => doc.body_contains(needle),
        }
    }
}

#[derive(Clone, Copy)]
pub enum FieldStrategy {
    Text(&'static str),
    Attr(&'static str, &'static str),
    Meta(&'static str),
    Derived(fn(&Document) -> Option<String>),
}

impl FieldStrategy {
    pub fn apply(&self, doc: &Document) -> Option<String> {
        let value = match self {
            FieldStrategy::Text(selector) => doc.text(selector),
            FieldStrategy::Attr(selector, attr) => doc.attr(selector, attr),
            FieldStrategy::Meta(property) => doc.meta(property),
            FieldStrategy::Derived(derive) => derive(doc),
        };
        value.filter(|value| !value.trim().is_empty())
    }
}

/// First strategy with a non-empty answer wins.
pub fn first_match(strategies: &[FieldStrategy], doc: &Document) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy.apply(doc))
}

pub struct PlatformProfile {
    pub platform: Platform,
    pub success: &'static [SuccessSignal],
    pub problem_id: &'static [FieldStrategy],
    pub code: &'static [FieldStrategy],
    pub language: &'static [FieldStrategy],
    pub difficulty: &'static [FieldStrategy],
    pub title: &'static [FieldStrategy],
}

pub fn profile(platform: Platform) -> &'static PlatformProfile {
    match platform {
        Platform::Leetcode => &leetcode::PROFILE,
        Platform::Codeforces => &codeforces::PROFILE,
        Platform::Codechef => &codechef::PROFILE,
        Platform::Unknown => &generic::PROFILE,
    }
}

pub struct Extractor {
    profile: &'static PlatformProfile,
    allow_synthetic_id: bool,
}

impl Extractor {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            profile: profile(platform),
            allow_synthetic_id: true,
        }
    }

    /// When disabled, a page without any problem identifier is dropped instead
    /// of being saved under a time-based name.
    pub fn with_synthetic_id(mut self, allow: bool) -> Self {
        self.allow_synthetic_id = allow;
        self
    }

    pub fn platform(&self) -> Platform {
        self.profile.platform
    }

    /// Pure: the same page always gives the same answer.
    pub fn is_successful_submission(&self, doc: &Document) -> bool {
        self.profile.success.iter().any(|signal| signal.matches(doc))
    }

    pub fn extract(&self, doc: &Document) -> Result<SubmissionRecord, ExtractError> {
        let profile = self.profile;
        let code = first_match(profile.code, doc).ok_or(ExtractError::MissingCode)?;

        let problem_id = match first_match(profile.problem_id, doc)
            .map(|id| slugify(&id))
            .filter(|id| !id.is_empty())
        {
            Some(id) => id,
            None if self.allow_synthetic_id => {
                let id = synthetic_id(profile.platform, doc.url(), &code);
                debug!("No problem id on the page, using {id}");
                id
            }
            None => return Err(ExtractError::MissingProblemId),
        };

        let language = first_match(profile.language, doc).unwrap_or_else(|| {
            trace!("No language on the page");
            DEFAULT_LANGUAGE.to_string()
        });
        let difficulty = first_match(profile.difficulty, doc).and_then(|d| Difficulty::parse(&d));
        let title = first_match(profile.title, doc);

        Ok(
            SubmissionRecord::new(profile.platform, &problem_id, code, &language)
                .with_difficulty(difficulty)
                .with_title(title),
        )
    }
}

/// Stable for a given page and source, so re-detecting the same submission
/// maps to the same file.
pub fn synthetic_id(platform: Platform, url: &str, code: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    code.hash(&mut hasher);
    format!("{platform}-{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}

pub(crate) fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Last non-empty segment of the page path.
pub(crate) fn last_path_segment(doc: &Document) -> Option<String> {
    doc.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Joins the text of every match, one per line. Code editors render each
/// source line as its own element.
pub(crate) fn joined_lines(doc: &Document, selector: &str) -> Option<String> {
    let lines = doc.texts_raw(selector);
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n").replace('\u{a0}', " "))
}
