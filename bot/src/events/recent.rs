use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::Mutex,
    time::{Duration, Instant},
};

use shared::{Platform, SubmissionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    platform: Platform,
    problem_id: String,
    language: String,
    code_hash: u64,
}

impl From<&SubmissionRecord> for Fingerprint {
    fn from(record: &SubmissionRecord) -> Self {
        let mut hasher = DefaultHasher::new();
        record.code.hash(&mut hasher);
        Self {
            platform: record.platform,
            problem_id: record.problem_id.clone(),
            language: record.language.clone(),
            code_hash: hasher.finish(),
        }
    }
}

/// Submissions processed (or being processed) within the last `window`.
pub struct RecentSubmissions {
    window: Duration,
    seen: Mutex<HashMap<Fingerprint, Instant>>,
}

impl RecentSubmissions {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `false` if the fingerprint was claimed within the window.
    pub fn claim(&self, fingerprint: &Fingerprint) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.retain(|_, at| now.duration_since(*at) < self.window);

        if seen.contains_key(fingerprint) {
            return false;
        }
        seen.insert(fingerprint.clone(), now);
        true
    }

    /// Forgets a claim so the next detection is processed again.
    pub fn release(&self, fingerprint: &Fingerprint) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(fingerprint);
    }
}
