//! # Tag Version Strategies
//!
//! Decide which git or docker tags are versions and how versions order.
//!
//! | strategy | accepted tags | ordered by |
//! |---|---|---|
//! | `increasing-tag` | `42` | the integer |
//! | `semver-tag` | `1.2.3`, `v1.2.3-rc.1` | semver precedence |
//! | `branch-job-commit-by-job` | `master-h12.a1b2c3d` | the job number |
//! | `semver-job-commit-by-job` | `v1.2.3-h12.a1b2c3d` | the job number |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static BRANCH_JOB_COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.]+-h(?P<job>\d+)\.[0-9a-fA-F]+$")
        .expect("Failed to compile branch-job-commit regex - this should never happen")
});

static SEMVER_JOB_COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(?P<version>\d+\.\d+\.\d+)-h(?P<job>\d+)\.[0-9a-fA-F]+$")
        .expect("Failed to compile semver-job-commit regex - this should never happen")
});

/// How tags of an artifact are turned into ordered versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagVersionStrategy {
    IncreasingTag,
    #[default]
    SemverTag,
    BranchJobCommitByJob,
    SemverJobCommitByJob,
}

/// Sortable form of a valid tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagKey {
    Number(u64),
    Semver(semver::Version),
}

impl TagVersionStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TagVersionStrategy::IncreasingTag => "increasing-tag",
            TagVersionStrategy::SemverTag => "semver-tag",
            TagVersionStrategy::BranchJobCommitByJob => "branch-job-commit-by-job",
            TagVersionStrategy::SemverJobCommitByJob => "semver-job-commit-by-job",
        }
    }

    /// Sort key of `tag`, or `None` when the strategy does not accept it
    #[must_use]
    pub fn key(&self, tag: &str) -> Option<TagKey> {
        match self {
            TagVersionStrategy::IncreasingTag => tag.parse::<u64>().ok().map(TagKey::Number),
            TagVersionStrategy::SemverTag => {
                let trimmed = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
                semver::Version::parse(trimmed).ok().map(TagKey::Semver)
            }
            TagVersionStrategy::BranchJobCommitByJob => job_number(&BRANCH_JOB_COMMIT, tag),
            TagVersionStrategy::SemverJobCommitByJob => job_number(&SEMVER_JOB_COMMIT, tag),
        }
    }

    #[must_use]
    pub fn is_valid(&self, tag: &str) -> bool {
        self.key(tag).is_some()
    }

    /// Ascending order of two tags; invalid tags sort before every valid one
    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }

    /// Keep the valid items and order them newest first
    pub fn newest_first<T, F>(&self, items: Vec<T>, tag_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        let mut keyed: Vec<(TagKey, T)> = items
            .into_iter()
            .filter_map(|item| self.key(tag_of(&item)).map(|key| (key, item)))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
        keyed.into_iter().map(|(_, item)| item).collect()
    }
}

fn job_number(pattern: &Regex, tag: &str) -> Option<TagKey> {
    pattern
        .captures(tag)
        .and_then(|captures| captures.name("job"))
        .and_then(|job| job.as_str().parse::<u64>().ok())
        .map(TagKey::Number)
}

impl fmt::Display for TagVersionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
