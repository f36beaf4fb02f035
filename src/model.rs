use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::GfillError;

pub const SCHEMA_VERSION: u32 = 1;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Inclusive calendar date window. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range that ends strictly before `today`.
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> crate::error::Result<Self> {
        if end >= today {
            return Err(GfillError::Config("End date must be earlier than today.".to_string()));
        }
        if start > end {
            return Err(GfillError::Config(format!(
                "Start date ({start}) must not be later than end date ({end})."
            )));
        }
        Ok(Self { start, end })
    }

    pub fn num_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Per-day commit counts. Built once by a planning strategy and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    days: BTreeMap<NaiveDate, u32>,
}

impl CommitPlan {
    pub(crate) fn from_counts(days: BTreeMap<NaiveDate, u32>) -> Self {
        Self { days }
    }

    pub fn get(&self, day: NaiveDate) -> Option<u32> {
        self.days.get(&day).copied()
    }

    /// Entries in increasing date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.days.iter().map(|(day, count)| (*day, *count))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.days.values().map(|c| *c as u64).sum()
    }

    pub fn active_days(&self) -> usize {
        self.days.values().filter(|c| **c > 0).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub date: NaiveDate,
    pub commits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutput {
    pub version: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub strategy: String,
    pub total_commits: u64,
    pub days: Vec<PlanEntry>,
}

/// Inclusive hour-of-day window used for fabricated timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start: u32,
    pub end: u32,
}

impl WorkHours {
    pub fn new(start: u32, end: u32) -> crate::error::Result<Self> {
        if start > 23 || end > 23 || end < start {
            return Err(GfillError::Config(format!(
                "Invalid work-hours '{start}-{end}'; ensure 0 <= H0 <= H1 <= 23."
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour <= self.end
    }
}

impl Default for WorkHours {
    fn default() -> Self {
        Self { start: 10, end: 19 }
    }
}

impl FromStr for WorkHours {
    type Err = GfillError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (start, end) = spec.split_once('-').ok_or_else(|| {
            GfillError::Config(format!("Invalid work-hours '{spec}'; expected H0-H1."))
        })?;
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                GfillError::Config(format!("Invalid work-hours '{spec}'; hours must be integers."))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for WorkHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One commit to be stamped with a synthetic author/committer date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricatedCommit {
    pub date: NaiveDate,
    pub index: u32,
    pub of: u32,
    pub timestamp: DateTime<FixedOffset>,
}

impl FabricatedCommit {
    pub fn message(&self) -> String {
        format!("backfill: {} ({}/{})", self.date, self.index, self.of)
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The line appended to the tracked file for this commit.
    pub fn log_line(&self) -> String {
        format!("{} {}/{} {}\n", self.date, self.index, self.of, self.timestamp_string())
    }
}

/// A fixed code sample shipped as its own pull request.
#[derive(Debug, Clone, Copy)]
pub struct Snippet {
    pub branch: &'static str,
    pub path: &'static str,
    pub content: &'static str,
    pub commit_message: &'static str,
    pub pr_title: &'static str,
    pub pr_body: &'static str,
    pub executable: bool,
}

impl Snippet {
    pub fn path(&self) -> &Path {
        Path::new(self.path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IssueTemplate {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
}

impl MergeMethod {
    pub fn flag(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "--merge",
            MergeMethod::Squash => "--squash",
        }
    }
}

/// A pull request that was opened, or under dry-run one that would have been.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestRef {
    Opened { number: u64, url: String },
    Planned { head: String },
}

impl PullRequestRef {
    /// Argument accepted by `gh pr merge` to identify this request.
    pub fn selector(&self) -> String {
        match self {
            PullRequestRef::Opened { number, .. } => number.to_string(),
            PullRequestRef::Planned { head } => head.clone(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PullRequestRef::Opened { url, .. } => Some(url),
            PullRequestRef::Planned { .. } => None,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullRequestRef::Opened { number, .. } => write!(f, "#{number}"),
            PullRequestRef::Planned { head } => write!(f, "<{head}>"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: u32,
    pub dry_run: bool,
    pub commits: u64,
    pub branches: Vec<String>,
    pub pull_requests: Vec<String>,
    pub issues: Vec<String>,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            version: SCHEMA_VERSION,
            dry_run,
            ..Self::default()
        }
    }
}

pub fn days_before(day: NaiveDate, days: i64) -> NaiveDate {
    day - Duration::days(days)
}
