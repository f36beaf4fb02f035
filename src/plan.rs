use crate::cli::{CommonArgs, PlanArgs};
use crate::error::{GfillError, Result};
use crate::model::{days_before, CommitPlan, DateRange, PlanEntry, PlanOutput, SCHEMA_VERSION};
use crate::util::{parse_date, Zone};
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use console::style;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt;

/// Length of the trailing window used when no `--start` is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 730;

/// How many commits each day of a range receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStrategy {
    /// Every day gets a count drawn uniformly from `min..=max`.
    Uniform { min: u32, max: u32 },
    /// Exactly `days` distinct dates, chosen with an RNG seeded by `seed`, get one commit each.
    SampledDays { days: usize, seed: u64 },
}

impl PlanStrategy {
    pub fn uniform(min: u32, max: u32) -> Result<Self> {
        if min == 0 || max == 0 {
            return Err(GfillError::Config(
                "per-day values must be positive integers.".to_string(),
            ));
        }
        if min > max {
            return Err(GfillError::Config(
                "--per-day-min must not exceed --per-day-max.".to_string(),
            ));
        }
        Ok(PlanStrategy::Uniform { min, max })
    }

    pub fn sampled(days: usize, seed: u64) -> Result<Self> {
        if days == 0 {
            return Err(GfillError::Config("--sample-size must be positive.".to_string()));
        }
        Ok(PlanStrategy::SampledDays { days, seed })
    }

    /// Build the plan for `range`. `rng` drives the uniform strategy; the sampled
    /// strategy always uses its own seeded generator.
    pub fn plan<R: Rng + ?Sized>(&self, range: &DateRange, rng: &mut R) -> Result<CommitPlan> {
        let days: Vec<NaiveDate> = range.days().collect();
        let counts: BTreeMap<NaiveDate, u32> = match *self {
            PlanStrategy::Uniform { min, max } => days
                .into_iter()
                .map(|day| (day, rng.gen_range(min..=max)))
                .collect(),
            PlanStrategy::SampledDays { days: wanted, seed } => {
                if days.len() < wanted {
                    return Err(GfillError::Config(format!(
                        "Range {range} has only {} days; need {wanted}.",
                        days.len()
                    )));
                }
                let mut seeded = StdRng::seed_from_u64(seed);
                let chosen = index::sample(&mut seeded, days.len(), wanted);
                let mut counts: BTreeMap<NaiveDate, u32> = days.iter().map(|d| (*d, 0)).collect();
                for i in chosen.iter() {
                    counts.insert(days[i], 1);
                }
                counts
            }
        };
        Ok(CommitPlan::from_counts(counts))
    }
}

impl fmt::Display for PlanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStrategy::Uniform { min, max } => write!(f, "uniform {min}..={max} per day"),
            PlanStrategy::SampledDays { days, seed } => {
                write!(f, "{days} sampled days (seed {seed})")
            }
        }
    }
}

/// Resolve the backfill window from optional `--start`/`--end` values.
///
/// Defaults to the trailing [`DEFAULT_WINDOW_DAYS`] ending yesterday.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    let start = match start {
        Some(s) => parse_date(s)?,
        None => days_before(today, DEFAULT_WINDOW_DAYS),
    };
    let end = match end {
        Some(e) => parse_date(e)?,
        None => days_before(today, 1),
    };
    DateRange::new(start, end, today)
}

/// Whole calendar year, clipped to yesterday for the current (or a future) year.
pub fn year_range(year: i32, today: NaiveDate) -> Result<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| GfillError::Config(format!("Invalid year {year}.")))?;
    let end = if year >= today.year() {
        days_before(today, 1)
    } else {
        NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| GfillError::Config(format!("Invalid year {year}.")))?
    };
    if end < start {
        return Err(GfillError::Config(format!(
            "No valid range for year {year}; end precedes start."
        )));
    }
    DateRange::new(start, end, today)
}

/// Strategy selected by the `plan`/`backfill` flags. The per-day bounds are
/// validated even when `--sample-size` picks the sampled strategy.
pub fn strategy_from_args(args: &PlanArgs) -> Result<PlanStrategy> {
    let uniform = PlanStrategy::uniform(args.per_day_min, args.per_day_max)?;
    match args.sample_size {
        Some(days) => PlanStrategy::sampled(days, args.seed),
        None => Ok(uniform),
    }
}

pub fn exec(common: CommonArgs, args: PlanArgs, json: bool) -> anyhow::Result<()> {
    let zone: Zone = common.timezone.parse()?;
    let strategy = strategy_from_args(&args)?;
    let range = resolve_range(args.start.as_deref(), args.end.as_deref(), zone.today())
        .context("Failed to resolve date range")?;
    let plan = strategy
        .plan(&range, &mut rand::thread_rng())
        .context("Failed to build commit plan")?;

    if json {
        output_json(&range, &strategy, &plan)?;
    } else {
        output_table(&range, &strategy, &plan);
    }
    Ok(())
}

fn output_json(
    range: &DateRange,
    strategy: &PlanStrategy,
    plan: &CommitPlan,
) -> anyhow::Result<()> {
    let output = PlanOutput {
        version: SCHEMA_VERSION,
        start: range.start,
        end: range.end,
        strategy: strategy.to_string(),
        total_commits: plan.total(),
        days: plan
            .iter()
            .map(|(date, commits)| PlanEntry { date, commits })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_table(range: &DateRange, strategy: &PlanStrategy, plan: &CommitPlan) {
    println!("{}", style("Commit Plan").bold());
    println!("{}", "─".repeat(50));
    println!("Range: {}", style(range).dim());
    println!("Strategy: {strategy}");
    println!();
    for (date, commits) in plan.iter().filter(|(_, c)| *c > 0) {
        println!("{date} {:>3} {}", commits, style("■".repeat(commits.min(20) as usize)).green());
    }
    println!();
    println!(
        "Total: {} commit(s) over {} of {} day(s)",
        style(plan.total()).cyan(),
        style(plan.active_days()).cyan(),
        plan.len()
    );
}
