//! Date filtering, bucketing, and income/expense/profit totals.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::ledger::{
    dates::{
        format_short_date, is_same_day, is_same_month, is_same_week, is_same_year,
        month_short_name, month_start, parse_iso_date, quarter, quarter_start, to_iso_date,
        week_start, year_start,
    },
    ClosedDaySet, LedgerEntry,
};

/// Income, expense, and profit accumulated over a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
}

impl Summary {
    /// Folds one entry in; `profit` is kept consistent after every call.
    pub fn add(&mut self, entry: &LedgerEntry) {
        let amount = entry.effective_amount();
        if entry.is_income() {
            self.income += amount;
        } else {
            self.expense += amount;
        }
        self.profit = self.income - self.expense;
    }
}

/// Granularity used when bucketing entries for trends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    All,
}

impl GroupMode {
    pub const ALL_MODES: [GroupMode; 6] = [
        GroupMode::Daily,
        GroupMode::Weekly,
        GroupMode::Monthly,
        GroupMode::Quarterly,
        GroupMode::Yearly,
        GroupMode::All,
    ];

    /// Unrecognized names fall back to monthly.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => GroupMode::Daily,
            "weekly" => GroupMode::Weekly,
            "quarterly" => GroupMode::Quarterly,
            "yearly" => GroupMode::Yearly,
            "all" => GroupMode::All,
            _ => GroupMode::Monthly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupMode::Daily => "daily",
            GroupMode::Weekly => "weekly",
            GroupMode::Monthly => "monthly",
            GroupMode::Quarterly => "quarterly",
            GroupMode::Yearly => "yearly",
            GroupMode::All => "all",
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals for one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub key: String,
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
    /// First day of the bucket; buckets are ordered by this value.
    pub anchor: NaiveDate,
}

impl BucketSummary {
    fn open(key: String, label: String, anchor: NaiveDate) -> Self {
        Self {
            key,
            label,
            income: 0.0,
            expense: 0.0,
            profit: 0.0,
            anchor,
        }
    }

    fn add(&mut self, entry: &LedgerEntry) {
        let amount = entry.effective_amount();
        if entry.is_income() {
            self.income += amount;
        } else {
            self.expense += amount;
        }
        self.profit = self.income - self.expense;
    }

    /// Numeric ordering value: days since the common era.
    pub fn sort_value(&self) -> i32 {
        self.anchor.num_days_from_ce()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            income: self.income,
            expense: self.expense,
            profit: self.profit,
        }
    }
}

/// Optional inclusive date bounds; `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRange {
    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            from: clean(from),
            to: clean(to),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// First day of the current month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            from: Some(to_iso_date(month_start(today))),
            to: Some(to_iso_date(today)),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn title(&self) -> String {
        if self.is_unbounded() {
            return "All time".to_string();
        }
        format!(
            "From {} to {}",
            self.from.as_deref().unwrap_or("start"),
            self.to.as_deref().unwrap_or("end")
        )
    }
}

/// Summary cards for the periods containing a reference day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodSummaries {
    pub today: Summary,
    pub week: Summary,
    pub month: Summary,
    pub year: Summary,
}

/// Totals and trend buckets for a user-selected range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub title: String,
    pub range: DateRange,
    pub mode: GroupMode,
    pub entry_count: usize,
    pub summary: Summary,
    pub buckets: Vec<BucketSummary>,
}

pub struct SummaryService;

impl SummaryService {
    /// Entries within the inclusive `[from, to]` bounds, ordered by ascending date.
    ///
    /// With no bounds every entry is returned, entries with unreadable dates
    /// first. With any bound, entries with unreadable dates are dropped. A bound
    /// that does not parse is treated as open. Ties keep their input order.
    pub fn filter_entries_by_date_range(
        entries: &[LedgerEntry],
        from: Option<&str>,
        to: Option<&str>,
    ) -> Vec<LedgerEntry> {
        let from = from.map(str::trim).filter(|v| !v.is_empty());
        let to = to.map(str::trim).filter(|v| !v.is_empty());

        if from.is_none() && to.is_none() {
            let mut all = entries.to_vec();
            all.sort_by_key(LedgerEntry::parsed_date);
            return all;
        }

        let from = from.and_then(parse_iso_date);
        let to = to.and_then(parse_iso_date);

        let mut selected: Vec<(NaiveDate, LedgerEntry)> = entries
            .iter()
            .filter_map(|entry| {
                let date = entry.parsed_date()?;
                if from.is_some_and(|start| date < start) || to.is_some_and(|end| date > end) {
                    return None;
                }
                Some((date, entry.clone()))
            })
            .collect();
        selected.sort_by_key(|(date, _)| *date);
        selected.into_iter().map(|(_, entry)| entry).collect()
    }

    pub fn filter_range(entries: &[LedgerEntry], range: &DateRange) -> Vec<LedgerEntry> {
        Self::filter_entries_by_date_range(entries, range.from.as_deref(), range.to.as_deref())
    }

    pub fn compute_summary<'a, I>(entries: I) -> Summary
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries
            .into_iter()
            .fold(Summary::default(), |mut acc, entry| {
                acc.add(entry);
                acc
            })
    }

    /// Buckets entries by `mode`, emitted in chronological order.
    /// Entries with unreadable dates are skipped.
    pub fn group_entries_by_mode(entries: &[LedgerEntry], mode: GroupMode) -> Vec<BucketSummary> {
        let mut buckets: HashMap<String, BucketSummary> = HashMap::new();

        for entry in entries {
            let Some(date) = entry.parsed_date() else {
                continue;
            };
            let (key, label, anchor) = bucket_identity(date, mode);
            let bucket = buckets
                .entry(key.clone())
                .or_insert_with(|| BucketSummary::open(key, label, anchor));
            if anchor < bucket.anchor {
                bucket.anchor = anchor;
            }
            bucket.add(entry);
        }

        let mut ordered: Vec<BucketSummary> = buckets.into_values().collect();
        ordered.sort_by(|a, b| a.anchor.cmp(&b.anchor).then_with(|| a.key.cmp(&b.key)));
        ordered
    }

    /// Days in the last `lookback_days` (today first) with no entry and not closed.
    /// The window stops at the earliest representable date.
    pub fn find_missing_days(
        entries: &[LedgerEntry],
        closed_days: &ClosedDaySet,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Vec<String> {
        let recorded: HashSet<String> = entries
            .iter()
            .map(|entry| match entry.parsed_date() {
                Some(date) => to_iso_date(date),
                None => entry.date.trim().to_string(),
            })
            .collect();

        (0..i64::from(lookback_days))
            .map_while(|offset| today.checked_sub_signed(Duration::days(offset)))
            .map(to_iso_date)
            .filter(|day| !recorded.contains(day) && !closed_days.contains(day))
            .collect()
    }

    pub fn period_summaries(entries: &[LedgerEntry], today: NaiveDate) -> PeriodSummaries {
        let mut cards = PeriodSummaries::default();
        for entry in entries {
            let Some(date) = entry.parsed_date() else {
                continue;
            };
            if is_same_day(date, today) {
                cards.today.add(entry);
            }
            if is_same_week(date, today) {
                cards.week.add(entry);
            }
            if is_same_month(date, today) {
                cards.month.add(entry);
            }
            if is_same_year(date, today) {
                cards.year.add(entry);
            }
        }
        cards
    }

    pub fn range_report(entries: &[LedgerEntry], range: &DateRange, mode: GroupMode) -> RangeReport {
        let selected = Self::filter_range(entries, range);
        RangeReport {
            title: range.title(),
            range: range.clone(),
            mode,
            entry_count: selected.len(),
            summary: Self::compute_summary(&selected),
            buckets: Self::group_entries_by_mode(&selected, mode),
        }
    }

    /// Newest entries first by date, at most `limit` of them.
    pub fn recent_entries(entries: &[LedgerEntry], limit: usize) -> Vec<&LedgerEntry> {
        let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| b.parsed_date().cmp(&a.parsed_date()));
        sorted.truncate(limit);
        sorted
    }
}

fn bucket_identity(date: NaiveDate, mode: GroupMode) -> (String, String, NaiveDate) {
    let year = date.year();
    match mode {
        GroupMode::Daily => (to_iso_date(date), format_short_date(date), date),
        GroupMode::Weekly => {
            let monday = week_start(date);
            (
                to_iso_date(monday),
                format!("Week of {}", format_short_date(monday)),
                monday,
            )
        }
        GroupMode::Monthly => (
            format!("{year}-{:02}", date.month()),
            format!("{} {year}", month_short_name(date.month())),
            month_start(date),
        ),
        GroupMode::Quarterly => {
            let q = quarter(date);
            (format!("{year}-Q{q}"), format!("Q{q} {year}"), quarter_start(date))
        }
        GroupMode::Yearly => (year.to_string(), year.to_string(), year_start(date)),
        GroupMode::All => ("all".to_string(), "All time".to_string(), date),
    }
}
