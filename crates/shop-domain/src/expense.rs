//! Shop expenses and their optional recurrence schedule.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{calendar, common::*};

const MAX_OCCURRENCES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Base cadence of a schedule. Unrecognised values are preserved verbatim.
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Other(String),
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
            RecurrencePattern::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RecurrencePattern::Other(_))
    }
}

impl From<&str> for RecurrencePattern {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => RecurrencePattern::Daily,
            "weekly" => RecurrencePattern::Weekly,
            "monthly" => RecurrencePattern::Monthly,
            "yearly" => RecurrencePattern::Yearly,
            _ => RecurrencePattern::Other(value.to_string()),
        }
    }
}

impl From<String> for RecurrencePattern {
    fn from(value: String) -> Self {
        RecurrencePattern::from(value.as_str())
    }
}

impl From<RecurrencePattern> for String {
    fn from(value: RecurrencePattern) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Month/day anchor for yearly schedules.
pub struct YearDate {
    pub month: u32,
    pub day: u32,
}

impl YearDate {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// True when the pair names a real calendar day (Feb 29 included).
    pub fn is_valid(&self) -> bool {
        calendar::days_in_month(2024, self.month).is_some_and(|last| (1..=last).contains(&self.day))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Pattern-specific day selectors. Fields irrelevant to the pattern are ignored.
pub struct ScheduleSelector {
    /// 0 = Sunday .. 6 = Saturday.
    #[serde(default)]
    pub week_days: Vec<u8>,
    #[serde(default)]
    pub month_days: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_date: Option<YearDate>,
}

impl ScheduleSelector {
    pub fn week_days(days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            week_days: days.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn month_days(days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            month_days: days.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn year_date(month: u32, day: u32) -> Self {
        Self {
            year_date: Some(YearDate::new(month, day)),
            ..Self::default()
        }
    }

    /// Sorted, de-duplicated weekdays in `0..=6`.
    pub fn normalized_week_days(&self) -> Vec<u8> {
        normalize(&self.week_days, 0, 6)
    }

    /// Sorted, de-duplicated month days in `1..=31`.
    pub fn normalized_month_days(&self) -> Vec<u8> {
        normalize(&self.month_days, 1, 31)
    }

    pub fn valid_year_date(&self) -> Option<YearDate> {
        self.year_date.filter(YearDate::is_valid)
    }
}

fn normalize(values: &[u8], min: u8, max: u8) -> Vec<u8> {
    let mut out: Vec<u8> = values
        .iter()
        .copied()
        .filter(|value| (min..=max).contains(value))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Whether a schedule is currently producing occurrences.
pub enum ScheduleStatus {
    Active,
    Paused,
    Upcoming,
    Finished,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleStatus::Active => "Active",
            ScheduleStatus::Paused => "Paused",
            ScheduleStatus::Upcoming => "Upcoming",
            ScheduleStatus::Finished => "Finished",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleRangeError {
    EndBeforeStart,
}

impl fmt::Display for ScheduleRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleRangeError::EndBeforeStart => {
                f.write_str("schedule end date must not precede its start date")
            }
        }
    }
}

impl std::error::Error for ScheduleRangeError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Recurrence configuration embedded in an [`Expense`].
pub struct RecurringSchedule {
    pub pattern: RecurrencePattern,
    pub interval: u32,
    #[serde(default)]
    pub selector: ScheduleSelector,
    #[serde(default = "RecurringSchedule::default_active")]
    pub is_active: bool,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated: Option<NaiveDate>,
}

impl RecurringSchedule {
    pub fn new(pattern: RecurrencePattern, interval: u32, start_date: NaiveDate) -> Self {
        Self {
            pattern,
            interval,
            selector: ScheduleSelector::default(),
            is_active: true,
            start_date,
            end_date: None,
            last_generated: None,
        }
    }

    pub fn default_active() -> bool {
        true
    }

    pub fn with_selector(mut self, selector: ScheduleSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Result<Self, ScheduleRangeError> {
        self.set_end_date(Some(end_date))?;
        Ok(self)
    }

    pub fn set_end_date(&mut self, end_date: Option<NaiveDate>) -> Result<(), ScheduleRangeError> {
        if end_date.is_some_and(|end| end < self.start_date) {
            return Err(ScheduleRangeError::EndBeforeStart);
        }
        self.end_date = end_date;
        Ok(())
    }

    /// Interval as read by schedulers and formatters; zero counts as one.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }

    pub fn has_valid_range(&self) -> bool {
        self.end_date.map_or(true, |end| end >= self.start_date)
    }

    /// A past end date wins over the active flag.
    pub fn status(&self, today: NaiveDate) -> ScheduleStatus {
        if self.end_date.is_some_and(|end| end < today) {
            ScheduleStatus::Finished
        } else if !self.is_active {
            ScheduleStatus::Paused
        } else if self.start_date > today {
            ScheduleStatus::Upcoming
        } else {
            ScheduleStatus::Active
        }
    }

    pub fn is_in_effect(&self, today: NaiveDate) -> bool {
        self.status(today) == ScheduleStatus::Active
    }

    /// First occurrence strictly after `after`.
    pub fn next_occurrence(&self, after: NaiveDate) -> Option<NaiveDate> {
        self.first_on_or_after(after.succ_opt()?)
    }

    /// First occurrence on or after `from`, bounded by the start and end dates.
    /// Unknown patterns never produce occurrences.
    pub fn first_on_or_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        let from = from.max(self.start_date);
        if self.end_date.is_some_and(|end| from > end) {
            return None;
        }
        let step = self.effective_interval() as i64;
        let candidate = match &self.pattern {
            RecurrencePattern::Daily => {
                let diff = (from - self.start_date).num_days();
                let steps = (diff + step - 1) / step;
                Some(self.start_date + Duration::days(steps * step))
            }
            RecurrencePattern::Weekly => self.first_weekly(from, step),
            RecurrencePattern::Monthly => self.first_monthly(from, step),
            RecurrencePattern::Yearly => self.first_yearly(from, step),
            RecurrencePattern::Other(_) => None,
        }?;
        match self.end_date {
            Some(end) if candidate > end => None,
            _ => Some(candidate),
        }
    }

    /// Every occurrence in `from..=to`, capped to keep runaway ranges bounded.
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut cursor = self.first_on_or_after(from);
        while let Some(date) = cursor {
            if date > to || dates.len() >= MAX_OCCURRENCES {
                break;
            }
            dates.push(date);
            cursor = self.next_occurrence(date);
        }
        dates
    }

    fn first_weekly(&self, from: NaiveDate, step: i64) -> Option<NaiveDate> {
        let mut days = self.selector.normalized_week_days();
        if days.is_empty() {
            days.push(self.start_date.weekday().num_days_from_sunday() as u8);
        }
        let anchor = calendar::week_start_sunday(self.start_date);
        let weeks = (from - anchor).num_days() / 7;
        let mut block = calendar::align_down(weeks, step);
        for _ in 0..3 {
            let week_start = anchor + Duration::weeks(block);
            let hit = days
                .iter()
                .map(|day| week_start + Duration::days(*day as i64))
                .find(|candidate| *candidate >= from);
            if hit.is_some() {
                return hit;
            }
            block += step;
        }
        None
    }

    fn first_monthly(&self, from: NaiveDate, step: i64) -> Option<NaiveDate> {
        let mut days = self.selector.normalized_month_days();
        if days.is_empty() {
            days.push(self.start_date.day() as u8);
        }
        let anchor = calendar::month_index(self.start_date);
        let offset = calendar::month_index(from) - anchor;
        let mut block = anchor + calendar::align_down(offset, step);
        for _ in 0..3 {
            let (year, month) = calendar::year_month(block);
            // Clamping can fold several selectors onto the month end; keep order.
            let mut candidates: Vec<NaiveDate> = days
                .iter()
                .filter_map(|day| calendar::clamped_date(year, month, *day as u32))
                .collect();
            candidates.dedup();
            if let Some(hit) = candidates.into_iter().find(|candidate| *candidate >= from) {
                return Some(hit);
            }
            block += step;
        }
        None
    }

    fn first_yearly(&self, from: NaiveDate, step: i64) -> Option<NaiveDate> {
        let anchor_date = self
            .selector
            .valid_year_date()
            .unwrap_or_else(|| YearDate::new(self.start_date.month(), self.start_date.day()));
        let offset = (from.year() - self.start_date.year()) as i64;
        let mut year = self.start_date.year() as i64 + calendar::align_down(offset, step);
        for _ in 0..3 {
            let candidate = calendar::clamped_date(year as i32, anchor_date.month, anchor_date.day)?;
            if candidate >= from {
                return Some(candidate);
            }
            year += step;
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurringSchedule>,
    /// Set on expenses generated from a recurring parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            category: category.into(),
            date,
            notes: None,
            recurrence: None,
            parent_id: None,
            created_at,
        }
    }

    pub fn with_recurrence(mut self, schedule: RecurringSchedule) -> Self {
        self.recurrence = Some(schedule);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Concrete expense for one occurrence of this recurring expense.
    pub fn occurrence(&self, date: NaiveDate, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            description: self.description.clone(),
            amount: self.amount,
            category: self.category.clone(),
            date,
            notes: self.notes.clone(),
            recurrence: None,
            parent_id: Some(self.id),
            created_at,
        }
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        format!("{} ({})", self.description, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pattern_keeps_unknown_values() {
        assert_eq!(RecurrencePattern::from("Weekly"), RecurrencePattern::Weekly);
        assert_eq!(
            RecurrencePattern::from("bogus"),
            RecurrencePattern::Other("bogus".into())
        );
        let json = serde_json::to_string(&RecurrencePattern::Monthly).unwrap();
        assert_eq!(json, "\"monthly\"");
    }

    #[test]
    fn selectors_are_normalized() {
        let selector = ScheduleSelector::week_days([5, 1, 9, 1, 0]);
        assert_eq!(selector.normalized_week_days(), vec![0, 1, 5]);
        let selector = ScheduleSelector::month_days([31, 0, 15, 15]);
        assert_eq!(selector.normalized_month_days(), vec![15, 31]);
        assert!(ScheduleSelector::year_date(2, 30).valid_year_date().is_none());
        assert!(ScheduleSelector::year_date(2, 29).valid_year_date().is_some());
    }

    #[test]
    fn end_date_before_start_is_rejected() {
        let schedule = RecurringSchedule::new(RecurrencePattern::Daily, 1, date(2026, 5, 10));
        assert_eq!(
            schedule.with_end_date(date(2026, 5, 9)),
            Err(ScheduleRangeError::EndBeforeStart)
        );
    }

    #[test]
    fn past_end_date_means_finished_even_when_active() {
        let schedule = RecurringSchedule::new(RecurrencePattern::Monthly, 1, date(2026, 1, 1))
            .with_end_date(date(2026, 6, 30))
            .unwrap();
        assert!(schedule.is_active);
        assert_eq!(schedule.status(date(2026, 7, 1)), ScheduleStatus::Finished);
        assert_eq!(schedule.status(date(2026, 6, 30)), ScheduleStatus::Active);
        assert_eq!(schedule.status(date(2025, 12, 1)), ScheduleStatus::Upcoming);

        let mut paused = schedule.clone();
        paused.is_active = false;
        assert_eq!(paused.status(date(2026, 3, 1)), ScheduleStatus::Paused);
        assert!(!paused.is_in_effect(date(2026, 3, 1)));
    }

    #[test]
    fn daily_schedule_steps_by_interval() {
        let schedule = RecurringSchedule::new(RecurrencePattern::Daily, 3, date(2026, 1, 1));
        assert_eq!(
            schedule.occurrences_between(date(2026, 1, 2), date(2026, 1, 12)),
            vec![date(2026, 1, 4), date(2026, 1, 7), date(2026, 1, 10)]
        );
    }

    #[test]
    fn weekly_schedule_uses_selected_days_every_other_week() {
        // 2026-01-05 is a Monday; blocks start on Sunday 2026-01-04.
        let schedule = RecurringSchedule::new(RecurrencePattern::Weekly, 2, date(2026, 1, 5))
            .with_selector(ScheduleSelector::week_days([1, 3]));
        assert_eq!(
            schedule.occurrences_between(date(2026, 1, 1), date(2026, 1, 31)),
            vec![
                date(2026, 1, 5),
                date(2026, 1, 7),
                date(2026, 1, 19),
                date(2026, 1, 21),
            ]
        );
    }

    #[test]
    fn monthly_schedule_clamps_to_month_end() {
        let schedule = RecurringSchedule::new(RecurrencePattern::Monthly, 1, date(2026, 1, 1))
            .with_selector(ScheduleSelector::month_days([15, 31]));
        assert_eq!(
            schedule.occurrences_between(date(2026, 2, 1), date(2026, 3, 20)),
            vec![date(2026, 2, 15), date(2026, 2, 28), date(2026, 3, 15)]
        );
    }

    #[test]
    fn yearly_schedule_respects_interval_and_end() {
        let schedule = RecurringSchedule::new(RecurrencePattern::Yearly, 2, date(2024, 1, 1))
            .with_selector(ScheduleSelector::year_date(2, 29))
            .with_end_date(date(2029, 1, 1))
            .unwrap();
        assert_eq!(
            schedule.occurrences_between(date(2024, 1, 1), date(2030, 12, 31)),
            vec![date(2024, 2, 29), date(2026, 2, 28), date(2028, 2, 29)]
        );
    }

    #[test]
    fn unknown_pattern_has_no_occurrences() {
        let schedule = RecurringSchedule::new(
            RecurrencePattern::Other("fortnightly".into()),
            1,
            date(2026, 1, 1),
        );
        assert_eq!(schedule.first_on_or_after(date(2026, 1, 1)), None);
    }

    #[test]
    fn occurrence_links_back_to_parent() {
        let created = DateTime::<Utc>::from_naive_utc_and_offset(
            date(2026, 1, 1).and_hms_opt(8, 0, 0).unwrap(),
            Utc,
        );
        let parent = Expense::new("Rent", 900.0, "premises", date(2026, 1, 1), created);
        let child = parent.occurrence(date(2026, 2, 1), created);
        assert_eq!(child.parent_id, Some(parent.id));
        assert!(child.recurrence.is_none());
        assert_eq!(child.amount, 900.0);
    }
}
