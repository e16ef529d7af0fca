//! Services related to recurring expense maintenance.

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use shop_domain::{Expense, RecurrencePattern, RecurringSchedule};

use crate::{time::Clock, CoreError};

/// One expected payment of a recurring expense.
#[derive(Debug, Clone, PartialEq)]
pub struct DueExpense {
    pub expense_id: Uuid,
    pub description: String,
    pub amount: f64,
    pub due_date: NaiveDate,
}

/// Provides safe helpers for modifying recurrence data on expenses.
pub struct RecurringExpenseService;

impl RecurringExpenseService {
    /// Checks a schedule before it is stored. Readers stay lenient; writers do not.
    pub fn validate(schedule: &RecurringSchedule) -> Result<(), CoreError> {
        if !schedule.pattern.is_known() {
            return Err(CoreError::Validation(format!(
                "unknown recurrence pattern `{}`",
                schedule.pattern
            )));
        }
        if schedule.interval == 0 {
            return Err(CoreError::Validation("interval must be at least 1".into()));
        }
        if !schedule.has_valid_range() {
            return Err(CoreError::Validation(
                "schedule end date must not precede its start date".into(),
            ));
        }
        let selector = &schedule.selector;
        match schedule.pattern {
            RecurrencePattern::Weekly if selector.week_days.iter().any(|day| *day > 6) => Err(
                CoreError::Validation("week days must be between 0 and 6".into()),
            ),
            RecurrencePattern::Monthly
                if selector.month_days.iter().any(|day| !(1..=31).contains(day)) =>
            {
                Err(CoreError::Validation(
                    "month days must be between 1 and 31".into(),
                ))
            }
            RecurrencePattern::Yearly
                if selector.year_date.is_some() && selector.valid_year_date().is_none() =>
            {
                Err(CoreError::Validation("yearly date is not a calendar day".into()))
            }
            _ => Ok(()),
        }
    }

    /// Assigns or replaces the schedule of an expense.
    pub fn set_schedule(expense: &mut Expense, schedule: RecurringSchedule) -> Result<(), CoreError> {
        Self::validate(&schedule)?;
        expense.recurrence = Some(schedule);
        Ok(())
    }

    /// Clears the schedule, returning whether one was present.
    pub fn clear_schedule(expense: &mut Expense) -> bool {
        expense.recurrence.take().is_some()
    }

    pub fn set_active(expense: &mut Expense, active: bool) -> Result<(), CoreError> {
        let schedule = schedule_mut(expense)?;
        schedule.is_active = active;
        Ok(())
    }

    pub fn set_end_date(expense: &mut Expense, end_date: Option<NaiveDate>) -> Result<(), CoreError> {
        let schedule = schedule_mut(expense)?;
        schedule.set_end_date(end_date)?;
        Ok(())
    }

    /// Generates concrete expenses for every occurrence after the last generated
    /// one, up to and including `through`, and advances the marker.
    /// Paused schedules generate nothing.
    pub fn materialize_due(
        expense: &mut Expense,
        through: NaiveDate,
        clock: &dyn Clock,
    ) -> Result<Vec<Expense>, CoreError> {
        let schedule = expense
            .recurrence
            .as_ref()
            .ok_or_else(|| CoreError::InvalidOperation("expense has no recurrence".into()))?;
        if !schedule.is_active {
            return Ok(Vec::new());
        }
        let from = match schedule.last_generated {
            Some(last) => match last.succ_opt() {
                Some(next) => next,
                None => return Ok(Vec::new()),
            },
            None => schedule.start_date,
        };
        let dates = schedule.occurrences_between(from, through);
        let now = clock.now();
        let generated: Vec<Expense> = dates
            .iter()
            .map(|date| expense.occurrence(*date, now))
            .collect();

        if let (Some(last), Some(schedule)) = (dates.last(), expense.recurrence.as_mut()) {
            schedule.last_generated = Some(*last);
        }
        debug!(
            expense = %expense.id,
            generated = generated.len(),
            "materialized recurring expense"
        );
        Ok(generated)
    }

    /// Occurrences of all in-effect recurring expenses within `from..=to`, by date.
    pub fn due_between(expenses: &[Expense], from: NaiveDate, to: NaiveDate) -> Vec<DueExpense> {
        let mut due: Vec<DueExpense> = expenses
            .iter()
            .filter_map(|expense| expense.recurrence.as_ref().map(|s| (expense, s)))
            .filter(|(_, schedule)| schedule.is_active)
            .flat_map(|(expense, schedule)| {
                schedule
                    .occurrences_between(from, to)
                    .into_iter()
                    .map(move |due_date| DueExpense {
                        expense_id: expense.id,
                        description: expense.description.clone(),
                        amount: expense.amount,
                        due_date,
                    })
            })
            .collect();
        due.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.description.cmp(&b.description))
        });
        due
    }
}

fn schedule_mut(expense: &mut Expense) -> Result<&mut RecurringSchedule, CoreError> {
    expense
        .recurrence
        .as_mut()
        .ok_or_else(|| CoreError::InvalidOperation("expense has no recurrence".into()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shop_domain::ScheduleSelector;

    use super::*;
    use crate::time::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap())
    }

    fn rent() -> Expense {
        let schedule = RecurringSchedule::new(RecurrencePattern::Monthly, 1, date(2026, 1, 1))
            .with_selector(ScheduleSelector::month_days([1]));
        Expense::new("Rent", 950.0, "premises", date(2026, 1, 1), clock().0)
            .with_recurrence(schedule)
    }

    #[test]
    fn validate_rejects_unknown_pattern_and_bad_selectors() {
        let start = date(2026, 1, 1);
        let unknown = RecurringSchedule::new(RecurrencePattern::from("hourly"), 1, start);
        assert!(matches!(
            RecurringExpenseService::validate(&unknown),
            Err(CoreError::Validation(_))
        ));

        let zero = RecurringSchedule::new(RecurrencePattern::Daily, 0, start);
        assert!(RecurringExpenseService::validate(&zero).is_err());

        let weekly = RecurringSchedule::new(RecurrencePattern::Weekly, 1, start)
            .with_selector(ScheduleSelector::week_days([7]));
        assert!(RecurringExpenseService::validate(&weekly).is_err());

        let monthly = RecurringSchedule::new(RecurrencePattern::Monthly, 1, start)
            .with_selector(ScheduleSelector::month_days([0]));
        assert!(RecurringExpenseService::validate(&monthly).is_err());
    }

    #[test]
    fn materialize_catches_up_and_advances_marker() {
        let mut expense = rent();
        let generated =
            RecurringExpenseService::materialize_due(&mut expense, date(2026, 3, 15), &clock())
                .unwrap();
        let dates: Vec<NaiveDate> = generated.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2026, 1, 1), date(2026, 2, 1), date(2026, 3, 1)]);
        assert!(generated.iter().all(|e| e.parent_id == Some(expense.id)));
        assert_eq!(
            expense.recurrence.as_ref().unwrap().last_generated,
            Some(date(2026, 3, 1))
        );

        let again =
            RecurringExpenseService::materialize_due(&mut expense, date(2026, 3, 31), &clock())
                .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn paused_schedule_generates_nothing() {
        let mut expense = rent();
        RecurringExpenseService::set_active(&mut expense, false).unwrap();
        let generated =
            RecurringExpenseService::materialize_due(&mut expense, date(2026, 6, 1), &clock())
                .unwrap();
        assert!(generated.is_empty());
    }

    #[test]
    fn materialize_requires_recurrence() {
        let mut expense = Expense::new("Scissors", 40.0, "tools", date(2026, 2, 2), clock().0);
        let err = RecurringExpenseService::materialize_due(&mut expense, date(2026, 3, 1), &clock())
            .expect_err("one-off expenses cannot be materialized");
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[test]
    fn end_date_update_is_validated() {
        let mut expense = rent();
        let err = RecurringExpenseService::set_end_date(&mut expense, Some(date(2025, 12, 1)))
            .expect_err("end before start");
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn due_between_orders_by_date() {
        let weekly = Expense::new("Towels", 20.0, "laundry", date(2026, 3, 2), clock().0)
            .with_recurrence(
                RecurringSchedule::new(RecurrencePattern::Weekly, 1, date(2026, 3, 2))
                    .with_selector(ScheduleSelector::week_days([1])),
            );
        let expenses = vec![rent(), weekly];
        let due = RecurringExpenseService::due_between(&expenses, date(2026, 3, 1), date(2026, 3, 10));
        let labels: Vec<(&str, NaiveDate)> = due
            .iter()
            .map(|d| (d.description.as_str(), d.due_date))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Rent", date(2026, 3, 1)),
                ("Towels", date(2026, 3, 2)),
                ("Towels", date(2026, 3, 9)),
            ]
        );
    }
}
