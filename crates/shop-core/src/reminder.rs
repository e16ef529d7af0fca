//! Reminder texts for upcoming recurring expenses.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use shop_domain::{Expense, ScheduleStatus};

use crate::{
    format::{CurrencyFormatter, DateFormatter},
    frequency::{FrequencyFormatter, Language},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseReminder {
    pub expense_id: Uuid,
    pub subject: String,
    pub body: String,
    pub due_date: NaiveDate,
}

struct Labels {
    subject: &'static str,
    amount: &'static str,
    due: &'static str,
    schedule: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::English => Labels {
            subject: "Upcoming expense",
            amount: "Amount",
            due: "Due",
            schedule: "Schedule",
        },
        Language::Spanish => Labels {
            subject: "Próximo gasto",
            amount: "Importe",
            due: "Vence",
            schedule: "Frecuencia",
        },
    }
}

/// Builds localized reminder messages for recurring expenses.
pub struct ReminderComposer<'a> {
    frequency: FrequencyFormatter,
    currency: &'a dyn CurrencyFormatter,
    dates: &'a dyn DateFormatter,
    currency_code: String,
}

impl<'a> ReminderComposer<'a> {
    pub fn new(
        language: Language,
        currency: &'a dyn CurrencyFormatter,
        dates: &'a dyn DateFormatter,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            frequency: FrequencyFormatter::new(language),
            currency,
            dates,
            currency_code: currency_code.into(),
        }
    }

    /// Reminder for the next occurrence on or after `today`, if the schedule
    /// is in effect and has one.
    pub fn compose(&self, expense: &Expense, today: NaiveDate) -> Option<ExpenseReminder> {
        let schedule = expense.recurrence.as_ref()?;
        if matches!(
            schedule.status(today),
            ScheduleStatus::Paused | ScheduleStatus::Finished
        ) {
            return None;
        }
        let due_date = schedule.first_on_or_after(today)?;
        let labels = labels(self.frequency.language());
        let subject = format!("{}: {}", labels.subject, expense.description);
        let body = [
            format!(
                "{}: {}",
                labels.amount,
                self.currency
                    .format_amount(expense.amount, &self.currency_code)
            ),
            format!("{}: {}", labels.due, self.dates.format_date(due_date)),
            format!(
                "{}: {}",
                labels.schedule,
                self.frequency.describe_schedule(schedule)
            ),
        ]
        .join("\n");
        Some(ExpenseReminder {
            expense_id: expense.id,
            subject,
            body,
            due_date,
        })
    }

    /// Reminders due within `horizon_days` of `today`, soonest first.
    pub fn compose_upcoming(
        &self,
        expenses: &[Expense],
        today: NaiveDate,
        horizon_days: u32,
    ) -> Vec<ExpenseReminder> {
        let limit = today
            .checked_add_signed(Duration::days(i64::from(horizon_days)))
            .unwrap_or(NaiveDate::MAX);
        let mut reminders: Vec<ExpenseReminder> = expenses
            .iter()
            .filter_map(|expense| self.compose(expense, today))
            .filter(|reminder| reminder.due_date <= limit)
            .collect();
        reminders.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.subject.cmp(&b.subject)));
        reminders
    }
}
