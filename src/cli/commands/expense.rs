use shop_core::{FrequencyFormatter, Language, RecurringExpenseService};
use shop_domain::{RecurrencePattern, RecurringSchedule, ScheduleSelector, YearDate};

use crate::cli::{
    output,
    registry::CommandDefinition,
    shell_context::{CommandError, CommandResult, ShellContext},
};

use super::{parse_date, parse_number_list, ParsedArgs};

const DEFAULT_PREVIEW: usize = 3;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "expense-describe",
        "Describe a recurring expense schedule in words",
        "expense-describe <daily|weekly|monthly|yearly> [interval] [--weekdays 1,5] [--days 1,15] [--date MM-DD] [--start YYYY-MM-DD] [--next N] [--lang en|es]",
        cmd_expense_describe,
    )]
}

fn cmd_expense_describe(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(
        args,
        &["weekdays", "days", "date", "start", "next", "lang"],
    )?;
    let (pattern, interval) = match parsed.positional.as_slice() {
        [pattern] => (*pattern, 1),
        [pattern, interval] => (
            *pattern,
            interval.parse::<u32>().map_err(|_| {
                CommandError::InvalidArguments(format!("invalid interval `{interval}`"))
            })?,
        ),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: expense-describe <pattern> [interval] [options]".into(),
            ))
        }
    };
    let selector = selector_from(&parsed)?;
    let pattern = RecurrencePattern::from(pattern);
    let formatter = match parsed.option("lang") {
        Some(lang) => FrequencyFormatter::new(Language::from_locale(lang)),
        None => context.app.frequency_formatter(),
    };
    output::info(formatter.describe(&pattern, interval, &selector));

    let Some(start) = parsed.option("start").map(parse_date).transpose()? else {
        return Ok(());
    };
    let count = match parsed.option("next") {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            CommandError::InvalidArguments(format!("invalid count `{raw}`"))
        })?,
        None => DEFAULT_PREVIEW,
    };
    let schedule = RecurringSchedule::new(pattern, interval, start).with_selector(selector);
    RecurringExpenseService::validate(&schedule)?;

    let today = context.app.invoices.clock().today();
    let mut cursor = schedule.first_on_or_after(today);
    let mut shown = 0;
    while let Some(date) = cursor {
        if shown >= count {
            break;
        }
        output::info(format!("  next: {date}"));
        shown += 1;
        cursor = schedule.next_occurrence(date);
    }
    if shown == 0 {
        output::info("  no upcoming occurrences");
    }
    Ok(())
}

fn selector_from(parsed: &ParsedArgs<'_>) -> Result<ScheduleSelector, CommandError> {
    let mut selector = ScheduleSelector::default();
    if let Some(raw) = parsed.option("weekdays") {
        selector.week_days = parse_number_list(raw, "weekday")?;
    }
    if let Some(raw) = parsed.option("days") {
        selector.month_days = parse_number_list(raw, "day")?;
    }
    if let Some(raw) = parsed.option("date") {
        let (month, day) = raw
            .split_once('-')
            .and_then(|(month, day)| Some((month.parse::<u32>().ok()?, day.parse::<u32>().ok()?)))
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("invalid date `{raw}` (use MM-DD)"))
            })?;
        selector.year_date = Some(YearDate::new(month, day));
    }
    Ok(selector)
}
