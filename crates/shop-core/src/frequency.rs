//! Human-readable descriptions of recurring-expense schedules.
//!
//! Every function here is total: malformed selectors degrade to the bare
//! cadence ("Monthly") instead of failing.

use shop_domain::{RecurrencePattern, RecurringSchedule, ScheduleSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// Maps a locale tag such as `es-ES` or `en_US`; anything unknown is English.
    pub fn from_locale(locale: &str) -> Self {
        let lang = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "es" => Language::Spanish,
            _ => Language::English,
        }
    }

    fn words(self) -> &'static Words {
        match self {
            Language::English => &ENGLISH,
            Language::Spanish => &SPANISH,
        }
    }
}

struct Words {
    daily: &'static str,
    weekly: &'static str,
    monthly: &'static str,
    yearly: &'static str,
    every: &'static str,
    every_lower: &'static str,
    days: &'static str,
    weeks: &'static str,
    months: &'static str,
    years: &'static str,
    and: &'static str,
    every_day: &'static str,
    day_single: &'static str,
    day_plural: &'static str,
    weekday_names: [&'static str; 7],
    month_names: [&'static str; 12],
    month_first: bool,
    date_joiner: &'static str,
}

const ENGLISH: Words = Words {
    daily: "Daily",
    weekly: "Weekly",
    monthly: "Monthly",
    yearly: "Yearly",
    every: "Every",
    every_lower: "every",
    days: "days",
    weeks: "weeks",
    months: "months",
    years: "years",
    and: "and",
    every_day: "every day",
    day_single: "day",
    day_plural: "days",
    weekday_names: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    month_names: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    month_first: true,
    date_joiner: " ",
};

const SPANISH: Words = Words {
    daily: "Diario",
    weekly: "Semanal",
    monthly: "Mensual",
    yearly: "Anual",
    every: "Cada",
    every_lower: "cada",
    days: "días",
    weeks: "semanas",
    months: "meses",
    years: "años",
    and: "y",
    every_day: "todos los días",
    day_single: "día",
    day_plural: "días",
    weekday_names: [
        "domingo",
        "lunes",
        "martes",
        "miércoles",
        "jueves",
        "viernes",
        "sábado",
    ],
    month_names: [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ],
    month_first: false,
    date_joiner: " de ",
};

/// Joins items as "A", "A and B", or "A, B and C" using `conjunction`.
pub fn join_list<S: AsRef<str>>(items: &[S], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [single] => single.as_ref().to_string(),
        [first, second] => format!("{} {conjunction} {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
            format!("{} {conjunction} {}", head.join(", "), last.as_ref())
        }
    }
}

/// English description of a schedule configuration.
pub fn format_frequency(
    pattern: &RecurrencePattern,
    interval: u32,
    selector: &ScheduleSelector,
) -> String {
    FrequencyFormatter::new(Language::English).describe(pattern, interval, selector)
}

/// Localized schedule descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyFormatter {
    language: Language,
}

impl FrequencyFormatter {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn describe_schedule(&self, schedule: &RecurringSchedule) -> String {
        self.describe(&schedule.pattern, schedule.interval, &schedule.selector)
    }

    pub fn describe(
        &self,
        pattern: &RecurrencePattern,
        interval: u32,
        selector: &ScheduleSelector,
    ) -> String {
        let words = self.language.words();
        let interval = interval.max(1);
        let (cadence, qualifier) = match pattern {
            RecurrencePattern::Daily => (cadence(words, interval, words.daily, words.days), None),
            RecurrencePattern::Weekly => (
                cadence(words, interval, words.weekly, words.weeks),
                weekday_qualifier(words, selector),
            ),
            RecurrencePattern::Monthly => (
                cadence(words, interval, words.monthly, words.months),
                month_day_qualifier(words, selector),
            ),
            RecurrencePattern::Yearly => (
                cadence(words, interval, words.yearly, words.years),
                year_date_qualifier(words, selector),
            ),
            RecurrencePattern::Other(raw) => {
                return format!("{raw} {} {interval}", words.every_lower);
            }
        };
        match qualifier {
            Some(detail) => format!("{cadence} ({detail})"),
            None => cadence,
        }
    }
}

fn cadence(words: &Words, interval: u32, single: &str, unit_plural: &str) -> String {
    if interval == 1 {
        single.to_string()
    } else {
        format!("{} {interval} {unit_plural}", words.every)
    }
}

fn weekday_qualifier(words: &Words, selector: &ScheduleSelector) -> Option<String> {
    let days = selector.normalized_week_days();
    match days.len() {
        0 => None,
        7 => Some(words.every_day.to_string()),
        _ => {
            let names: Vec<&str> = days
                .iter()
                .map(|day| words.weekday_names[*day as usize])
                .collect();
            Some(join_list(&names, words.and))
        }
    }
}

fn month_day_qualifier(words: &Words, selector: &ScheduleSelector) -> Option<String> {
    let days = selector.normalized_month_days();
    if days.is_empty() {
        return None;
    }
    let label = if days.len() == 1 {
        words.day_single
    } else {
        words.day_plural
    };
    let numbers: Vec<String> = days.iter().map(u8::to_string).collect();
    Some(format!("{label} {}", join_list(&numbers, words.and)))
}

fn year_date_qualifier(words: &Words, selector: &ScheduleSelector) -> Option<String> {
    let date = selector.valid_year_date()?;
    let month = words.month_names[(date.month - 1) as usize];
    Some(if words.month_first {
        format!("{month}{}{}", words.date_joiner, date.day)
    } else {
        format!("{}{}{month}", date.day, words.date_joiner)
    })
}
