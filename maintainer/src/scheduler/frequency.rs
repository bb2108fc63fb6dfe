use chrono::{Datelike, NaiveDate, Weekday};
use tracing::warn;

/// How often a periodic task is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyMode {
    #[default]
    Everyday,
    /// Sundays only
    EveryWeek,
    /// The 1st of each month only
    EveryMonth,
    /// Every other period, counted per task family
    EverySecond,
}

/// Period that `every_second` alternates over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFamily {
    Daily,
    Weekly,
    Monthly,
}

impl FrequencyMode {
    /// Unset and unrecognized values both fall back to `everyday`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim) else {
            return FrequencyMode::Everyday;
        };

        match value {
            "" | "everyday" => FrequencyMode::Everyday,
            "everyweek" => FrequencyMode::EveryWeek,
            "everymonth" => FrequencyMode::EveryMonth,
            "every_second" => FrequencyMode::EverySecond,
            other => {
                warn!("Unrecognized frequency '{}', treating as everyday", other);
                FrequencyMode::Everyday
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyMode::Everyday => "everyday",
            FrequencyMode::EveryWeek => "everyweek",
            FrequencyMode::EveryMonth => "everymonth",
            FrequencyMode::EverySecond => "every_second",
        }
    }
}

/// Decide whether a task of `family` configured with `mode` runs on `date`.
pub fn should_run(family: TaskFamily, mode: FrequencyMode, date: NaiveDate) -> bool {
    match mode {
        FrequencyMode::Everyday => true,
        FrequencyMode::EveryWeek => date.weekday() == Weekday::Sun,
        FrequencyMode::EveryMonth => date.day() == 1,
        FrequencyMode::EverySecond => match family {
            TaskFamily::Daily => date.day() % 2 == 1,
            TaskFamily::Weekly => date.iso_week().week() % 2 == 1,
            TaskFamily::Monthly => date.month() % 2 == 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case(None, FrequencyMode::Everyday ; "unset")]
    #[test_case(Some("everyday"), FrequencyMode::Everyday ; "everyday")]
    #[test_case(Some("everyweek"), FrequencyMode::EveryWeek ; "everyweek")]
    #[test_case(Some("everymonth"), FrequencyMode::EveryMonth ; "everymonth")]
    #[test_case(Some(" every_second "), FrequencyMode::EverySecond ; "every_second padded")]
    #[test_case(Some("fortnightly"), FrequencyMode::Everyday ; "unrecognized")]
    fn test_from_raw(raw: Option<&str>, expected: FrequencyMode) {
        assert_eq!(FrequencyMode::from_raw(raw), expected);
    }

    #[test]
    fn test_calendar_properties_hold_for_two_years() {
        let mut day = date(2025, 1, 1);
        let end = date(2027, 1, 1);
        while day < end {
            for family in [TaskFamily::Daily, TaskFamily::Weekly, TaskFamily::Monthly] {
                assert!(should_run(family, FrequencyMode::Everyday, day));
                assert_eq!(
                    should_run(family, FrequencyMode::EveryWeek, day),
                    day.weekday().number_from_monday() == 7
                );
                assert_eq!(
                    should_run(family, FrequencyMode::EveryMonth, day),
                    day.day() == 1
                );
            }
            assert_eq!(
                should_run(TaskFamily::Daily, FrequencyMode::EverySecond, day),
                day.day() % 2 == 1
            );
            day = day.succ_opt().unwrap();
        }
    }

    // 2026-01-05 is in ISO week 2, 2026-01-12 in week 3
    #[test_case(TaskFamily::Weekly, date(2026, 1, 5), false ; "weekly even iso week")]
    #[test_case(TaskFamily::Weekly, date(2026, 1, 12), true ; "weekly odd iso week")]
    #[test_case(TaskFamily::Monthly, date(2026, 2, 1), false ; "monthly february")]
    #[test_case(TaskFamily::Monthly, date(2026, 3, 1), true ; "monthly march")]
    #[test_case(TaskFamily::Daily, date(2026, 5, 10), false ; "daily even day")]
    #[test_case(TaskFamily::Daily, date(2026, 5, 31), true ; "daily odd day")]
    fn test_every_second_per_family(family: TaskFamily, day: NaiveDate, expected: bool) {
        assert_eq!(should_run(family, FrequencyMode::EverySecond, day), expected);
    }

    #[test]
    fn test_iso_week_parity_across_year_boundary() {
        // 2026-12-31 is a Thursday in ISO week 53 of 2026
        assert_eq!(date(2026, 12, 31).iso_week().week(), 53);
        assert!(should_run(
            TaskFamily::Weekly,
            FrequencyMode::EverySecond,
            date(2026, 12, 31)
        ));
    }
}
