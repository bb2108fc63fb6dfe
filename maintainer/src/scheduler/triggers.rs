use super::TaskId;
use crate::config::{parse_trigger_time, ScheduleConfig};
use crate::errors::ConfigError;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

/// Which calendar days a trigger fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDay {
    Every,
    Weekday(Weekday),
    DayOfMonth(u32),
}

impl TriggerDay {
    fn matches(self, at: NaiveDateTime) -> bool {
        match self {
            TriggerDay::Every => true,
            TriggerDay::Weekday(weekday) => at.weekday() == weekday,
            TriggerDay::DayOfMonth(day) => at.day() == day,
        }
    }
}

/// A task bound to a wall-clock time, with its next due instant
#[derive(Debug, Clone)]
pub struct Trigger {
    pub task: TaskId,
    pub at: NaiveTime,
    pub day: TriggerDay,
    pub next_run: NaiveDateTime,
}

impl Trigger {
    pub fn new(task: TaskId, at: NaiveTime, day: TriggerDay, now: NaiveDateTime) -> Self {
        Self {
            task,
            at,
            day,
            next_run: next_occurrence(at, day, now),
        }
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Move past `now` after the trigger has been dispatched
    pub fn reschedule(&mut self, now: NaiveDateTime) {
        self.next_run = next_occurrence(self.at, self.day, now);
    }
}

/// First instant strictly after `after` at wall-clock `at` on a matching day.
pub fn next_occurrence(at: NaiveTime, day: TriggerDay, after: NaiveDateTime) -> NaiveDateTime {
    let mut candidate = after.date().and_time(at);
    if candidate <= after {
        candidate += Duration::days(1);
    }
    // Any day-of-month up to 31 recurs within a year
    for _ in 0..366 {
        if day.matches(candidate) {
            return candidate;
        }
        candidate += Duration::days(1);
    }
    candidate
}

/// Build the standard daily trigger table from configuration.
pub fn build_triggers(
    schedule: &ScheduleConfig,
    now: NaiveDateTime,
) -> Result<Vec<Trigger>, ConfigError> {
    let table = [
        (TaskId::MaintenanceAnnouncement, "announcement", &schedule.announcement, TriggerDay::Every),
        (TaskId::PgRepackAllDb, "repack", &schedule.repack, TriggerDay::Every),
        (TaskId::AutoBackupDaily, "daily_backup", &schedule.daily_backup, TriggerDay::Every),
        (TaskId::PgroongaReindex, "reindex", &schedule.reindex, TriggerDay::Every),
        (
            TaskId::AutoBackupWeekly,
            "weekly_backup",
            &schedule.weekly_backup,
            TriggerDay::Weekday(Weekday::Sun),
        ),
        (
            TaskId::AutoBackupMonthly,
            "monthly_backup",
            &schedule.monthly_backup,
            TriggerDay::DayOfMonth(1),
        ),
        (TaskId::DailyReport, "daily_report", &schedule.daily_report, TriggerDay::Every),
    ];

    table
        .into_iter()
        .map(|(task, field, value, day)| {
            let at = parse_trigger_time(field, value)?;
            Ok(Trigger::new(task, at, day, now))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_later_today_when_time_not_reached() {
        let next = next_occurrence(time(3, 0), TriggerDay::Every, at(2026, 10, 17, 1, 0));
        assert_eq!(next, at(2026, 10, 17, 3, 0));
    }

    #[test]
    fn test_tomorrow_when_exactly_on_time() {
        let next = next_occurrence(time(3, 0), TriggerDay::Every, at(2026, 10, 17, 3, 0));
        assert_eq!(next, at(2026, 10, 18, 3, 0));
    }

    #[test]
    fn test_weekly_trigger_lands_on_sunday() {
        // 2026-10-17 is a Saturday
        let next = next_occurrence(
            time(5, 0),
            TriggerDay::Weekday(Weekday::Sun),
            at(2026, 10, 17, 12, 0),
        );
        assert_eq!(next, at(2026, 10, 18, 5, 0));
    }

    #[test]
    fn test_monthly_trigger_lands_on_first() {
        let next = next_occurrence(
            time(6, 0),
            TriggerDay::DayOfMonth(1),
            at(2026, 12, 1, 7, 0),
        );
        assert_eq!(next, at(2027, 1, 1, 6, 0));
    }

    #[test]
    fn test_reschedule_after_late_dispatch() {
        let mut trigger = Trigger::new(
            TaskId::PgRepackAllDb,
            time(2, 0),
            TriggerDay::Every,
            at(2026, 10, 17, 1, 0),
        );
        assert!(!trigger.is_due(at(2026, 10, 17, 1, 59)));
        assert!(trigger.is_due(at(2026, 10, 17, 4, 30)));

        trigger.reschedule(at(2026, 10, 17, 4, 30));
        assert_eq!(trigger.next_run, at(2026, 10, 18, 2, 0));
    }

    #[test]
    fn test_build_triggers_rejects_bad_time() {
        let schedule = ScheduleConfig {
            reindex: "25:00".to_string(),
            ..ScheduleConfig::default()
        };
        let err = build_triggers(&schedule, at(2026, 10, 17, 0, 0)).unwrap_err();
        assert!(err.to_string().contains("schedule.reindex"));
    }

    #[test]
    fn test_build_triggers_covers_scheduled_tasks() {
        let triggers = build_triggers(&ScheduleConfig::default(), at(2026, 10, 17, 0, 0)).unwrap();
        let tasks: Vec<TaskId> = triggers.iter().map(|t| t.task).collect();
        assert_eq!(
            tasks,
            vec![
                TaskId::MaintenanceAnnouncement,
                TaskId::PgRepackAllDb,
                TaskId::AutoBackupDaily,
                TaskId::PgroongaReindex,
                TaskId::AutoBackupWeekly,
                TaskId::AutoBackupMonthly,
                TaskId::DailyReport,
            ]
        );
    }
}
