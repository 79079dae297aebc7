use crate::grades::round_half_up;
use crate::model::{AttendanceRecord, AttendanceStatus, ClassSection, Student};
use crate::roster;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// A student's mark for one day, `Unmarked` when no record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayMark {
    Present,
    Absent,
    Late,
    Excused,
    Unmarked,
}

impl From<AttendanceStatus> for DayMark {
    fn from(s: AttendanceStatus) -> Self {
        match s {
            AttendanceStatus::Present => DayMark::Present,
            AttendanceStatus::Absent => DayMark::Absent,
            AttendanceStatus::Late => DayMark::Late,
            AttendanceStatus::Excused => DayMark::Excused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DailyStats {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayColor {
    Green,
    Red,
    Yellow,
    Gray,
}

fn on_day(r: &AttendanceRecord, date: NaiveDate) -> bool {
    r.date == Some(date)
}

pub fn status_for_student_on_date(
    student_id: i64,
    date: NaiveDate,
    records: &[AttendanceRecord],
) -> DayMark {
    records
        .iter()
        .find(|r| r.student_id == student_id && on_day(r, date))
        .and_then(|r| r.status)
        .map(DayMark::from)
        .unwrap_or(DayMark::Unmarked)
}

/// Records with an unrecognised status count toward `total` only.
pub fn daily_stats(date: NaiveDate, records: &[AttendanceRecord]) -> DailyStats {
    let mut stats = DailyStats::default();
    for r in records.iter().filter(|r| on_day(r, date)) {
        stats.total += 1;
        match r.status {
            Some(AttendanceStatus::Present) => stats.present += 1,
            Some(AttendanceStatus::Absent) => stats.absent += 1,
            Some(AttendanceStatus::Late) => stats.late += 1,
            Some(AttendanceStatus::Excused) => stats.excused += 1,
            None => {}
        }
    }
    stats
}

/// First matching rule wins: everyone present, any absence, any lateness.
pub fn day_indicator_color(stats: &DailyStats, total_students_in_class: usize) -> DayColor {
    if stats.present == total_students_in_class {
        DayColor::Green
    } else if stats.absent > 0 {
        DayColor::Red
    } else if stats.late > 0 {
        DayColor::Yellow
    } else {
        DayColor::Gray
    }
}

/// Percentage of today's records marked present; 0 when there are none.
pub fn todays_rate(records: &[AttendanceRecord], today: NaiveDate) -> i64 {
    let stats = daily_stats(today, records);
    if stats.total == 0 {
        return 0;
    }
    round_half_up(stats.present as f64 / stats.total as f64 * 100.0)
}

/// The record to store for a (student, class, date) mark. An existing record
/// for the triple keeps its id; otherwise the id is 0.
pub fn attendance_mark(
    records: &[AttendanceRecord],
    student_id: i64,
    class_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> AttendanceRecord {
    let id = records
        .iter()
        .find(|r| r.student_id == student_id && r.class_id == class_id && on_day(r, date))
        .map(|r| r.id)
        .unwrap_or(0);
    AttendanceRecord {
        id,
        student_id,
        class_id,
        date: Some(date),
        status: Some(status),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub weekend: bool,
    pub stats: DailyStats,
    /// Only set on days that have at least one record.
    pub indicator: Option<DayColor>,
}

/// One entry per day of the month. `None` for an invalid year/month.
pub fn month_calendar(
    year: i32,
    month: u32,
    records: &[AttendanceRecord],
    class_size: usize,
) -> Option<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| {
            let stats = daily_stats(date, records);
            let weekday = date.weekday();
            CalendarDay {
                date,
                weekday,
                weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
                stats,
                indicator: (stats.total > 0).then(|| day_indicator_color(&stats, class_size)),
            }
        })
        .collect();
    Some(days)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDayMark {
    pub student_id: i64,
    pub display_name: String,
    pub mark: DayMark,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySheet {
    pub class_id: i64,
    pub date: NaiveDate,
    pub stats: DailyStats,
    pub indicator: DayColor,
    pub students: Vec<StudentDayMark>,
}

/// Marks for every enrolled student on one day, restricted to the class's
/// own records.
pub fn day_sheet(
    class: &ClassSection,
    students: &[Student],
    records: &[AttendanceRecord],
    date: NaiveDate,
) -> DaySheet {
    let class_records: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| r.class_id == class.id)
        .cloned()
        .collect();
    let enrolled = roster::class_roster(class, students);
    let stats = daily_stats(date, &class_records);

    DaySheet {
        class_id: class.id,
        date,
        stats,
        indicator: day_indicator_color(&stats, enrolled.len()),
        students: enrolled
            .iter()
            .map(|s| StudentDayMark {
                student_id: s.id,
                display_name: s.full_name(),
                mark: status_for_student_on_date(s.id, date, &class_records),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn record(id: i64, student_id: i64, date: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id,
            class_id: 1,
            date: Some(date),
            status: Some(status),
        }
    }

    #[test]
    fn daily_stats_counts_only_matching_day() {
        let d = day(2024, 3, 4);
        let records = vec![
            record(1, 1, d, AttendanceStatus::Present),
            record(2, 2, d, AttendanceStatus::Present),
            record(3, 3, d, AttendanceStatus::Absent),
            record(4, 1, day(2024, 3, 5), AttendanceStatus::Late),
        ];
        let stats = daily_stats(d, &records);
        assert_eq!(
            stats,
            DailyStats {
                present: 2,
                absent: 1,
                late: 0,
                excused: 0,
                total: 3
            }
        );
        assert_eq!(day_indicator_color(&stats, 3), DayColor::Red);
    }

    #[test]
    fn indicator_follows_priority_order() {
        let all_present = DailyStats {
            present: 3,
            total: 3,
            ..Default::default()
        };
        assert_eq!(day_indicator_color(&all_present, 3), DayColor::Green);

        let absent_and_late = DailyStats {
            present: 1,
            absent: 1,
            late: 1,
            total: 3,
            ..Default::default()
        };
        assert_eq!(day_indicator_color(&absent_and_late, 3), DayColor::Red);

        let late_only = DailyStats {
            present: 2,
            late: 1,
            total: 3,
            ..Default::default()
        };
        assert_eq!(day_indicator_color(&late_only, 3), DayColor::Yellow);

        let excused = DailyStats {
            present: 2,
            excused: 1,
            total: 3,
            ..Default::default()
        };
        assert_eq!(day_indicator_color(&excused, 3), DayColor::Gray);
    }

    #[test]
    fn missing_mark_is_unmarked() {
        let d = day(2024, 3, 4);
        let records = vec![record(1, 1, d, AttendanceStatus::Late)];
        assert_eq!(status_for_student_on_date(1, d, &records), DayMark::Late);
        assert_eq!(status_for_student_on_date(2, d, &records), DayMark::Unmarked);
        assert_eq!(
            status_for_student_on_date(1, day(2024, 3, 5), &records),
            DayMark::Unmarked
        );
    }

    #[test]
    fn todays_rate_rounds_present_share() {
        let today = day(2024, 3, 4);
        let records = vec![
            record(1, 1, today, AttendanceStatus::Present),
            record(2, 2, today, AttendanceStatus::Present),
            record(3, 3, today, AttendanceStatus::Late),
            record(4, 4, day(2024, 3, 3), AttendanceStatus::Absent),
        ];
        assert_eq!(todays_rate(&records, today), 67);
        assert_eq!(todays_rate(&records, day(2024, 3, 9)), 0);
    }

    #[test]
    fn mark_reuses_record_for_same_triple() {
        let d = day(2024, 3, 4);
        let records = vec![record(9, 1, d, AttendanceStatus::Absent)];
        let again = attendance_mark(&records, 1, 1, d, AttendanceStatus::Excused);
        assert_eq!(again.id, 9);
        assert_eq!(again.status, Some(AttendanceStatus::Excused));

        let other_class = attendance_mark(&records, 1, 2, d, AttendanceStatus::Present);
        assert_eq!(other_class.id, 0);
    }

    #[test]
    fn month_calendar_covers_every_day() {
        let records = vec![record(1, 1, day(2024, 2, 29), AttendanceStatus::Present)];
        let cal = month_calendar(2024, 2, &records, 1).expect("valid month");
        assert_eq!(cal.len(), 29);
        assert_eq!(cal[0].weekday, Weekday::Thu);
        assert!(cal[2].weekend);
        assert_eq!(cal[0].indicator, None);
        assert_eq!(cal[28].indicator, Some(DayColor::Green));
        assert!(month_calendar(2024, 13, &records, 1).is_none());
    }

    #[test]
    fn day_sheet_lists_enrolled_students() {
        let d = day(2024, 3, 4);
        let class = ClassSection {
            id: 1,
            student_ids: vec![1, 2],
            ..Default::default()
        };
        let students = vec![
            Student {
                id: 1,
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                ..Default::default()
            },
            Student {
                id: 2,
                first_name: "Bob".into(),
                last_name: "Ray".into(),
                ..Default::default()
            },
        ];
        let mut elsewhere = record(2, 2, d, AttendanceStatus::Absent);
        elsewhere.class_id = 7;
        let records = vec![record(1, 1, d, AttendanceStatus::Late), elsewhere];

        let sheet = day_sheet(&class, &students, &records, d);
        assert_eq!(sheet.stats.total, 1);
        assert_eq!(sheet.indicator, DayColor::Yellow);
        assert_eq!(sheet.students[0].mark, DayMark::Late);
        assert_eq!(sheet.students[1].mark, DayMark::Unmarked);
    }
}
