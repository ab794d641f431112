//! Russian display strings. The display locale is fixed.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

use super::{week_end, week_start, View};
use crate::models::{EventType, Frequency, Priority};

pub const DAY_ABBREVIATIONS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];
pub const WEEK_HEADER: &str = "Неделя";

const MONTHS: [&str; 12] = [
    "январь", "февраль", "март", "апрель", "май", "июнь",
    "июль", "август", "сентябрь", "октябрь", "ноябрь", "декабрь",
];

const MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня",
    "июля", "августа", "сентября", "октября", "ноября", "декабря",
];

const WEEKDAYS: [&str; 7] = [
    "понедельник", "вторник", "среда", "четверг", "пятница", "суббота", "воскресенье",
];

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// Header above the grid: `сентябрь 2024 г.` or `2 - 8 сентября 2024 г.`
pub fn period_title(view: View, anchor: NaiveDate) -> String {
    match view {
        View::Month => format!("{} {} г.", month_name(anchor), anchor.year()),
        View::Week => {
            let start = week_start(anchor);
            let end = week_end(start);
            format!(
                "{} - {} {} {} г.",
                start.day(),
                end.day(),
                MONTHS_GENITIVE[end.month0() as usize],
                end.year()
            )
        }
    }
}

/// `2 сентября`, used in agenda day headers.
pub fn day_and_month(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS_GENITIVE[date.month0() as usize])
}

pub fn date_time<Tz: TimeZone>(t: &DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.with_timezone(tz).format("%d.%m.%Y, %H:%M").to_string()
}

pub fn time_of_day<Tz: TimeZone>(t: &DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.with_timezone(tz).format("%H:%M").to_string()
}

pub fn event_type_label(t: EventType) -> &'static str {
    match t {
        EventType::Class => "Занятие",
        EventType::Homework => "Домашнее задание",
        EventType::Exam => "Экзамен",
        EventType::Other => "Прочее",
    }
}

pub fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Низкий",
        Priority::Medium => "Средний",
        Priority::High => "Высокий",
    }
}

pub fn frequency_label(f: Frequency) -> &'static str {
    match f {
        Frequency::Daily => "Ежедневно",
        Frequency::Weekly => "Еженедельно",
        Frequency::Monthly => "Ежемесячно",
    }
}

/// Human-readable size with at most two decimals: `0 Bytes`, `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn titles_follow_view() {
        assert_eq!(period_title(View::Month, d(2024, 9, 15)), "сентябрь 2024 г.");
        assert_eq!(period_title(View::Week, d(2024, 9, 4)), "2 - 8 сентября 2024 г.");
        assert_eq!(period_title(View::Week, d(2024, 12, 31)), "30 - 5 января 2025 г.");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }

    #[test]
    fn date_time_uses_russian_order() {
        let t = chrono::DateTime::parse_from_rfc3339("2024-09-02T09:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(date_time(&t, &Utc), "02.09.2024, 09:05");
        assert_eq!(weekday_name(d(2024, 9, 2)), "понедельник");
        assert_eq!(day_and_month(d(2024, 9, 2)), "2 сентября");
    }
}
