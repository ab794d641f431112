pub mod locale;
pub mod partition;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Rows in the month grid. Six weeks always cover a month starting on Sunday.
pub const GRID_WEEKS: usize = 6;

// ─── View ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Month,
    Week,
}

impl View {
    pub fn toggle(self) -> Self {
        match self {
            Self::Month => Self::Week,
            Self::Week => Self::Month,
        }
    }
}

/// How the week view is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekLayout {
    /// Same grid as the month view.
    Grid,
    /// Vertical per-day listing under a week summary.
    #[default]
    Agenda,
}

// ─── Date windows ───────────────────────────────────────────────────────────

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

/// September 1 of the academic year `date` belongs to.
pub fn academic_year_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() < 9 { date.year() - 1 } else { date.year() };
    NaiveDate::from_ymd_opt(year, 9, 1).unwrap_or(date)
}

/// 1-based week index counted from the Monday on or before September 1.
pub fn week_number(date: NaiveDate) -> u32 {
    let first = week_start(academic_year_start(date));
    let days = (week_start(date) - first).num_days();
    (days.div_euclid(7) + 1).max(1) as u32
}

/// First Monday shown in the month grid containing `date`.
pub fn month_grid_start(date: NaiveDate) -> NaiveDate {
    week_start(date.with_day(1).unwrap_or(date))
}

// ─── Month grid ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub other_month: bool,
    pub today: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    pub start: NaiveDate,
    pub number: u32,
    pub days: [DayCell; 7],
}

/// Six week rows of seven days starting from the Monday on/before the 1st.
pub fn month_grid(anchor: NaiveDate, today: NaiveDate, selected: Option<NaiveDate>) -> Vec<WeekRow> {
    let start = month_grid_start(anchor);
    (0..GRID_WEEKS)
        .map(|w| week_row(start + Duration::weeks(w as i64), anchor, today, selected))
        .collect()
}

pub fn week_row(
    start: NaiveDate,
    anchor: NaiveDate,
    today: NaiveDate,
    selected: Option<NaiveDate>,
) -> WeekRow {
    let days = std::array::from_fn(|d| {
        let date = start + Duration::days(d as i64);
        DayCell {
            date,
            other_month: date.month() != anchor.month() || date.year() != anchor.year(),
            today: date == today,
            selected: selected == Some(date),
        }
    });
    WeekRow {
        start,
        number: week_number(start),
        days,
    }
}

// ─── State ──────────────────────────────────────────────────────────────────

/// Navigation state for the calendar. Owned by the app and handed to the
/// renderer by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    pub view: View,
    pub anchor: NaiveDate,
    pub selected: NaiveDate,
    pub today: NaiveDate,
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            view: View::Month,
            anchor: today,
            selected: today,
            today,
        }
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Moves one period forward (`direction > 0`) or back.
    pub fn navigate(&mut self, direction: i32) {
        let next = match self.view {
            View::Month => shift_months(self.anchor, direction),
            View::Week => Some(self.anchor + Duration::days(7 * direction as i64)),
        };
        if let Some(next) = next {
            self.anchor = next;
            self.selected = next;
        }
    }

    pub fn go_to_today(&mut self) {
        self.anchor = self.today;
        self.selected = self.today;
    }

    pub fn move_selection(&mut self, days: i64) {
        self.selected += Duration::days(days);
        self.anchor = self.selected;
    }

    pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
        match self.view {
            View::Month => {
                let start = month_grid_start(self.anchor);
                (start, start + Duration::days(GRID_WEEKS as i64 * 7 - 1))
            }
            View::Week => {
                let start = week_start(self.anchor);
                (start, week_end(start))
            }
        }
    }
}

/// Day-of-month is clamped to the length of the target month.
fn shift_months(date: NaiveDate, direction: i32) -> Option<NaiveDate> {
    let months = Months::new(direction.unsigned_abs());
    if direction >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_start_is_monday_and_idempotent() {
        let mut date = d(2023, 12, 20);
        for _ in 0..400 {
            let start = week_start(date);
            assert_eq!(start.weekday(), Weekday::Mon);
            assert_eq!(week_start(start), start);
            assert!(start <= date && (date - start).num_days() < 7);
            date += Duration::days(1);
        }
    }

    #[test]
    fn sunday_belongs_to_preceding_monday() {
        assert_eq!(week_start(d(2024, 9, 1)), d(2024, 8, 26));
        assert_eq!(week_start(d(2024, 9, 2)), d(2024, 9, 2));
    }

    #[test]
    fn academic_year_switches_in_september() {
        assert_eq!(academic_year_start(d(2025, 8, 31)), d(2024, 9, 1));
        assert_eq!(academic_year_start(d(2025, 9, 1)), d(2025, 9, 1));
        assert_eq!(academic_year_start(d(2025, 1, 15)), d(2024, 9, 1));
    }

    #[test]
    fn first_academic_week_is_one() {
        // 2025-09-01 is a Monday.
        assert_eq!(week_number(d(2025, 9, 1)), 1);
        assert_eq!(week_number(d(2025, 9, 7)), 1);
        assert_eq!(week_number(d(2025, 9, 8)), 2);
    }

    #[test]
    fn sunday_september_first_counts_as_week_one() {
        // 2024-09-01 is a Sunday, so its week began on 2024-08-26.
        assert_eq!(week_number(d(2024, 9, 1)), 1);
        assert_eq!(week_number(d(2024, 9, 2)), 2);
    }

    #[test]
    fn week_number_is_monotonic_within_academic_year() {
        let mut date = d(2024, 9, 1);
        let mut last = week_number(date);
        while date < d(2025, 8, 31) {
            date += Duration::days(1);
            let n = week_number(date);
            assert!(n >= last, "{date}: {n} < {last}");
            last = n;
        }
        assert!(last > 50);
        assert_eq!(week_number(d(2025, 9, 1)), 1);
    }

    #[test]
    fn month_grid_has_six_weeks_from_monday() {
        let grid = month_grid(d(2024, 9, 15), d(2024, 9, 10), Some(d(2024, 9, 20)));
        assert_eq!(grid.len(), GRID_WEEKS);
        assert_eq!(grid[0].start, d(2024, 8, 26));
        assert!(grid[0].days[0].other_month);
        assert!(!grid[0].days[6].other_month);
        let cells: Vec<&DayCell> = grid.iter().flat_map(|w| w.days.iter()).collect();
        assert_eq!(cells.len(), 42);
        assert_eq!(cells.iter().filter(|c| c.today).count(), 1);
        assert_eq!(cells.iter().filter(|c| c.selected).count(), 1);
        assert!(cells.windows(2).all(|p| p[1].date - p[0].date == Duration::days(1)));
    }

    #[test]
    fn month_navigation_clamps_day() {
        let mut state = CalendarState::new(d(2024, 1, 31));
        state.navigate(1);
        assert_eq!(state.anchor, d(2024, 2, 29));
        state.navigate(-1);
        assert_eq!(state.anchor, d(2024, 1, 29));
    }

    #[test]
    fn week_navigation_shifts_seven_days() {
        let mut state = CalendarState::new(d(2024, 9, 4));
        state.set_view(View::Week);
        state.navigate(-1);
        assert_eq!(state.anchor, d(2024, 8, 28));
        state.navigate(2);
        assert_eq!(state.anchor, d(2024, 9, 11));
        assert_eq!(state.visible_range(), (d(2024, 9, 9), d(2024, 9, 15)));
    }

    #[test]
    fn view_switch_keeps_anchor() {
        let mut state = CalendarState::new(d(2024, 9, 4));
        state.move_selection(10);
        let anchor = state.anchor;
        state.set_view(View::Week);
        assert_eq!(state.anchor, anchor);
        state.go_to_today();
        assert_eq!(state.anchor, d(2024, 9, 4));
        assert_eq!(state.selected, d(2024, 9, 4));
    }
}
