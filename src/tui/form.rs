use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Event, EventDraft, EventType, Frequency, Priority, RecurrencePattern};

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Weekday checkbox order on screen (Monday first) and the value each sends.
pub const WEEKDAY_VALUES: [u8; 7] = [1, 2, 3, 4, 5, 6, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Course,
    Type,
    Start,
    End,
    Location,
    Instructor,
    Priority,
    Recurring,
    Frequency,
    Weekdays,
    RecurrenceEnd,
}

impl FormField {
    pub const ALL: [FormField; 13] = [
        Self::Title,
        Self::Description,
        Self::Course,
        Self::Type,
        Self::Start,
        Self::End,
        Self::Location,
        Self::Instructor,
        Self::Priority,
        Self::Recurring,
        Self::Frequency,
        Self::Weekdays,
        Self::RecurrenceEnd,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Название",
            Self::Description => "Описание",
            Self::Course => "Курс",
            Self::Type => "Тип",
            Self::Start => "Начало",
            Self::End => "Конец",
            Self::Location => "Место",
            Self::Instructor => "Преподаватель",
            Self::Priority => "Приоритет",
            Self::Recurring => "Повторять",
            Self::Frequency => "Частота",
            Self::Weekdays => "Дни недели",
            Self::RecurrenceEnd => "Повторять до",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::Title
                | Self::Description
                | Self::Course
                | Self::Start
                | Self::End
                | Self::Location
                | Self::Instructor
                | Self::RecurrenceEnd
        )
    }

    pub fn is_recurrence_option(self) -> bool {
        matches!(self, Self::Frequency | Self::Weekdays | Self::RecurrenceEnd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Укажите название события")]
    MissingTitle,
    #[error("Неверная дата: {0} (ожидается ГГГГ-ММ-ДД ЧЧ:ММ)")]
    BadDateTime(String),
    #[error("Неверная дата окончания повторений: {0}")]
    BadRecurrenceEnd(String),
    #[error("Окончание раньше начала")]
    EndBeforeStart,
}

/// Text buffers and toggles behind the create/edit popup.
#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    /// Set when editing; submission then updates instead of creating.
    pub editing: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub course: String,
    pub event_type: EventType,
    pub start: String,
    pub end: String,
    pub location: String,
    pub instructor: String,
    pub priority: Priority,
    pub is_recurring: bool,
    pub frequency: Frequency,
    /// Indexed like [`WEEKDAY_VALUES`].
    pub weekdays: [bool; 7],
    pub weekday_cursor: usize,
    pub recurrence_end: String,
    pub active: FormField,
}

impl EventForm {
    /// Empty form with a one-hour slot at 09:00 on `date`.
    pub fn new_on(date: NaiveDate) -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            course: String::new(),
            event_type: EventType::Class,
            start: format!("{} 09:00", date.format(DATE_FORMAT)),
            end: format!("{} 10:00", date.format(DATE_FORMAT)),
            location: String::new(),
            instructor: String::new(),
            priority: Priority::Medium,
            is_recurring: false,
            frequency: Frequency::Weekly,
            weekdays: [false; 7],
            weekday_cursor: 0,
            recurrence_end: String::new(),
            active: FormField::Title,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self::from_event_in(event, &Local)
    }

    pub fn from_event_in<Tz: TimeZone>(event: &Event, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let pattern = event.recurrence_pattern.as_ref();
        let mut weekdays = [false; 7];
        if let Some(days) = pattern.and_then(|p| p.days_of_week.as_ref()) {
            for (i, value) in WEEKDAY_VALUES.iter().enumerate() {
                weekdays[i] = days.contains(value);
            }
        }
        Self {
            editing: Some(event.id),
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            course: event.course.clone().unwrap_or_default(),
            event_type: event.event_type,
            start: event.start_time.with_timezone(tz).format(DATE_TIME_FORMAT).to_string(),
            end: event.end_time.with_timezone(tz).format(DATE_TIME_FORMAT).to_string(),
            location: event.location.clone().unwrap_or_default(),
            instructor: event.instructor.clone().unwrap_or_default(),
            priority: event.priority,
            is_recurring: event.is_recurring,
            frequency: pattern.map(|p| p.frequency).unwrap_or_default(),
            weekdays,
            weekday_cursor: 0,
            recurrence_end: event
                .recurrence_end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            active: FormField::Title,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Fields the user can currently move to.
    pub fn visible_fields(&self) -> impl Iterator<Item = FormField> + '_ {
        FormField::ALL
            .into_iter()
            .filter(|f| self.is_recurring || !f.is_recurrence_option())
    }

    pub fn next_field(&mut self) {
        let fields: Vec<FormField> = self.visible_fields().collect();
        let idx = fields.iter().position(|f| *f == self.active).unwrap_or(0);
        self.active = fields[(idx + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields: Vec<FormField> = self.visible_fields().collect();
        let idx = fields.iter().position(|f| *f == self.active).unwrap_or(0);
        self.active = fields[(idx + fields.len() - 1) % fields.len()];
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.active {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Course => Some(&mut self.course),
            FormField::Start => Some(&mut self.start),
            FormField::End => Some(&mut self.end),
            FormField::Location => Some(&mut self.location),
            FormField::Instructor => Some(&mut self.instructor),
            FormField::RecurrenceEnd => Some(&mut self.recurrence_end),
            _ => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(buf) = self.active_buffer() {
            buf.push(c);
        } else if c == ' ' {
            self.toggle();
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buf) = self.active_buffer() {
            buf.pop();
        }
    }

    /// Cycles or toggles the active choice field.
    pub fn toggle(&mut self) {
        match self.active {
            FormField::Type => self.event_type = self.event_type.next(),
            FormField::Priority => self.priority = self.priority.next(),
            FormField::Recurring => self.is_recurring = !self.is_recurring,
            FormField::Frequency => self.frequency = self.frequency.next(),
            FormField::Weekdays => {
                let i = self.weekday_cursor;
                self.weekdays[i] = !self.weekdays[i];
            }
            _ => {}
        }
    }

    pub fn move_weekday_cursor(&mut self, delta: i32) {
        self.weekday_cursor = (self.weekday_cursor as i32 + delta).rem_euclid(7) as usize;
    }

    pub fn to_draft(&self) -> Result<EventDraft, FormError> {
        self.to_draft_in(&Local)
    }

    /// Builds the request body, reading times in `tz`.
    pub fn to_draft_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<EventDraft, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::MissingTitle);
        }
        let start_time = parse_local(&self.start, tz)?;
        let end_time = parse_local(&self.end, tz)?;
        if end_time < start_time {
            return Err(FormError::EndBeforeStart);
        }

        let (recurrence_pattern, recurrence_end_date) = if self.is_recurring {
            let days: Vec<u8> = WEEKDAY_VALUES
                .iter()
                .zip(self.weekdays)
                .filter(|(_, checked)| *checked)
                .map(|(value, _)| *value)
                .collect();
            let pattern = RecurrencePattern {
                frequency: self.frequency,
                days_of_week: (!days.is_empty()).then_some(days),
                interval: 1,
            };
            let end = match self.recurrence_end.trim() {
                "" => None,
                s => Some(
                    NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .map_err(|_| FormError::BadRecurrenceEnd(s.to_string()))?,
                ),
            };
            (Some(pattern), end)
        } else {
            (None, None)
        };

        Ok(EventDraft {
            title: title.to_string(),
            description: non_empty(&self.description),
            course: non_empty(&self.course),
            event_type: self.event_type,
            start_time,
            end_time,
            location: non_empty(&self.location),
            instructor: non_empty(&self.instructor),
            priority: self.priority,
            is_recurring: self.is_recurring,
            recurrence_pattern,
            recurrence_end_date,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_local<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateTime<Utc>, FormError> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT)
        .map_err(|_| FormError::BadDateTime(s.to_string()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| FormError::BadDateTime(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Коллоквиум".into(),
            description: Some("Главы 1-3".into()),
            course: Some("Алгебра".into()),
            event_type: EventType::Exam,
            start_time: DateTime::parse_from_rfc3339("2024-10-14T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            end_time: DateTime::parse_from_rfc3339("2024-10-14T11:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            location: None,
            instructor: Some("Петров".into()),
            priority: Priority::High,
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern {
                frequency: Frequency::Weekly,
                days_of_week: Some(vec![1, 3]),
                interval: 1,
            }),
            recurrence_end_date: NaiveDate::from_ymd_opt(2024, 12, 27),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn editing_without_changes_preserves_every_field() {
        let event = sample_event();
        let form = EventForm::from_event_in(&event, &Utc);
        assert!(form.is_editing());
        assert_eq!(form.to_draft_in(&Utc).unwrap(), event.to_draft());
    }

    #[test]
    fn editing_one_field_keeps_the_rest() {
        let event = sample_event();
        let mut form = EventForm::from_event_in(&event, &Utc);
        form.location = "Ауд. 214".into();
        let draft = form.to_draft_in(&Utc).unwrap();
        let mut expected = event.to_draft();
        expected.location = Some("Ауд. 214".into());
        assert_eq!(draft, expected);
    }

    #[test]
    fn round_trip_in_offset_zone() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let event = sample_event();
        let form = EventForm::from_event_in(&event, &tz);
        assert_eq!(form.start, "2024-10-14 13:00");
        assert_eq!(form.to_draft_in(&tz).unwrap().start_time, event.start_time);
    }

    #[test]
    fn new_form_creates_plain_event() {
        let mut form = EventForm::new_on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        assert!(!form.is_editing());
        assert_eq!(form.to_draft_in(&Utc), Err(FormError::MissingTitle));

        form.title = "  Семинар ".into();
        let draft = form.to_draft_in(&Utc).unwrap();
        assert_eq!(draft.title, "Семинар");
        assert_eq!(draft.description, None);
        assert!(draft.recurrence_pattern.is_none());
        assert_eq!((draft.end_time - draft.start_time).num_minutes(), 60);
    }

    #[test]
    fn recurrence_collects_checked_weekdays() {
        let mut form = EventForm::new_on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        form.title = "Лабораторная".into();
        form.is_recurring = true;
        let draft = form.to_draft_in(&Utc).unwrap();
        let pattern = draft.recurrence_pattern.unwrap();
        assert_eq!(pattern.days_of_week, None);
        assert_eq!(pattern.interval, 1);
        assert_eq!(draft.recurrence_end_date, None);

        form.active = FormField::Weekdays;
        form.toggle();
        form.move_weekday_cursor(-1);
        form.toggle();
        form.recurrence_end = "2024-12-31".into();
        let draft = form.to_draft_in(&Utc).unwrap();
        assert_eq!(draft.recurrence_pattern.unwrap().days_of_week, Some(vec![1, 0]));
        assert_eq!(draft.recurrence_end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn invalid_times_are_reported() {
        let mut form = EventForm::new_on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        form.title = "x".into();
        form.start = "завтра".into();
        assert!(matches!(form.to_draft_in(&Utc), Err(FormError::BadDateTime(_))));
        form.start = "2024-09-02 11:00".into();
        assert_eq!(form.to_draft_in(&Utc), Err(FormError::EndBeforeStart));
    }

    #[test]
    fn recurrence_fields_hidden_until_enabled() {
        let mut form = EventForm::new_on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        assert!(!form.visible_fields().any(|f| f == FormField::Frequency));
        form.active = FormField::Recurring;
        form.next_field();
        assert_eq!(form.active, FormField::Title);
        form.is_recurring = true;
        form.active = FormField::Recurring;
        form.next_field();
        assert_eq!(form.active, FormField::Frequency);
    }
}
