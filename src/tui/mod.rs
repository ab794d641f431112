pub mod event;
pub mod form;
pub mod ui;

use crate::api::{ApiError, CalendarClient};
use crate::calendar::{
    partition::{events_for_day, events_for_week},
    week_end, week_number, week_start, CalendarState, View, WeekLayout,
};
use crate::config::Config;
use crate::models::*;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use form::EventForm;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

// ─── Commands ───────────────────────────────────────────────────────────────

/// Every user action reachable from the calendar screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// One period forward (`1`) or back (`-1`).
    Navigate(i32),
    GoToToday,
    SetView(View),
    ToggleView,
    MoveSelection(i64),
    CycleFocus(i32),
    OpenDetails,
    OpenCreateForm,
    QuickAdd,
    QuickAddWeek,
    Refresh,
}

// ─── Popups ─────────────────────────────────────────────────────────────────

/// Multi-step text prompts. Each step carries what earlier steps collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStep {
    QuickTitle { date: NaiveDate },
    QuickNotes { date: NaiveDate, title: String },
    WeekTitle { start: NaiveDate, number: u32 },
    WeekNotes { start: NaiveDate, number: u32, title: String },
    NoteAuthor { event_id: Uuid },
    NoteContent { event_id: Uuid, author: String },
    UploadPath { event_id: Uuid },
    UploadAuthor { event_id: Uuid, path: PathBuf },
}

impl PromptStep {
    pub fn label(&self) -> String {
        match self {
            Self::QuickTitle { .. } => "Название события:".into(),
            Self::WeekTitle { number, .. } => format!("Создать событие для недели {number}:"),
            Self::QuickNotes { .. } | Self::WeekNotes { .. } => "Заметки (необязательно):".into(),
            Self::NoteAuthor { .. } => "Ваше имя:".into(),
            Self::NoteContent { .. } => "Добавить заметку:".into(),
            Self::UploadPath { .. } => "Путь к файлу:".into(),
            Self::UploadAuthor { .. } => "Имя загрузившего:".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub step: PromptStep,
    pub input: String,
}

impl Prompt {
    fn new(step: PromptStep) -> Self {
        Self { step, input: String::new() }
    }

    fn prefilled(step: PromptStep, input: Option<&str>) -> Self {
        Self {
            step,
            input: input.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Popup {
    Form(EventForm),
    Prompt(Prompt),
    ConfirmDelete(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    pub details: EventDetails,
    pub file_cursor: usize,
}

// ─── Toasts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created: Instant,
}

// ─── Background outcomes ────────────────────────────────────────────────────

/// Result of a spawned API task, applied on the UI loop.
#[derive(Debug)]
pub enum Outcome {
    EventsLoaded(Result<Vec<Event>, ApiError>),
    Saved { created: bool, result: Result<Event, ApiError> },
    Deleted(Result<(), ApiError>),
    DetailsLoaded(Result<EventDetails, ApiError>),
    NoteAdded { event_id: Uuid, result: Result<(), ApiError> },
    NotesLoaded { event_id: Uuid, result: Result<Vec<EventNote>, ApiError> },
    FileUploaded { event_id: Uuid, result: Result<(), ApiError> },
    FileDownloaded(Result<PathBuf, ApiError>),
}

/// An item in the side panel for the selected day.
#[derive(Debug, Clone, Copy)]
pub struct DayItem<'a> {
    pub event: &'a Event,
    pub week_long: bool,
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub client: CalendarClient,
    pub config: Config,
    pub running: bool,

    pub calendar: CalendarState,
    pub week_layout: WeekLayout,
    /// Read-through cache, replaced wholesale after every mutation.
    pub events: Vec<Event>,
    /// Index into [`App::day_items`].
    pub focus: usize,

    pub details: Option<DetailsView>,
    pub popup: Option<Popup>,
    pub toasts: Vec<Toast>,

    /// Requests still running; drives the loading indicator.
    pub in_flight: usize,
    pub frame_count: u64,

    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl App {
    pub fn new(client: CalendarClient, config: Config) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            client,
            week_layout: config.week_layout,
            config,
            running: true,
            calendar: CalendarState::new(Local::now().date_naive()),
            events: Vec::new(),
            focus: 0,
            details: None,
            popup: None,
            toasts: Vec::new(),
            in_flight: 0,
            frame_count: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    // ── Commands ────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, command: Command) {
        tracing::trace!(?command, "dispatch");
        match command {
            Command::Quit => self.running = false,
            Command::Navigate(direction) => {
                self.calendar.navigate(direction);
                self.focus = 0;
            }
            Command::GoToToday => {
                self.calendar.go_to_today();
                self.focus = 0;
            }
            Command::SetView(view) => self.calendar.set_view(view),
            Command::ToggleView => self.calendar.set_view(self.calendar.view.toggle()),
            Command::MoveSelection(days) => {
                self.calendar.move_selection(days);
                self.focus = 0;
            }
            Command::CycleFocus(delta) => {
                let len = self.day_items().len();
                if len > 0 {
                    self.focus = (self.focus as i64 + delta as i64).rem_euclid(len as i64) as usize;
                }
            }
            Command::OpenDetails => {
                if let Some(id) = self.focused_event().map(|e| e.id) {
                    self.open_details(id);
                }
            }
            Command::OpenCreateForm => {
                self.popup = Some(Popup::Form(EventForm::new_on(self.calendar.selected)));
            }
            Command::QuickAdd => {
                let date = self.calendar.selected;
                self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::QuickTitle { date })));
            }
            Command::QuickAddWeek => {
                let start = week_start(self.calendar.selected);
                let number = week_number(start);
                self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::WeekTitle { start, number })));
            }
            Command::Refresh => self.load_events(),
        }
    }

    /// Week-long items of the selected week, then the selected day's events.
    pub fn day_items(&self) -> Vec<DayItem<'_>> {
        let date = self.calendar.selected;
        let week = events_for_week(&self.events, week_start(date), &Local)
            .into_iter()
            .map(|event| DayItem { event, week_long: true });
        let day = events_for_day(&self.events, date, &Local)
            .into_iter()
            .map(|event| DayItem { event, week_long: false });
        week.chain(day).collect()
    }

    pub fn focused_event(&self) -> Option<&Event> {
        self.day_items().get(self.focus).map(|item| item.event)
    }

    // ── Background work ─────────────────────────────────────────────────

    /// Runs `task` on the runtime; its outcome arrives via `poll_outcomes`.
    /// Requests are never deduplicated or cancelled.
    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    pub fn load_events(&mut self) {
        let client = self.client.clone();
        self.spawn(async move { Outcome::EventsLoaded(client.list_events().await) });
    }

    pub fn open_details(&mut self, id: Uuid) {
        let client = self.client.clone();
        self.spawn(async move { Outcome::DetailsLoaded(client.event_details(id).await) });
    }

    fn submit_draft(&mut self, editing: Option<Uuid>, draft: EventDraft) {
        let client = self.client.clone();
        self.spawn(async move {
            match editing {
                Some(id) => Outcome::Saved {
                    created: false,
                    result: client.update_event(id, &draft).await,
                },
                None => Outcome::Saved {
                    created: true,
                    result: client.create_event(&draft).await,
                },
            }
        });
    }

    fn delete_event(&mut self, id: Uuid) {
        let client = self.client.clone();
        self.spawn(async move { Outcome::Deleted(client.delete_event(id).await) });
    }

    /// Refreshes only the notes of the open details popup.
    pub fn reload_notes(&mut self) {
        let Some(event_id) = self.details_event_id() else {
            return;
        };
        let client = self.client.clone();
        self.spawn(async move {
            Outcome::NotesLoaded {
                event_id,
                result: client.list_notes(event_id).await,
            }
        });
    }

    fn add_note(&mut self, event_id: Uuid, note: NewNote) {
        let client = self.client.clone();
        self.spawn(async move {
            Outcome::NoteAdded {
                event_id,
                result: client.add_note(event_id, &note).await,
            }
        });
    }

    fn upload_file(&mut self, event_id: Uuid, path: PathBuf, uploaded_by: String) {
        let client = self.client.clone();
        self.spawn(async move {
            Outcome::FileUploaded {
                event_id,
                result: client.upload_file(event_id, &path, &uploaded_by).await,
            }
        });
    }

    pub fn download_file(&mut self, file_id: Uuid) {
        let client = self.client.clone();
        let dir = self.config.download_dir();
        self.spawn(async move { Outcome::FileDownloaded(save_download(client, file_id, dir).await) });
    }

    /// Applies every finished task without blocking.
    pub fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply_outcome(outcome);
        }
    }

    pub fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::EventsLoaded(Ok(events)) => {
                tracing::info!(count = events.len(), "events loaded");
                self.events = events;
                let len = self.day_items().len();
                if self.focus >= len {
                    self.focus = len.saturating_sub(1);
                }
            }
            Outcome::EventsLoaded(Err(e)) => self.fail(&e, Failure::Fixed("Ошибка загрузки событий")),
            Outcome::Saved { created, result: Ok(event) } => {
                let saved_form = match &self.popup {
                    Some(Popup::Form(form)) if created => form.editing.is_none(),
                    Some(Popup::Form(form)) => form.editing == Some(event.id),
                    _ => false,
                };
                if saved_form {
                    self.popup = None;
                }
                self.load_events();
                self.toast(
                    if created { "Событие создано!" } else { "Событие обновлено!" },
                    ToastKind::Success,
                );
            }
            Outcome::Saved { created, result: Err(e) } => self.fail(
                &e,
                Failure::ServerOr(if created {
                    "Ошибка создания события"
                } else {
                    "Ошибка сохранения события"
                }),
            ),
            Outcome::Deleted(Ok(())) => {
                self.details = None;
                self.load_events();
                self.toast("Событие удалено!", ToastKind::Success);
            }
            Outcome::Deleted(Err(e)) => self.fail(&e, Failure::Fixed("Ошибка удаления события")),
            Outcome::DetailsLoaded(Ok(details)) => {
                let file_cursor = self
                    .details
                    .as_ref()
                    .filter(|d| d.details.event.id == details.event.id)
                    .map(|d| d.file_cursor.min(details.files.len().saturating_sub(1)))
                    .unwrap_or(0);
                self.details = Some(DetailsView { details, file_cursor });
            }
            Outcome::DetailsLoaded(Err(e)) => self.fail(&e, Failure::Fixed("Ошибка загрузки деталей события")),
            Outcome::NoteAdded { event_id, result: Ok(()) } => {
                self.open_details(event_id);
                self.toast("Заметка добавлена!", ToastKind::Success);
            }
            Outcome::NotesLoaded { event_id, result: Ok(notes) } => {
                if let Some(view) = self.details.as_mut().filter(|d| d.details.event.id == event_id) {
                    view.details.notes = notes;
                }
            }
            Outcome::NotesLoaded { result: Err(e), .. } => self.fail(&e, Failure::Fixed("Ошибка загрузки заметок")),
            Outcome::FileUploaded { event_id, result: Ok(()) } => {
                self.load_events();
                if self.details_event_id() == Some(event_id) {
                    self.open_details(event_id);
                }
                self.toast("Файл загружен!", ToastKind::Success);
            }
            Outcome::NoteAdded { result: Err(e), .. } => {
                self.fail(&e, Failure::ServerOr("Ошибка добавления заметки"))
            }
            Outcome::FileUploaded { result: Err(e), .. } => {
                self.fail(&e, Failure::ServerOr("Ошибка загрузки файла"))
            }
            Outcome::FileDownloaded(Ok(path)) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::info!(path = %path.display(), "file saved");
                self.toast(format!("Файл {name} скачан!"), ToastKind::Success);
            }
            Outcome::FileDownloaded(Err(e)) => self.fail(&e, Failure::Fixed("Ошибка скачивания файла")),
        }
    }

    fn details_event_id(&self) -> Option<Uuid> {
        self.details.as_ref().map(|d| d.details.event.id)
    }

    // ── Popups ──────────────────────────────────────────────────────────

    pub fn close_details(&mut self) {
        self.details = None;
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    /// Opens the form pre-filled from the cached copy of the event.
    pub fn edit_event(&mut self, id: Uuid) {
        let event = self
            .events
            .iter()
            .find(|e| e.id == id)
            .or_else(|| self.details.as_ref().map(|d| &d.details.event).filter(|e| e.id == id));
        if let Some(event) = event {
            let form = EventForm::from_event(event);
            self.details = None;
            self.popup = Some(Popup::Form(form));
        }
    }

    pub fn request_delete(&mut self, id: Uuid) {
        self.popup = Some(Popup::ConfirmDelete(id));
    }

    pub fn confirm_delete(&mut self) {
        if let Some(Popup::ConfirmDelete(id)) = self.popup.take() {
            self.delete_event(id);
        }
    }

    pub fn start_note(&mut self, event_id: Uuid) {
        let author = self.config.default_author.clone();
        self.popup = Some(Popup::Prompt(Prompt::prefilled(
            PromptStep::NoteAuthor { event_id },
            author.as_deref(),
        )));
    }

    pub fn start_upload(&mut self, event_id: Uuid) {
        self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::UploadPath { event_id })));
    }

    pub fn download_selected_file(&mut self) {
        let file_id = self
            .details
            .as_ref()
            .and_then(|d| d.details.files.get(d.file_cursor))
            .map(|f| f.id);
        if let Some(id) = file_id {
            self.download_file(id);
        }
    }

    pub fn submit_form(&mut self) {
        let Some(Popup::Form(form)) = &self.popup else {
            return;
        };
        match form.to_draft() {
            Ok(draft) => {
                let editing = form.editing;
                self.submit_draft(editing, draft);
            }
            Err(e) => self.toast(e.to_string(), ToastKind::Error),
        }
    }

    /// Advances the active prompt with its current input. Empty required
    /// input closes the prompt without touching the network.
    pub fn submit_prompt(&mut self) {
        let Some(Popup::Prompt(prompt)) = self.popup.take() else {
            return;
        };
        let input = prompt.input.trim().to_string();
        let author = self.config.default_author.clone();

        match prompt.step {
            PromptStep::QuickTitle { date } => {
                if !input.is_empty() {
                    self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::QuickNotes {
                        date,
                        title: input,
                    })));
                }
            }
            PromptStep::QuickNotes { date, title } => {
                self.submit_draft(None, quick_event_draft(date, title, input, &Local));
            }
            PromptStep::WeekTitle { start, number } => {
                if !input.is_empty() {
                    self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::WeekNotes {
                        start,
                        number,
                        title: input,
                    })));
                }
            }
            PromptStep::WeekNotes { start, number, title } => {
                self.submit_draft(None, week_event_draft(start, number, title, input, &Local));
            }
            PromptStep::NoteAuthor { event_id } => {
                self.popup = Some(Popup::Prompt(Prompt::new(PromptStep::NoteContent {
                    event_id,
                    author: input,
                })));
            }
            PromptStep::NoteContent { event_id, author } => {
                if author.is_empty() || input.is_empty() {
                    self.toast("Пожалуйста, заполните имя и текст заметки", ToastKind::Error);
                    return;
                }
                self.add_note(
                    event_id,
                    NewNote {
                        author_name: author,
                        content: input,
                    },
                );
            }
            PromptStep::UploadPath { event_id } => {
                if input.is_empty() || !Path::new(&input).is_file() {
                    self.toast("Пожалуйста, выберите файл", ToastKind::Error);
                    return;
                }
                self.popup = Some(Popup::Prompt(Prompt::prefilled(
                    PromptStep::UploadAuthor {
                        event_id,
                        path: PathBuf::from(input),
                    },
                    author.as_deref(),
                )));
            }
            PromptStep::UploadAuthor { event_id, path } => {
                self.upload_file(event_id, path, input);
            }
        }
    }

    // ── Toasts ──────────────────────────────────────────────────────────

    pub fn toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toasts.push(Toast {
            message: message.into(),
            kind,
            created: Instant::now(),
        });
    }

    fn fail(&mut self, err: &ApiError, failure: Failure) {
        tracing::warn!(error = %err, "request failed");
        let message = failure_message(err, failure);
        self.toast(message, ToastKind::Error);
    }

    pub fn prune_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_TTL);
    }

    /// Keeps "today" current across midnight.
    pub fn tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
        self.calendar.today = Local::now().date_naive();
        self.prune_toasts(Instant::now());
    }
}

/// Which text an error toast shows for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Always this text.
    Fixed(&'static str),
    /// The server's message if it sent one, else this text. Transport
    /// errors get a generic connection line.
    ServerOr(&'static str),
}

pub fn failure_message(err: &ApiError, failure: Failure) -> String {
    match (err, failure) {
        (ApiError::Io(_) | ApiError::Other(_), _) => err.to_string(),
        (ApiError::Rejected(Some(message)), Failure::ServerOr(_)) => message.clone(),
        (ApiError::Rejected(None), Failure::ServerOr(text)) | (_, Failure::Fixed(text)) => {
            text.to_string()
        }
        (_, Failure::ServerOr(_)) => "Ошибка подключения к серверу".to_string(),
    }
}

fn local_at<Tz: TimeZone>(date: NaiveDate, hour: u32, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(hour, 0, 0).unwrap_or_default();
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// One-hour `other` event at 09:00 on `date`.
pub fn quick_event_draft<Tz: TimeZone>(
    date: NaiveDate,
    title: String,
    notes: String,
    tz: &Tz,
) -> EventDraft {
    EventDraft::simple(title, notes, local_at(date, 9, tz), local_at(date, 10, tz))
}

/// Week-long event from Monday 09:00 to Sunday 17:00, titled with the week.
pub fn week_event_draft<Tz: TimeZone>(
    start: NaiveDate,
    number: u32,
    title: String,
    notes: String,
    tz: &Tz,
) -> EventDraft {
    EventDraft::simple(
        format!("{title} (Неделя {number})"),
        notes,
        local_at(start, 9, tz),
        local_at(week_end(start), 17, tz),
    )
}

async fn save_download(
    client: CalendarClient,
    file_id: Uuid,
    dir: PathBuf,
) -> Result<PathBuf, ApiError> {
    let download = client.download_file(file_id).await?;
    let path = dir.join(safe_filename(&download.filename));
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(&path, &download.bytes).await?;
    Ok(path)
}

/// Keeps only the final path component of a server-suggested name.
pub fn safe_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => crate::api::DEFAULT_FILENAME.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::partition::events_for_week;
    use chrono::Duration as ChronoDuration;

    fn app() -> App {
        let client = CalendarClient::new("http://127.0.0.1:9").unwrap();
        App::new(client, Config::default())
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stored(draft: EventDraft) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            course: draft.course,
            event_type: draft.event_type,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: draft.location,
            instructor: draft.instructor,
            priority: draft.priority,
            is_recurring: draft.is_recurring,
            recurrence_pattern: draft.recurrence_pattern,
            recurrence_end_date: draft.recurrence_end_date,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn quick_event_is_one_hour_on_the_day() {
        let draft = quick_event_draft(d(2024, 9, 2), "Консультация".into(), String::new(), &Utc);
        assert_eq!(draft.start_time.to_rfc3339(), "2024-09-02T09:00:00+00:00");
        assert_eq!(draft.end_time - draft.start_time, ChronoDuration::hours(1));
        assert_eq!(draft.event_type, EventType::Other);
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.description.as_deref(), Some(""));
    }

    #[test]
    fn week_event_spans_the_week_and_lands_in_its_row() {
        let draft = week_event_draft(d(2024, 9, 2), 2, "Практика".into(), "лаб.".into(), &Utc);
        assert_eq!(draft.title, "Практика (Неделя 2)");
        assert_eq!(draft.end_time.to_rfc3339(), "2024-09-08T17:00:00+00:00");
        let events = vec![stored(draft)];
        assert_eq!(events_for_week(&events, d(2024, 9, 2), &Utc).len(), 1);
    }

    #[test]
    fn filenames_lose_directories() {
        assert_eq!(safe_filename("report.pdf"), "report.pdf");
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename("C:\\tmp\\a.txt"), "a.txt");
        assert_eq!(safe_filename(".."), "file");
    }

    #[test]
    fn failure_messages() {
        let rejected = ApiError::Rejected(Some("Нет доступа".into()));
        let save = Failure::ServerOr("Ошибка сохранения события");
        assert_eq!(failure_message(&rejected, save), "Нет доступа");
        assert_eq!(failure_message(&rejected, Failure::Fixed("Ошибка")), "Ошибка");
        let silent = ApiError::Rejected(None);
        assert_eq!(failure_message(&silent, save), "Ошибка сохранения события");
        let http = ApiError::Http { status: 500, message: String::new() };
        assert_eq!(failure_message(&http, save), "Ошибка подключения к серверу");
    }

    #[test]
    fn navigation_commands_reset_focus() {
        let mut app = app();
        app.focus = 3;
        app.dispatch(Command::MoveSelection(1));
        assert_eq!(app.focus, 0);
        let anchor = app.calendar.anchor;
        app.dispatch(Command::ToggleView);
        assert_eq!(app.calendar.view, View::Week);
        assert_eq!(app.calendar.anchor, anchor);
        app.dispatch(Command::Quit);
        assert!(!app.running);
    }

    #[test]
    fn empty_quick_title_aborts_silently() {
        let mut app = app();
        app.dispatch(Command::QuickAdd);
        app.submit_prompt();
        assert!(app.popup.is_none());
        assert!(app.toasts.is_empty());
        assert_eq!(app.in_flight, 0);
    }

    #[test]
    fn quick_title_leads_to_notes_prompt() {
        let mut app = app();
        app.dispatch(Command::QuickAdd);
        if let Some(Popup::Prompt(p)) = &mut app.popup {
            p.input = "Зачёт".into();
        }
        app.submit_prompt();
        match &app.popup {
            Some(Popup::Prompt(Prompt { step: PromptStep::QuickNotes { title, .. }, .. })) => {
                assert_eq!(title, "Зачёт")
            }
            other => panic!("unexpected popup {other:?}"),
        }
    }

    #[test]
    fn note_requires_author_and_content() {
        let mut app = app();
        let event_id = Uuid::new_v4();
        app.start_note(event_id);
        app.submit_prompt();
        app.submit_prompt();
        assert!(app.popup.is_none());
        assert_eq!(app.in_flight, 0);
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].kind, ToastKind::Error);
    }

    #[test]
    fn upload_without_file_is_refused() {
        let mut app = app();
        app.start_upload(Uuid::new_v4());
        if let Some(Popup::Prompt(p)) = &mut app.popup {
            p.input = "/definitely/not/here.pdf".into();
        }
        app.submit_prompt();
        assert!(app.popup.is_none());
        assert_eq!(app.in_flight, 0);
        assert_eq!(app.toasts[0].message, "Пожалуйста, выберите файл");
    }

    #[test]
    fn failed_details_keep_previous_state() {
        let mut app = app();
        app.apply_outcome(Outcome::DetailsLoaded(Err(ApiError::Rejected(Some("x".into())))));
        assert!(app.details.is_none());
        assert_eq!(app.toasts[0].message, "Ошибка загрузки деталей события");
    }

    #[test]
    fn loaded_events_feed_the_day_panel() {
        let mut app = app();
        let today = app.calendar.selected;
        let start = local_at(today, 9, &Local);
        let draft = EventDraft::simple("Лекция".into(), String::new(), start, start + ChronoDuration::hours(1));
        app.apply_outcome(Outcome::EventsLoaded(Ok(vec![stored(draft)])));
        assert_eq!(app.day_items().len(), 1);
        assert_eq!(app.focused_event().map(|e| e.title.as_str()), Some("Лекция"));
        app.dispatch(Command::CycleFocus(1));
        assert_eq!(app.focus, 0);
    }

    #[test]
    fn reloaded_notes_replace_only_the_open_event() {
        let mut app = app();
        let start = local_at(d(2024, 9, 2), 9, &Utc);
        let event = stored(EventDraft::simple("Лекция".into(), String::new(), start, start));
        let event_id = event.id;
        app.apply_outcome(Outcome::DetailsLoaded(Ok(EventDetails {
            event,
            files: Vec::new(),
            notes: Vec::new(),
        })));
        let note = EventNote {
            id: Uuid::new_v4(),
            author_name: "Анна".into(),
            content: "Принести тетрадь".into(),
            created_at: start,
        };

        app.apply_outcome(Outcome::NotesLoaded { event_id: Uuid::new_v4(), result: Ok(vec![note.clone()]) });
        assert!(app.details.as_ref().unwrap().details.notes.is_empty());

        app.apply_outcome(Outcome::NotesLoaded { event_id, result: Ok(vec![note]) });
        assert_eq!(app.details.as_ref().unwrap().details.notes.len(), 1);
    }

    #[test]
    fn toasts_expire() {
        let mut app = app();
        app.toast("hello", ToastKind::Success);
        let created = app.toasts[0].created;
        app.prune_toasts(created + Duration::from_secs(1));
        assert_eq!(app.toasts.len(), 1);
        app.prune_toasts(created + TOAST_TTL);
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn rejected_note_without_message_uses_russian_fallback() {
        let mut app = app();
        app.apply_outcome(Outcome::NoteAdded {
            event_id: Uuid::new_v4(),
            result: Err(ApiError::Rejected(None)),
        });
        assert_eq!(app.toasts[0].message, "Ошибка добавления заметки");
        assert_eq!(app.toasts[0].kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn save_closes_only_the_form_it_came_from() {
        let mut app = app();
        let start = local_at(d(2024, 9, 2), 9, &Utc);
        let edited = stored(EventDraft::simple("Лекция".into(), String::new(), start, start));
        let other = stored(EventDraft::simple("Семинар".into(), String::new(), start, start));
        app.popup = Some(Popup::Form(EventForm::from_event(&edited)));

        app.apply_outcome(Outcome::Saved { created: true, result: Ok(other.clone()) });
        assert!(matches!(app.popup, Some(Popup::Form(_))));
        app.apply_outcome(Outcome::Saved { created: false, result: Ok(other) });
        assert!(matches!(app.popup, Some(Popup::Form(_))));

        app.apply_outcome(Outcome::Saved { created: false, result: Ok(edited) });
        assert!(app.popup.is_none());

        app.popup = Some(Popup::Form(EventForm::new_on(d(2024, 9, 2))));
        let created = stored(EventDraft::simple("Зачёт".into(), String::new(), start, start));
        app.apply_outcome(Outcome::Saved { created: true, result: Ok(created) });
        assert!(app.popup.is_none());
    }

    #[tokio::test]
    async fn mutations_are_tracked_as_in_flight() {
        let mut app = app();
        app.request_delete(Uuid::new_v4());
        app.confirm_delete();
        assert!(app.popup.is_none());
        assert!(app.loading());
    }
}
