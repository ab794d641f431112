use chrono::{Datelike, Duration, Local, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::form::{EventForm, FormField, WEEKDAY_VALUES};
use super::{App, DetailsView, Popup, Prompt, ToastKind};
use crate::calendar::{
    locale,
    partition::{events_for_day, events_for_week},
    month_grid, week_row, week_start, DayCell, View, WeekLayout, WeekRow,
};
use crate::models::{Event, EventType, Priority};

const ACCENT: Color = Color::Cyan;
const HEADER_BG: Color = Color::DarkGray;
const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
const TODAY: Color = Color::Rgb(255, 185, 50);
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;
const BAD: Color = Color::Red;

const WEEK_COLUMN_WIDTH: u16 = 12;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

// ─── Main render ────────────────────────────────────────────────────────────

/// Draws the whole screen from `app`. Reads no clock, so the same state
/// always produces the same buffer.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(chunks[1]);

    match (app.calendar.view, app.week_layout) {
        (View::Month, _) => render_month(f, app, body[0]),
        (View::Week, WeekLayout::Grid) => render_week_grid(f, app, body[0]),
        (View::Week, WeekLayout::Agenda) => render_week_agenda(f, app, body[0]),
    }
    render_day_panel(f, app, body[1]);
    render_status_bar(f, app, chunks[2]);

    if let Some(view) = &app.details {
        render_details(f, view, f.area());
    }
    match &app.popup {
        Some(Popup::Form(form)) => render_form(f, form, f.area()),
        Some(Popup::Prompt(prompt)) => render_prompt(f, prompt, f.area()),
        Some(Popup::ConfirmDelete(_)) => render_confirm(f, f.area()),
        None => {}
    }
    render_toasts(f, app, chunks[1]);
}

// ─── Title ──────────────────────────────────────────────────────────────────

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let view = match app.calendar.view {
        View::Month => "Месяц",
        View::Week => "Неделя",
    };
    let title = Line::from(vec![
        Span::styled(" Календарь ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(DIM)),
        Span::styled(
            locale::period_title(app.calendar.view, app.calendar.anchor),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  [{view}]"), Style::default().fg(DIM)),
        Span::styled(
            format!("  Сегодня: {}", app.calendar.today.format("%d.%m.%Y")),
            Style::default().fg(TODAY),
        ),
    ]);
    f.render_widget(
        Paragraph::new(title).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let loading = if app.loading() {
        let frame = SPINNER[(app.frame_count as usize / 2) % SPINNER.len()];
        format!(" {frame} Загрузка…")
    } else {
        format!(" {} событий", app.events.len())
    };

    let hints = if app.details.is_some() {
        "  e:изменить  d:удалить  u:файл  s:скачать  c:заметка  r:заметки  Esc:закрыть"
    } else {
        "  q:выход  ←→↑↓:день  n/p:период  m/w:вид  t:сегодня  Enter:открыть  c:создать  a/A:быстро  r:обновить"
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            loading,
            Style::default().fg(if app.loading() { WARN } else { Color::White }),
        ),
        Span::styled(hints, Style::default().fg(DIM)),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Month ──────────────────────────────────────────────────────────────────

fn render_month(f: &mut Frame, app: &App, area: Rect) {
    let cal = &app.calendar;
    let weeks = month_grid(cal.anchor, cal.today, Some(cal.selected));
    render_grid(f, app, area, &weeks);
}

fn render_week_grid(f: &mut Frame, app: &App, area: Rect) {
    let cal = &app.calendar;
    let row = week_row(week_start(cal.anchor), cal.anchor, cal.today, Some(cal.selected));
    render_grid(f, app, area, std::slice::from_ref(&row));
}

fn grid_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    let mut constraints = vec![Constraint::Length(WEEK_COLUMN_WIDTH)];
    constraints.extend(std::iter::repeat(Constraint::Ratio(1, 7)).take(7));
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area)
}

fn render_grid(f: &mut Frame, app: &App, area: Rect, weeks: &[WeekRow]) {
    let mut rows = vec![Constraint::Length(1)];
    rows.extend(std::iter::repeat(Constraint::Ratio(1, weeks.len() as u32)).take(weeks.len()));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(rows)
        .split(area);

    let header = grid_columns(rows[0]);
    f.render_widget(
        Paragraph::new(locale::WEEK_HEADER).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        header[0],
    );
    for (i, name) in locale::DAY_ABBREVIATIONS.iter().enumerate() {
        f.render_widget(
            Paragraph::new(format!(" {name}"))
                .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            header[i + 1],
        );
    }

    for (week, row_area) in weeks.iter().zip(rows.iter().skip(1)) {
        let cols = grid_columns(*row_area);
        render_week_cell(f, app, week, cols[0]);
        for (cell, col) in week.days.iter().zip(cols.iter().skip(1)) {
            render_day_cell(f, app, cell, *col);
        }
    }
}

fn render_week_cell(f: &mut Frame, app: &App, week: &WeekRow, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines = vec![Line::from(Span::styled(
        format!("{}", week.number),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))];
    for event in events_for_week(&app.events, week.start, &Local) {
        lines.push(Line::from(Span::styled(
            truncate(&event.title, width),
            event_style(event),
        )));
    }
    let selected_week = week_start(app.calendar.selected) == week.start;
    let border = if selected_week { ACCENT } else { DIM };
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        ),
        area,
    );
}

fn render_day_cell(f: &mut Frame, app: &App, cell: &DayCell, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let number_style = if cell.today {
        Style::default().fg(TODAY).add_modifier(Modifier::BOLD)
    } else if cell.other_month {
        Style::default().fg(DIM)
    } else {
        Style::default().fg(Color::White)
    };

    let mut lines = vec![Line::from(Span::styled(format!("{}", cell.date.day()), number_style))];
    for event in events_for_day(&app.events, cell.date, &Local) {
        lines.push(Line::from(Span::styled(
            truncate(&priority_marked(event), width),
            event_style(event),
        )));
    }

    let (border, bg) = match (cell.selected, cell.today) {
        (true, _) => (ACCENT, SELECTED_BG),
        (false, true) => (TODAY, Color::Reset),
        _ => (DIM, Color::Reset),
    };
    f.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        ),
        area,
    );
}

// ─── Week agenda ────────────────────────────────────────────────────────────

fn render_week_agenda(f: &mut Frame, app: &App, area: Rect) {
    let cal = &app.calendar;
    let (start, end) = cal.visible_range();

    let week_events = events_for_week(&app.events, start, &Local);
    let mut summary = vec![Line::from(vec![
        Span::styled(
            format!("Неделя {}", crate::calendar::week_number(start)),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} – {}", locale::day_and_month(start), locale::day_and_month(end)),
            Style::default().fg(Color::White),
        ),
    ])];
    if week_events.is_empty() {
        summary.push(Line::from(Span::styled("Нет событий на всю неделю", Style::default().fg(DIM))));
    }
    for event in &week_events {
        summary.push(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(ACCENT)),
            Span::styled(event.title.clone(), event_style(event)),
            Span::styled(
                format!(
                    "  {} – {}",
                    locale::date_time(&event.start_time, &Local),
                    locale::date_time(&event.end_time, &Local)
                ),
                Style::default().fg(DIM),
            ),
        ]));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(summary).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Неделя ")
                .title_style(Style::default().fg(ACCENT)),
        ),
        chunks[0],
    );

    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;
    for offset in 0..7 {
        let date = start + Duration::days(offset);
        if date == cal.selected {
            selected_line = lines.len();
        }
        lines.push(agenda_day_header(date, cal.today, cal.selected));

        let events = events_for_day(&app.events, date, &Local);
        if events.is_empty() {
            lines.push(Line::from(Span::styled("    —", Style::default().fg(DIM))));
        }
        for event in events {
            lines.push(agenda_event_line(event));
        }
        lines.push(Line::from(""));
    }

    let inner_height = chunks[1].height.saturating_sub(2) as usize;
    let scroll = if inner_height > 0 && selected_line >= inner_height {
        selected_line - inner_height / 3
    } else {
        0
    };

    f.render_widget(
        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn agenda_day_header(date: NaiveDate, today: NaiveDate, selected: NaiveDate) -> Line<'static> {
    let marker = if date == selected { "> " } else { "  " };
    let mut style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    if date == today {
        style = style.fg(TODAY);
    }
    if date == selected {
        style = style.bg(SELECTED_BG);
    }
    let idx = date.weekday().num_days_from_monday() as usize;
    Line::from(vec![
        Span::styled(marker, Style::default().fg(ACCENT)),
        Span::styled(
            format!(
                "{}, {} ({})",
                locale::DAY_ABBREVIATIONS[idx],
                locale::day_and_month(date),
                locale::weekday_name(date)
            ),
            style,
        ),
    ])
}

fn agenda_event_line(event: &Event) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!(
                "    {}–{}  ",
                locale::time_of_day(&event.start_time, &Local),
                locale::time_of_day(&event.end_time, &Local)
            ),
            Style::default().fg(DIM),
        ),
        Span::styled(priority_marked(event), event_style(event)),
        Span::styled(
            format!("  [{}]", locale::event_type_label(event.event_type)),
            Style::default().fg(type_color(event.event_type)),
        ),
    ];
    if let Some(location) = &event.location {
        spans.push(Span::styled(format!("  @ {location}"), Style::default().fg(DIM)));
    }
    Line::from(spans)
}

// ─── Day panel ──────────────────────────────────────────────────────────────

fn render_day_panel(f: &mut Frame, app: &App, area: Rect) {
    let date = app.calendar.selected;
    let items = app.day_items();

    let mut lines: Vec<Line> = Vec::new();
    if items.is_empty() {
        lines.push(Line::from(Span::styled("  Нет событий", Style::default().fg(DIM))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  a: добавить на день, A: на неделю",
            Style::default().fg(DIM),
        )));
    }
    for (i, item) in items.iter().enumerate() {
        let focused = i == app.focus;
        let bg = if focused { SELECTED_BG } else { Color::Reset };
        let when = if item.week_long {
            "неделя".to_string()
        } else {
            locale::time_of_day(&item.event.start_time, &Local)
        };
        lines.push(Line::from(vec![
            Span::styled(if focused { "> " } else { "  " }, Style::default().fg(ACCENT)),
            Span::styled(format!("{when:<7}"), Style::default().fg(DIM).bg(bg)),
            Span::styled(priority_marked(item.event), event_style(item.event).bg(bg)),
        ]));
        let mut meta = vec![locale::event_type_label(item.event.event_type).to_string()];
        if let Some(course) = &item.event.course {
            meta.push(course.clone());
        }
        if let Some(location) = &item.event.location {
            meta.push(location.clone());
        }
        lines.push(Line::from(Span::styled(
            format!("           {}", meta.join(" · ")),
            Style::default().fg(DIM),
        )));
    }

    let title = format!(
        " {}, {} ",
        locale::weekday_name(date),
        locale::day_and_month(date)
    );
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

// ─── Details popup ──────────────────────────────────────────────────────────

fn render_details(f: &mut Frame, view: &DetailsView, area: Rect) {
    let area = centered_rect(76, 84, area);
    f.render_widget(Clear, area);

    let d = &view.details;
    let e = &d.event;
    let label = Style::default().fg(DIM);
    let value = Style::default().fg(Color::White);
    let section = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(
            e.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Тип:        ", label),
            Span::styled(locale::event_type_label(e.event_type), Style::default().fg(type_color(e.event_type))),
        ]),
        Line::from(vec![
            Span::styled("Время:      ", label),
            Span::styled(
                format!(
                    "{} - {}",
                    locale::date_time(&e.start_time, &Local),
                    locale::date_time(&e.end_time, &Local)
                ),
                value,
            ),
        ]),
    ];
    let optional = [
        ("Место:      ", e.location.as_deref()),
        ("Преподаватель: ", e.instructor.as_deref()),
        ("Курс:       ", e.course.as_deref()),
    ];
    for (name, text) in optional {
        if let Some(text) = text {
            lines.push(Line::from(vec![
                Span::styled(name, label),
                Span::styled(text.to_string(), value),
            ]));
        }
    }
    lines.push(Line::from(vec![
        Span::styled("Приоритет:  ", label),
        Span::styled(locale::priority_label(e.priority), Style::default().fg(priority_color(e.priority))),
    ]));
    if let Some(pattern) = e.recurrence_pattern.as_ref().filter(|_| e.is_recurring) {
        let mut text = locale::frequency_label(pattern.frequency).to_string();
        if let Some(days) = &pattern.days_of_week {
            let names: Vec<&str> = WEEKDAY_VALUES
                .iter()
                .enumerate()
                .filter(|(_, v)| days.contains(v))
                .map(|(i, _)| locale::DAY_ABBREVIATIONS[i])
                .collect();
            text.push_str(&format!(" ({})", names.join(", ")));
        }
        if let Some(until) = e.recurrence_end_date {
            text.push_str(&format!(" до {}", until.format("%d.%m.%Y")));
        }
        lines.push(Line::from(vec![Span::styled("Повтор:     ", label), Span::styled(text, value)]));
    }

    if let Some(description) = &e.description {
        if !description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Описание", section)));
            lines.push(Line::from(Span::styled(description.clone(), value)));
        }
    }

    if !d.files.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Прикрепленные файлы", section)));
        for (i, file) in d.files.iter().enumerate() {
            let selected = i == view.file_cursor;
            lines.push(Line::from(vec![
                Span::styled(if selected { "> " } else { "  " }, Style::default().fg(ACCENT)),
                Span::styled(
                    file.original_filename.clone(),
                    if selected { value.bg(SELECTED_BG) } else { value },
                ),
                Span::styled(
                    format!(
                        "  ({}) - {}",
                        locale::format_file_size(file.file_size),
                        file.uploaded_by
                    ),
                    label,
                ),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Заметки и обсуждение", section)));
    if d.notes.is_empty() {
        lines.push(Line::from(Span::styled("Пока нет заметок", label)));
    }
    for note in &d.notes {
        lines.push(Line::from(vec![
            Span::styled(note.author_name.clone(), value.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", locale::date_time(&note.created_at, &Local)), label),
        ]));
        lines.push(Line::from(Span::styled(format!("  {}", note.content), value)));
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Событие ")
                .title_style(Style::default().fg(ACCENT))
                .title_bottom(Line::from(
                    " e:изменить  d:удалить  u:загрузить  j/k+s:скачать  c:заметка  Esc ",
                )),
        ),
        area,
    );
}

// ─── Form popup ─────────────────────────────────────────────────────────────

fn form_value(form: &EventForm, field: FormField) -> String {
    match field {
        FormField::Title => form.title.clone(),
        FormField::Description => form.description.clone(),
        FormField::Course => form.course.clone(),
        FormField::Type => format!("< {} >", locale::event_type_label(form.event_type)),
        FormField::Start => form.start.clone(),
        FormField::End => form.end.clone(),
        FormField::Location => form.location.clone(),
        FormField::Instructor => form.instructor.clone(),
        FormField::Priority => format!("< {} >", locale::priority_label(form.priority)),
        FormField::Recurring => (if form.is_recurring { "[x]" } else { "[ ]" }).to_string(),
        FormField::Frequency => format!("< {} >", locale::frequency_label(form.frequency)),
        FormField::Weekdays => form
            .weekdays
            .iter()
            .zip(locale::DAY_ABBREVIATIONS)
            .map(|(checked, name)| format!("[{}]{name}", if *checked { 'x' } else { ' ' }))
            .collect::<Vec<_>>()
            .join(" "),
        FormField::RecurrenceEnd => form.recurrence_end.clone(),
    }
}

fn render_form(f: &mut Frame, form: &EventForm, area: Rect) {
    let fields: Vec<FormField> = form.visible_fields().collect();
    let height = (fields.len() as u16 + 4).min(area.height);
    let width = 70.min(area.width);
    let area = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    f.render_widget(Clear, area);

    let mut lines: Vec<Line> = fields
        .iter()
        .map(|&field| {
            let active = field == form.active;
            let mut value = form_value(form, field);
            if active && field.is_text() {
                value.push('_');
            }
            let mut spans = vec![
                Span::styled(
                    format!("{:<15}", field.label()),
                    Style::default().fg(if active { ACCENT } else { DIM }),
                ),
                Span::styled(
                    value,
                    if active {
                        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
            ];
            if active && field == FormField::Weekdays {
                spans.push(Span::styled(
                    format!("  ← {} →", locale::DAY_ABBREVIATIONS[form.weekday_cursor]),
                    Style::default().fg(WARN),
                ));
            }
            Line::from(spans)
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab/↑↓: поле  ←→/Пробел: выбор  Enter: сохранить  Esc: отмена",
        Style::default().fg(DIM),
    )));

    let title = if form.is_editing() { " Редактировать событие " } else { " Создать событие " };
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(GOOD).add_modifier(Modifier::BOLD))
                .border_style(Style::default().fg(GOOD)),
        ),
        area,
    );
}

// ─── Prompt & confirm ───────────────────────────────────────────────────────

fn small_popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_prompt(f: &mut Frame, prompt: &Prompt, area: Rect) {
    let area = small_popup(area, 60, 5);
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(Span::styled(prompt.step.label(), Style::default().fg(Color::White))),
        Line::from(Span::styled(
            format!("{}_", prompt.input),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("Enter: OK  Esc: отмена", Style::default().fg(DIM))),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

fn render_confirm(f: &mut Frame, area: Rect) {
    let area = small_popup(area, 56, 4);
    f.render_widget(Clear, area);
    let lines = vec![
        Line::from(Span::styled(
            "Вы уверены, что хотите удалить это событие?",
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled("y: да  n: нет", Style::default().fg(DIM))),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BAD)),
        ),
        area,
    );
}

// ─── Toasts ─────────────────────────────────────────────────────────────────

fn render_toasts(f: &mut Frame, app: &App, area: Rect) {
    let width = 48.min(area.width);
    for (i, toast) in app.toasts.iter().rev().take(4).enumerate() {
        let y = area.bottom().saturating_sub(3 * (i as u16 + 1));
        if y < area.y {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width), y, width, 3);
        let color = match toast.kind {
            ToastKind::Success => GOOD,
            ToastKind::Error => BAD,
        };
        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(truncate(&toast.message, width.saturating_sub(2) as usize))
                .style(Style::default().fg(color))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
            rect,
        );
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn type_color(t: EventType) -> Color {
    match t {
        EventType::Class => ACCENT,
        EventType::Homework => WARN,
        EventType::Exam => BAD,
        EventType::Other => Color::Magenta,
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::Low => DIM,
        Priority::Medium => Color::White,
        Priority::High => BAD,
    }
}

fn event_style(event: &Event) -> Style {
    let style = Style::default().fg(type_color(event.event_type));
    match event.priority {
        Priority::High => style.add_modifier(Modifier::BOLD),
        Priority::Medium => style,
        Priority::Low => style.add_modifier(Modifier::DIM),
    }
}

fn priority_marked(event: &Event) -> String {
    match event.priority {
        Priority::High => format!("!{}", event.title),
        _ => event.title.clone(),
    }
}

/// Cuts `s` to at most `width` terminal columns, ending with `…` when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CalendarClient;
    use crate::config::Config;
    use crate::models::{EventDetails, EventFile, EventNote};
    use crate::tui::{Command, Outcome};
    use chrono::{TimeZone, Utc};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use uuid::Uuid;

    fn app() -> App {
        let mut app = App::new(CalendarClient::new("http://127.0.0.1:9").unwrap(), Config::default());
        let day = NaiveDate::from_ymd_opt(2024, 9, 4).unwrap();
        app.calendar = crate::calendar::CalendarState::new(day);
        app
    }

    fn event(title: &str, start: chrono::DateTime<Utc>, hours: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: title.into(),
            description: Some("описание".into()),
            course: Some("Физика".into()),
            event_type: EventType::Exam,
            start_time: start,
            end_time: start + Duration::hours(hours),
            location: Some("Ауд. 5".into()),
            instructor: None,
            priority: Priority::High,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn draw(app: &App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &Buffer) -> String {
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn populated() -> App {
        let mut app = app();
        let start = Local.with_ymd_and_hms(2024, 9, 4, 10, 0, 0).unwrap().with_timezone(&Utc);
        app.apply_outcome(Outcome::EventsLoaded(Ok(vec![
            event("Экзамен", start, 2),
            event("Практика", start, 72),
        ])));
        app
    }

    #[test]
    fn rendering_same_state_twice_is_identical() {
        let app = populated();
        assert_eq!(draw(&app), draw(&app));

        let mut app = populated();
        app.dispatch(Command::SetView(View::Week));
        assert_eq!(draw(&app), draw(&app));
    }

    #[test]
    fn month_view_shows_headers_and_week_numbers() {
        let screen = text(&draw(&populated()));
        assert!(screen.contains("Неделя"));
        for name in locale::DAY_ABBREVIATIONS {
            assert!(screen.contains(name), "{name}");
        }
        assert!(screen.contains("сентябрь 2024 г."));
    }

    #[test]
    fn every_week_layout_renders() {
        for layout in [WeekLayout::Grid, WeekLayout::Agenda] {
            let mut app = populated();
            app.week_layout = layout;
            app.dispatch(Command::SetView(View::Week));
            let screen = text(&draw(&app));
            assert!(screen.contains("2 - 8 сентября 2024 г."), "{layout:?}");
        }
    }

    #[test]
    fn details_popup_lists_files_and_notes() {
        let mut app = populated();
        let event = app.events[0].clone();
        app.apply_outcome(Outcome::DetailsLoaded(Ok(EventDetails {
            event,
            files: vec![EventFile {
                id: Uuid::new_v4(),
                original_filename: "report.pdf".into(),
                file_size: 1536,
                uploaded_by: "Иван".into(),
                mime_type: None,
                created_at: None,
            }],
            notes: vec![EventNote {
                id: Uuid::new_v4(),
                author_name: "Мария".into(),
                content: "Взять калькулятор".into(),
                created_at: Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap(),
            }],
        })));
        let screen = text(&draw(&app));
        assert!(screen.contains("report.pdf"));
        assert!(screen.contains("1.5 KB"));
        assert!(screen.contains("Взять калькулятор"));
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate("Лекция", 10), "Лекция");
        assert_eq!(truncate("Лекция по матанализу", 8), "Лекция …");
        assert_eq!(truncate("abc", 0), "");
    }
}
