use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::form::FormField;
use super::{App, Command, Popup};
use crate::calendar::View;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Routes a key to the topmost layer: popup, then details, then calendar.
pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        app.dispatch(Command::Quit);
        return;
    }

    if app.popup.is_some() {
        handle_popup_key(app, code, modifiers);
    } else if app.details.is_some() {
        handle_details_key(app, code);
    } else if let Some(command) = command_for_key(code, modifiers) {
        app.dispatch(command);
    }
}

/// Calendar-screen bindings.
pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    let command = match code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Left | KeyCode::Char('h') => Command::MoveSelection(-1),
        KeyCode::Right | KeyCode::Char('l') => Command::MoveSelection(1),
        KeyCode::Up | KeyCode::Char('k') => Command::MoveSelection(-7),
        KeyCode::Down | KeyCode::Char('j') => Command::MoveSelection(7),
        KeyCode::PageUp | KeyCode::Char('p') => Command::Navigate(-1),
        KeyCode::PageDown | KeyCode::Char('n') => Command::Navigate(1),
        KeyCode::Char('t') => Command::GoToToday,
        KeyCode::Char('m') => Command::SetView(View::Month),
        KeyCode::Char('w') => Command::SetView(View::Week),
        KeyCode::Char('v') => Command::ToggleView,
        KeyCode::Tab => Command::CycleFocus(1),
        KeyCode::BackTab => Command::CycleFocus(-1),
        KeyCode::Enter => Command::OpenDetails,
        KeyCode::Char('c') => Command::OpenCreateForm,
        KeyCode::Char('a') => Command::QuickAdd,
        KeyCode::Char('A') => Command::QuickAddWeek,
        KeyCode::Char('r') => Command::Refresh,
        _ => return None,
    };
    if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    Some(command)
}

fn handle_details_key(app: &mut App, code: KeyCode) {
    let Some(view) = app.details.as_mut() else {
        return;
    };
    let event_id = view.details.event.id;
    let files = view.details.files.len();

    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_details(),
        KeyCode::Down | KeyCode::Char('j') => {
            if view.file_cursor + 1 < files {
                view.file_cursor += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view.file_cursor = view.file_cursor.saturating_sub(1);
        }
        KeyCode::Char('e') => app.edit_event(event_id),
        KeyCode::Char('d') => app.request_delete(event_id),
        KeyCode::Char('u') => app.start_upload(event_id),
        KeyCode::Char('c') => app.start_note(event_id),
        KeyCode::Char('s') | KeyCode::Enter => app.download_selected_file(),
        KeyCode::Char('r') => app.reload_notes(),
        KeyCode::Char('R') => app.open_details(event_id),
        _ => {}
    }
}

fn handle_popup_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match app.popup.as_mut() {
        Some(Popup::Form(form)) => match code {
            KeyCode::Esc => app.close_popup(),
            KeyCode::Enter => app.submit_form(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Left if form.active == FormField::Weekdays => form.move_weekday_cursor(-1),
            KeyCode::Right if form.active == FormField::Weekdays => form.move_weekday_cursor(1),
            KeyCode::Left | KeyCode::Right if !form.active.is_text() => form.toggle(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => form.input_char(c),
            _ => {}
        },
        Some(Popup::Prompt(prompt)) => match code {
            KeyCode::Esc => app.close_popup(),
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => prompt.input.push(c),
            _ => {}
        },
        Some(Popup::ConfirmDelete(_)) => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_popup(),
            _ => {}
        },
        None => {}
    }
}
