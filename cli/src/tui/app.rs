use ratatui::widgets::TableState;
use presence_core::{FileStateRepository, Person, PresenceService, PresenceStatus, ToggleOutcome};

pub enum InputMode {
    Normal,
    Adding,
}

/// What a grid cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Mark(PresenceStatus),
    Excused,
}

pub struct App {
    pub service: PresenceService<FileStateRepository>,
    pub state: TableState,
    pub day_index: usize,
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub message: Option<String>,
}

impl App {
    pub fn new(service: PresenceService<FileStateRepository>) -> App {
        let mut state = TableState::default();
        if !service.people().is_empty() {
            state.select(Some(0));
        }
        App {
            service,
            state,
            day_index: 0,
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            message: None,
        }
    }

    pub fn people(&self) -> &[Person] {
        self.service.people()
    }

    pub fn days(&self) -> Vec<u32> {
        self.service.calendar().iter().collect()
    }

    pub fn selected_person(&self) -> Option<&Person> {
        self.state.selected().and_then(|i| self.people().get(i))
    }

    pub fn selected_day(&self) -> Option<u32> {
        self.service.calendar().iter().nth(self.day_index)
    }

    pub fn cell(&self, person: &Person, day: u32) -> Cell {
        if self.service.excuse_on(person.id, day).is_some() {
            return Cell::Excused;
        }
        Cell::Mark(self.service.status(person.id, day).unwrap_or_default())
    }

    pub fn next(&mut self) {
        let len = self.people().len();
        if len == 0 { return; }

        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.people().len();
        if len == 0 { return; }

        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn next_day(&mut self) {
        let len = self.service.calendar().len();
        if self.day_index + 1 < len {
            self.day_index += 1;
        }
    }

    pub fn previous_day(&mut self) {
        self.day_index = self.day_index.saturating_sub(1);
    }

    pub fn toggle_selected(&mut self) {
        let (Some(person), Some(day)) = (self.selected_person(), self.selected_day()) else {
            self.message = Some("Select a person and a tracked day first".into());
            return;
        };
        let (id, name) = (person.id, person.name.clone());

        self.message = match self.service.toggle(id, day) {
            Ok(ToggleOutcome::Excused(_)) => {
                let reason = self
                    .service
                    .excuse_on(id, day)
                    .map(|e| e.description.clone())
                    .unwrap_or_default();
                Some(format!("{} is excused on day {}: {}", name, day, reason))
            }
            Ok(ToggleOutcome::Marked(_)) => None,
            Err(e) => Some(e.to_string()),
        };
    }

    pub fn next_month(&mut self) {
        let result = self.service.next_month();
        self.after_month_change(result);
    }

    pub fn previous_month(&mut self) {
        let result = self.service.previous_month();
        self.after_month_change(result);
    }

    pub fn select_weekdays(&mut self) {
        let result = self.service.select_weekdays();
        self.after_month_change(result);
    }

    fn after_month_change(&mut self, result: presence_core::Result<()>) {
        self.day_index = 0;
        self.message = match result {
            Ok(()) if self.service.calendar().is_empty() => {
                Some(format!("No tracked days in {} (w: select weekdays)", self.service.calendar().label()))
            }
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        };
    }

    pub fn delete_person(&mut self) {
        let Some(i) = self.state.selected() else { return; };
        let Some(id) = self.people().get(i).map(|p| p.id) else { return; };

        match self.service.remove_person(id) {
            Ok(removed) => self.message = Some(format!("Removed {}", removed.name)),
            Err(e) => self.message = Some(e.to_string()),
        }

        let len = self.people().len();
        if len == 0 {
            self.state.select(None);
        } else if i >= len {
            self.state.select(Some(len - 1));
        }
    }

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.input.chars().take(self.cursor_position).map(|c| c.len_utf8()).sum();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index: usize = self.input.chars().take(self.cursor_position - 1).map(|c| c.len_utf8()).sum();
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    /// Adds every name typed in the input line (comma or semicolon separated).
    pub fn submit_command(&mut self) {
        if !self.input.trim().is_empty() {
            self.message = match self.service.add_people_from_text(&self.input) {
                Ok(added) => {
                    if self.state.selected().is_none() {
                        self.state.select(Some(0));
                    }
                    Some(format!("Added {} people", added.len()))
                }
                Err(e) => Some(e.to_string()),
            };
        }

        self.input.clear();
        self.cursor_position = 0;
        self.exit_input_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::StorageScope;

    fn app(dir: &tempfile::TempDir) -> App {
        let repo = FileStateRepository::new(Some(dir.path().to_path_buf())).unwrap();
        let mut service = PresenceService::open(repo, StorageScope::Guest).unwrap();
        service.set_month(9, 2025).unwrap();
        service.select_weekdays().unwrap();
        service.add_people_from_text("Alice, Bob").unwrap();
        App::new(service)
    }

    #[test]
    fn test_navigation_wraps_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app(&dir);
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        app.previous_day();
        assert_eq!(app.selected_day(), Some(1));
        app.next_day();
        assert_eq!(app.selected_day(), Some(2));
    }

    #[test]
    fn test_toggle_and_excused_cell() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app(&dir);
        let alice = app.people()[0].id;

        app.toggle_selected();
        assert_eq!(app.cell(&app.people()[0].clone(), 1), Cell::Mark(PresenceStatus::Present));

        app.service.add_excuse(alice, 1, "clinic").unwrap();
        app.toggle_selected();
        assert_eq!(app.cell(&app.people()[0].clone(), 1), Cell::Excused);
        assert!(app.message.as_deref().unwrap_or_default().contains("clinic"));
    }

    #[test]
    fn test_add_and_delete_people() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = app(&dir);
        app.enter_add_mode();
        for c in "Carol; Dave".chars() {
            app.input_char(c);
        }
        app.submit_command();
        assert_eq!(app.people().len(), 4);

        app.state.select(Some(3));
        app.delete_person();
        assert_eq!(app.people().len(), 3);
        assert_eq!(app.state.selected(), Some(2));
    }
}
