use std::mem;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::error::StoreError;
use crate::models::{Statistics, StudentRecord};
use crate::storage::Storage;
use crate::store::RecordStore;

use super::forms::{ConfirmDelete, StudentField, StudentForm};
use super::helpers::{centered_rect, grade_style, surface_error};

/// Height of the banner at the top of the screen.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained modes layered over the record table.
enum Mode {
    Normal,
    Adding(StudentForm),
    Editing {
        previous_roll: String,
        form: StudentForm,
    },
    ConfirmDelete(ConfirmDelete),
    Searching(SearchState),
    Statistics(Statistics),
}

/// Roll number being typed into the search bar.
#[derive(Default)]
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state: the record store plus what the screen shows.
pub struct App<S: Storage> {
    store: RecordStore<S>,
    selected: usize,
    /// Roll number of the single record a search narrowed the table to.
    filter: Option<String>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl<S: Storage> App<S> {
    pub fn new(store: RecordStore<S>) -> Self {
        Self {
            store,
            selected: 0,
            filter: None,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// Show an error in the footer, e.g. a snapshot that failed to load.
    pub fn report_error<T: Into<String>>(&mut self, text: T) {
        self.set_status(text, StatusKind::Error);
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Adding(form) => self.handle_add(code, form),
            Mode::Editing {
                previous_roll,
                form,
            } => self.handle_edit(code, previous_roll, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::Statistics(_) => Mode::Normal,
        };

        exit
    }

    /// Process a key press with its modifiers. Ctrl-U clears the open form and
    /// Ctrl-C quits; other Ctrl chords are ignored. Returns `true` on quit.
    pub fn handle_key_event(&mut self, event: KeyEvent) -> bool {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            match event.code {
                KeyCode::Char('u') => self.handle_ctrl_u(),
                KeyCode::Char('c') => return true,
                _ => {}
            }
            return false;
        }
        self.handle_key(event.code)
    }

    /// Ctrl-U empties the open form, like the desktop "Clear Fields" button.
    fn handle_ctrl_u(&mut self) {
        match &mut self.mode {
            Mode::Adding(form) | Mode::Editing { form, .. } => form.clear(),
            Mode::Searching(state) => state.query.clear(),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.filter.is_some() {
                    self.show_all();
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible_len().saturating_sub(1),
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                self.clear_status();
                return Mode::Adding(StudentForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(record) = self.current_record() {
                    let mode = Mode::Editing {
                        previous_roll: record.roll().to_string(),
                        form: StudentForm::from_record(record),
                    };
                    self.clear_status();
                    return mode;
                }
                self.set_status("Please select a student to update!", StatusKind::Error);
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(record) = self.current_record() {
                    let confirm = ConfirmDelete::from_record(record);
                    self.clear_status();
                    return Mode::ConfirmDelete(confirm);
                }
                self.set_status("Please select a student to delete!", StatusKind::Error);
            }
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Mode::Searching(SearchState::default());
            }
            KeyCode::Char('v') | KeyCode::Char('V') => self.show_all(),
            KeyCode::Char('s') | KeyCode::Char('S') => match self.store.statistics() {
                Ok(stats) => {
                    self.clear_status();
                    return Mode::Statistics(stats);
                }
                Err(err) => self.set_status(err.to_string(), StatusKind::Info),
            },
            KeyCode::Char('w') | KeyCode::Char('W') => match self.store.save() {
                Ok(()) => self.set_status(
                    format!("Saved {} students.", self.store.len()),
                    StatusKind::Info,
                ),
                Err(err) => self.set_status(
                    format!("Failed to save data: {err}"),
                    StatusKind::Error,
                ),
            },
            KeyCode::Char('o') | KeyCode::Char('O') => match self.open_data_file() {
                Ok(location) => self.set_status(format!("Opened {location}."), StatusKind::Info),
                Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
            },
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add(&mut self, code: KeyCode, mut form: StudentForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add student cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let outcome = self
                    .store
                    .add_student(&form.roll, &form.name, &form.marks)
                    .map(|record| record.roll().to_string());
                keep_open = self.finish_submit(outcome, &mut form, "added");
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::Adding(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_edit(&mut self, code: KeyCode, previous_roll: String, mut form: StudentForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let outcome = self
                    .store
                    .update_student(&previous_roll, &form.roll, &form.name, &form.marks)
                    .map(|record| record.roll().to_string());
                let applied = match &outcome {
                    Ok(_) => true,
                    Err(err) => err.is_persistence(),
                };
                if applied && self.filter.as_deref() == Some(previous_roll.as_str()) {
                    self.filter = None;
                }
                keep_open = self.finish_submit(outcome, &mut form, "updated");
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::Editing {
                previous_roll,
                form,
            }
        } else {
            Mode::Normal
        }
    }

    /// Apply the result of an add or update. Returns whether the form stays
    /// open. A failed save closes the form because the change already lives in
    /// the store; only rejected input keeps it open.
    fn finish_submit(
        &mut self,
        outcome: Result<String, StoreError>,
        form: &mut StudentForm,
        verb: &str,
    ) -> bool {
        let typed_roll = form.roll.trim().to_string();
        match outcome {
            Ok(roll) => {
                self.focus_roll(&roll);
                self.set_status(
                    format!("Student {roll} {verb} successfully!"),
                    StatusKind::Info,
                );
                false
            }
            Err(err) if err.is_persistence() => {
                self.focus_roll(&typed_roll);
                self.set_status(
                    format!("Student {typed_roll} {verb}, but failed to save data: {err}"),
                    StatusKind::Error,
                );
                false
            }
            Err(err) => {
                let message = err.to_string();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                true
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.store.delete_student(&confirm.roll) {
                    Ok(()) => self.set_status(
                        format!("Student {} deleted successfully!", confirm.roll),
                        StatusKind::Info,
                    ),
                    Err(err) if err.is_persistence() => self.set_status(
                        format!(
                            "Student {} deleted, but failed to save data: {err}",
                            confirm.roll
                        ),
                        StatusKind::Error,
                    ),
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                if self.filter.as_deref() == Some(confirm.roll.as_str()) {
                    self.filter = None;
                }
                self.clamp_selection();
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Enter => {
                match self.store.search_student(&state.query) {
                    Ok(record) => {
                        self.filter = Some(record.roll().to_string());
                        self.selected = 0;
                        self.set_status(format!("Found {record}."), StatusKind::Info);
                    }
                    Err(StoreError::InvalidInput(_)) => {
                        self.set_status(
                            "Please enter roll number to search!",
                            StatusKind::Error,
                        );
                        return Mode::Searching(state);
                    }
                    Err(err) => {
                        self.show_all();
                        self.set_status(err.to_string(), StatusKind::Error);
                    }
                }
                return Mode::Normal;
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }
        Mode::Searching(state)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Adding(form) => self.draw_form(frame, area, "Add Student", form),
            Mode::Editing { form, .. } => self.draw_form(frame, area, "Update Student", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Statistics(stats) => self.draw_statistics(frame, area, stats),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "STUDENT GRADE MANAGEMENT SYSTEM",
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::Blue))
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, area);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let records = self.visible_records();
        let title = match &self.filter {
            Some(roll) => format!("Search result for {roll} (v to view all)"),
            None => format!("Students ({})", self.store.len()),
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if records.is_empty() {
            let message = Paragraph::new("No students yet. Press 'a' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(["Roll No", "Name", "Marks", "Grade"]).style(header_style);

        let rows = records.iter().map(|record| {
            Row::new(vec![
                Cell::from(record.roll().to_string()),
                Cell::from(record.name().to_string()),
                Cell::from(record.marks().to_string()),
                Cell::from(record.grade().as_str()).style(grade_style(record.grade())),
            ])
        });

        let widths = [
            Constraint::Percentage(20),
            Constraint::Percentage(50),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut state = TableState::default();
        state.select(Some(self.selected.min(records.len() - 1)));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match &self.mode {
            Mode::Adding(_) | Mode::Editing { .. } => &[
                ("[Tab]", " Next Field   "),
                ("[Enter]", " Save   "),
                ("[Ctrl-U]", " Clear Fields   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n/Esc]", " Keep")],
            Mode::Searching(_) => &[("[Enter]", " Search   "), ("[Esc]", " Cancel")],
            Mode::Statistics(_) => &[("[any key]", " Close")],
            Mode::Normal => &[
                ("[↑↓]", " Select   "),
                ("[a]", " Add   "),
                ("[e]", " Update   "),
                ("[d]", " Delete   "),
                ("[/]", " Search   "),
                ("[v]", " View All   "),
                ("[s]", " Statistics   "),
                ("[w]", " Save   "),
                ("[o]", " Open File   "),
                ("[q]", " Quit"),
            ],
        };

        let spans = hints
            .iter()
            .flat_map(|(key, label)| [Span::styled(*key, key_style), Span::raw(*label)])
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(StudentField::Roll),
            form.build_line(StudentField::Name),
            form.build_line(StudentField::Marks),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + form.cursor_offset(),
            inner.y + form.active.row(),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from("Are you sure you want to delete this student?"),
            Line::from(format!("{} - {}", confirm.roll, confirm.name)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search by Roll No");
        let paragraph = Paragraph::new(Span::raw(format!("Roll No: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Roll No: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_statistics(&self, frame: &mut Frame, area: Rect, stats: &Statistics) {
        let popup_area = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Class Statistics")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("Total Students: {}", stats.count)),
            Line::from(format!("Average Marks: {}", stats.average_display())),
            Line::from(format!("Highest Marks: {}", stats.max)),
            Line::from(format!("Lowest Marks: {}", stats.min)),
            Line::from(""),
        ];
        lines.extend(stats.grade_counts.iter().map(|(grade, count)| {
            Line::from(vec![
                Span::styled(format!("{:<3}", grade.as_str()), grade_style(*grade)),
                Span::raw(format!(" {count}")),
            ])
        }));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn open_data_file(&self) -> Result<String> {
        let location = self.store.data_location();
        if !Path::new(&location).exists() {
            return Err(anyhow!("Nothing has been saved to {location} yet."));
        }
        open_path(&location).with_context(|| format!("failed to open {location}"))?;
        Ok(location)
    }

    fn show_all(&mut self) {
        self.filter = None;
        self.clamp_selection();
        self.set_status("Showing all students.", StatusKind::Info);
    }

    fn visible_records(&self) -> &[StudentRecord] {
        match &self.filter {
            Some(roll) => self
                .store
                .position(roll)
                .map(|idx| &self.store.list_all()[idx..=idx])
                .unwrap_or(&[]),
            None => self.store.list_all(),
        }
    }

    fn visible_len(&self) -> usize {
        self.visible_records().len()
    }

    fn current_record(&self) -> Option<&StudentRecord> {
        self.visible_records().get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = (len - 1) as isize;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.visible_len().saturating_sub(1));
    }

    /// Select the record with this roll number in the full listing.
    fn focus_roll(&mut self, roll: &str) {
        if self.filter.is_some() {
            return;
        }
        if let Some(idx) = self.store.position(roll) {
            self.selected = idx;
        } else {
            self.clamp_selection();
        }
    }

    #[cfg(test)]
    fn status_text(&self) -> Option<(&str, StatusKind)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.kind))
    }
}
