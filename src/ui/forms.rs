use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::StudentRecord;

/// Raw text for the three record fields. Nothing here is validated; the store
/// parses the values on submit so every error message comes from one place.
#[derive(Default, Clone)]
pub(crate) struct StudentForm {
    pub(crate) roll: String,
    pub(crate) name: String,
    pub(crate) marks: String,
    pub(crate) active: StudentField,
    pub(crate) error: Option<String>,
}

/// Fields within the student form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum StudentField {
    #[default]
    Roll,
    Name,
    Marks,
}

impl StudentField {
    pub(crate) fn label(self) -> &'static str {
        match self {
            StudentField::Roll => "Roll No",
            StudentField::Name => "Name",
            StudentField::Marks => "Marks",
        }
    }

    /// Row offset of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        match self {
            StudentField::Roll => 0,
            StudentField::Name => 1,
            StudentField::Marks => 2,
        }
    }
}

impl StudentForm {
    /// Populate the form from the selected record when editing.
    pub(crate) fn from_record(record: &StudentRecord) -> Self {
        Self {
            roll: record.roll().to_string(),
            name: record.name().to_string(),
            marks: record.marks().to_string(),
            active: StudentField::Roll,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            StudentField::Roll => StudentField::Name,
            StudentField::Name => StudentField::Marks,
            StudentField::Marks => StudentField::Roll,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            StudentField::Roll => StudentField::Marks,
            StudentField::Name => StudentField::Roll,
            StudentField::Marks => StudentField::Name,
        };
    }

    /// Append a character to the active field. Marks only take digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            StudentField::Roll => self.roll.push(ch),
            StudentField::Name => self.name.push(ch),
            StudentField::Marks => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.marks.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Empty every field and return focus to the roll number.
    pub(crate) fn clear(&mut self) {
        self.roll.clear();
        self.name.clear();
        self.marks.clear();
        self.active = StudentField::Roll;
        self.error = None;
    }

    pub(crate) fn value(&self, field: StudentField) -> &str {
        match field {
            StudentField::Roll => &self.roll,
            StudentField::Name => &self.name,
            StudentField::Marks => &self.marks,
        }
    }

    fn value_mut(&mut self, field: StudentField) -> &mut String {
        match field {
            StudentField::Roll => &mut self.roll,
            StudentField::Name => &mut self.name,
            StudentField::Marks => &mut self.marks,
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: StudentField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset for the active field, counted from the popup's
    /// inner left edge.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let prefix = self.active.label().len() + ": ".len();
        (prefix + self.value(self.active).chars().count()) as u16
    }
}

/// The record awaiting a yes/no answer before it is deleted.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) roll: String,
    pub(crate) name: String,
}

impl ConfirmDelete {
    pub(crate) fn from_record(record: &StudentRecord) -> Self {
        Self {
            roll: record.roll().to_string(),
            name: record.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentInput;

    #[test]
    fn focus_cycles_both_ways() {
        let mut form = StudentForm::default();
        form.next_field();
        assert_eq!(form.active, StudentField::Name);
        form.next_field();
        form.next_field();
        assert_eq!(form.active, StudentField::Roll);
        form.previous_field();
        assert_eq!(form.active, StudentField::Marks);
    }

    #[test]
    fn marks_field_only_takes_digits() {
        let mut form = StudentForm {
            active: StudentField::Marks,
            ..StudentForm::default()
        };
        assert!(form.push_char('8'));
        assert!(!form.push_char('x'));
        assert!(form.push_char('5'));
        form.backspace();
        assert_eq!(form.marks, "8");
    }

    #[test]
    fn clear_resets_everything() {
        let record = StudentRecord::from_input(StudentInput::new("7", "Dee", 42).unwrap());
        let mut form = StudentForm::from_record(&record);
        form.active = StudentField::Marks;
        form.error = Some("bad".to_string());
        form.clear();
        assert!(form.roll.is_empty() && form.name.is_empty() && form.marks.is_empty());
        assert_eq!(form.active, StudentField::Roll);
        assert!(form.error.is_none());
    }

    #[test]
    fn cursor_tracks_active_value() {
        let mut form = StudentForm::default();
        form.push_char('1');
        form.push_char('2');
        assert_eq!(form.cursor_offset(), "Roll No: ".len() as u16 + 2);
    }
}
