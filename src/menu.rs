//! Start menu: three digit fields collected before training starts.
//!
//! The form is a small state machine fed one key at a time, so it can be
//! driven from a terminal, a test, or anything else that produces keys.

use std::io::{self, BufRead, Write};

/// Field labels in focus order
pub const FIELD_LABELS: [&str; 3] = ["Neurons", "Attempts per epoch", "Epochs"];

/// A key press the form understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuKey {
    /// Non-digit characters are ignored
    Char(char),
    Backspace,
    Enter,
}

/// Parsed form contents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuValues {
    pub neurons: usize,
    pub attempts: usize,
    pub epochs: usize,
}

/// What a key press did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuEvent {
    Editing,
    /// Enter on the last field with unparsable or zero values; the form
    /// has been cleared
    Rejected,
    Submitted(MenuValues),
}

#[derive(Clone, Debug, Default)]
pub struct MenuForm {
    fields: [String; 3],
    active: usize,
}

impl MenuForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.as_str())
    }

    pub fn press(&mut self, key: MenuKey) -> MenuEvent {
        match key {
            MenuKey::Char(c) if c.is_ascii_digit() => {
                self.fields[self.active].push(c);
                MenuEvent::Editing
            }
            MenuKey::Char(_) => MenuEvent::Editing,
            MenuKey::Backspace => {
                self.fields[self.active].pop();
                MenuEvent::Editing
            }
            MenuKey::Enter if self.active + 1 < self.fields.len() => {
                self.active += 1;
                MenuEvent::Editing
            }
            MenuKey::Enter => match self.parse() {
                Some(values) => MenuEvent::Submitted(values),
                None => {
                    self.reset();
                    MenuEvent::Rejected
                }
            },
        }
    }

    fn parse(&self) -> Option<MenuValues> {
        let mut parsed = [0usize; 3];
        for (slot, field) in parsed.iter_mut().zip(self.fields.iter()) {
            *slot = field.parse().ok().filter(|&v| v > 0)?;
        }
        Some(MenuValues {
            neurons: parsed[0],
            attempts: parsed[1],
            epochs: parsed[2],
        })
    }

    /// Clear every field and return focus to the first
    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(String::clear);
        self.active = 0;
    }
}

/// Run the form over line-based input: each line's characters are typed
/// into the focused field, then Enter is pressed.
///
/// Returns `Ok(None)` if input ends before the form is submitted.
pub fn prompt<R: BufRead, W: Write>(input: R, output: &mut W) -> io::Result<Option<MenuValues>> {
    let mut form = MenuForm::new();
    let mut lines = input.lines();

    loop {
        write!(output, "{}: ", FIELD_LABELS[form.active()])?;
        output.flush()?;

        let Some(line) = lines.next() else {
            return Ok(None);
        };
        for c in line?.trim().chars() {
            form.press(MenuKey::Char(c));
        }
        match form.press(MenuKey::Enter) {
            MenuEvent::Submitted(values) => return Ok(Some(values)),
            MenuEvent::Rejected => {
                writeln!(output, "Invalid input, every value must be a positive number")?;
            }
            MenuEvent::Editing => {}
        }
    }
}
