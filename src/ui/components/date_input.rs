use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::KeyCode;

/// Segment of a `dd/mm/yyyy` date currently receiving digits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DatePart {
    Day,
    Month,
    Year,
}

impl DatePart {
    fn width(&self) -> usize {
        match self {
            DatePart::Day | DatePart::Month => 2,
            DatePart::Year => 4,
        }
    }
}

/// Keyboard date picker. The date may be unset until the user edits it.
pub struct DateInputState {
    pub date: Option<NaiveDate>,
    pub editing: bool,
    pub date_part: DatePart,
    buffer: String,
}

impl DateInputState {
    pub fn new(date: Option<NaiveDate>) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Day,
            buffer: String::new(),
        }
    }

    /// Start or stop editing. An unset date starts from `today`.
    pub fn set_editing(&mut self, editing: bool, today: NaiveDate) {
        self.editing = editing;
        self.buffer.clear();
        if editing {
            self.date_part = DatePart::Day;
            self.date.get_or_insert(today);
        }
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Month,
            DatePart::Month => DatePart::Year,
            DatePart::Year => DatePart::Day,
        };
        self.buffer.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Year,
            DatePart::Month => DatePart::Day,
            DatePart::Year => DatePart::Month,
        };
        self.buffer.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }
        let Some(date) = self.date else {
            return;
        };

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.buffer.push(c);
                if self.buffer.len() < self.date_part.width() {
                    return;
                }
                if let Some(updated) = self.apply_buffer(date) {
                    self.date = Some(updated);
                    self.buffer.clear();
                    if self.date_part != DatePart::Year {
                        self.next_date_part();
                    }
                } else {
                    self.buffer.clear();
                }
            }
            KeyCode::Char('+') => self.date = date.checked_add_signed(Duration::days(1)).or(Some(date)),
            KeyCode::Char('-') => self.date = date.checked_sub_signed(Duration::days(1)).or(Some(date)),
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    // Out-of-range input (month 13, 31st of April) leaves the date unchanged.
    fn apply_buffer(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.date_part {
            DatePart::Day => {
                let day = self.buffer.parse::<u32>().ok()?;
                NaiveDate::from_ymd_opt(date.year(), date.month(), day)
            }
            DatePart::Month => {
                let month = self.buffer.parse::<u32>().ok()?;
                NaiveDate::from_ymd_opt(date.year(), month, date.day())
            }
            DatePart::Year => {
                let year = self.buffer.parse::<i32>().ok()?;
                if !(1900..=2100).contains(&year) {
                    return None;
                }
                NaiveDate::from_ymd_opt(year, date.month(), date.day())
            }
        }
    }

    pub fn get_display_string(&self) -> String {
        let Some(date) = self.date else {
            return "Not set".to_string();
        };
        if !self.editing {
            return date.format("%d/%m/%Y").to_string();
        }

        let marker = |part: DatePart, value: String| {
            if part != self.date_part {
                value
            } else if self.buffer.is_empty() {
                format!("[{value}]")
            } else {
                format!("[{}]", self.buffer)
            }
        };

        format!(
            "{}/{}/{}",
            marker(DatePart::Day, format!("{:02}", date.day())),
            marker(DatePart::Month, format!("{:02}", date.month())),
            marker(DatePart::Year, format!("{:04}", date.year())),
        )
    }
}
