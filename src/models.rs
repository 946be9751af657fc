use crate::handlers::clock::TimeOfDay;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub at: TimeOfDay,
    pub message: String,
    pub fired: bool,
}

/// One line of the to-do list, stored as `{"text": ..., "done": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub text: String,
    pub done: bool,
}

impl TaskRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// The nine launcher buttons, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    TimeDate,
    Weather,
    Wikipedia,
    Reminder,
    Password,
    Calculator,
    Converter,
    TextUtils,
    TodoList,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::TimeDate,
        Feature::Weather,
        Feature::Wikipedia,
        Feature::Reminder,
        Feature::Password,
        Feature::Calculator,
        Feature::Converter,
        Feature::TextUtils,
        Feature::TodoList,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Feature::TimeDate => "Time & Date",
            Feature::Weather => "Weather",
            Feature::Wikipedia => "Wikipedia Search",
            Feature::Reminder => "Set Reminder",
            Feature::Password => "Password Tools",
            Feature::Calculator => "Calculator",
            Feature::Converter => "Unit Converter",
            Feature::TextUtils => "Text Utilities",
            Feature::TodoList => "To-Do List",
        }
    }

    /// Title and label of the input prompt, for buttons that ask for text.
    pub fn prompt(self) -> Option<(&'static str, &'static str)> {
        match self {
            Feature::TimeDate | Feature::TodoList => None,
            Feature::Weather => Some(("Weather", "Enter city name:")),
            Feature::Wikipedia => Some(("Wikipedia", "Search Wikipedia:")),
            Feature::Reminder => Some(("Reminder", "Enter reminder (HH:MM - text):")),
            Feature::Password => Some(("Password Tool", "Enter password:")),
            Feature::Calculator => Some(("Calculator", "Enter expression:")),
            Feature::Converter => Some(("Converter", "Enter 25C or 77F:")),
            Feature::TextUtils => Some(("Text Utilities", "Enter text:")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupMode {
    None,
    Prompt(Feature),
    TodoWindow,
    TodoAdd,
}
