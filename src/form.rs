use std::rc::Rc;
use yew::Reducible;

use crate::types::{LogEntry, LogUpdate, NewLog};

/// Contents of the entry form. `editing` holds the id of the log being
/// edited; while it is set, submitting updates that log instead of creating
/// a new one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub content: String,
    pub date: String,
    pub editing: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormAction {
    SetContent(String),
    SetDate(String),
    /// A finalized piece of dictation.
    AppendTranscript(String),
    ClearContent,
    StartEdit(LogEntry),
    Reset,
}

impl Reducible for FormState {
    type Action = FormAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            FormAction::SetContent(content) => next.content = content,
            FormAction::SetDate(date) => next.date = date,
            FormAction::AppendTranscript(text) => next.content.push_str(&text),
            FormAction::ClearContent => next.content.clear(),
            FormAction::StartEdit(entry) => {
                next.content = entry.content.clone();
                next.date = entry.date_value();
                next.editing = Some(entry.id);
            }
            FormAction::Reset => next = FormState::default(),
        }
        Rc::new(next)
    }
}

impl FormState {
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// The create button stays disabled for blank input or while a create is
    /// in flight.
    pub fn can_create(&self, sending: bool) -> bool {
        !sending && !self.content.trim().is_empty()
    }

    pub fn new_log(&self) -> NewLog {
        NewLog {
            content: self.content.clone(),
            date: self.date.clone(),
        }
    }

    pub fn log_update(&self) -> Option<LogUpdate> {
        self.editing.as_ref().map(|id| LogUpdate {
            id: id.clone(),
            content: self.content.clone(),
            date: self.date.clone(),
        })
    }
}
