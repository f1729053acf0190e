//! Modal dialog and focus collaborators of the page.
//!
//! The page only describes dialogs; showing them is up to the implementation of
//! `ModalDialogService`. `DialogStack` and `FocusStack` are in-memory versions.

use std::sync::{Mutex, PoisonError};

pub type DialogId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitButtonLabel {
    Ok,
    Delete,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    /// Confirm or cancel.
    Alert,
    /// Confirm only after typing `captcha` exactly (case-sensitive).
    Captcha { captcha: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: DialogId,
    /// Stacking level; higher levels are shown above lower ones.
    pub level: usize,
    pub title: String,
    pub message: String,
    pub submit_label: SubmitButtonLabel,
    pub kind: DialogKind,
}

impl Dialog {
    pub fn alert(
        id: DialogId,
        level: usize,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            level,
            title: title.into(),
            message: message.into(),
            submit_label: SubmitButtonLabel::Ok,
            kind: DialogKind::Alert,
        }
    }

    pub fn captcha(
        id: DialogId,
        level: usize,
        title: impl Into<String>,
        message: impl Into<String>,
        captcha: impl Into<String>,
    ) -> Self {
        Self {
            kind: DialogKind::Captcha { captcha: captcha.into() },
            ..Self::alert(id, level, title, message)
        }
    }

    pub fn with_submit_label(mut self, label: SubmitButtonLabel) -> Self {
        self.submit_label = label;
        self
    }

    /// Whether `input` unlocks the submit button.
    pub fn accepts(&self, input: Option<&str>) -> bool {
        match &self.kind {
            DialogKind::Alert => true,
            DialogKind::Captcha { captcha } => input == Some(captcha.as_str()),
        }
    }
}

pub trait ModalDialogService: Send + Sync {
    fn push(&self, dialog: Dialog);
    fn dismiss(&self, id: DialogId);
    /// Level for the next dialog, one above the topmost open one.
    fn next_level(&self) -> usize;
}

pub trait FocusManager: Send + Sync {
    /// Remembers the element that opened a dialog.
    fn add(&self, target: &str);
    /// Returns focus to the most recently remembered element.
    fn restore(&self) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct DialogStack {
    dialogs: Mutex<Vec<Dialog>>,
}

impl DialogStack {
    pub fn open(&self) -> Vec<Dialog> {
        self.dialogs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn top(&self) -> Option<Dialog> {
        self.dialogs.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

impl ModalDialogService for DialogStack {
    fn push(&self, dialog: Dialog) {
        self.dialogs.lock().unwrap_or_else(PoisonError::into_inner).push(dialog);
    }

    fn dismiss(&self, id: DialogId) {
        self.dialogs.lock().unwrap_or_else(PoisonError::into_inner).retain(|d| d.id != id);
    }

    fn next_level(&self) -> usize {
        self.dialogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|d| d.level + 1)
            .max()
            .unwrap_or(1)
    }
}

#[derive(Debug, Default)]
pub struct FocusStack {
    targets: Mutex<Vec<String>>,
}

impl FocusManager for FocusStack {
    fn add(&self, target: &str) {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).push(target.to_string());
    }

    fn restore(&self) -> Option<String> {
        self.targets.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }
}
