pub mod html;
pub mod notification;
pub mod pagination;

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

pub use notification::{Notification, NotificationBar, NotificationKind, Notifier};
pub use pagination::{Pagination, render_pagination};

pub fn loader(label: &str) -> String {
    format!(r#"<div class="loader">{}</div>"#, html::escape(label))
}

/// Blocking yes/no question put to the user before destructive actions.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer; records every question asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ConfirmPrompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> bool {
        self.asked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
        self.answer
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
pub struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        let mut stdout = io::stdout();
        if write!(stdout, "{} [y/N] ", message).and_then(|_| stdout.flush()).is_err() {
            return false;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
