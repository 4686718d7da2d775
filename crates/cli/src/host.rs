// Terminal host: prints notices to stderr and asks for confirmation on stdin.

use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, IsTerminal, Write};

use proforma_editor::{Host, Notice};
use tracing::{debug, warn};

use crate::output::{self, OutputFormat};

pub struct TerminalHost {
    format: OutputFormat,
    assume_yes: bool,
    notices: RefCell<Vec<Notice>>,
    left: Cell<bool>,
}

impl TerminalHost {
    pub fn new(format: OutputFormat, assume_yes: bool) -> Self {
        Self { format, assume_yes, notices: RefCell::new(Vec::new()), left: Cell::new(false) }
    }

    /// Every notice reported so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn left_editor(&self) -> bool {
        self.left.get()
    }
}

impl Host for TerminalHost {
    fn notify(&self, notice: Notice) {
        output::print_notice(self.format, &notice);
        self.notices.borrow_mut().push(notice);
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            warn!(prompt, "no terminal to confirm on, declining (pass --yes to skip prompts)");
            return false;
        }
        ask(prompt, &mut stdin.lock(), &mut io::stderr().lock())
    }

    fn leave_editor(&self) {
        debug!("template is gone, closing session");
        self.left.set(true);
    }
}

/// Write `prompt` and read one line of answer. Anything but yes declines.
pub fn ask<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> bool {
    let _ = write!(output, "{prompt} [y/N] ");
    let _ = output.flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_yes(&line),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
