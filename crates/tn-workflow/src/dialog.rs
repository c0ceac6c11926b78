//! Operator prompts.

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Widgets the workflow needs from the console.
///
/// Cancellation (Esc) is reported as `None` (or `false` for yes/no) and is
/// never an error; `Err` means the terminal itself failed.
#[allow(async_fn_in_trait)]
pub trait Dialog {
    /// Pick one entry; returns its index.
    async fn menu(&self, title: &str, items: &[&str]) -> Result<Option<usize>>;

    /// Multi-select over `(tag, description)` rows; returns the chosen tags.
    async fn checklist(
        &self,
        title: &str,
        text: &str,
        items: &[(String, String)],
    ) -> Result<Option<Vec<String>>>;

    async fn yesno(&self, title: &str, text: &str) -> Result<bool>;

    async fn msgbox(&self, title: &str, text: &str) -> Result<()>;

    async fn password(&self, title: &str) -> Result<Option<String>>;
}

/// Canned answer for one prompt of a [`ScriptedDialog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Menu(Option<usize>),
    Checklist(Option<Vec<String>>),
    YesNo(bool),
    Password(Option<String>),
}

impl Answer {
    pub fn pick(tags: &[&str]) -> Self {
        Answer::Checklist(Some(tags.iter().map(|t| t.to_string()).collect()))
    }

    pub fn password(value: &str) -> Self {
        Answer::Password(Some(value.to_string()))
    }

    fn kind(&self) -> &'static str {
        match self {
            Answer::Menu(_) => "menu",
            Answer::Checklist(_) => "checklist",
            Answer::YesNo(_) => "yesno",
            Answer::Password(_) => "password",
        }
    }
}

/// A prompt as it was shown to the (scripted) operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub kind: &'static str,
    pub title: String,
    pub text: String,
}

/// Test double answering prompts from a fixed script.
///
/// Asking a prompt the script does not expect is an error, so tests fail
/// loudly when the workflow takes an unexpected path.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: Mutex<VecDeque<Answer>>,
    shown: Mutex<Vec<Shown>>,
}

impl ScriptedDialog {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    /// Messages shown through `msgbox`, as `(title, text)`.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.shown()
            .into_iter()
            .filter(|s| s.kind == "msgbox")
            .map(|s| (s.title, s.text))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, kind: &'static str, title: &str, text: &str) -> Result<Answer> {
        self.shown.lock().unwrap().push(Shown {
            kind,
            title: title.to_string(),
            text: text.to_string(),
        });
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted at {} prompt {:?}", kind, title))?;
        if answer.kind() != kind {
            return Err(anyhow!(
                "expected {} prompt but {:?} asked a {}",
                answer.kind(),
                title,
                kind
            ));
        }
        Ok(answer)
    }
}

impl Dialog for ScriptedDialog {
    async fn menu(&self, title: &str, items: &[&str]) -> Result<Option<usize>> {
        match self.next("menu", title, &items.join("\n"))? {
            Answer::Menu(choice) => Ok(choice),
            _ => unreachable!(),
        }
    }

    async fn checklist(
        &self,
        title: &str,
        text: &str,
        _items: &[(String, String)],
    ) -> Result<Option<Vec<String>>> {
        match self.next("checklist", title, text)? {
            Answer::Checklist(tags) => Ok(tags),
            _ => unreachable!(),
        }
    }

    async fn yesno(&self, title: &str, text: &str) -> Result<bool> {
        match self.next("yesno", title, text)? {
            Answer::YesNo(yes) => Ok(yes),
            _ => unreachable!(),
        }
    }

    async fn msgbox(&self, title: &str, text: &str) -> Result<()> {
        self.shown.lock().unwrap().push(Shown {
            kind: "msgbox",
            title: title.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn password(&self, title: &str) -> Result<Option<String>> {
        match self.next("password", title, "")? {
            Answer::Password(value) => Ok(value),
            _ => unreachable!(),
        }
    }
}
