//! Modal dialog state machines, independent of any terminal.

use crate::secret::SecretField;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a finished modal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Index(Option<usize>),
    Tags(Option<Vec<String>>),
    YesNo(bool),
    Ack,
    Secret(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStage {
    Enter,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Menu {
        items: Vec<String>,
        cursor: usize,
    },
    Checklist {
        rows: Vec<(String, String)>,
        checked: Vec<bool>,
        cursor: usize,
    },
    YesNo {
        yes: bool,
    },
    Message,
    Password {
        first: SecretField,
        second: SecretField,
        stage: PasswordStage,
        mismatch: bool,
    },
}

impl Modal {
    pub fn menu(items: &[&str]) -> Self {
        Modal::Menu {
            items: items.iter().map(|s| s.to_string()).collect(),
            cursor: 0,
        }
    }

    pub fn checklist(rows: &[(String, String)]) -> Self {
        Modal::Checklist {
            rows: rows.to_vec(),
            checked: vec![false; rows.len()],
            cursor: 0,
        }
    }

    pub fn yesno() -> Self {
        Modal::YesNo { yes: true }
    }

    pub fn password() -> Self {
        Modal::Password {
            first: SecretField::default(),
            second: SecretField::default(),
            stage: PasswordStage::Enter,
            mismatch: false,
        }
    }

    /// Feed one key press; `Some` once the modal is finished.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Reply> {
        let cancel = key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));

        match self {
            Modal::Menu { items, cursor } => {
                if cancel {
                    return Some(Reply::Index(None));
                }
                match key.code {
                    KeyCode::Enter if !items.is_empty() => return Some(Reply::Index(Some(*cursor))),
                    code => move_cursor(cursor, items.len(), code),
                }
                None
            }
            Modal::Checklist {
                rows,
                checked,
                cursor,
            } => {
                if cancel {
                    return Some(Reply::Tags(None));
                }
                match key.code {
                    KeyCode::Char(' ') => {
                        if let Some(slot) = checked.get_mut(*cursor) {
                            *slot = !*slot;
                        }
                    }
                    KeyCode::Enter => {
                        let tags = rows
                            .iter()
                            .zip(checked.iter())
                            .filter(|(_, on)| **on)
                            .map(|((tag, _), _)| tag.clone())
                            .collect();
                        return Some(Reply::Tags(Some(tags)));
                    }
                    code => move_cursor(cursor, rows.len(), code),
                }
                None
            }
            Modal::YesNo { yes } => {
                if cancel {
                    return Some(Reply::YesNo(false));
                }
                match key.code {
                    KeyCode::Left | KeyCode::Right | KeyCode::Tab => *yes = !*yes,
                    KeyCode::Char('y') | KeyCode::Char('Y') => return Some(Reply::YesNo(true)),
                    KeyCode::Char('n') | KeyCode::Char('N') => return Some(Reply::YesNo(false)),
                    KeyCode::Enter => return Some(Reply::YesNo(*yes)),
                    _ => {}
                }
                None
            }
            Modal::Message => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Reply::Ack),
                _ if cancel => Some(Reply::Ack),
                _ => None,
            },
            Modal::Password {
                first,
                second,
                stage,
                mismatch,
            } => {
                if cancel {
                    return Some(Reply::Secret(None));
                }
                if key.code != KeyCode::Enter {
                    match *stage {
                        PasswordStage::Enter => first.handle_key(key),
                        PasswordStage::Confirm => second.handle_key(key),
                    };
                    return None;
                }
                match *stage {
                    // Nothing to confirm; the caller treats empty as "back out".
                    PasswordStage::Enter if first.value().is_empty() => {
                        Some(Reply::Secret(Some(String::new())))
                    }
                    PasswordStage::Enter => {
                        *stage = PasswordStage::Confirm;
                        *mismatch = false;
                        None
                    }
                    PasswordStage::Confirm if first.value() == second.value() => {
                        Some(Reply::Secret(Some(first.value().to_string())))
                    }
                    PasswordStage::Confirm => {
                        first.clear();
                        second.clear();
                        *stage = PasswordStage::Enter;
                        *mismatch = true;
                        None
                    }
                }
            }
        }
    }
}

fn move_cursor(cursor: &mut usize, len: usize, code: KeyCode) {
    if len == 0 {
        return;
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => *cursor = cursor.checked_sub(1).unwrap_or(len - 1),
        KeyCode::Down | KeyCode::Char('j') => *cursor = (*cursor + 1) % len,
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = len - 1,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(modal: &mut Modal, codes: &[KeyCode]) -> Option<Reply> {
        let mut reply = None;
        for code in codes {
            reply = modal.handle_key(KeyEvent::from(*code));
        }
        reply
    }

    fn type_str(modal: &mut Modal, text: &str) {
        for c in text.chars() {
            assert_eq!(modal.handle_key(KeyEvent::from(KeyCode::Char(c))), None);
        }
    }

    #[test]
    fn menu_wraps_and_cancels() {
        let mut modal = Modal::menu(&["a", "b", "c"]);
        assert_eq!(
            press(&mut modal, &[KeyCode::Up, KeyCode::Enter]),
            Some(Reply::Index(Some(2)))
        );
        let mut modal = Modal::menu(&["a"]);
        assert_eq!(press(&mut modal, &[KeyCode::Esc]), Some(Reply::Index(None)));
    }

    #[test]
    fn checklist_returns_tags_in_row_order() {
        let rows = vec![
            ("sda".to_string(), "A".to_string()),
            ("sdb".to_string(), "B".to_string()),
            ("sdc".to_string(), "C".to_string()),
        ];
        let mut modal = Modal::checklist(&rows);
        let reply = press(
            &mut modal,
            &[
                KeyCode::End,
                KeyCode::Char(' '),
                KeyCode::Home,
                KeyCode::Char(' '),
                KeyCode::Down,
                KeyCode::Char(' '),
                KeyCode::Char(' '),
                KeyCode::Enter,
            ],
        );
        assert_eq!(
            reply,
            Some(Reply::Tags(Some(vec!["sda".into(), "sdc".into()])))
        );
    }

    #[test]
    fn yesno_defaults_to_yes_and_esc_is_no() {
        assert_eq!(
            press(&mut Modal::yesno(), &[KeyCode::Enter]),
            Some(Reply::YesNo(true))
        );
        assert_eq!(
            press(&mut Modal::yesno(), &[KeyCode::Tab, KeyCode::Enter]),
            Some(Reply::YesNo(false))
        );
        assert_eq!(
            press(&mut Modal::yesno(), &[KeyCode::Esc]),
            Some(Reply::YesNo(false))
        );
    }

    #[test]
    fn password_needs_matching_confirmation() {
        let mut modal = Modal::password();
        type_str(&mut modal, "abc");
        assert_eq!(press(&mut modal, &[KeyCode::Enter]), None);
        type_str(&mut modal, "abd");
        assert_eq!(press(&mut modal, &[KeyCode::Enter]), None);
        assert!(matches!(
            modal,
            Modal::Password {
                mismatch: true,
                stage: PasswordStage::Enter,
                ..
            }
        ));

        type_str(&mut modal, "abc");
        press(&mut modal, &[KeyCode::Enter]);
        type_str(&mut modal, "abc");
        assert_eq!(
            press(&mut modal, &[KeyCode::Enter]),
            Some(Reply::Secret(Some("abc".into())))
        );
    }

    #[test]
    fn empty_password_finishes_immediately() {
        assert_eq!(
            press(&mut Modal::password(), &[KeyCode::Enter]),
            Some(Reply::Secret(Some(String::new())))
        );
        assert_eq!(
            press(&mut Modal::password(), &[KeyCode::Esc]),
            Some(Reply::Secret(None))
        );
    }
}
