//! Operator input, decoupled from the terminal.

use std::{io, time::Duration};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Operator actions understood by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    FocusUp,
    FocusDown,
    SoftReseed,
    KillAndReseed,
    /// Double the focused worker's temperature.
    HeatUp,
    /// Halve the focused worker's temperature.
    CoolDown,
    Quit,
}

impl Input {
    /// Whether the input sends a command to the writer.
    pub fn is_command(self) -> bool {
        matches!(
            self,
            Self::SoftReseed | Self::KillAndReseed | Self::HeatUp | Self::CoolDown
        )
    }
}

/// Non-blocking source of operator input.
pub trait InputSource {
    /// Next pending input, or `None` if nothing is waiting.
    ///
    /// # Errors
    /// Returns an error if the underlying device cannot be read.
    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

/// Maps a key press to an [`Input`], `None` for unbound keys.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(Input::Quit);
    }

    match key.code {
        KeyCode::Up => Some(Input::FocusUp),
        KeyCode::Down => Some(Input::FocusDown),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Input::FocusUp),
            's' => Some(Input::FocusDown),
            'r' => Some(Input::SoftReseed),
            'k' => Some(Input::KillAndReseed),
            '+' | '=' => Some(Input::HeatUp),
            '-' | '_' => Some(Input::CoolDown),
            'q' => Some(Input::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Reads key presses from the terminal without blocking.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(input) = map_key(k) {
                    return Ok(Some(input));
                }
            }
        }
        Ok(None)
    }
}

/// Replays a fixed list of inputs, one per poll.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pending: std::collections::VecDeque<Input>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new(inputs: impl IntoIterator<Item = Input>) -> Self {
        Self {
            pending: inputs.into_iter().collect(),
        }
    }

    pub fn push(&mut self, input: Input) {
        self.pending.push_back(input);
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
impl InputSource for ScriptedInput {
    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_wasd_move_focus() {
        assert_eq!(map_key(key(KeyCode::Up)), Some(Input::FocusUp));
        assert_eq!(map_key(key(KeyCode::Char('w'))), Some(Input::FocusUp));
        assert_eq!(map_key(key(KeyCode::Down)), Some(Input::FocusDown));
        assert_eq!(map_key(key(KeyCode::Char('S'))), Some(Input::FocusDown));
    }

    #[test]
    fn command_keys() {
        assert_eq!(map_key(key(KeyCode::Char('r'))), Some(Input::SoftReseed));
        assert_eq!(map_key(key(KeyCode::Char('K'))), Some(Input::KillAndReseed));
        assert_eq!(map_key(key(KeyCode::Char('+'))), Some(Input::HeatUp));
        assert_eq!(map_key(key(KeyCode::Char('-'))), Some(Input::CoolDown));
    }

    #[test]
    fn only_writer_actions_are_commands() {
        assert!(Input::KillAndReseed.is_command());
        assert!(Input::CoolDown.is_command());
        assert!(!Input::FocusDown.is_command());
        assert!(!Input::Quit.is_command());
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Input::Quit));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(Input::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Input::Quit)
        );
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
        assert_eq!(map_key(key(KeyCode::Tab)), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn scripted_input_drains_in_order() {
        let mut input = ScriptedInput::new([Input::FocusDown, Input::Quit]);
        assert_eq!(input.poll_input().unwrap(), Some(Input::FocusDown));
        assert_eq!(input.poll_input().unwrap(), Some(Input::Quit));
        assert_eq!(input.poll_input().unwrap(), None);
        assert!(input.is_drained());
    }
}
