use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::config::AutomationConfig;
use crate::types::BridgeMessage;

/// Placeholder substituted in the chat command template
pub const CALLSIGN_PLACEHOLDER: &str = "{callsign}";

/// One action replayed into the focused application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputStep {
    /// Replace the system clipboard text
    SetClipboard(String),

    /// Type text key by key
    TypeText { text: String, key_delay: Duration },

    /// Press and release Enter
    PressEnter,

    /// Ctrl+V
    Paste,

    /// Wait before the next step
    Pause(Duration),
}

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("input synthesis failed: {0}")]
    Input(String),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Receives the replay steps. The bridge drives one sink sequentially.
pub trait AutomationSink {
    fn perform(&mut self, step: &InputStep) -> Result<(), AutomationError>;
}

/// Steps that deliver a clearance: put the text on the clipboard, open a
/// private chat with the callsign, paste, and optionally send.
pub fn replay_script(message: &BridgeMessage, config: &AutomationConfig) -> Vec<InputStep> {
    let open_command = config.chat_command.replace(CALLSIGN_PLACEHOLDER, &message.callsign);

    let mut steps = vec![
        InputStep::SetClipboard(message.pdc.clone()),
        InputStep::TypeText {
            text: open_command,
            key_delay: Duration::from_millis(config.key_delay_ms),
        },
        InputStep::PressEnter,
        InputStep::Pause(Duration::from_millis(config.open_delay_ms)),
        InputStep::Paste,
        InputStep::Pause(Duration::from_millis(config.paste_delay_ms)),
    ];

    if config.confirm_after_paste {
        steps.push(InputStep::PressEnter);
    }

    steps
}

/// Sink that drives the real desktop: system clipboard plus synthetic
/// keyboard input into whatever window has focus.
///
/// The clipboard handle is opened on first use and kept for the life of the
/// sink. On X11/Wayland the owner serves the contents, so dropping it after
/// each set would lose the text before the paste.
#[derive(Default)]
pub struct DesktopSink {
    clipboard: Option<arboard::Clipboard>,
}

impl DesktopSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, AutomationError> {
        if self.clipboard.is_none() {
            let clipboard = arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard.as_mut().ok_or_else(|| AutomationError::Clipboard("clipboard unavailable".into()))
    }
}

impl AutomationSink for DesktopSink {
    fn perform(&mut self, step: &InputStep) -> Result<(), AutomationError> {
        match step {
            InputStep::SetClipboard(text) => {
                self.clipboard()?
                    .set_text(text.clone())
                    .map_err(|e| AutomationError::Clipboard(e.to_string()))
            }
            InputStep::TypeText { text, key_delay } => keyboard::type_text(text, *key_delay),
            InputStep::PressEnter => keyboard::press_enter(),
            InputStep::Paste => keyboard::paste(),
            InputStep::Pause(duration) => {
                thread::sleep(*duration);
                Ok(())
            }
        }
    }
}

#[cfg(windows)]
mod keyboard {
    use std::mem;
    use std::thread;
    use std::time::Duration;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        INPUT,
        INPUT_0,
        INPUT_KEYBOARD,
        KEYBDINPUT,
        KEYBD_EVENT_FLAGS,
        KEYEVENTF_KEYUP,
        KEYEVENTF_UNICODE,
        SendInput,
        VIRTUAL_KEY,
        VK_CONTROL,
        VK_RETURN,
    };

    use super::AutomationError;

    const VK_V: VIRTUAL_KEY = VIRTUAL_KEY(b'V' as u16);

    fn key(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn send(inputs: &[INPUT]) -> Result<(), AutomationError> {
        let sent = unsafe { SendInput(inputs, mem::size_of::<INPUT>() as i32) };
        if sent as usize == inputs.len() {
            Ok(())
        } else {
            Err(AutomationError::Input(format!("SendInput accepted {} of {} events", sent, inputs.len())))
        }
    }

    /// Unicode key events, so the result does not depend on keyboard layout
    pub fn type_text(text: &str, key_delay: Duration) -> Result<(), AutomationError> {
        for unit in text.encode_utf16() {
            send(
                &[
                    key(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
                    key(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
                ]
            )?;
            thread::sleep(key_delay);
        }
        Ok(())
    }

    pub fn press_enter() -> Result<(), AutomationError> {
        send(&[key(VK_RETURN, 0, KEYBD_EVENT_FLAGS(0)), key(VK_RETURN, 0, KEYEVENTF_KEYUP)])
    }

    pub fn paste() -> Result<(), AutomationError> {
        send(
            &[
                key(VK_CONTROL, 0, KEYBD_EVENT_FLAGS(0)),
                key(VK_V, 0, KEYBD_EVENT_FLAGS(0)),
                key(VK_V, 0, KEYEVENTF_KEYUP),
                key(VK_CONTROL, 0, KEYEVENTF_KEYUP),
            ]
        )
    }
}

#[cfg(not(windows))]
mod keyboard {
    use std::time::Duration;

    use super::AutomationError;

    pub fn type_text(_text: &str, _key_delay: Duration) -> Result<(), AutomationError> {
        Err(AutomationError::Unsupported("keystroke synthesis"))
    }

    pub fn press_enter() -> Result<(), AutomationError> {
        Err(AutomationError::Unsupported("keystroke synthesis"))
    }

    pub fn paste() -> Result<(), AutomationError> {
        Err(AutomationError::Unsupported("keystroke synthesis"))
    }
}
