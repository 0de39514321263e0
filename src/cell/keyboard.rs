//! Keyboard handling for an active cell
//!
//! Editing shortcuts are intercepted and turned into rich-text editing
//! commands for the output element instead of reaching the host's default
//! handling.

/// Host platform; decides which modifier is the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    Char(char),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Cmd on macOS, Ctrl elsewhere.
    fn primary(&self, platform: Platform) -> bool {
        match platform {
            Platform::MacOs => self.meta,
            Platform::Windows | Platform::Linux => self.ctrl,
        }
    }

    fn is_char(&self, c: char) -> bool {
        matches!(self.key, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Native rich-text editing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RichTextCommand {
    SelectAll,
    Undo,
    Redo,
    Indent,
    Outdent,
}

impl RichTextCommand {
    /// Name of the editing command as understood by contenteditable hosts.
    pub fn exec_command_name(&self) -> &'static str {
        match self {
            RichTextCommand::SelectAll => "selectAll",
            RichTextCommand::Undo => "undo",
            RichTextCommand::Redo => "redo",
            RichTextCommand::Indent => "indent",
            RichTextCommand::Outdent => "outdent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ExitEditMode,
    Command(RichTextCommand),
}

/// What a cell view did with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled; the host's default handling applies
    Ignored,
    ExitedEditMode,
    /// The host should run this command on the output element
    Execute(RichTextCommand),
}

/// Translate a key press into a cell action.
pub fn translate(chord: &KeyChord, platform: Platform) -> Option<KeyAction> {
    let primary = chord.primary(platform);
    match chord.key {
        Key::Escape => Some(KeyAction::ExitEditMode),
        Key::Tab if chord.shift => Some(KeyAction::Command(RichTextCommand::Outdent)),
        Key::Tab => Some(KeyAction::Command(RichTextCommand::Indent)),
        _ if primary && chord.is_char('a') => Some(KeyAction::Command(RichTextCommand::SelectAll)),
        _ if primary && chord.is_char('z') && chord.shift => {
            Some(KeyAction::Command(RichTextCommand::Redo))
        }
        _ if primary && chord.is_char('z') => Some(KeyAction::Command(RichTextCommand::Undo)),
        _ if primary && chord.is_char('y') && platform != Platform::MacOs => {
            Some(KeyAction::Command(RichTextCommand::Redo))
        }
        _ => None,
    }
}
