use serde::{Deserialize, Serialize};

/// A viewer command produced by a key press.
///
/// The frame loop consumes commands, never raw key codes, so every display
/// backend shares the same control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Restore the default camera pose.
    ResetCamera,
    /// Freeze or resume frame acquisition.
    TogglePause,
    /// Step the decimation level 0 -> 1 -> 2 -> 0.
    CycleDecimation,
    /// Toggle scaling projected points by the decimation factor.
    ToggleScale,
    /// Toggle texturing from the color stream.
    ToggleColor,
    /// Write the framebuffer to the snapshot file.
    SaveSnapshot,
    /// Write the current point cloud to the export file.
    ExportPointCloud,
    /// End the session.
    Quit,
}

/// A key code as reported by a display backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, stored lowercase.
    Char(char),
    Escape,
}

impl Key {
    /// Key for a printable character; letters are folded to lowercase.
    pub fn character(c: char) -> Self {
        Self::Char(c.to_ascii_lowercase())
    }

    /// Parse a binding name: `"Escape"`/`"Esc"` or a single character.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("escape") || name.eq_ignore_ascii_case("esc") {
            return Some(Self::Escape);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self::character(c)),
            _ => None,
        }
    }
}

/// Key mapping configuration. Each binding is a key name as accepted by
/// [`Key::from_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub reset: String,
    pub pause: String,
    pub decimate: String,
    pub scale: String,
    pub color: String,
    pub snapshot: String,
    pub export: String,
    /// Any of these quits.
    pub quit: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            reset: "r".to_string(),
            pause: "p".to_string(),
            decimate: "d".to_string(),
            scale: "z".to_string(),
            color: "c".to_string(),
            snapshot: "s".to_string(),
            export: "e".to_string(),
            quit: vec!["q".to_string(), "Escape".to_string()],
        }
    }
}

impl KeyBindings {
    /// Resolve a key press to a command, if it is bound.
    pub fn command_for(&self, key: Key) -> Option<Command> {
        let key = match key {
            Key::Char(c) => Key::character(c),
            other => other,
        };
        let bound = |name: &str| Key::from_name(name) == Some(key);

        let command = if bound(&self.reset) {
            Command::ResetCamera
        } else if bound(&self.pause) {
            Command::TogglePause
        } else if bound(&self.decimate) {
            Command::CycleDecimation
        } else if bound(&self.scale) {
            Command::ToggleScale
        } else if bound(&self.color) {
            Command::ToggleColor
        } else if bound(&self.snapshot) {
            Command::SaveSnapshot
        } else if bound(&self.export) {
            Command::ExportPointCloud
        } else if self.quit.iter().any(|name| bound(name)) {
            Command::Quit
        } else {
            tracing::trace!(?key, "unbound key");
            return None;
        };
        Some(command)
    }

    /// Binding names that do not parse as keys.
    pub fn invalid_names(&self) -> Vec<&str> {
        [
            &self.reset,
            &self.pause,
            &self.decimate,
            &self.scale,
            &self.color,
            &self.snapshot,
            &self.export,
        ]
        .into_iter()
        .chain(self.quit.iter())
        .map(String::as_str)
        .filter(|name| Key::from_name(name).is_none())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_every_command() {
        let keys = KeyBindings::default();
        let cases = [
            ('r', Command::ResetCamera),
            ('p', Command::TogglePause),
            ('d', Command::CycleDecimation),
            ('z', Command::ToggleScale),
            ('c', Command::ToggleColor),
            ('s', Command::SaveSnapshot),
            ('e', Command::ExportPointCloud),
            ('q', Command::Quit),
        ];
        for (c, expected) in cases {
            assert_eq!(keys.command_for(Key::character(c)), Some(expected), "key {c}");
        }
    }

    #[test]
    fn escape_and_q_both_quit() {
        let keys = KeyBindings::default();
        assert_eq!(keys.command_for(Key::Escape), Some(Command::Quit));
        assert_eq!(keys.command_for(Key::character('q')), Some(Command::Quit));
    }

    #[test]
    fn matching_ignores_case() {
        let keys = KeyBindings::default();
        assert_eq!(keys.command_for(Key::Char('R')), Some(Command::ResetCamera));
        assert_eq!(keys.command_for(Key::character('E')), Some(Command::ExportPointCloud));
    }

    #[test]
    fn unbound_keys_yield_nothing() {
        let keys = KeyBindings::default();
        assert_eq!(keys.command_for(Key::character('x')), None);
    }

    #[test]
    fn key_names_parse() {
        assert_eq!(Key::from_name("Esc"), Some(Key::Escape));
        assert_eq!(Key::from_name("S"), Some(Key::Char('s')));
        assert_eq!(Key::from_name("space"), None);
        assert_eq!(Key::from_name(""), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let keys: KeyBindings = serde_json::from_str(r#"{ "snapshot": "k" }"#).unwrap();
        assert_eq!(keys.command_for(Key::character('k')), Some(Command::SaveSnapshot));
        assert_eq!(keys.command_for(Key::character('s')), None);
        assert_eq!(keys.command_for(Key::character('r')), Some(Command::ResetCamera));
    }

    #[test]
    fn invalid_names_are_reported() {
        let keys = KeyBindings {
            pause: "pause".to_string(),
            ..KeyBindings::default()
        };
        assert_eq!(keys.invalid_names(), vec!["pause"]);
    }
}
