// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line-oriented messages accepted by the governor.

/// Operator intents. The touchscreen buttons map 1:1 onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AdjustDown,
    AdjustUp,
    Commit,
    Start,
    Stop,
}

impl Command {
    /// Button label as printed on the touchscreen, also accepted on the debug console.
    pub fn label(self) -> &'static str {
        match self {
            Command::AdjustDown => "-",
            Command::AdjustUp => "+",
            Command::Commit => "Set",
            Command::Start => "START",
            Command::Stop => "STOP",
        }
    }

    /// Look up a button label, ignoring ASCII case.
    pub fn from_label(label: &str) -> Option<Command> {
        [
            Command::AdjustDown,
            Command::AdjustUp,
            Command::Commit,
            Command::Start,
            Command::Stop,
        ]
        .into_iter()
        .find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

/// One parsed line from the debug console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugLine {
    /// Operator intent typed as a button label.
    Operator(Command),
    /// Fixed motor command for manual override (drive counts).
    ManualCommand(f32),
}
