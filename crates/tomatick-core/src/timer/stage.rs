use serde::{Deserialize, Serialize};

/// The active phase of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Work, Stage::ShortBreak, Stage::LongBreak];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Work => "Work",
            Stage::ShortBreak => "Short Break",
            Stage::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Stage::Work)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
