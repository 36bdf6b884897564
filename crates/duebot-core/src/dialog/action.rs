//! Button actions and their compact callback-data encoding.

use chrono::NaiveTime;

use std::fmt;
use std::str::FromStr;

use duebot_types::category::CategoryId;

/// Preset due times offered as buttons.
pub const TIME_PRESETS: [(u32, u32); 4] = [(9, 0), (12, 0), (18, 0), (21, 0)];

/// Something the user can press on a dialog screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    PickCategory(CategoryId),
    NewCategory,
    SkipCategory,
    Today,
    Tomorrow,
    TimePreset(NaiveTime),
    Back,
    Cancel,
}

impl DialogAction {
    /// Encode as Telegram callback data (at most 64 bytes).
    pub fn to_callback_data(&self) -> String {
        match self {
            Self::PickCategory(id) => format!("cat:{id}"),
            Self::NewCategory => "cat_new".to_string(),
            Self::SkipCategory => "cat_skip".to_string(),
            Self::Today => "date_today".to_string(),
            Self::Tomorrow => "date_tomorrow".to_string(),
            Self::TimePreset(t) => format!("time:{}", t.format("%H%M")),
            Self::Back => "back".to_string(),
            Self::Cancel => "cancel".to_string(),
        }
    }

    /// Short confirmation shown when a button press is acknowledged.
    pub fn toast(&self) -> Option<String> {
        match self {
            Self::PickCategory(_) => Some("Category selected".to_string()),
            Self::SkipCategory => Some("No category".to_string()),
            Self::Today => Some("Date: today".to_string()),
            Self::Tomorrow => Some("Date: tomorrow".to_string()),
            Self::TimePreset(t) => Some(format!("Time: {}", t.format("%H:%M"))),
            Self::NewCategory | Self::Back | Self::Cancel => None,
        }
    }
}

impl fmt::Display for DialogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_callback_data())
    }
}

impl FromStr for DialogAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || format!("unknown callback data: '{s}'");
        match s {
            "cat_new" => Ok(Self::NewCategory),
            "cat_skip" => Ok(Self::SkipCategory),
            "date_today" => Ok(Self::Today),
            "date_tomorrow" => Ok(Self::Tomorrow),
            "back" => Ok(Self::Back),
            "cancel" => Ok(Self::Cancel),
            _ => {
                if let Some(id) = s.strip_prefix("cat:") {
                    return id.parse().map(Self::PickCategory).map_err(|_| unknown());
                }
                if let Some(hhmm) = s.strip_prefix("time:") {
                    return NaiveTime::parse_from_str(hhmm, "%H%M")
                        .map(Self::TimePreset)
                        .map_err(|_| unknown());
                }
                Err(unknown())
            }
        }
    }
}
