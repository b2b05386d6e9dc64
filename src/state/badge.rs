//! Badge rendering policy
//!
//! The badge is a pure function of the remaining seconds and the enabled
//! flag. The settings panel reuses [`BadgeTier`] for its countdown display.

use serde::Serialize;

/// Urgency tier of a countdown value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    /// 10 seconds or less
    Urgent,
    /// 11 to 30 seconds
    Warning,
    /// More than 30 seconds
    Normal,
}

impl BadgeTier {
    pub fn for_seconds(remaining_seconds: u64) -> Self {
        if remaining_seconds <= 10 {
            Self::Urgent
        } else if remaining_seconds <= 30 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            Self::Urgent => "#FF0000",
            Self::Warning => "#FFA500",
            Self::Normal => "#00FF00",
        }
    }

    pub fn text_color(&self) -> &'static str {
        match self {
            Self::Urgent => "white",
            Self::Warning | Self::Normal => "black",
        }
    }
}

/// Render seconds as `M:SS`
pub fn format_countdown(remaining_seconds: u64) -> String {
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// What the badge overlay currently shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub text: String,
    pub tier: Option<BadgeTier>,
    pub background: Option<&'static str>,
    pub text_color: Option<&'static str>,
}

impl Badge {
    /// Empty badge shown while auto-save is off
    pub fn blank() -> Self {
        Self {
            text: String::new(),
            tier: None,
            background: None,
            text_color: None,
        }
    }

    pub fn render(remaining_seconds: u64, enabled: bool) -> Self {
        if !enabled {
            return Self::blank();
        }

        let tier = BadgeTier::for_seconds(remaining_seconds);
        Self {
            text: format_countdown(remaining_seconds),
            tier: Some(tier),
            background: Some(tier.background()),
            text_color: Some(tier.text_color()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for Badge {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(9), "0:09");
        assert_eq!(format_countdown(60), "1:00");
        assert_eq!(format_countdown(299), "4:59");
        assert_eq!(format_countdown(3600), "60:00");
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(BadgeTier::for_seconds(0), BadgeTier::Urgent);
        assert_eq!(BadgeTier::for_seconds(10), BadgeTier::Urgent);
        assert_eq!(BadgeTier::for_seconds(11), BadgeTier::Warning);
        assert_eq!(BadgeTier::for_seconds(30), BadgeTier::Warning);
        assert_eq!(BadgeTier::for_seconds(31), BadgeTier::Normal);
        assert_eq!(BadgeTier::for_seconds(86_400), BadgeTier::Normal);
    }

    #[test]
    fn disabled_badge_is_blank_whatever_the_countdown() {
        for seconds in [0, 5, 25, 60] {
            assert!(Badge::render(seconds, false).is_blank());
            assert_eq!(Badge::render(seconds, false).tier, None);
        }
    }

    #[test]
    fn urgent_badge_uses_light_text() {
        let badge = Badge::render(10, true);
        assert_eq!(badge.text, "0:10");
        assert_eq!(badge.background, Some("#FF0000"));
        assert_eq!(badge.text_color, Some("white"));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Badge::render(45, true)).unwrap();
        assert_eq!(json["text"], "0:45");
        assert_eq!(json["tier"], "normal");
        assert_eq!(json["textColor"], "black");
    }
}
