/// Canned prompts offered while typing.
pub const SUGGESTIONS: [&str; 8] = [
    "I have a fever",
    "COVID symptoms",
    "Vaccination schedule",
    "Health tips",
    "Emergency help",
    "I feel sick",
    "Headache relief",
    "Nearby hospitals",
];

const MAX_SUGGESTIONS: usize = 3;

pub const HOSPITALS_IN_AREA: &str = "Find hospitals in my area";

pub const LOCATION_UNSUPPORTED: &str =
    "Location is not available on this device. Searching for general hospital information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Symptoms,
    Vaccines,
    Alerts,
    Emergency,
    Tips,
    Hospitals,
}

impl QuickAction {
    pub const ALL: [QuickAction; 6] = [
        QuickAction::Symptoms,
        QuickAction::Vaccines,
        QuickAction::Alerts,
        QuickAction::Emergency,
        QuickAction::Tips,
        QuickAction::Hospitals,
    ];

    /// Ctrl+1 through Ctrl+6.
    pub fn from_shortcut(key: char) -> Option<Self> {
        let index = key.to_digit(10)?.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            QuickAction::Symptoms => "Symptoms",
            QuickAction::Vaccines => "Vaccines",
            QuickAction::Alerts => "Alerts",
            QuickAction::Emergency => "Emergency",
            QuickAction::Tips => "Health tips",
            QuickAction::Hospitals => "Hospitals",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            QuickAction::Symptoms => "I have symptoms that I need help with",
            QuickAction::Vaccines => "Tell me about vaccinations",
            QuickAction::Alerts => "Any health alerts in my area?",
            QuickAction::Emergency => "I need emergency health assistance",
            QuickAction::Tips => "Give me health tips for today",
            QuickAction::Hospitals => "Find hospitals near my location",
        }
    }

    pub fn follow_ups(self) -> &'static [&'static str] {
        match self {
            QuickAction::Symptoms => &[
                "I have a fever",
                "I have a headache",
                "I feel nauseous",
                "I have chest pain",
            ],
            QuickAction::Vaccines => &[
                "COVID-19 vaccine info",
                "Flu shot schedule",
                "Travel vaccines",
                "Childhood immunizations",
            ],
            QuickAction::Alerts => &[
                "Air quality today",
                "Disease outbreaks",
                "Weather health warnings",
                "Food safety alerts",
            ],
            QuickAction::Emergency => &[
                "Call 911",
                "Nearest hospital",
                "First aid guidance",
                "Poison control",
            ],
            QuickAction::Tips => &[
                "Exercise tips",
                "Nutrition advice",
                "Sleep hygiene",
                "Mental health tips",
            ],
            QuickAction::Hospitals => &[],
        }
    }
}

/// What the window should do for a quick action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickPlan {
    /// Bot-side notice posted before sending, if any.
    pub notice: Option<&'static str>,
    pub message: &'static str,
    pub follow_ups: &'static [&'static str],
}

impl QuickPlan {
    /// Follow-ups to show instead of the current suggestions; `None` keeps
    /// whatever is already on screen.
    pub fn suggestions(&self) -> Option<Vec<String>> {
        if self.follow_ups.is_empty() {
            None
        } else {
            Some(self.follow_ups.iter().map(|s| s.to_string()).collect())
        }
    }
}

pub fn plan(action: QuickAction) -> QuickPlan {
    match action {
        // No location source on the desktop, so take the general route.
        QuickAction::Hospitals => QuickPlan {
            notice: Some(LOCATION_UNSUPPORTED),
            message: HOSPITALS_IN_AREA,
            follow_ups: &[],
        },
        other => QuickPlan {
            notice: None,
            message: other.prompt(),
            follow_ups: other.follow_ups(),
        },
    }
}

/// Up to three suggestions containing `input` (case-insensitive), skipping an
/// exact match of what was already typed.
pub fn suggestions_for(input: &str) -> Vec<&'static str> {
    let needle = input.to_lowercase();
    SUGGESTIONS
        .iter()
        .filter(|s| {
            let candidate = s.to_lowercase();
            candidate.contains(&needle) && candidate != needle
        })
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_map_in_order() {
        assert_eq!(QuickAction::from_shortcut('1'), Some(QuickAction::Symptoms));
        assert_eq!(QuickAction::from_shortcut('6'), Some(QuickAction::Hospitals));
        assert_eq!(QuickAction::from_shortcut('0'), None);
        assert_eq!(QuickAction::from_shortcut('7'), None);
        assert_eq!(QuickAction::from_shortcut('x'), None);
    }

    #[test]
    fn hospitals_takes_general_route() {
        let p = plan(QuickAction::Hospitals);
        assert_eq!(p.message, HOSPITALS_IN_AREA);
        assert!(p.notice.is_some());
        assert!(p.follow_ups.is_empty());
        assert_eq!(p.suggestions(), None);
    }

    #[test]
    fn location_notice_does_not_mention_a_browser() {
        let notice = plan(QuickAction::Hospitals).notice.unwrap_or_default();
        assert!(notice.starts_with("Location is not available on this device."));
        assert!(!notice.to_lowercase().contains("browser"));
    }

    #[test]
    fn emergency_offers_follow_ups() {
        let p = plan(QuickAction::Emergency);
        assert_eq!(p.message, "I need emergency health assistance");
        assert_eq!(p.follow_ups.len(), 4);
        assert_eq!(p.notice, None);
        assert_eq!(p.suggestions().map(|s| s.len()), Some(4));
    }

    #[test]
    fn suggestions_filter_case_insensitively() {
        assert_eq!(suggestions_for("FEV"), vec!["I have a fever"]);
        assert_eq!(
            suggestions_for("i"),
            vec!["I have a fever", "COVID symptoms", "Vaccination schedule"]
        );
        assert!(suggestions_for("health tips").is_empty());
        assert_eq!(suggestions_for("").len(), 3);
    }
}
