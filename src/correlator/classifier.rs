//! Trigger classification
//!
//! Decides whether a progress message is worth a journal entry. Matching is
//! case-sensitive substring containment, never anchored.

use crate::core::config::TriggerConfig;

/// What a message turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// Matches at least one trigger
    pub significant: bool,
    /// Announces the agent's next goal
    pub goal: bool,
    /// Carries its own text as the action
    pub action: bool,
}

/// Fixed set of trigger substrings
#[derive(Debug, Clone)]
pub struct TriggerSet {
    significant: Vec<String>,
    goal: Vec<String>,
    action: Vec<String>,
}

impl TriggerSet {
    /// Build from explicit lists. Goal markers count as significant triggers.
    pub fn new(significant: Vec<String>, goal: Vec<String>, action: Vec<String>) -> Self {
        Self {
            significant,
            goal,
            action,
        }
    }

    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new(
            config.significant.clone(),
            config.goal.clone(),
            config.action.clone(),
        )
    }

    /// Classify a message. Pure; the three flags are computed independently.
    pub fn classify(&self, message: &str) -> Classification {
        let goal = contains_any(message, &self.goal);
        Classification {
            significant: goal || contains_any(message, &self.significant),
            goal,
            action: contains_any(message, &self.action),
        }
    }
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::from_config(&TriggerConfig::default())
    }
}

fn contains_any(message: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| message.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_triggers_match_anywhere() {
        let triggers = TriggerSet::default();
        for message in [
            "Navigating to https://console.aws.amazon.com/",
            "📍 Next goal: open S3",
            "🖱️  Clicked button with index 5",
            "Entering text into the search field",
            "Searched for \"s3\" in Google",
            "User logged in to AWS console",
            "🛠️  Action 1/1: {\"click_element\": {\"index\": 3}}",
            "prefix Clicking bucket row suffix",
        ] {
            assert!(triggers.classify(message).significant, "{}", message);
        }
    }

    #[test]
    fn test_no_trigger_is_insignificant() {
        let triggers = TriggerSet::default();
        for message in [
            "unrelated chatter",
            "",
            "clicked lowercase does not count",
            "Action 2/3: not the single-action marker",
            "next goal: wrong case",
        ] {
            assert!(!triggers.classify(message).significant, "{}", message);
        }
    }

    #[test]
    fn test_goal_and_action_are_independent() {
        let triggers = TriggerSet::default();

        let goal_only = triggers.classify("Next goal: open S3");
        assert!(goal_only.significant && goal_only.goal && !goal_only.action);

        let both = triggers.classify("Next goal: keep Clicking the bucket row");
        assert!(both.significant && both.goal && both.action);

        let action_only = triggers.classify("Clicking bucket row");
        assert!(action_only.significant && !action_only.goal && action_only.action);
    }

    #[test]
    fn test_goal_marker_outside_significant_list_still_counts() {
        let triggers = TriggerSet::new(
            vec!["Opened".to_string()],
            vec!["Goal ->".to_string()],
            vec!["Opened".to_string()],
        );
        assert!(triggers.classify("Goal -> billing").significant);
        assert!(triggers.classify("Opened billing").significant);
        assert!(!triggers.classify("Next goal: billing").significant);
    }

    #[test]
    fn test_substring_equivalence_over_generated_messages() {
        let triggers = TriggerSet::default();
        let config = TriggerConfig::default();
        let fillers = ["", "x", "  ", "step 7 ", "🙂", "navigating to"];

        for left in fillers {
            for right in fillers {
                for trigger in config.significant.iter().chain(&config.goal) {
                    let message = format!("{}{}{}", left, trigger, right);
                    assert!(triggers.classify(&message).significant, "{}", message);
                }
                let plain = format!("{}{}", left, right);
                assert!(!triggers.classify(&plain).significant, "{}", plain);
            }
        }
    }
}
