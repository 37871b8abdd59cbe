//! Goal catalog as served by the goals API.
//!
//! A [`Goal`] is the whole catalog: an ordered list of [`Item`]s plus a
//! pagination cursor. Each item's `goal` value is a step count or a distance in
//! meters depending on its [`GoalType`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GoalTrackError, Result};

/// Goal catalog returned by a fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// One target in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GoalType,
    /// Target value: steps for [`GoalType::Step`], meters otherwise.
    pub goal: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

/// What an item measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalType {
    #[serde(rename = "step")]
    Step,
    #[serde(rename = "walking_distance")]
    Walking,
    #[serde(rename = "running_distance")]
    Running,
}

/// Reward granted when an item's goal is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub trophy: Trophy,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trophy {
    #[serde(rename = "gold_medal")]
    Gold,
    #[serde(rename = "silver_medal")]
    Silver,
    #[serde(rename = "bronze_medal")]
    Bronze,
    #[serde(rename = "zombie_hand")]
    Zombie,
}

// ============================================================================
// Goal
// ============================================================================

impl Goal {
    /// Decode a fetch response body and check catalog invariants.
    pub fn from_json(body: &str) -> Result<Self> {
        let goal: Goal = serde_json::from_str(body)?;
        goal.validate()?;
        Ok(goal)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Every item has a positive target and a unique id.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.goal == 0 {
                return Err(GoalTrackError::InvalidGoal {
                    id: item.id.clone(),
                    message: "goal must be greater than zero".to_string(),
                });
            }
            if !seen.insert(item.id.as_str()) {
                return Err(GoalTrackError::InvalidGoal {
                    id: item.id.clone(),
                    message: "duplicate item id".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Sum of points granted today across the catalog.
    pub fn points_today(&self, progress: &DailyProgress) -> u32 {
        self.items
            .iter()
            .map(|item| item.earned_points(progress.for_type(item.kind)))
            .sum()
    }
}

// ============================================================================
// Item
// ============================================================================

impl Item {
    /// Reward is granted once progress reaches the target.
    pub fn is_achieved(&self, progress_today: f64) -> bool {
        progress_today >= f64::from(self.goal)
    }

    pub fn earned_points(&self, progress_today: f64) -> u32 {
        match self.reward {
            Some(reward) if self.is_achieved(progress_today) => reward.points,
            _ => 0,
        }
    }

    /// Fraction of the target reached, capped at 1.
    pub fn completion_ratio(&self, progress_today: f64) -> f64 {
        if progress_today <= 0.0 {
            return 0.0;
        }
        (progress_today / f64::from(self.goal)).min(1.0)
    }

    /// Target as shown on a goal card.
    pub fn goal_label(&self) -> String {
        match self.kind {
            GoalType::Step => format!("{} steps", self.goal),
            GoalType::Walking | GoalType::Running => format!("{} km", self.goal / 1000),
        }
    }
}

impl GoalType {
    pub fn is_distance(self) -> bool {
        !matches!(self, GoalType::Step)
    }

    /// Health-store activity for distance goals.
    pub fn activity(self) -> Option<ActivityKind> {
        match self {
            GoalType::Step => None,
            GoalType::Walking => Some(ActivityKind::Walking),
            GoalType::Running => Some(ActivityKind::Running),
        }
    }

    /// Activity a workout towards this goal is saved as. Step goals count as walks.
    pub fn workout_activity(self) -> ActivityKind {
        self.activity().unwrap_or(ActivityKind::Walking)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            GoalType::Step => "step",
            GoalType::Walking => "walking_distance",
            GoalType::Running => "running_distance",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Trophy {
    /// Asset name used by the presentation layer.
    pub fn image_name(self) -> &'static str {
        match self {
            Trophy::Gold => "gold_medal",
            Trophy::Silver => "silver_medal",
            Trophy::Bronze => "bronze_medal",
            Trophy::Zombie => "zombie_hand",
        }
    }
}

/// Workout activity recorded in the health store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Walking,
    Running,
}

// ============================================================================
// Daily progress
// ============================================================================

/// Today's health totals. Each metric is written only by its own query.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyProgress {
    pub steps: Option<f64>,
    pub walking_distance: Option<f64>,
    pub running_distance: Option<f64>,
}

impl DailyProgress {
    /// Progress in the unit of the given goal type, 0 when unknown.
    pub fn for_type(&self, kind: GoalType) -> f64 {
        let value = match kind {
            GoalType::Step => self.steps,
            GoalType::Walking => self.walking_distance,
            GoalType::Running => self.running_distance,
        };
        value.unwrap_or(0.0)
    }

    pub fn set_distance(&mut self, activity: ActivityKind, meters: f64) {
        match activity {
            ActivityKind::Walking => self.walking_distance = Some(meters),
            ActivityKind::Running => self.running_distance = Some(meters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "items": [
            {"id": "1", "title": "Easy walk", "description": "Walk 10k steps",
             "type": "step", "goal": 10000,
             "reward": {"trophy": "bronze_medal", "points": 5}},
            {"id": "2", "title": "Half marathon", "description": "Run 21 km",
             "type": "running_distance", "goal": 21000,
             "reward": {"trophy": "gold_medal", "points": 50}},
            {"id": "3", "title": "Stroll", "description": "Walk 2 km",
             "type": "walking_distance", "goal": 2000}
        ],
        "nextPageToken": "abc"
    }"#;

    fn step_item(goal: u32, points: u32) -> Item {
        Item {
            id: "s".into(),
            title: "Steps".into(),
            description: String::new(),
            kind: GoalType::Step,
            goal,
            reward: Some(Reward {
                trophy: Trophy::Silver,
                points,
            }),
        }
    }

    #[test]
    fn test_decode_catalog() {
        let goal = Goal::from_json(CATALOG).unwrap();
        assert_eq!(goal.items.len(), 3);
        assert_eq!(goal.next_page_token.as_deref(), Some("abc"));
        assert_eq!(goal.items[1].kind, GoalType::Running);
        assert_eq!(goal.items[1].reward.unwrap().trophy, Trophy::Gold);
        assert!(goal.items[2].reward.is_none());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(step_item(10, 1)).unwrap();
        assert_eq!(json["type"], "step");
        assert_eq!(json["reward"]["trophy"], "silver_medal");
        assert_eq!(
            serde_json::to_value(Trophy::Zombie).unwrap(),
            "zombie_hand"
        );
    }

    #[test]
    fn test_missing_page_token() {
        let goal = Goal::from_json(r#"{"items": []}"#).unwrap();
        assert!(goal.next_page_token.is_none());
        assert!(goal.is_empty());
    }

    #[test]
    fn test_rejects_zero_goal() {
        let body = r#"{"items": [{"id": "x", "title": "", "description": "",
                       "type": "step", "goal": 0}]}"#;
        assert!(matches!(
            Goal::from_json(body),
            Err(GoalTrackError::InvalidGoal { id, .. }) if id == "x"
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut goal = Goal::from_json(CATALOG).unwrap();
        goal.items[2].id = "1".into();
        assert!(matches!(
            goal.validate(),
            Err(GoalTrackError::InvalidGoal { .. })
        ));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(matches!(
            Goal::from_json("{\"items\": 3}"),
            Err(GoalTrackError::Decode { .. })
        ));
    }

    #[test]
    fn test_reward_threshold() {
        let item = step_item(10_000, 10);
        assert!(item.is_achieved(12_000.0));
        assert!(item.is_achieved(10_000.0));
        assert!(!item.is_achieved(9_000.0));
        assert_eq!(item.earned_points(12_000.0), 10);
        assert_eq!(item.earned_points(9_000.0), 0);
    }

    #[test]
    fn test_points_today_uses_matching_metric() {
        let goal = Goal::from_json(CATALOG).unwrap();
        let progress = DailyProgress {
            steps: Some(11_000.0),
            walking_distance: Some(5_000.0),
            running_distance: None,
        };
        // Walking item has no reward; running has no progress.
        assert_eq!(goal.points_today(&progress), 5);
    }

    #[test]
    fn test_goal_labels() {
        let goal = Goal::from_json(CATALOG).unwrap();
        assert_eq!(goal.items[0].goal_label(), "10000 steps");
        assert_eq!(goal.items[1].goal_label(), "21 km");
        assert_eq!(goal.items[2].goal_label(), "2 km");
    }

    #[test]
    fn test_completion_ratio_capped() {
        let item = step_item(1000, 1);
        assert_eq!(item.completion_ratio(500.0), 0.5);
        assert_eq!(item.completion_ratio(5000.0), 1.0);
        assert_eq!(item.completion_ratio(-1.0), 0.0);
    }

    #[test]
    fn test_progress_fields_are_independent() {
        let mut progress = DailyProgress::default();
        progress.set_distance(ActivityKind::Running, 300.0);
        progress.set_distance(ActivityKind::Walking, 100.0);
        progress.set_distance(ActivityKind::Running, 400.0);
        assert_eq!(progress.for_type(GoalType::Running), 400.0);
        assert_eq!(progress.for_type(GoalType::Walking), 100.0);
        assert_eq!(progress.for_type(GoalType::Step), 0.0);
    }
}
