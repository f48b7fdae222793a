//! Layered per-citizen AI for everyone not driven by a player.

pub mod action;
mod controller;
mod layers;
mod manager;

use serde::{Deserialize, Serialize};

use crate::model::{Citizen, Trait};

pub use action::{Action, Decision, Layer, LifeGoalAction, NeedAction, RelationshipAction, RoleAction};
pub use controller::{BehaviorController, ControllerSnapshot};
pub use manager::BehaviorManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AiType {
    Reactive,
    Proactive,
    Historical,
    Dynamic,
}

string_enum!(AiType {
    Reactive => "reactive",
    Proactive => "proactive",
    Historical => "historical",
    Dynamic => "dynamic",
});

impl AiType {
    /// First match wins: ambition, then intelligence, then rank.
    pub fn classify(citizen: &Citizen) -> Self {
        let personality = citizen.personality();
        if personality.get(Trait::Ambition) > 75.0 {
            AiType::Proactive
        } else if personality.get(Trait::Intelligence) > 80.0 {
            AiType::Dynamic
        } else if citizen.social_class().is_aristocratic() {
            AiType::Historical
        } else {
            AiType::Reactive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GoalKind {
    FindFood,
    SecureShelter,
    AdvanceCareer,
    AccumulateWealth,
}

string_enum!(GoalKind {
    FindFood => "find_food",
    SecureShelter => "secure_shelter",
    AdvanceCareer => "advance_career",
    AccumulateWealth => "accumulate_wealth",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    /// 0–100, higher first.
    pub priority: u8,
}

impl Goal {
    /// Everyone eats and sleeps somewhere; proactive citizens also want more.
    pub fn seed_for(ai_type: AiType) -> Vec<Goal> {
        let mut goals = vec![
            Goal {
                kind: GoalKind::FindFood,
                priority: 90,
            },
            Goal {
                kind: GoalKind::SecureShelter,
                priority: 80,
            },
        ];
        if ai_type == AiType::Proactive {
            goals.push(Goal {
                kind: GoalKind::AdvanceCareer,
                priority: 60,
            });
            goals.push(Goal {
                kind: GoalKind::AccumulateWealth,
                priority: 50,
            });
        }
        goals
    }
}
