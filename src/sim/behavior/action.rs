use serde::{Deserialize, Serialize};

use crate::id::CitizenId;

/// Decision layers, in the order a controller runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Layer {
    BasicNeeds,
    RoleGoals,
    Relationships,
    LifeGoals,
}

string_enum!(Layer {
    BasicNeeds => "basic_needs",
    RoleGoals => "role_goals",
    Relationships => "relationships",
    LifeGoals => "life_goals",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NeedAction {
    FindFood,
    SeekShelter,
    SeekHealing,
}

string_enum!(NeedAction {
    FindFood => "find_food",
    SeekShelter => "seek_shelter",
    SeekHealing => "seek_healing",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoleAction {
    PlantCrops,
    HarvestCrops,
    SeekTrade,
    TrainCombat,
    HostFeast,
    BuildConnections,
    ImproveSkill,
}

string_enum!(RoleAction {
    PlantCrops => "plant_crops",
    HarvestCrops => "harvest_crops",
    SeekTrade => "seek_trade",
    TrainCombat => "train_combat",
    HostFeast => "host_feast",
    BuildConnections => "build_connections",
    ImproveSkill => "improve_skill",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RelationshipAction {
    SeekMarriage,
    MakeFriends,
    SupportFamily,
}

string_enum!(RelationshipAction {
    SeekMarriage => "seek_marriage",
    MakeFriends => "make_friends",
    SupportFamily => "support_family",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LifeGoalAction {
    SeekPromotion,
    BuildLegacy,
}

string_enum!(LifeGoalAction {
    SeekPromotion => "seek_promotion",
    BuildLegacy => "build_legacy",
});

/// What a controller decided to do, tagged by the layer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "action", rename_all = "snake_case")]
pub enum Action {
    BasicNeeds(NeedAction),
    RoleGoals(RoleAction),
    Relationships(RelationshipAction),
    LifeGoals(LifeGoalAction),
}

impl Action {
    pub fn layer(self) -> Layer {
        match self {
            Action::BasicNeeds(_) => Layer::BasicNeeds,
            Action::RoleGoals(_) => Layer::RoleGoals,
            Action::Relationships(_) => Layer::Relationships,
            Action::LifeGoals(_) => Layer::LifeGoals,
        }
    }

    /// Stable snake_case tag, e.g. `harvest_crops`.
    pub fn tag(self) -> &'static str {
        match self {
            Action::BasicNeeds(a) => a.as_str(),
            Action::RoleGoals(a) => a.as_str(),
            Action::Relationships(a) => a.as_str(),
            Action::LifeGoals(a) => a.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub citizen_id: CitizenId,
    pub action: Action,
    /// `year * 12 + month` of the update that produced it.
    pub timestamp: u32,
    pub reasoning: String,
    /// Always true; failure is not modeled at this level.
    pub success: bool,
}
