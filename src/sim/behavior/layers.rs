//! The four decision layers. Each reads a citizen and returns the actions it
//! proposes, with a short reason for each.

use super::AiType;
use super::action::{Action, LifeGoalAction, NeedAction, RelationshipAction, RoleAction};
use crate::model::{Citizen, Need, Profession, SimDate, Skill, Trait};

pub type Proposal = (Action, String);

// --- Constants ---

const HUNGRY: f64 = 50.0;
const UNSHELTERED: f64 = 40.0;
const UNWELL: f64 = 40.0;

const PLANTING_MONTHS: std::ops::RangeInclusive<u32> = 3..=5;
const HARVEST_MONTHS: std::ops::RangeInclusive<u32> = 8..=10;
const MERCHANT_WEALTH_TARGET: f64 = 1000.0;
const SOLDIER_COMBAT_TARGET: f64 = 70.0;
const NOBLE_REPUTATION_TARGET: f64 = 70.0;
const NOBLE_CONNECTIONS_TARGET: usize = 5;
const MAX_PROFESSION_LEVEL: u8 = 100;

const MARRIAGEABLE_AGES: std::ops::RangeInclusive<u32> = 18..=35;
const MARRIAGE_HAPPINESS: f64 = 50.0;
const FRIENDS_TARGET: usize = 3;
const FAMILY_SUPPORT_WEALTH: f64 = 500.0;

const PROMOTION_AMBITION: f64 = 70.0;
const PROMOTION_LEVEL_CAP: u8 = 80;
const LEGACY_AGE: u32 = 45;
const LEGACY_WEALTH: f64 = 2000.0;

pub fn basic_needs(citizen: &Citizen) -> Vec<Proposal> {
    let needs = citizen.needs();
    let mut out = Vec::new();
    let food = needs.get(Need::Food);
    if food < HUNGRY {
        out.push((
            Action::BasicNeeds(NeedAction::FindFood),
            format!("Food need is low ({food:.0})"),
        ));
    }
    let shelter = needs.get(Need::Shelter);
    if shelter < UNSHELTERED {
        out.push((
            Action::BasicNeeds(NeedAction::SeekShelter),
            format!("Shelter need is low ({shelter:.0})"),
        ));
    }
    let health = needs.get(Need::Health);
    if health < UNWELL {
        out.push((
            Action::BasicNeeds(NeedAction::SeekHealing),
            format!("Health need is low ({health:.0})"),
        ));
    }
    out
}

pub fn role_goals(citizen: &Citizen, date: SimDate) -> Vec<Proposal> {
    let mut out = Vec::new();
    match citizen.profession() {
        Profession::Farmer => {
            if PLANTING_MONTHS.contains(&date.month()) {
                out.push((
                    Action::RoleGoals(RoleAction::PlantCrops),
                    "Planting season".to_string(),
                ));
            } else if HARVEST_MONTHS.contains(&date.month()) {
                out.push((
                    Action::RoleGoals(RoleAction::HarvestCrops),
                    "Harvest season".to_string(),
                ));
            }
        }
        Profession::Merchant => {
            if citizen.wealth() < MERCHANT_WEALTH_TARGET {
                out.push((
                    Action::RoleGoals(RoleAction::SeekTrade),
                    format!("Wealth {:.0} is below target", citizen.wealth()),
                ));
            }
        }
        Profession::Soldier => {
            let combat = citizen.skills().get(Skill::Combat);
            if combat < SOLDIER_COMBAT_TARGET {
                out.push((
                    Action::RoleGoals(RoleAction::TrainCombat),
                    format!("Combat skill {combat:.0} needs work"),
                ));
            }
        }
        Profession::Noble => {
            if citizen.reputation() < NOBLE_REPUTATION_TARGET {
                out.push((
                    Action::RoleGoals(RoleAction::HostFeast),
                    "Standing at court could be higher".to_string(),
                ));
            }
            if citizen.relations().len() < NOBLE_CONNECTIONS_TARGET {
                out.push((
                    Action::RoleGoals(RoleAction::BuildConnections),
                    format!("Only {} connections", citizen.relations().len()),
                ));
            }
        }
        _ => {
            if citizen.profession_level() < MAX_PROFESSION_LEVEL {
                out.push((
                    Action::RoleGoals(RoleAction::ImproveSkill),
                    format!("Improving as a {}", citizen.profession()),
                ));
            }
        }
    }
    out
}

pub fn relationships(citizen: &Citizen) -> Vec<Proposal> {
    let mut out = Vec::new();
    if !citizen.is_married()
        && MARRIAGEABLE_AGES.contains(&citizen.age())
        && citizen.happiness() > MARRIAGE_HAPPINESS
    {
        out.push((
            Action::Relationships(RelationshipAction::SeekMarriage),
            "Unmarried and ready to settle down".to_string(),
        ));
    }
    if citizen.relations().len() < FRIENDS_TARGET {
        out.push((
            Action::Relationships(RelationshipAction::MakeFriends),
            "Few social ties".to_string(),
        ));
    }
    if citizen.children().next().is_some() && citizen.wealth() > FAMILY_SUPPORT_WEALTH {
        out.push((
            Action::Relationships(RelationshipAction::SupportFamily),
            "Has children and means to help them".to_string(),
        ));
    }
    out
}

pub fn life_goals(citizen: &Citizen, ai_type: AiType) -> Vec<Proposal> {
    if !matches!(ai_type, AiType::Proactive | AiType::Dynamic) {
        return Vec::new();
    }
    let mut out = Vec::new();
    if citizen.personality().get(Trait::Ambition) > PROMOTION_AMBITION
        && citizen.profession_level() < PROMOTION_LEVEL_CAP
    {
        out.push((
            Action::LifeGoals(LifeGoalAction::SeekPromotion),
            "Ambitious and not yet at the top".to_string(),
        ));
    }
    if citizen.age() > LEGACY_AGE && citizen.wealth() > LEGACY_WEALTH {
        out.push((
            Action::LifeGoals(LifeGoalAction::BuildLegacy),
            "Old enough and rich enough to be remembered".to_string(),
        ));
    }
    out
}
