use serde::{Deserialize, Serialize};

use super::citizen::Skill;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Profession {
    Farmer,
    Merchant,
    Soldier,
    Noble,
    Craftsman,
    Priest,
    Scholar,
    Laborer,
}

string_enum!(Profession {
    Farmer => "farmer",
    Merchant => "merchant",
    Soldier => "soldier",
    Noble => "noble",
    Craftsman => "craftsman",
    Priest => "priest",
    Scholar => "scholar",
    Laborer => "laborer",
});

impl Profession {
    /// Monthly income at profession level 0.
    pub fn base_income(self) -> f64 {
        match self {
            Profession::Farmer => 50.0,
            Profession::Merchant => 150.0,
            Profession::Soldier => 80.0,
            Profession::Noble => 500.0,
            Profession::Craftsman => 100.0,
            Profession::Priest => 70.0,
            Profession::Scholar => 120.0,
            Profession::Laborer => 40.0,
        }
    }

    /// Income scales linearly with level, doubling at level 100.
    pub fn income_at(self, level: u8) -> f64 {
        self.base_income() * (1.0 + f64::from(level) / 100.0)
    }

    /// Skills this profession trains, strongest first.
    pub fn favored_skills(self) -> &'static [Skill] {
        match self {
            Profession::Farmer => &[Skill::Farming, Skill::Crafting],
            Profession::Merchant => &[Skill::Trading, Skill::Diplomacy],
            Profession::Soldier => &[Skill::Combat, Skill::Leadership],
            Profession::Noble => &[Skill::Leadership, Skill::Diplomacy],
            Profession::Craftsman => &[Skill::Crafting, Skill::Trading],
            Profession::Priest => &[Skill::Medicine, Skill::Scholarship],
            Profession::Scholar => &[Skill::Scholarship, Skill::Medicine],
            Profession::Laborer => &[Skill::Crafting, Skill::Combat],
        }
    }

    /// The class a citizen of this profession is born into absent other information.
    pub fn default_class(self) -> SocialClass {
        match self {
            Profession::Noble => SocialClass::Noble,
            Profession::Merchant | Profession::Scholar | Profession::Priest => SocialClass::Middle,
            _ => SocialClass::Peasant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SocialClass {
    Peasant,
    Middle,
    Noble,
    Royal,
}

string_enum!(SocialClass {
    Peasant => "peasant",
    Middle => "middle",
    Noble => "noble",
    Royal => "royal",
});

impl SocialClass {
    /// Weight used when ranking how interesting a citizen is to play.
    pub fn prominence(self) -> f64 {
        match self {
            SocialClass::Royal => 100.0,
            SocialClass::Noble => 50.0,
            SocialClass::Middle => 25.0,
            SocialClass::Peasant => 0.0,
        }
    }

    pub fn is_aristocratic(self) -> bool {
        matches!(self, SocialClass::Noble | SocialClass::Royal)
    }
}
