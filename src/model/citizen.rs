use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::profession::{Profession, SocialClass};
use super::timestamp::SimDate;
use crate::id::{CitizenId, DiseaseId, FamilyId, PlayerId, RegionId};

pub const STAT_MAX: f64 = 100.0;
/// Lower bound of reputation and relationship strength.
pub const SIGNED_MIN: f64 = -100.0;

/// Clamp to the 0–100 range shared by needs, traits, skills and health.
pub fn clamp_stat(value: f64) -> f64 {
    value.clamp(0.0, STAT_MAX)
}

/// Clamp to the -100–100 range of reputation and relationship strength.
pub fn clamp_signed(value: f64) -> f64 {
    value.clamp(SIGNED_MIN, STAT_MAX)
}

// ---------------------------------------------------------------------------
// Score vectors
// ---------------------------------------------------------------------------

pub const SCORE_DIMENSIONS: usize = 8;

/// A dimension of a fixed-size score vector.
pub trait ScoreKey: Copy + 'static {
    const KEYS: [Self; SCORE_DIMENSIONS];
    fn index(self) -> usize;
}

/// Eight 0–100 scores indexed by `K`. Every write is clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Scores<K> {
    values: [f64; SCORE_DIMENSIONS],
    #[serde(skip)]
    _key: PhantomData<K>,
}

impl<K: ScoreKey> Scores<K> {
    pub fn new(values: [f64; SCORE_DIMENSIONS]) -> Self {
        Self {
            values: values.map(clamp_stat),
            _key: PhantomData,
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new([value; SCORE_DIMENSIONS])
    }

    pub fn get(&self, key: K) -> f64 {
        self.values[key.index()]
    }

    pub fn set(&mut self, key: K, value: f64) {
        self.values[key.index()] = clamp_stat(value);
    }

    pub fn adjust(&mut self, key: K, delta: f64) {
        self.set(key, self.get(key) + delta);
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / SCORE_DIMENSIONS as f64
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        K::KEYS.into_iter().map(|k| (k, self.get(k)))
    }

    /// Sum of absolute per-dimension differences.
    pub fn distance(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Need {
    Food,
    Shelter,
    Health,
    Safety,
    Belonging,
    Esteem,
    Faith,
    Leisure,
}

string_enum!(Need {
    Food => "food",
    Shelter => "shelter",
    Health => "health",
    Safety => "safety",
    Belonging => "belonging",
    Esteem => "esteem",
    Faith => "faith",
    Leisure => "leisure",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Trait {
    Ambition,
    Intelligence,
    Courage,
    Charisma,
    Kindness,
    Honesty,
    Piety,
    Curiosity,
}

string_enum!(Trait {
    Ambition => "ambition",
    Intelligence => "intelligence",
    Courage => "courage",
    Charisma => "charisma",
    Kindness => "kindness",
    Honesty => "honesty",
    Piety => "piety",
    Curiosity => "curiosity",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Skill {
    Farming,
    Trading,
    Combat,
    Crafting,
    Leadership,
    Scholarship,
    Diplomacy,
    Medicine,
}

string_enum!(Skill {
    Farming => "farming",
    Trading => "trading",
    Combat => "combat",
    Crafting => "crafting",
    Leadership => "leadership",
    Scholarship => "scholarship",
    Diplomacy => "diplomacy",
    Medicine => "medicine",
});

macro_rules! score_key {
    ($name:ident [$($variant:ident),+ $(,)?]) => {
        impl ScoreKey for $name {
            const KEYS: [Self; SCORE_DIMENSIONS] = [$($name::$variant),+];

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

score_key!(Need [Food, Shelter, Health, Safety, Belonging, Esteem, Faith, Leisure]);
score_key!(Trait [Ambition, Intelligence, Courage, Charisma, Kindness, Honesty, Piety, Curiosity]);
score_key!(Skill [Farming, Trading, Combat, Crafting, Leadership, Scholarship, Diplomacy, Medicine]);

pub type Needs = Scores<Need>;
pub type Personality = Scores<Trait>;
pub type Skills = Scores<Skill>;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pregnancy {
    pub conceived: SimDate,
    /// Months carried so far; birth happens at 9.
    pub month: u32,
}

pub const PREGNANCY_MONTHS: u32 = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// 0–100.
    pub overall: f64,
    /// Diseases the citizen currently carries.
    pub diseases: Vec<DiseaseId>,
    /// General resistance, 0–100.
    pub immunity: f64,
    /// 0–100.
    pub fertility: f64,
    pub pregnancy: Option<Pregnancy>,
    /// Diseases this citizen can no longer catch.
    pub immune_to: BTreeSet<DiseaseId>,
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FamilyKind {
    Spouse,
    Parent,
    Child,
    Sibling,
    Grandparent,
    Grandchild,
}

string_enum!(FamilyKind {
    Spouse => "spouse",
    Parent => "parent",
    Child => "child",
    Sibling => "sibling",
    Grandparent => "grandparent",
    Grandchild => "grandchild",
});

/// A directed family edge. The inverse edge on the other citizen is stored
/// separately and is not maintained automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRelation {
    pub kind: FamilyKind,
    pub citizen_id: CitizenId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SocialKind {
    Friend,
    Enemy,
    Rival,
    Mentor,
    Student,
    Colleague,
}

string_enum!(SocialKind {
    Friend => "friend",
    Enemy => "enemy",
    Rival => "rival",
    Mentor => "mentor",
    Student => "student",
    Colleague => "colleague",
});

impl SocialKind {
    /// Category implied by a strength value alone.
    pub fn from_strength(strength: f64) -> Self {
        if strength > 30.0 {
            SocialKind::Friend
        } else if strength < -30.0 {
            SocialKind::Enemy
        } else {
            SocialKind::Colleague
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialRelation {
    pub kind: SocialKind,
    pub citizen_id: CitizenId,
    /// -100–100.
    pub strength: f64,
    pub since_year: u32,
}

// ---------------------------------------------------------------------------
// Life events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LifeEventKind {
    Born,
    Died,
    Migrated,
    ProfessionChanged,
    Promoted,
    Conceived,
    GaveBirth,
    FellIll,
    Recovered,
    Starving,
    Befriended,
    MadeEnemy,
    JoinedMovement,
    LeftMovement,
    Embodied,
    ReturnedToAi,
}

string_enum!(LifeEventKind {
    Born => "born",
    Died => "died",
    Migrated => "migrated",
    ProfessionChanged => "profession_changed",
    Promoted => "promoted",
    Conceived => "conceived",
    GaveBirth => "gave_birth",
    FellIll => "fell_ill",
    Recovered => "recovered",
    Starving => "starving",
    Befriended => "befriended",
    MadeEnemy => "made_enemy",
    JoinedMovement => "joined_movement",
    LeftMovement => "left_movement",
    Embodied => "embodied",
    ReturnedToAi => "returned_to_ai",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeEvent {
    pub date: SimDate,
    pub kind: LifeEventKind,
    pub description: String,
}

impl LifeEvent {
    pub fn new(date: SimDate, kind: LifeEventKind, description: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Citizen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gender {
    Male,
    Female,
}

string_enum!(Gender {
    Male => "male",
    Female => "female",
});

/// An autonomous agent.
///
/// Fields are crate-private: outside the crate a citizen is read through its
/// accessors and changed through the registry's mutators, which keep every
/// bounded field in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
    pub(crate) id: CitizenId,
    pub(crate) name: String,
    pub(crate) gender: Gender,

    pub(crate) age: u32,
    pub(crate) birth: SimDate,
    pub(crate) death: Option<SimDate>,
    pub(crate) alive: bool,
    /// Year the citizen last had a birthday, so aging fires once per year.
    pub(crate) last_aged_year: u32,

    pub(crate) profession: Profession,
    pub(crate) profession_level: u8,
    pub(crate) income: f64,
    pub(crate) wealth: f64,

    pub(crate) region_id: RegionId,
    pub(crate) home_id: Option<u64>,
    pub(crate) origin_region_id: RegionId,
    pub(crate) migration_desire: f64,

    pub(crate) family_id: FamilyId,
    pub(crate) family: Vec<FamilyRelation>,
    pub(crate) relations: Vec<SocialRelation>,
    pub(crate) reputation: f64,
    pub(crate) social_class: SocialClass,

    pub(crate) health: HealthStatus,
    pub(crate) needs: Needs,
    pub(crate) happiness: f64,
    pub(crate) personality: Personality,
    pub(crate) skills: Skills,

    pub(crate) is_player_character: bool,
    pub(crate) controlling_player: Option<PlayerId>,

    pub(crate) life_events: Vec<LifeEvent>,
}

impl Citizen {
    pub fn id(&self) -> CitizenId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn birth(&self) -> SimDate {
        self.birth
    }

    pub fn death(&self) -> Option<SimDate> {
        self.death
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn profession(&self) -> Profession {
        self.profession
    }

    pub fn profession_level(&self) -> u8 {
        self.profession_level
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn wealth(&self) -> f64 {
        self.wealth
    }

    pub fn region_id(&self) -> RegionId {
        self.region_id
    }

    pub fn home_id(&self) -> Option<u64> {
        self.home_id
    }

    pub fn origin_region_id(&self) -> RegionId {
        self.origin_region_id
    }

    pub fn migration_desire(&self) -> f64 {
        self.migration_desire
    }

    pub fn family_id(&self) -> FamilyId {
        self.family_id
    }

    pub fn family(&self) -> &[FamilyRelation] {
        &self.family
    }

    pub fn relations(&self) -> &[SocialRelation] {
        &self.relations
    }

    pub fn reputation(&self) -> f64 {
        self.reputation
    }

    pub fn social_class(&self) -> SocialClass {
        self.social_class
    }

    pub fn health(&self) -> &HealthStatus {
        &self.health
    }

    pub fn needs(&self) -> &Needs {
        &self.needs
    }

    pub fn happiness(&self) -> f64 {
        self.happiness
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    pub fn is_player_character(&self) -> bool {
        self.is_player_character
    }

    pub fn controlling_player(&self) -> Option<PlayerId> {
        self.controlling_player
    }

    pub fn life_events(&self) -> &[LifeEvent] {
        &self.life_events
    }

    /// Mean of the food, health and shelter needs.
    pub fn critical_needs(&self) -> f64 {
        (self.needs.get(Need::Food) + self.needs.get(Need::Health) + self.needs.get(Need::Shelter))
            / 3.0
    }

    pub fn relation_to(&self, other: CitizenId) -> Option<&SocialRelation> {
        self.relations.iter().find(|r| r.citizen_id == other)
    }

    pub fn is_married(&self) -> bool {
        self.family.iter().any(|f| f.kind == FamilyKind::Spouse)
    }

    pub fn children(&self) -> impl Iterator<Item = CitizenId> + '_ {
        self.family
            .iter()
            .filter(|f| f.kind == FamilyKind::Child)
            .map(|f| f.citizen_id)
    }

    pub fn friends(&self) -> impl Iterator<Item = CitizenId> + '_ {
        self.relations
            .iter()
            .filter(|r| r.kind == SocialKind::Friend)
            .map(|r| r.citizen_id)
    }

    pub fn is_immune_to(&self, disease: DiseaseId) -> bool {
        self.health.immune_to.contains(&disease)
    }

    pub fn has_disease(&self, disease: DiseaseId) -> bool {
        self.health.diseases.contains(&disease)
    }

    pub(crate) fn recompute_happiness(&mut self) {
        self.happiness =
            clamp_stat((self.needs.mean() + self.health.overall + self.reputation) / 3.0);
    }

    /// Append a life event, dropping the oldest entries beyond `cap` (0 = unbounded).
    pub(crate) fn record(&mut self, event: LifeEvent, cap: usize) {
        self.life_events.push(event);
        if cap > 0 && self.life_events.len() > cap {
            let excess = self.life_events.len() - cap;
            self.life_events.drain(..excess);
        }
    }

    pub(crate) fn recompute_income(&mut self) {
        self.income = self.profession.income_at(self.profession_level);
    }
}
