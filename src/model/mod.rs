pub mod citizen;
pub mod disease;
pub mod famine;
pub mod message;
pub mod movement;
pub mod profession;
pub mod timestamp;

pub use citizen::{
    Citizen, FamilyKind, FamilyRelation, Gender, HealthStatus, LifeEvent, LifeEventKind, Need,
    Needs, Personality, Pregnancy, ScoreKey, Scores, Skill, Skills, SocialKind, SocialRelation,
    Trait, clamp_signed, clamp_stat,
};
pub use disease::{Disease, DiseaseParams};
pub use famine::Famine;
pub use message::{Message, MessageKind};
pub use movement::{Movement, MovementKind};
pub use profession::{Profession, SocialClass};
pub use timestamp::SimDate;
