use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::timestamp::SimDate;
use crate::id::{CitizenId, MessageId, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MessageKind {
    News,
    Rumor,
    Propaganda,
    Gossip,
}

string_enum!(MessageKind {
    News => "news",
    Rumor => "rumor",
    Propaganda => "propaganda",
    Gossip => "gossip",
});

/// A piece of information spreading across the social graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub origin: CitizenId,
    pub kind: MessageKind,
    pub content: String,
    /// 0–100.
    pub spread_rate: f64,
    /// 0–100.
    pub believability: f64,
    pub region_id: RegionId,
    pub created: SimDate,
    /// Citizens the message has reached. Only ever grows.
    pub reached: BTreeSet<CitizenId>,
    /// Subset of `reached` that believed it.
    pub believers: BTreeSet<CitizenId>,
}

impl Message {
    pub fn is_spreading(&self, date: SimDate, lifetime_months: u32) -> bool {
        date.months_since(self.created) < lifetime_months
    }
}
