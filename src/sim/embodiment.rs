//! Player embodiment: handing citizens back and forth between a human
//! player and the behavior AI.
//!
//! A [`RoleSwitcher`] keeps one [`PlayerSession`] per player. Switching
//! releases the previously embodied citizen to a freshly classified AI
//! controller in the same call, so there is never a month where a citizen
//! belongs to neither side.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::behavior::BehaviorManager;
use super::registry::CitizenRegistry;
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, PlayerId, RegionId};
use crate::model::{Citizen, LifeEventKind, Profession, SimDate, SocialClass};

// --- Constants ---

const MAX_FRIEND_PICKS: usize = 5;
const MAX_STRANGER_PICKS: usize = 3;
/// Relations weaker than this are not worth recommending.
const CLOSE_RELATION_STRENGTH: f64 = 50.0;
const WEALTH_INTEREST_CAP: f64 = 50.0;

/// One entry of a session's append-only switch log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchEvent {
    pub from: Option<CitizenId>,
    pub to: CitizenId,
    pub date: SimDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSession {
    player: PlayerId,
    current: Option<CitizenId>,
    /// Previously embodied citizens, most recent last.
    history: Vec<CitizenId>,
    switches: Vec<SwitchEvent>,
    /// Free-form knowledge the player carries between bodies.
    meta_knowledge: BTreeMap<String, serde_json::Value>,
}

impl PlayerSession {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            current: None,
            history: Vec::new(),
            switches: Vec::new(),
            meta_knowledge: BTreeMap::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn current(&self) -> Option<CitizenId> {
        self.current
    }

    pub fn history(&self) -> &[CitizenId] {
        &self.history
    }

    pub fn switches(&self) -> &[SwitchEvent] {
        &self.switches
    }

    pub fn meta_knowledge(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.meta_knowledge
    }
}

/// Predicate filter for [`RoleSwitcher::get_playable_characters`]. Unset
/// fields match everyone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayableFilter {
    pub region: Option<RegionId>,
    pub profession: Option<Profession>,
    pub social_class: Option<SocialClass>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

impl PlayableFilter {
    fn matches(&self, citizen: &Citizen) -> bool {
        self.region.is_none_or(|r| citizen.region_id() == r)
            && self.profession.is_none_or(|p| citizen.profession() == p)
            && self.social_class.is_none_or(|c| citizen.social_class() == c)
            && self.min_age.is_none_or(|a| citizen.age() >= a)
            && self.max_age.is_none_or(|a| citizen.age() <= a)
    }
}

/// How interesting a citizen is to play, used to rank strangers.
pub fn interest_score(citizen: &Citizen) -> f64 {
    citizen.social_class().prominence()
        + (citizen.wealth() / 100.0).min(WEALTH_INTEREST_CAP)
        + citizen.reputation().abs() / 2.0
        + citizen.relations().len() as f64 * 2.0
        + citizen.skills().max() / 2.0
}

/// Give `id` back to the AI. Dead citizens only lose their player flags.
fn return_to_ai(
    registry: &mut CitizenRegistry,
    behavior: &mut BehaviorManager,
    id: CitizenId,
    date: SimDate,
) -> SimResult<()> {
    registry.remove_player_control(id)?;
    if let Ok(citizen) = registry.living(id) {
        behavior.activate(citizen);
        registry.record_event(id, date, LifeEventKind::ReturnedToAi, "Returned to their own devices")?;
    }
    Ok(())
}

fn available_to(registry: &CitizenRegistry, id: CitizenId, player: PlayerId) -> SimResult<()> {
    let citizen = registry.living(id)?;
    match citizen.controlling_player() {
        Some(other) if other != player => Err(SimError::AlreadyControlled {
            citizen: id,
            player: other,
        }),
        _ => Ok(()),
    }
}

/// Move `session` into `target`, releasing its current citizen first.
/// `target` must already have passed `available_to`.
fn embody(
    session: &mut PlayerSession,
    registry: &mut CitizenRegistry,
    behavior: &mut BehaviorManager,
    target: CitizenId,
    date: SimDate,
    remember_previous: bool,
) -> SimResult<()> {
    let from = session.current.take();
    if let Some(previous) = from {
        return_to_ai(registry, behavior, previous, date)?;
        if remember_previous {
            session.history.push(previous);
        }
    }
    registry.assign_player_control(target, session.player)?;
    behavior.deactivate(target);
    registry.record_event(target, date, LifeEventKind::Embodied, "Taken over by a player")?;
    session.current = Some(target);
    session.switches.push(SwitchEvent {
        from,
        to: target,
        date,
    });
    debug!(player = %session.player, from = ?from, to = %target, "role switched");
    Ok(())
}

/// Sessions for every player, keyed by player id.
#[derive(Debug, Clone, Default)]
pub struct RoleSwitcher {
    sessions: BTreeMap<PlayerId, PlayerSession>,
}

impl RoleSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self, player: PlayerId) -> SimResult<&PlayerSession> {
        self.sessions
            .get(&player)
            .ok_or(SimError::SessionNotFound(player))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PlayerSession> {
        self.sessions.values()
    }

    pub fn current_citizen(&self, player: PlayerId) -> Option<CitizenId> {
        self.sessions.get(&player).and_then(|s| s.current)
    }

    /// Embody `target`, opening a session for `player` on first use.
    ///
    /// The target must be alive and not held by another player. The citizen
    /// the player leaves is pushed onto the session history and resumes under
    /// a freshly classified AI controller.
    pub fn switch_role(
        &mut self,
        registry: &mut CitizenRegistry,
        behavior: &mut BehaviorManager,
        player: PlayerId,
        target: CitizenId,
        date: SimDate,
    ) -> SimResult<()> {
        available_to(registry, target, player).inspect_err(|e| {
            warn!(%player, citizen_id = %target, error = %e, "switch rejected");
        })?;
        let session = self
            .sessions
            .entry(player)
            .or_insert_with(|| PlayerSession::new(player));
        if session.current == Some(target) {
            return Ok(());
        }
        embody(session, registry, behavior, target, date, true)
    }

    /// Return to the most recent previous citizen, discarding history entries
    /// that died or were taken by someone else in the meantime.
    pub fn switch_to_previous(
        &mut self,
        registry: &mut CitizenRegistry,
        behavior: &mut BehaviorManager,
        player: PlayerId,
        date: SimDate,
    ) -> SimResult<CitizenId> {
        let session = self
            .sessions
            .get_mut(&player)
            .ok_or(SimError::SessionNotFound(player))?;
        let target = loop {
            let Some(candidate) = session.history.pop() else {
                warn!(%player, "no previous citizen to return to");
                return Err(SimError::HistoryExhausted(player));
            };
            if session.current != Some(candidate)
                && available_to(registry, candidate, player).is_ok()
            {
                break candidate;
            }
            debug!(%player, citizen_id = %candidate, "discarding stale history entry");
        };
        embody(session, registry, behavior, target, date, false)?;
        Ok(target)
    }

    /// Hand the current citizen back to the AI and leave the player
    /// disembodied. The released citizen goes onto the history.
    pub fn release(
        &mut self,
        registry: &mut CitizenRegistry,
        behavior: &mut BehaviorManager,
        player: PlayerId,
        date: SimDate,
    ) -> SimResult<CitizenId> {
        let session = self
            .sessions
            .get_mut(&player)
            .ok_or(SimError::SessionNotFound(player))?;
        let current = session.current.ok_or(SimError::NoActiveCitizen(player))?;
        return_to_ai(registry, behavior, current, date)?;
        session.current = None;
        session.history.push(current);
        debug!(%player, citizen_id = %current, "released citizen to AI");
        Ok(current)
    }

    /// Candidates worth switching to from the player's current citizen:
    /// living family first, then up to five close relations by strength,
    /// then up to three of the most interesting strangers in the same region.
    pub fn get_recommended_characters(
        &self,
        registry: &CitizenRegistry,
        player: PlayerId,
    ) -> SimResult<Vec<CitizenId>> {
        let current = self
            .session(player)?
            .current
            .ok_or(SimError::NoActiveCitizen(player))?;
        let me = registry.citizen(current)?;

        let selectable = |id: CitizenId| {
            registry
                .get(id)
                .is_some_and(|c| c.is_alive() && !c.is_player_character())
        };
        let mut seen = BTreeSet::from([current]);
        let mut picks = Vec::new();

        for edge in me.family() {
            if selectable(edge.citizen_id) && seen.insert(edge.citizen_id) {
                picks.push(edge.citizen_id);
            }
        }

        let mut close: Vec<_> = me
            .relations()
            .iter()
            .filter(|r| r.strength > CLOSE_RELATION_STRENGTH && selectable(r.citizen_id))
            .collect();
        close.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        for relation in close.into_iter().take(MAX_FRIEND_PICKS) {
            if seen.insert(relation.citizen_id) {
                picks.push(relation.citizen_id);
            }
        }

        let mut strangers: Vec<(CitizenId, f64)> = registry
            .in_region(me.region_id())
            .into_iter()
            .filter(|c| {
                !c.is_player_character()
                    && !seen.contains(&c.id())
                    && me.relation_to(c.id()).is_none()
            })
            .map(|c| (c.id(), interest_score(c)))
            .collect();
        strangers.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        picks.extend(strangers.into_iter().take(MAX_STRANGER_PICKS).map(|(id, _)| id));

        Ok(picks)
    }

    /// Living, unembodied citizens matching every set field of `filter`.
    pub fn get_playable_characters(
        &self,
        registry: &CitizenRegistry,
        filter: &PlayableFilter,
    ) -> Vec<CitizenId> {
        registry
            .alive()
            .filter(|c| !c.is_player_character() && filter.matches(c))
            .map(Citizen::id)
            .collect()
    }

    /// Store a fact the player keeps across bodies. Opens the session if needed.
    pub fn set_meta_knowledge(
        &mut self,
        player: PlayerId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) {
        self.sessions
            .entry(player)
            .or_insert_with(|| PlayerSession::new(player))
            .meta_knowledge
            .insert(key.into(), value);
    }

    pub fn get_meta_knowledge(&self, player: PlayerId, key: &str) -> Option<&serde_json::Value> {
        self.sessions.get(&player)?.meta_knowledge.get(key)
    }

    pub fn snapshot(&self) -> Vec<PlayerSession> {
        self.sessions.values().cloned().collect()
    }

    pub fn restore(sessions: Vec<PlayerSession>) -> Self {
        Self {
            sessions: sessions.into_iter().map(|s| (s.player, s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FamilyKind, Gender, Skill};
    use crate::sim::social::create_friendship;
    use crate::testutil::{date, spawn};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    struct World {
        registry: CitizenRegistry,
        behavior: BehaviorManager,
        switcher: RoleSwitcher,
    }

    impl World {
        fn new() -> Self {
            Self {
                registry: CitizenRegistry::new(),
                behavior: BehaviorManager::new(100),
                switcher: RoleSwitcher::new(),
            }
        }

        fn add(&mut self, name: &str, region: u64) -> CitizenId {
            spawn(&mut self.registry, name, Gender::Female, 30, Profession::Merchant, RegionId(region))
        }

        fn switch(&mut self, player: PlayerId, target: CitizenId) -> SimResult<()> {
            self.switcher
                .switch_role(&mut self.registry, &mut self.behavior, player, target, date(1450, 6))
        }

        fn back(&mut self, player: PlayerId) -> SimResult<CitizenId> {
            self.switcher
                .switch_to_previous(&mut self.registry, &mut self.behavior, player, date(1450, 7))
        }
    }

    #[test]
    fn switching_hands_the_old_body_back_to_the_ai() {
        let mut w = World::new();
        let a = w.add("Adelheid Brandt", 1);
        let b = w.add("Beatrix Brandt", 1);
        w.behavior.update_all(&w.registry, date(1450, 5));

        w.switch(P1, a).unwrap();
        assert!(w.registry.citizen(a).unwrap().is_player_character());
        assert!(!w.behavior.controller(a).unwrap().is_active());

        w.switch(P1, b).unwrap();
        let a_ref = w.registry.citizen(a).unwrap();
        assert!(!a_ref.is_player_character());
        assert_eq!(a_ref.controlling_player(), None);
        assert!(w.behavior.controller(a).unwrap().is_active());
        assert!(w.registry.citizen(b).unwrap().is_player_character());
        assert!(!w.behavior.controller(b).unwrap().is_active());

        let session = w.switcher.session(P1).unwrap();
        assert_eq!(session.current(), Some(b));
        assert_eq!(session.history(), &[a]);
        assert_eq!(session.switches().len(), 2);
        assert_eq!(session.switches()[1].from, Some(a));
        assert_eq!(
            a_ref.life_events().last().unwrap().kind,
            LifeEventKind::ReturnedToAi
        );
    }

    #[test]
    fn embodied_citizens_make_no_ai_decisions() {
        let mut w = World::new();
        let a = w.add("Cecily Keller", 1);
        w.switch(P1, a).unwrap();
        let decisions = w.behavior.update_all(&w.registry, date(1450, 8));
        assert!(decisions.iter().all(|d| d.citizen_id != a));
    }

    #[test]
    fn rejected_switch_leaves_session_untouched() {
        let mut w = World::new();
        let a = w.add("Dorothea Lang", 1);
        let dead = w.add("Elsbeth Lang", 1);
        w.registry.mark_dead(dead, date(1450, 2), "fever");
        w.switch(P1, a).unwrap();

        assert_eq!(w.switch(P1, dead), Err(SimError::CitizenDeceased(dead)));
        assert_eq!(
            w.switch(P1, CitizenId(404)),
            Err(SimError::CitizenNotFound(CitizenId(404)))
        );
        assert_eq!(
            w.switch(P2, a),
            Err(SimError::AlreadyControlled { citizen: a, player: P1 })
        );
        let session = w.switcher.session(P1).unwrap();
        assert_eq!(session.current(), Some(a));
        assert!(session.history().is_empty());
        assert!(w.switcher.session(P2).is_err());
    }

    #[test]
    fn switching_to_self_is_a_no_op() {
        let mut w = World::new();
        let a = w.add("Felicitas Vogel", 1);
        w.switch(P1, a).unwrap();
        w.switch(P1, a).unwrap();
        let session = w.switcher.session(P1).unwrap();
        assert_eq!(session.switches().len(), 1);
        assert!(session.history().is_empty());
    }

    #[test]
    fn previous_skips_dead_entries_until_exhausted() {
        let mut w = World::new();
        let a = w.add("Gisela Meyer", 1);
        let b = w.add("Hedwig Meyer", 1);
        let c = w.add("Isolde Meyer", 1);
        w.switch(P1, a).unwrap();
        w.switch(P1, b).unwrap();
        w.switch(P1, c).unwrap();
        w.registry.mark_dead(b, date(1450, 6), "accident");

        assert_eq!(w.back(P1), Ok(a));
        let session = w.switcher.session(P1).unwrap();
        assert_eq!(session.current(), Some(a));
        assert!(session.history().is_empty());
        assert!(!w.registry.citizen(c).unwrap().is_player_character());

        assert_eq!(w.back(P1), Err(SimError::HistoryExhausted(P1)));
        assert_eq!(w.back(P2), Err(SimError::SessionNotFound(P2)));
    }

    #[test]
    fn release_requires_a_body() {
        let mut w = World::new();
        let a = w.add("Johanna Richter", 1);
        w.switch(P1, a).unwrap();
        let released = w
            .switcher
            .release(&mut w.registry, &mut w.behavior, P1, date(1450, 9))
            .unwrap();
        assert_eq!(released, a);
        assert!(!w.registry.citizen(a).unwrap().is_player_character());
        assert_eq!(w.switcher.current_citizen(P1), None);
        assert_eq!(
            w.switcher.release(&mut w.registry, &mut w.behavior, P1, date(1450, 9)),
            Err(SimError::NoActiveCitizen(P1))
        );
        assert_eq!(w.back(P1), Ok(a));
    }

    #[test]
    fn recommendations_rank_family_then_friends_then_strangers() {
        let mut w = World::new();
        let me = w.add("Katrin Fischer", 1);
        let sister = w.add("Lucia Fischer", 1);
        let friend = w.add("Margarethe Bauer", 1);
        let acquaintance = w.add("Ottilie Bauer", 1);
        let strangers: Vec<_> = (0..4).map(|i| w.add(&format!("Ursula Weber{i}"), 1)).collect();
        let elsewhere = w.add("Theda Zimmer", 2);

        w.registry.add_family_relation(me, FamilyKind::Sibling, sister).unwrap();
        create_friendship(&mut w.registry, me, friend, 90.0, date(1450, 1)).unwrap();
        create_friendship(&mut w.registry, me, acquaintance, 40.0, date(1450, 1)).unwrap();
        // Sister is also a close friend; she must appear only once.
        create_friendship(&mut w.registry, me, sister, 80.0, date(1450, 1)).unwrap();
        w.registry.set_social_class(strangers[3], SocialClass::Royal).unwrap();
        w.registry.adjust_reputation(strangers[3], 200.0).unwrap();

        w.switch(P1, me).unwrap();
        let picks = w.switcher.get_recommended_characters(&w.registry, P1).unwrap();

        assert_eq!(picks[0], sister);
        assert_eq!(picks[1], friend);
        assert_eq!(picks.len(), 2 + MAX_STRANGER_PICKS);
        assert_eq!(picks[2], strangers[3]);
        assert!(!picks.contains(&me));
        assert!(!picks.contains(&acquaintance));
        assert!(!picks.contains(&elsewhere));
        let unique: BTreeSet<_> = picks.iter().collect();
        assert_eq!(unique.len(), picks.len());
    }

    #[test]
    fn recommendations_need_an_active_body() {
        let w = World::new();
        assert_eq!(
            w.switcher.get_recommended_characters(&w.registry, P1),
            Err(SimError::SessionNotFound(P1))
        );
    }

    #[test]
    fn interest_weights_class_wealth_reputation_and_skill() {
        let mut w = World::new();
        let a = w.add("Rosalind Hartmann", 1);
        w.registry.set_social_class(a, SocialClass::Noble).unwrap();
        let wealth = w.registry.citizen(a).unwrap().wealth();
        w.registry.adjust_wealth(a, 10_000.0 - wealth).unwrap();
        w.registry.adjust_reputation(a, -200.0).unwrap();
        for skill in Skill::ALL {
            w.registry.set_skill(a, *skill, 40.0).unwrap();
        }
        w.registry.set_skill(a, Skill::Trading, 80.0).unwrap();
        let score = interest_score(w.registry.citizen(a).unwrap());
        // 50 class + 50 wealth cap + 50 reputation + 0 relations + 40 skill.
        assert!((score - 190.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn playable_filter_matches_every_set_field() {
        let mut w = World::new();
        let a = w.add("Sibylla Jaeger", 1);
        let b = w.add("Walburga Jaeger", 2);
        let farmer = spawn(&mut w.registry, "Piers Jaeger", Gender::Male, 60, Profession::Farmer, RegionId(1));
        w.switch(P1, a).unwrap();

        let all = w.switcher.get_playable_characters(&w.registry, &PlayableFilter::default());
        assert_eq!(all, vec![b, farmer]);

        let filter = PlayableFilter {
            region: Some(RegionId(1)),
            min_age: Some(50),
            ..PlayableFilter::default()
        };
        assert_eq!(w.switcher.get_playable_characters(&w.registry, &filter), vec![farmer]);

        let filter = PlayableFilter {
            profession: Some(Profession::Merchant),
            max_age: Some(20),
            ..PlayableFilter::default()
        };
        assert!(w.switcher.get_playable_characters(&w.registry, &filter).is_empty());
    }

    #[test]
    fn meta_knowledge_survives_switches_and_snapshots() {
        let mut w = World::new();
        let a = w.add("Ottilie Neumann", 1);
        let b = w.add("Notburga Neumann", 1);
        w.switcher
            .set_meta_knowledge(P1, "plague_source", serde_json::json!("the harbor"));
        w.switch(P1, a).unwrap();
        w.switch(P1, b).unwrap();
        assert_eq!(
            w.switcher.get_meta_knowledge(P1, "plague_source"),
            Some(&serde_json::json!("the harbor"))
        );

        let json = serde_json::to_string(&w.switcher.snapshot()).unwrap();
        let sessions: Vec<PlayerSession> = serde_json::from_str(&json).unwrap();
        let restored = RoleSwitcher::restore(sessions);
        assert_eq!(restored.session(P1), w.switcher.session(P1));
        assert_eq!(restored.current_citizen(P1), Some(b));
    }
}
