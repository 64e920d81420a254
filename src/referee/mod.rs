//! The match state machine.
//!
//! A [`Referee`] owns the live map, both players and the two random sources.
//! Construction performs setup (neutral fill, wastelands, pickable regions)
//! and fails on a broken configuration. Each [`Referee::step`] then runs one
//! phase:
//!
//! `Draft -> (Deploy -> ResolveDeploy -> Attack -> ResolveAttack)* -> Done`
//!
//! The map-generation source is only consulted during setup and the draft;
//! combat and move ordering draw from the gameplay source.

pub mod draft;
pub mod setup;

use std::collections::BTreeSet;
use std::mem;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::board::{apply_fog, FirstPlayer, Map, MapView, RegionId, Settings};
use crate::bot::Player;
use crate::moves::Move;
use crate::protocol::json::standings;
use crate::protocol::BotProtocol;
use crate::replay::{MatchOutcome, Replay};
use crate::resolve::{
    execute_deploys, income, resolve_attacks, validate_attack, validate_deploys, CombatParams,
    MoveQueue, RoundLog, Slot,
};

pub use draft::{assign_starting_regions, DraftRules};
pub use setup::{
    check_player_name, pickable_regions, place_neutrals, place_wastelands, SetupError, NUM_PLAYERS,
};

/// Options that shape a match run but are not game rules.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// Seed for setup and draft randomness (0 = use entropy).
    pub map_seed: u64,
    /// Seed for combat and move-order randomness (0 = use entropy).
    pub game_seed: u64,
    /// Serve both players' requests of a phase concurrently.
    pub parallel_requests: bool,
}

/// The phase the next [`Referee::step`] will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Draft,
    Deploy,
    ResolveDeploy,
    Attack,
    ResolveAttack,
    Done,
}

pub struct Referee<P: BotProtocol> {
    map: Map,
    settings: Settings,
    protocol: P,
    players: [Player; 2],
    names: [String; 2],
    options: MatchOptions,
    setup_rng: SmallRng,
    game_rng: SmallRng,
    phase: MatchPhase,
    round: u32,
    max_rounds: u32,
    wastelands: BTreeSet<RegionId>,
    pickable: BTreeSet<RegionId>,
    first_pick: Slot,
    /// Moves submitted in the current phase, not yet resolved.
    pending: [Vec<Move>; 2],
    round_log: RoundLog,
    /// What each player saw during the previous round.
    observed: [Vec<Move>; 2],
    replay: Replay,
    outcome: Option<MatchOutcome>,
}

fn seeded_rng(seed: u64) -> SmallRng {
    if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    }
}

impl<P: BotProtocol> Referee<P> {
    /// Validates the configuration and prepares the map for the draft.
    pub fn new(
        mut map: Map,
        settings: Settings,
        protocol: P,
        players: [Player; 2],
        options: MatchOptions,
    ) -> Result<Self, SetupError> {
        settings.validate()?;
        for player in &players {
            check_player_name(player.name())?;
        }
        if players[0].name() == players[1].name() {
            return Err(SetupError::DuplicatePlayerName(players[0].name().to_string()));
        }

        let mut setup_rng = seeded_rng(options.map_seed);
        let game_rng = seeded_rng(options.game_seed);

        place_neutrals(&mut map, &settings);
        let wastelands = place_wastelands(&mut map, &settings, &mut setup_rng);
        let pickable = pickable_regions(&map, &settings, &wastelands, &mut setup_rng)?;

        let names = [players[0].name().to_string(), players[1].name().to_string()];
        let max_rounds = settings.max_rounds(map.region_count());
        let mut replay = Replay::new(map.name(), [names[0].as_str(), names[1].as_str()]);
        replay.wastelands = wastelands.iter().copied().collect();
        replay.pickable = pickable.iter().copied().collect();

        info!(map = %map.name(), max_rounds, "match set up");
        Ok(Referee {
            map,
            settings,
            protocol,
            players,
            names,
            options,
            setup_rng,
            game_rng,
            phase: MatchPhase::Draft,
            round: 0,
            max_rounds,
            wastelands,
            pickable,
            first_pick: 0,
            pending: [Vec::new(), Vec::new()],
            round_log: RoundLog::default(),
            observed: [Vec::new(), Vec::new()],
            replay,
            outcome: None,
        })
    }

    /// Runs the current phase and returns the next one.
    pub fn step(&mut self) -> MatchPhase {
        self.phase = match self.phase {
            MatchPhase::Draft => {
                self.run_draft();
                self.round = 1;
                MatchPhase::Deploy
            }
            MatchPhase::Deploy => {
                self.collect_deploys();
                MatchPhase::ResolveDeploy
            }
            MatchPhase::ResolveDeploy => {
                self.apply_deploys();
                MatchPhase::Attack
            }
            MatchPhase::Attack => {
                self.collect_attacks();
                MatchPhase::ResolveAttack
            }
            MatchPhase::ResolveAttack => {
                self.apply_attacks();
                match self.check_outcome() {
                    Some(outcome) => {
                        self.finish(outcome);
                        MatchPhase::Done
                    }
                    None => {
                        self.round += 1;
                        MatchPhase::Deploy
                    }
                }
            }
            MatchPhase::Done => MatchPhase::Done,
        };
        self.phase
    }

    /// Plays the match to the end.
    pub fn run(&mut self) -> MatchOutcome {
        while self.step() != MatchPhase::Done {}
        self.outcome.clone().unwrap_or(MatchOutcome::Draw)
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Current round, 1-based; 0 before the draft.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn player(&self, slot: Slot) -> &Player {
        &self.players[slot.min(1)]
    }

    pub fn wastelands(&self) -> &BTreeSet<RegionId> {
        &self.wastelands
    }

    pub fn pickable(&self) -> &BTreeSet<RegionId> {
        &self.pickable
    }

    pub fn first_pick(&self) -> Slot {
        self.first_pick
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    fn run_draft(&mut self) {
        let max_rounds = self.max_rounds;
        let names = &self.names;
        let map = &self.map;
        let wastelands = &self.wastelands;
        each_player(&self.protocol, &mut self.players, self.options.parallel_requests, |protocol, slot, player| {
            protocol.send_settings(player, &names[1 - slot], max_rounds);
            protocol.send_map(player, map, wastelands);
        });

        let quota = self.settings.starting_territories as usize;
        let pickable = &self.pickable;
        let preferences = each_player(&self.protocol, &mut self.players, self.options.parallel_requests, |protocol, _, player| {
            protocol.request_picks(player, quota, pickable)
        });

        self.first_pick = match self.settings.first_player {
            FirstPlayer::Player1 => 0,
            FirstPlayer::Player2 => 1,
            FirstPlayer::Random => usize::from(self.setup_rng.gen_bool(0.5)),
        };
        let rules = DraftRules {
            pickable: &self.pickable,
            quota,
            player_armies: self.settings.initial_player_armies,
            leftover_armies: self.settings.neutrals_in_distribution,
        };
        let awarded = assign_starting_regions(
            &mut self.map,
            [self.names[0].as_str(), self.names[1].as_str()],
            preferences,
            self.first_pick,
            &rules,
            &mut self.setup_rng,
        );

        for (name, regions) in self.names.iter().zip(awarded) {
            self.replay.starting_regions.insert(name.clone(), regions);
        }
        self.replay.initial_standings = standings(&MapView::full(&self.map));
        info!(first_pick = %self.names[self.first_pick], "all starting regions assigned");
    }

    fn collect_deploys(&mut self) {
        info!(round = self.round, "round started");
        self.replay.start_round(self.round);
        for (player, name) in self.players.iter_mut().zip(&self.names) {
            player.armies_left = income(&self.map, &self.settings, name);
        }

        let views = [0usize, 1].map(|slot| apply_fog(&self.map, &self.names[slot], self.settings.fog));
        let observed = mem::take(&mut self.observed);
        self.pending = each_player(&self.protocol, &mut self.players, self.options.parallel_requests, |protocol, slot, player| {
            protocol.send_round_start(player, &views[slot], &observed[slot]);
            protocol.request_deploys(player)
        });
    }

    fn apply_deploys(&mut self) {
        let mut moves = Vec::new();
        for slot in 0..NUM_PLAYERS {
            let mut submitted = mem::take(&mut self.pending[slot]);
            validate_deploys(
                &self.map,
                &self.names[slot],
                &mut submitted,
                &mut self.players[slot].armies_left,
            );
            moves.extend(submitted);
        }

        let replay = &mut self.replay;
        let mut log = RoundLog::default();
        execute_deploys(
            &mut self.map,
            moves,
            [self.names[0].as_str(), self.names[1].as_str()],
            &mut log,
            &mut |mv, map| replay.record_move(mv, map),
        );
        self.round_log = log;
    }

    fn collect_attacks(&mut self) {
        self.pending = each_player(&self.protocol, &mut self.players, self.options.parallel_requests, |protocol, _, player| {
            protocol.request_attacks(player)
        });
    }

    fn apply_attacks(&mut self) {
        let mut queue = MoveQueue::new(self.settings.move_order, self.round_leader());
        for slot in 0..NUM_PLAYERS {
            let mut submitted = mem::take(&mut self.pending[slot]);
            for mv in &mut submitted {
                validate_attack(&self.map, &self.names[slot], mv);
            }
            queue.extend(slot, submitted);
        }

        let params = CombatParams::from_settings(&self.settings);
        let replay = &mut self.replay;
        let mut log = RoundLog::default();
        resolve_attacks(
            &mut self.map,
            &mut queue,
            [self.names[0].as_str(), self.names[1].as_str()],
            &params,
            &mut self.game_rng,
            &mut log,
            &mut |mv, map| replay.record_move(mv, map),
        );
        self.round_log.append(log);
        self.observed = mem::take(&mut self.round_log).observed;
    }

    /// Round 1 is led by the player who did not pick first; the lead then
    /// alternates.
    fn round_leader(&self) -> Slot {
        if self.round % 2 == 1 {
            1 - self.first_pick
        } else {
            self.first_pick
        }
    }

    fn check_outcome(&self) -> Option<MatchOutcome> {
        let owned = [0usize, 1].map(|slot| self.map.owned_count(&self.names[slot]));
        match owned {
            [0, 0] => Some(MatchOutcome::Draw),
            [0, _] => Some(MatchOutcome::Winner(self.names[1].clone())),
            [_, 0] => Some(MatchOutcome::Winner(self.names[0].clone())),
            _ if self.round >= self.max_rounds => Some(MatchOutcome::Draw),
            _ => None,
        }
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        match &outcome {
            MatchOutcome::Winner(name) => info!(round = self.round, winner = %name, "match finished"),
            MatchOutcome::Draw => info!(round = self.round, "match finished in a draw"),
        }
        for player in &mut self.players {
            player.shutdown();
            self.replay
                .errors
                .insert(player.name().to_string(), player.error_log().to_vec());
        }
        self.replay.outcome = Some(outcome.clone());
        self.outcome = Some(outcome);
    }
}

/// Runs `f` for both players, concurrently when `parallel` is set. Each
/// player's own requests stay in order either way.
fn each_player<P, T, F>(protocol: &P, players: &mut [Player; 2], parallel: bool, f: F) -> [T; 2]
where
    P: BotProtocol,
    T: Send,
    F: Fn(&P, Slot, &mut Player) -> T + Sync,
{
    let (first, second) = players.split_at_mut(1);
    let (a, b) = (&mut first[0], &mut second[0]);
    if parallel {
        let (x, y) = rayon::join(|| f(protocol, 0, a), || f(protocol, 1, b));
        [x, y]
    } else {
        let x = f(protocol, 0, a);
        let y = f(protocol, 1, b);
        [x, y]
    }
}
