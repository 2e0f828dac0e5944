//! Fair random decoy assignment planning.
//!
//! The planner is a pure function over a pre-run storage snapshot: it decides
//! which stale decoy rows to drop and which fresh ones to create, balancing
//! how often each eligible participant serves as a decoy across the whole
//! competition. Picks use greedy least-loaded selection with a uniformly
//! shuffled tie pool, so the outcome is deterministic up to the injected
//! random source. Applying the resulting plan atomically is the job of
//! [`super::decoy_service`].

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{
    AttributionEntity, AttributionKey, AttributionRole, ParticipantEntity, SongEntity,
};

/// Pre-run snapshot of the roster, read once and never re-read mid-run.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// Every song in the competition; bonus songs are filtered during planning.
    pub songs: Vec<SongEntity>,
    /// Every registered participant.
    pub participants: Vec<ParticipantEntity>,
    /// Every attribution row across the whole competition.
    pub attributions: Vec<AttributionEntity>,
}

/// Outcome of one song's clear-then-refill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongDecoySummary {
    /// Song the summary belongs to.
    pub song_id: Uuid,
    /// Human-curated option count (`real` + `fixed`) found on the song.
    pub existing: u32,
    /// Decoy rows added by this run.
    pub added: u32,
    /// Total option count after the run (`existing + added`).
    pub final_options: u32,
}

/// Planned mutation batch plus the per-song summaries, in processing order.
#[derive(Debug, Clone, Default)]
pub struct DecoyPlan {
    /// Stale decoy rows to delete (every prior decoy of every processed song).
    pub deletes: Vec<AttributionKey>,
    /// Fresh decoy rows to insert.
    pub inserts: Vec<AttributionEntity>,
    /// One summary per processed (non-bonus) song, in processing order.
    pub summaries: Vec<SongDecoySummary>,
}

/// Failures that abort a planning run before anything is mutated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecoyError {
    /// The configured minimum option count is zero.
    #[error("minimum required options must be a positive number")]
    InvalidMinimumOptions,
    /// The global candidate pool is empty.
    #[error("no eligible participants available for decoy assignment")]
    NoEligibleParticipants,
}

/// Participants allowed to serve as random decoys, in snapshot order.
///
/// A participant is eligible when it is not disruptor-only AND owns at least
/// one `real` attribution somewhere in the competition, i.e. it is a genuine
/// contributor rather than a filler identity.
pub fn eligible_participants(
    participants: &[ParticipantEntity],
    attributions: &[AttributionEntity],
) -> Vec<Uuid> {
    let contributors: HashSet<Uuid> = attributions
        .iter()
        .filter(|row| row.role == AttributionRole::Real)
        .map(|row| row.participant_id)
        .collect();

    participants
        .iter()
        .filter(|p| !p.disruptor_only && contributors.contains(&p.id))
        .map(|p| p.id)
        .collect()
}

/// Run-local decoy usage counts, seeded from the pre-run snapshot and updated
/// in place as picks are made. Never re-read from storage mid-run.
struct LoadTracker {
    counts: HashMap<Uuid, u32>,
}

impl LoadTracker {
    /// Count existing decoy rows across the entire competition.
    fn from_snapshot(attributions: &[AttributionEntity]) -> Self {
        let mut counts = HashMap::new();
        for row in attributions {
            if row.role == AttributionRole::Decoy {
                *counts.entry(row.participant_id).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    fn load(&self, id: Uuid) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    fn record(&mut self, id: Uuid) {
        *self.counts.entry(id).or_insert(0) += 1;
    }
}

/// Compute the decoy reassignment for every non-bonus song.
///
/// Per song: stale decoy rows are dropped unconditionally, then the gap up to
/// `min_required_options` is refilled from the least-loaded eligible
/// candidates not yet attached to the song. Candidate exhaustion mid-fill is
/// not an error; the song simply ends up with fewer options than targeted,
/// which the summary surfaces as `added < needed`.
pub fn plan_decoys<R: Rng + ?Sized>(
    snapshot: &RosterSnapshot,
    min_required_options: u32,
    rng: &mut R,
) -> Result<DecoyPlan, DecoyError> {
    if min_required_options == 0 {
        return Err(DecoyError::InvalidMinimumOptions);
    }

    let eligible = eligible_participants(&snapshot.participants, &snapshot.attributions);
    if eligible.is_empty() {
        return Err(DecoyError::NoEligibleParticipants);
    }

    let mut loads = LoadTracker::from_snapshot(&snapshot.attributions);

    // Insertion-order grouping keeps the run deterministic up to the RNG.
    let mut rows_by_song: IndexMap<Uuid, Vec<&AttributionEntity>> = IndexMap::new();
    for row in &snapshot.attributions {
        rows_by_song.entry(row.song_id).or_default().push(row);
    }

    let mut processing_order: Vec<&SongEntity> =
        snapshot.songs.iter().filter(|song| !song.is_bonus).collect();
    processing_order.shuffle(rng);

    let mut plan = DecoyPlan::default();
    let now = SystemTime::now();

    for song in processing_order {
        let rows = rows_by_song
            .get(&song.id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        // Participants already attached through human-curated rows. Prior
        // decoys are dropped below and therefore do not exclude anyone.
        let mut attached: HashSet<Uuid> = rows
            .iter()
            .filter(|row| row.role != AttributionRole::Decoy)
            .map(|row| row.participant_id)
            .collect();

        plan.deletes.extend(
            rows.iter()
                .filter(|row| row.role == AttributionRole::Decoy)
                .map(|row| row.key()),
        );

        let existing = attached.len() as u32;
        let needed = min_required_options.saturating_sub(existing);

        let mut added = 0;
        for _ in 0..needed {
            let remaining: Vec<Uuid> = eligible
                .iter()
                .copied()
                .filter(|id| !attached.contains(id))
                .collect();
            let Some(min_load) = remaining.iter().map(|id| loads.load(*id)).min() else {
                break;
            };

            let mut tied: Vec<Uuid> = remaining
                .into_iter()
                .filter(|id| loads.load(*id) == min_load)
                .collect();
            tied.shuffle(rng);
            let winner = tied[0];

            plan.inserts.push(AttributionEntity {
                song_id: song.id,
                participant_id: winner,
                role: AttributionRole::Decoy,
                created_at: now,
                updated_at: now,
            });
            attached.insert(winner);
            loads.record(winner);
            added += 1;
        }

        plan.summaries.push(SongDecoySummary {
            song_id: song.id,
            existing,
            added,
            final_options: existing + added,
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn song(is_bonus: bool) -> SongEntity {
        SongEntity {
            id: Uuid::new_v4(),
            title: "song".into(),
            artist: "artist".into(),
            is_bonus,
            mystery_order: 0,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn participant(disruptor_only: bool) -> ParticipantEntity {
        ParticipantEntity {
            id: Uuid::new_v4(),
            name: "participant".into(),
            disruptor_only,
            contact: None,
            profile_url: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn row(song_id: Uuid, participant_id: Uuid, role: AttributionRole) -> AttributionEntity {
        AttributionEntity {
            song_id,
            participant_id,
            role,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    /// Resulting attribution table after a plan is applied to a snapshot.
    fn apply(snapshot: &RosterSnapshot, plan: &DecoyPlan) -> Vec<AttributionEntity> {
        let deleted: HashSet<AttributionKey> = plan.deletes.iter().copied().collect();
        let mut table: Vec<AttributionEntity> = snapshot
            .attributions
            .iter()
            .filter(|r| !deleted.contains(&r.key()))
            .cloned()
            .collect();
        table.extend(plan.inserts.iter().cloned());
        table
    }

    /// Snapshot with `songs` quiz songs and `pool` eligible participants whose
    /// real rows live on a shared bonus song, keeping the quiz songs clean.
    fn pool_snapshot(song_count: usize, pool: usize) -> RosterSnapshot {
        let anchor = song(true);
        let participants: Vec<ParticipantEntity> =
            (0..pool).map(|_| participant(false)).collect();
        let attributions = participants
            .iter()
            .map(|p| row(anchor.id, p.id, AttributionRole::Real))
            .collect();
        let mut songs: Vec<SongEntity> = (0..song_count).map(|_| song(false)).collect();
        songs.push(anchor);
        RosterSnapshot {
            songs,
            participants,
            attributions,
        }
    }

    #[test]
    fn eligibility_requires_real_row_and_no_disruptor_flag() {
        let anchor = song(true);
        let contributor = participant(false);
        let filler = participant(true);
        let bystander = participant(false);
        let attributions = vec![
            row(anchor.id, contributor.id, AttributionRole::Real),
            row(anchor.id, filler.id, AttributionRole::Real),
            row(anchor.id, bystander.id, AttributionRole::Fixed),
        ];

        let eligible = eligible_participants(
            &[contributor.clone(), filler, bystander],
            &attributions,
        );

        assert_eq!(eligible, vec![contributor.id]);
    }

    #[test]
    fn zero_minimum_is_a_configuration_error() {
        let snapshot = pool_snapshot(1, 3);
        assert_eq!(
            plan_decoys(&snapshot, 0, &mut rng()).unwrap_err(),
            DecoyError::InvalidMinimumOptions
        );
    }

    #[test]
    fn empty_pool_aborts_before_planning() {
        let snapshot = RosterSnapshot {
            songs: vec![song(false)],
            participants: vec![participant(false), participant(true)],
            attributions: vec![],
        };
        assert_eq!(
            plan_decoys(&snapshot, 4, &mut rng()).unwrap_err(),
            DecoyError::NoEligibleParticipants
        );
    }

    #[test]
    fn fixed_and_real_rows_are_never_touched() {
        let mut snapshot = pool_snapshot(2, 6);
        let quiz_song = snapshot.songs[0].id;
        let curated = snapshot.participants[0].id;
        snapshot
            .attributions
            .push(row(quiz_song, curated, AttributionRole::Fixed));

        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        let decoy_keys: HashSet<AttributionKey> = snapshot
            .attributions
            .iter()
            .filter(|r| r.role == AttributionRole::Decoy)
            .map(|r| r.key())
            .collect();
        assert!(plan.deletes.iter().all(|key| decoy_keys.contains(key)));
        assert!(
            plan.inserts
                .iter()
                .all(|r| r.role == AttributionRole::Decoy)
        );
    }

    #[test]
    fn stale_decoys_are_cleared_even_when_nothing_is_added() {
        let mut snapshot = pool_snapshot(1, 6);
        let quiz_song = snapshot.songs[0].id;
        // Four curated rows already satisfy the requirement.
        for p in &snapshot.participants[..4] {
            snapshot
                .attributions
                .push(row(quiz_song, p.id, AttributionRole::Fixed));
        }
        let stale = snapshot.participants[4].id;
        snapshot
            .attributions
            .push(row(quiz_song, stale, AttributionRole::Decoy));

        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        assert_eq!(
            plan.deletes,
            vec![AttributionKey {
                song_id: quiz_song,
                participant_id: stale,
            }]
        );
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.summaries.len(), 1);
        assert_eq!(plan.summaries[0].existing, 4);
        assert_eq!(plan.summaries[0].added, 0);
    }

    #[test]
    fn accounting_holds_for_every_summary() {
        let plan = plan_decoys(&pool_snapshot(5, 7), 4, &mut rng()).unwrap();
        assert_eq!(plan.summaries.len(), 5);
        for summary in &plan.summaries {
            assert_eq!(summary.final_options, summary.existing + summary.added);
        }
    }

    #[test]
    fn no_participant_appears_twice_on_a_song() {
        let snapshot = pool_snapshot(6, 5);
        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();
        let table = apply(&snapshot, &plan);

        let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();
        for r in &table {
            assert!(
                seen.insert((r.song_id, r.participant_id)),
                "duplicate attribution for song {} participant {}",
                r.song_id,
                r.participant_id
            );
        }
    }

    #[test]
    fn coverage_is_exact_when_supply_allows() {
        let plan = plan_decoys(&pool_snapshot(3, 10), 4, &mut rng()).unwrap();
        for summary in &plan.summaries {
            assert_eq!(summary.final_options, 4, "never exceeded, never short");
        }
    }

    #[test]
    fn exhaustion_is_surfaced_not_raised() {
        // minRequiredOptions = 4, no curated rows, only 2 eligible candidates.
        let plan = plan_decoys(&pool_snapshot(1, 2), 4, &mut rng()).unwrap();
        assert_eq!(plan.summaries[0].existing, 0);
        assert_eq!(plan.summaries[0].added, 2);
        assert_eq!(plan.summaries[0].final_options, 2);
    }

    #[test]
    fn starved_songs_still_get_a_summary() {
        let mut snapshot = pool_snapshot(1, 2);
        let quiz_song = snapshot.songs[0].id;
        // Both eligible participants are curated onto the song already, so the
        // candidate set is empty while the requirement is unmet.
        for p in &snapshot.participants {
            snapshot
                .attributions
                .push(row(quiz_song, p.id, AttributionRole::Fixed));
        }

        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        assert_eq!(plan.summaries.len(), 1);
        assert_eq!(plan.summaries[0].existing, 2);
        assert_eq!(plan.summaries[0].added, 0);
    }

    #[test]
    fn bonus_songs_are_left_alone() {
        let mut snapshot = pool_snapshot(1, 4);
        let anchor = snapshot.songs.last().unwrap().id;
        let resting = snapshot.participants[0].id;
        snapshot
            .attributions
            .push(row(anchor, resting, AttributionRole::Decoy));

        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        assert!(plan.deletes.iter().all(|key| key.song_id != anchor));
        assert!(plan.inserts.iter().all(|r| r.song_id != anchor));
        assert_eq!(plan.summaries.len(), 1, "only the quiz song is processed");
    }

    #[test]
    fn prior_decoy_load_pushes_a_participant_to_the_back() {
        let mut snapshot = pool_snapshot(1, 3);
        let anchor = snapshot.songs.last().unwrap().id;
        let loaded = snapshot.participants[0].id;
        // Surviving decoy rows on a bonus song keep counting as load.
        snapshot
            .attributions
            .push(row(anchor, loaded, AttributionRole::Decoy));

        let plan = plan_decoys(&snapshot, 2, &mut rng()).unwrap();

        assert_eq!(plan.inserts.len(), 2);
        assert!(
            plan.inserts.iter().all(|r| r.participant_id != loaded),
            "zero-load candidates win before a pre-loaded one"
        );
    }

    #[test]
    fn fairness_spread_stays_within_one() {
        let snapshot = pool_snapshot(8, 5);
        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        let mut counts: HashMap<Uuid, u32> = snapshot
            .participants
            .iter()
            .map(|p| (p.id, 0))
            .collect();
        for r in &plan.inserts {
            *counts.get_mut(&r.participant_id).unwrap() += 1;
        }

        let max = counts.values().max().copied().unwrap();
        let min = counts.values().min().copied().unwrap();
        assert!(
            max - min <= 1,
            "greedy least-loaded picks must balance within one step (spread {max}-{min})"
        );
    }

    #[test]
    fn rerun_preserves_the_invariants() {
        let snapshot = pool_snapshot(4, 5);
        let first = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        let rerun_snapshot = RosterSnapshot {
            songs: snapshot.songs.clone(),
            participants: snapshot.participants.clone(),
            attributions: apply(&snapshot, &first),
        };
        let second = plan_decoys(&rerun_snapshot, 4, &mut StdRng::seed_from_u64(99)).unwrap();

        // Every prior decoy is discarded and recomputed.
        let prior_decoys: HashSet<AttributionKey> = rerun_snapshot
            .attributions
            .iter()
            .filter(|r| r.role == AttributionRole::Decoy)
            .map(|r| r.key())
            .collect();
        let deleted: HashSet<AttributionKey> = second.deletes.iter().copied().collect();
        assert_eq!(deleted, prior_decoys);

        for summary in &second.summaries {
            assert_eq!(summary.final_options, summary.existing + summary.added);
            assert_eq!(summary.final_options, 4);
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_plan() {
        let snapshot = pool_snapshot(4, 6);
        let a = plan_decoys(&snapshot, 4, &mut StdRng::seed_from_u64(21)).unwrap();
        let b = plan_decoys(&snapshot, 4, &mut StdRng::seed_from_u64(21)).unwrap();

        assert_eq!(a.summaries, b.summaries);
        assert_eq!(a.deletes, b.deletes);
        let keys = |plan: &DecoyPlan| -> Vec<AttributionKey> {
            plan.inserts.iter().map(AttributionEntity::key).collect()
        };
        assert_eq!(keys(&a), keys(&b));
    }

    #[test]
    fn two_song_scenario_balances_seven_slots_over_five_candidates() {
        // S1 carries one fixed row (U1, not eligible), S2 starts empty; the
        // pool is U2..U6 with decoy-load 0 everywhere.
        let s1 = song(false);
        let s2 = song(false);
        let anchor = song(true);
        let u1 = participant(false);
        let pool: Vec<ParticipantEntity> = (0..5).map(|_| participant(false)).collect();

        let mut attributions = vec![row(s1.id, u1.id, AttributionRole::Fixed)];
        attributions.extend(
            pool.iter()
                .map(|p| row(anchor.id, p.id, AttributionRole::Real)),
        );

        let snapshot = RosterSnapshot {
            songs: vec![s1.clone(), s2.clone(), anchor],
            participants: std::iter::once(u1.clone()).chain(pool.iter().cloned()).collect(),
            attributions,
        };

        let plan = plan_decoys(&snapshot, 4, &mut rng()).unwrap();

        let by_song = |song_id: Uuid| -> Vec<Uuid> {
            plan.inserts
                .iter()
                .filter(|r| r.song_id == song_id)
                .map(|r| r.participant_id)
                .collect()
        };
        let s1_decoys = by_song(s1.id);
        let s2_decoys = by_song(s2.id);

        assert_eq!(s1_decoys.len(), 3, "S1: 1 fixed + 3 decoys");
        assert_eq!(s2_decoys.len(), 4, "S2: 4 decoys");
        assert!(s1_decoys.iter().all(|id| *id != u1.id));

        let mut counts: HashMap<Uuid, u32> = pool.iter().map(|p| (p.id, 0)).collect();
        for id in s1_decoys.iter().chain(s2_decoys.iter()) {
            *counts.get_mut(id).unwrap() += 1;
        }
        let mut distribution: Vec<u32> = counts.values().copied().collect();
        distribution.sort_unstable();
        assert_eq!(distribution, vec![1, 1, 1, 2, 2]);
    }
}
