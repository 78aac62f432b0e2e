//! Conflict resolution after a user-driven swap.
//!
//! When the tile the user dragged has settled into its new cell, the
//! [`ConflictResolver`] inspects that cell's neighbors:
//!
//! 1. Every other occupant is frozen so no new gesture can start mid-resolution.
//! 2. Each neighbor is classified, in [`GridBoard::neighbors`] order:
//!    - empty: skipped
//!    - same kind (a *match*): the neighbor's cell is locked and the moved
//!      actor queues an attack on the neighbor's actor
//!    - different kind: the neighbor plays a dance and is unfrozen at once
//! 3. The orchestrator schedules [`ConflictResolver::unfreeze_all`] after the
//!    grace window as a safety net.
//!
//! All side effects of one call are applied inside that call, so two
//! resolutions never interleave.
//!
//! # Invariants
//!
//! - Resolution only ever runs on an occupied source cell. An empty source is
//!   reported as [`GameError::EmptySourceCell`] and nothing is mutated.
//! - Attacks are queued on the attacker in neighbor scan order, so they play
//!   one after another.

mod approach;

pub use approach::{approach_point, attack_direction};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::actor::{ActorFlags, ActorId, Reaction};
use crate::board::{CellIndex, GridBoard};
use crate::config::{ActorConfig, ResolverConfig};
use crate::error::GameError;

/// One attack issued during a resolution.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedAttack {
    /// Actor on the moved cell.
    pub attacker: ActorId,
    /// Actor on the matching neighbor.
    pub target: ActorId,
    /// The neighbor cell, now locked.
    pub target_cell: CellIndex,
    /// Point the attacker closes on.
    pub approach: glam::Vec3,
}

/// One benign reaction issued during a resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedReaction {
    /// Actor that reacts.
    pub actor: ActorId,
    /// Its cell.
    pub cell: CellIndex,
    /// What it plays.
    pub reaction: Reaction,
}

/// What a single resolution did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The cell the user dragged.
    pub source: CellIndex,
    /// Its occupant.
    pub attacker: ActorId,
    /// Actors frozen at the start of the resolution.
    pub frozen: Vec<ActorId>,
    /// Attacks issued, in scan order.
    pub attacks: Vec<IssuedAttack>,
    /// Reactions issued, in scan order.
    pub reactions: Vec<IssuedReaction>,
}

/// Classifies the neighbors of a moved tile and issues the resulting commands.
///
/// # Example
///
/// ```
/// use roomswap_core::board::{BoardLayout, CellIndex, GridBoard};
/// use roomswap_core::config::{ActorConfig, BoardConfig, ResolverConfig};
/// use roomswap_core::resolver::ConflictResolver;
/// use roomswap_core::spawn::SpawnTable;
///
/// let layout = BoardLayout::reference();
/// let mut board =
///     GridBoard::new(&layout, &mut SpawnTable::for_layout(&layout), &BoardConfig::default())
///         .unwrap();
/// // Slide the top B into the centre, where it meets the other three Bs.
/// board.swap(CellIndex::new(1, 0), CellIndex::new(1, 1), false).unwrap();
///
/// let resolver = ConflictResolver::new(ResolverConfig::default());
/// let resolution = resolver
///     .resolve(&mut board, CellIndex::new(1, 1), &ActorConfig::default())
///     .unwrap();
/// assert_eq!(resolution.attacks.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolver {
    config: ResolverConfig,
}

impl ConflictResolver {
    /// Creates a resolver with the given timings.
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The resolver's timings.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the neighbors of `source`, the cell the user dragged.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if `source` is off the grid and
    /// [`GameError::EmptySourceCell`] if it has no occupant. In both cases
    /// the board is left untouched.
    pub fn resolve(
        &self,
        board: &mut GridBoard,
        source: CellIndex,
        actor_config: &ActorConfig,
    ) -> Result<Resolution, GameError> {
        let cell = board.cell(source).ok_or(GameError::OutOfBounds {
            cell: source,
            width: board.width(),
            height: board.height(),
        })?;
        let (source_kind, attacker) = match cell.occupant {
            Some(id) if !cell.is_empty() => (cell.kind, id),
            _ => {
                error!(cell = %source, "Conflict resolution on an empty cell");
                return Err(GameError::EmptySourceCell { cell: source });
            }
        };
        let attacker_position = board
            .actors()
            .get(attacker)
            .ok_or(GameError::UnknownActor { id: attacker })?
            .position();

        let frozen = Self::freeze_others(board, attacker);
        let mut resolution = Resolution {
            source,
            attacker,
            frozen,
            attacks: Vec::new(),
            reactions: Vec::new(),
        };

        for neighbor in board.neighbors(source) {
            let Some(target_cell) = board.cell(neighbor) else {
                continue;
            };
            let Some(target) = target_cell.occupant else {
                continue;
            };
            if target_cell.kind == source_kind {
                resolution
                    .attacks
                    .push(self.issue_attack(board, attacker, attacker_position, target, neighbor)?);
            } else {
                resolution
                    .reactions
                    .push(Self::issue_dance(board, target, neighbor, actor_config));
            }
        }

        debug!(
            cell = %source,
            attacker = %attacker,
            attacks = resolution.attacks.len(),
            reactions = resolution.reactions.len(),
            "Resolution issued"
        );
        Ok(resolution)
    }

    fn freeze_others(board: &mut GridBoard, attacker: ActorId) -> Vec<ActorId> {
        let others: Vec<ActorId> = board
            .cells()
            .filter_map(|cell| cell.occupant)
            .filter(|id| *id != attacker)
            .collect();
        for id in &others {
            if let Some(actor) = board.actors_mut().get_mut(*id) {
                actor.set_flag(ActorFlags::FROZEN, true);
            }
        }
        others
    }

    fn issue_attack(
        &self,
        board: &mut GridBoard,
        attacker: ActorId,
        attacker_position: glam::Vec3,
        target: ActorId,
        target_cell: CellIndex,
    ) -> Result<IssuedAttack, GameError> {
        let target_position = board
            .actors()
            .get(target)
            .ok_or(GameError::UnknownActor { id: target })?
            .position();
        let approach = approach_point(attacker_position, target_position, &self.config);

        board.lock(target_cell, self.config.lock_duration)?;
        board.hold_lock(target_cell)?;
        board
            .actors_mut()
            .get_mut(attacker)
            .ok_or(GameError::UnknownActor { id: attacker })?
            .request_attack(target, approach, self.config.attack_duration);

        trace!(attacker = %attacker, target = %target, cell = %target_cell, "Attack queued");
        Ok(IssuedAttack {
            attacker,
            target,
            target_cell,
            approach,
        })
    }

    fn issue_dance(
        board: &mut GridBoard,
        actor: ActorId,
        cell: CellIndex,
        actor_config: &ActorConfig,
    ) -> IssuedReaction {
        if let Some(neighbor) = board.actors_mut().get_mut(actor) {
            neighbor.play_reaction(Reaction::Dance, actor_config);
            neighbor.set_flag(ActorFlags::FROZEN, false);
        }
        IssuedReaction {
            actor,
            cell,
            reaction: Reaction::Dance,
        }
    }

    /// Unfreezes every actor unconditionally.
    pub fn unfreeze_all(board: &mut GridBoard) {
        for actor in board.actors_mut().iter_mut() {
            actor.set_flag(ActorFlags::FROZEN, false);
        }
        trace!("All actors unfrozen");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{PendingState, StateKind};
    use crate::board::BoardLayout;
    use crate::config::BoardConfig;
    use crate::spawn::SpawnTable;

    fn board(rows: &[&str]) -> GridBoard {
        let layout = BoardLayout::from_rows(rows).unwrap();
        let mut spawner = SpawnTable::for_layout(&layout);
        GridBoard::new(&layout, &mut spawner, &BoardConfig::default()).unwrap()
    }

    fn resolve(board: &mut GridBoard, source: CellIndex) -> Result<Resolution, GameError> {
        ConflictResolver::default().resolve(board, source, &ActorConfig::default())
    }

    mod classification_tests {
        use super::*;

        #[test]
        fn single_match_issues_one_attack() {
            let mut board = board(&["ABA", "B_A", "AAB"]);
            board.swap(CellIndex::new(0, 1), CellIndex::new(1, 1), false).unwrap();

            let resolution = resolve(&mut board, CellIndex::new(1, 1)).unwrap();
            assert_eq!(resolution.attacks.len(), 1);
            assert_eq!(resolution.attacks[0].target_cell, CellIndex::new(1, 0));
            assert_eq!(resolution.reactions.len(), 2);
        }

        #[test]
        fn attacks_follow_scan_order() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            board.swap(CellIndex::new(1, 0), CellIndex::new(1, 1), false).unwrap();

            let resolution = resolve(&mut board, CellIndex::new(1, 1)).unwrap();
            let targets: Vec<_> = resolution.attacks.iter().map(|a| a.target_cell).collect();
            assert_eq!(
                targets,
                vec![CellIndex::new(0, 1), CellIndex::new(2, 1), CellIndex::new(1, 2)]
            );
        }

        #[test]
        fn no_match_dances_and_unfreezes() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            board.swap(CellIndex::new(0, 0), CellIndex::new(1, 1), false).unwrap();
            // The A in the centre now faces four Bs.
            let resolution = resolve(&mut board, CellIndex::new(1, 1)).unwrap();
            assert!(resolution.attacks.is_empty());
            assert_eq!(resolution.reactions.len(), 4);
            for reaction in &resolution.reactions {
                let actor = board.actors().get(reaction.actor).unwrap();
                assert!(!actor.is_frozen());
                assert_eq!(actor.reaction(), Some(Reaction::Dance));
            }
        }

        #[test]
        fn empty_neighbors_are_skipped() {
            let mut board = board(&["AB", "_A"]);
            let resolution = resolve(&mut board, CellIndex::new(0, 0)).unwrap();
            assert_eq!(resolution.reactions.len(), 1);
            assert!(resolution.attacks.is_empty());
        }
    }

    mod side_effect_tests {
        use super::*;

        #[test]
        fn match_locks_target_and_queues_attack() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            board.swap(CellIndex::new(1, 0), CellIndex::new(1, 1), false).unwrap();
            let resolution = resolve(&mut board, CellIndex::new(1, 1)).unwrap();

            assert_eq!(resolution.attacks.len(), 3);
            assert!(board.is_locked(CellIndex::new(0, 1)));
            assert!(board.is_locked(CellIndex::new(2, 1)));
            assert!(board.is_locked(CellIndex::new(1, 2)));
            assert!(!board.is_locked(CellIndex::new(1, 1)));

            let attacker = board.actors().get(resolution.attacker).unwrap();
            let queued: Vec<_> = attacker.pending().map(PendingState::kind).collect();
            assert_eq!(queued, vec![StateKind::Attack; 3]);
        }

        #[test]
        fn target_lock_is_held_past_its_duration() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            board.swap(CellIndex::new(1, 0), CellIndex::new(1, 1), false).unwrap();
            resolve(&mut board, CellIndex::new(1, 1)).unwrap();

            assert!(board.tick_locks(10.0).is_empty());
            assert!(board.is_locked(CellIndex::new(1, 2)));
            assert!(board.cell(CellIndex::new(1, 2)).unwrap().held);
        }

        #[test]
        fn everyone_but_the_attacker_is_frozen_until_unfrozen() {
            let mut board = board(&["ABA", "B_A", "AAB"]);
            board.swap(CellIndex::new(0, 1), CellIndex::new(1, 1), false).unwrap();
            let resolution = resolve(&mut board, CellIndex::new(1, 1)).unwrap();

            assert_eq!(resolution.frozen.len(), 7);
            let attacker = board.actors().get(resolution.attacker).unwrap();
            assert!(!attacker.is_frozen());
            let still_frozen = board.actors().iter().filter(|a| a.is_frozen()).count();
            // The two dancing neighbors were released immediately.
            assert_eq!(still_frozen, 5);

            ConflictResolver::unfreeze_all(&mut board);
            assert!(board.actors().iter().all(|a| !a.is_frozen()));
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn empty_source_is_reported_without_side_effects() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let before = board.clone();
            let err = resolve(&mut board, CellIndex::new(1, 1)).unwrap_err();
            assert!(matches!(err, GameError::EmptySourceCell { cell } if cell == CellIndex::new(1, 1)));
            assert_eq!(board, before);
        }

        #[test]
        fn off_grid_source_fails() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let err = resolve(&mut board, CellIndex::new(4, 0)).unwrap_err();
            assert!(matches!(err, GameError::OutOfBounds { .. }));
        }
    }
}
