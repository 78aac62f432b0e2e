//! The level orchestrator.
//!
//! [`Game`] is the per-frame driver. It owns the board, the conflict
//! resolver, the deferred-task [`Scheduler`], the gesture tracker and the
//! only RNG in the core, and it defines the order in which everything runs.
//!
//! # Level states
//!
//! ```text
//! Playing --(resolution leaves no conflicts)--> Won --(win delay)--> Playing
//!    |                                           |
//!    +------------(manual_reset)-----------------+--> Resetting --(flourish)--> Playing
//! ```
//!
//! Gestures are only accepted while `Playing` and while no swap or
//! resolution is in flight.
//!
//! # Frame order
//!
//! [`Game::update`] runs, in order:
//! 1. cell lock countdowns
//! 2. every actor's state machine (against a pose snapshot)
//! 3. cross-actor effects: knockbacks and their reverts
//! 4. deferred tasks that came due
//! 5. the pending resolution, once the dragged actor has settled
//! 6. the pending win check of a command swap, once its actors have settled
//!
//! The win check runs right after a resolution or a settled command swap,
//! never mid-animation.
//!
//! # Example
//!
//! ```
//! use roomswap_core::board::BoardLayout;
//! use roomswap_core::config::GameConfig;
//! use roomswap_core::game::Game;
//! use roomswap_core::output::LevelState;
//! use roomswap_core::spawn::SpawnTable;
//!
//! let layout = BoardLayout::reference();
//! let mut spawner = SpawnTable::for_layout(&layout);
//! let mut game = Game::new(&layout, &mut spawner, GameConfig::default()).unwrap();
//!
//! for _ in 0..60 {
//!     game.update(1.0 / 60.0).unwrap();
//! }
//! assert_eq!(game.level_state(), LevelState::Playing);
//! assert_eq!(game.snapshot().actors.len(), 8);
//! ```

mod scheduler;

pub use scheduler::{DeferredTask, Scheduler};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::actor::{ActorEffect, ActorFlags, ActorId, Reaction};
use crate::board::{BoardLayout, CellIndex, GridBoard};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::input::{Gesture, GestureTracker, Swipe};
use crate::output::{
    ActorView, CellView, GameEvent, GameSnapshot, LevelState, RejectReason, ResetReason,
};
use crate::resolver::{ConflictResolver, Resolution};
use crate::spawn::Spawner;

/// A user swap waiting for its tile to settle before resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PendingResolution {
    cell: CellIndex,
    actor: ActorId,
}

/// A command swap waiting for its actors to settle before the win check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingWinCheck {
    actors: Vec<ActorId>,
}

/// The level: board, resolver, timers and input state.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    board: GridBoard,
    resolver: ConflictResolver,
    scheduler: Scheduler,
    tracker: GestureTracker,
    pending: Option<PendingResolution>,
    win_check: Option<PendingWinCheck>,
    level: LevelState,
    won: bool,
    frame: u64,
    rng: ChaCha8Rng,
    events: Vec<GameEvent>,
}

impl Game {
    /// Builds the board, shuffles it and enters `Playing`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation and
    /// [`GameError::MissingSpawn`] if the spawner cannot populate a cell.
    pub fn new(
        layout: &BoardLayout,
        spawner: &mut dyn Spawner,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let board = GridBoard::new(layout, spawner, &config.board)?;
        let mut game = Self {
            resolver: ConflictResolver::new(config.resolver.clone()),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            board,
            scheduler: Scheduler::new(),
            tracker: GestureTracker::new(),
            pending: None,
            win_check: None,
            level: LevelState::Playing,
            won: false,
            frame: 0,
            events: Vec::new(),
        };
        let solved = game
            .board
            .shuffle(game.config.board.shuffle_iterations, &mut game.rng);
        info!(
            width = game.board.width(),
            height = game.board.height(),
            seed = game.config.seed,
            solved,
            "Level ready"
        );
        Ok(game)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current level state.
    #[must_use]
    pub const fn level_state(&self) -> LevelState {
        self.level
    }

    /// True from the win until the board is reset.
    #[must_use]
    pub const fn is_won(&self) -> bool {
        self.won
    }

    /// Seconds until a pending reset, for the UI countdown.
    #[must_use]
    pub fn reset_countdown(&self) -> Option<f32> {
        self.scheduler.reset_countdown()
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &GridBoard {
        &self.board
    }

    /// The configuration the game was built with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Frames advanced so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// The deferred-task queue.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// True while a user swap is waiting to be resolved.
    #[must_use]
    pub const fn resolution_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True while a command swap is waiting for its win check.
    #[must_use]
    pub const fn win_check_pending(&self) -> bool {
        self.win_check.is_some()
    }

    /// Drains events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Authoritative view of every actor and cell.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let conflicting = self.board.conflicting_cells();
        GameSnapshot {
            level: self.level,
            won: self.won,
            reset_countdown: self.reset_countdown(),
            selected: self.tracker.selected(),
            drag_offset: self.tracker.drag_offset(),
            actors: self.board.actors().iter().map(ActorView::from).collect(),
            cells: self
                .board
                .cells()
                .map(|cell| CellView::new(cell, conflicting.contains(&cell.index)))
                .collect(),
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Feeds one decoded gesture.
    ///
    /// Rejected gestures are recorded as [`GameEvent::GestureRejected`] and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Only invariant violations surface: a swap between cells the tracker
    /// produced is always on the grid.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> Result<(), GameError> {
        match gesture {
            Gesture::PointerDown { col, row } => {
                let cell = CellIndex::clamped(col, row, self.board.width(), self.board.height());
                if let Err(reason) = self.press(cell) {
                    self.reject(reason);
                }
            }
            Gesture::PointerDrag { delta } => self.tracker.drag(delta),
            Gesture::PointerUp => self.release()?,
        }
        Ok(())
    }

    fn press(&mut self, cell: CellIndex) -> Result<(), RejectReason> {
        self.accepting_input()?;
        let target = self.board.cell(cell).ok_or(RejectReason::EmptyCell)?;
        let id = target.occupant.ok_or(RejectReason::EmptyCell)?;
        if target.locked {
            return Err(RejectReason::Locked);
        }
        let actor = self.board.actors().get(id).ok_or(RejectReason::EmptyCell)?;
        if actor.is_frozen() {
            return Err(RejectReason::Frozen);
        }
        if actor.is_busy() {
            return Err(RejectReason::Busy);
        }

        self.clear_selection();
        self.tracker.press(cell);
        if let Some(actor) = self.board.actors_mut().get_mut(id) {
            actor.set_flag(ActorFlags::SELECTED, true);
        }
        debug!(cell = %cell, actor = %id, "Source selected");
        Ok(())
    }

    fn release(&mut self) -> Result<(), GameError> {
        let Some((source, drag)) = self.tracker.release() else {
            self.reject(RejectReason::NoSelection);
            return Ok(());
        };
        self.clear_selected_flags();

        let target = match self.swipe_target(source, drag) {
            Ok(target) => target,
            Err(reason) => {
                self.reject(reason);
                return Ok(());
            }
        };

        let actor = self.board.occupant(source);
        self.board.swap(source, target, true)?;
        self.events.push(GameEvent::SwapStarted {
            from: source,
            to: target,
            actor,
        });
        if let Some(actor) = actor {
            self.pending = Some(PendingResolution {
                cell: target,
                actor,
            });
        }
        info!(from = %source, to = %target, "Swap started");
        Ok(())
    }

    /// Validates a released drag and returns the empty cell it swipes into.
    fn swipe_target(&self, source: CellIndex, drag: glam::Vec2) -> Result<CellIndex, RejectReason> {
        self.accepting_input()?;
        if self.board.is_locked(source) {
            return Err(RejectReason::Locked);
        }
        let swipe =
            Swipe::from_drag(drag, self.config.swipe_dead_zone).ok_or(RejectReason::NoSwipe)?;
        let target = swipe.target(source, self.board.width(), self.board.height());
        let free = self.board.cell(target).is_some_and(|cell| cell.is_empty());
        if target == source || !free || !source.is_adjacent(target) {
            return Err(RejectReason::TargetOccupied);
        }
        if self.board.is_locked(target) {
            return Err(RejectReason::Locked);
        }
        Ok(target)
    }

    fn accepting_input(&self) -> Result<(), RejectReason> {
        if self.level != LevelState::Playing {
            return Err(RejectReason::NotPlaying);
        }
        if self.pending.is_some() || self.win_check.is_some() {
            return Err(RejectReason::Busy);
        }
        Ok(())
    }

    fn reject(&mut self, reason: RejectReason) {
        debug!(reason = %reason, level = %self.level, "Gesture rejected");
        self.events.push(GameEvent::GestureRejected { reason });
    }

    fn clear_selection(&mut self) {
        self.tracker.cancel();
        self.clear_selected_flags();
    }

    fn clear_selected_flags(&mut self) {
        for actor in self.board.actors_mut().iter_mut() {
            actor.set_flag(ActorFlags::SELECTED, false);
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Starts an animated swap of two arbitrary cells and checks for a win
    /// once the moved actors have settled.
    ///
    /// No adjacency rule applies. Returns `Ok(false)` without doing anything
    /// unless the level is `Playing` with no resolution or win check pending.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] for off-grid cells,
    /// [`GameError::CellLocked`] if either cell is locked and
    /// [`GameError::ActorBusy`] if either occupant is still moving or attacking.
    pub fn swap_cells(&mut self, a: CellIndex, b: CellIndex) -> Result<bool, GameError> {
        if self.level != LevelState::Playing || self.pending.is_some() || self.win_check.is_some() {
            debug!(level = %self.level, "Swap ignored");
            return Ok(false);
        }
        for cell in [a, b] {
            if self.board.cell(cell).is_none() {
                return Err(GameError::OutOfBounds {
                    cell,
                    width: self.board.width(),
                    height: self.board.height(),
                });
            }
            if self.board.is_locked(cell) {
                return Err(GameError::CellLocked { cell });
            }
            let busy = self
                .board
                .occupant(cell)
                .and_then(|id| self.board.actors().get(id))
                .is_some_and(|actor| actor.is_busy());
            if busy {
                return Err(GameError::ActorBusy { cell });
            }
        }

        let actor = self.board.occupant(a);
        let moved: Vec<ActorId> = [actor, self.board.occupant(b)]
            .into_iter()
            .flatten()
            .collect();
        self.board.swap(a, b, true)?;
        self.events.push(GameEvent::SwapStarted {
            from: a,
            to: b,
            actor,
        });
        if moved.is_empty() {
            if self.board.check_win() {
                self.enter_won();
            }
        } else {
            self.win_check = Some(PendingWinCheck { actors: moved });
        }
        Ok(true)
    }

    /// One animated swap between two uniformly random cells (possibly the
    /// same one), followed by a win check once it settles.
    ///
    /// Ignored unless `Playing` and idle; a pick that hits a locked cell is
    /// skipped. Returns whether a swap was made.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Game::swap_cells`] other than a lock or a
    /// busy actor.
    pub fn random_swap(&mut self) -> Result<bool, GameError> {
        if self.level != LevelState::Playing
            || self.pending.is_some()
            || self.win_check.is_some()
            || self.board.actors().any_busy()
        {
            debug!(level = %self.level, "Random swap ignored");
            return Ok(false);
        }
        let a = self.board.random_cell(&mut self.rng);
        let b = self.board.random_cell(&mut self.rng);
        match self.swap_cells(a, b) {
            Err(GameError::CellLocked { cell }) => {
                debug!(cell = %cell, "Random swap hit a locked cell");
                Ok(false)
            }
            Err(GameError::ActorBusy { cell }) => {
                debug!(cell = %cell, "Random swap hit a busy actor");
                Ok(false)
            }
            other => other,
        }
    }

    /// Knocks every actor back, then after the flourish delay shuffles the
    /// board and returns to `Playing`.
    ///
    /// Cancels any pending win reset. Returns false if a manual reset is
    /// already running.
    pub fn manual_reset(&mut self) -> bool {
        if self.level == LevelState::Resetting {
            debug!("Manual reset already running");
            return false;
        }
        self.scheduler.clear();
        self.clear_selection();
        self.pending = None;
        self.win_check = None;
        self.level = LevelState::Resetting;

        let center = self.board.center();
        // Outlasts the flourish so the reset is what ends it.
        let duration = self.config.manual_reset_delay + self.config.actor.knockback_grace;
        let config = &self.config.actor;
        let rng = &mut self.rng;
        for actor in self.board.actors_mut().iter_mut() {
            actor.set_flag(ActorFlags::FROZEN, true);
            actor.spawn_knockback(center, duration, config, &mut *rng);
        }
        self.scheduler.schedule(
            self.config.manual_reset_delay,
            DeferredTask::ResetBoard {
                reason: ResetReason::Manual,
            },
        );
        info!(delay = self.config.manual_reset_delay, "Manual reset started");
        true
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Advances the level by `dt` seconds.
    ///
    /// Negative or non-finite deltas are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptySourceCell`] if a pending resolution finds
    /// its cell empty, which indicates a bug; the resolution is dropped.
    pub fn update(&mut self, dt: f32) -> Result<(), GameError> {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "Ignoring invalid frame delta");
            return Ok(());
        }
        self.frame += 1;

        for cell in self.board.tick_locks(dt) {
            trace!(cell = %cell, "Cell unlocked");
        }

        let effects = self.board.actors_mut().update(dt, &self.config.actor);
        self.apply_effects(effects)?;

        for task in self.scheduler.tick(dt) {
            self.run_task(task)?;
        }

        self.try_resolve()?;
        self.try_win_check();
        Ok(())
    }

    fn apply_effects(&mut self, effects: Vec<ActorEffect>) -> Result<(), GameError> {
        for effect in effects {
            match effect {
                ActorEffect::StrikeLanded {
                    attacker,
                    target,
                    force_position,
                } => {
                    let duration = self.config.actor.knockback_duration;
                    if let Some(actor) = self.board.actors_mut().get_mut(target) {
                        actor.spawn_knockback(
                            force_position,
                            duration,
                            &self.config.actor,
                            &mut self.rng,
                        );
                    }
                    info!(attacker = %attacker, target = %target, "Strike landed");
                    self.events
                        .push(GameEvent::StrikeLanded { attacker, target });
                }
                ActorEffect::AttackFinished { attacker, target } => {
                    let grace = self.config.actor.knockback_grace;
                    if let Some(actor) = self.board.actors_mut().get_mut(target) {
                        actor.schedule_knockback_revert(grace);
                    }
                    if let Some(cell) = self.board.cell_of(target) {
                        self.board.release_lock(cell, grace)?;
                    }
                    trace!(attacker = %attacker, target = %target, grace, "Attack finished");
                }
                ActorEffect::KnockbackReverted { actor } => {
                    self.events.push(GameEvent::KnockbackReverted { actor });
                }
            }
        }
        Ok(())
    }

    fn run_task(&mut self, task: DeferredTask) -> Result<(), GameError> {
        match task {
            DeferredTask::UnfreezeAll => {
                ConflictResolver::unfreeze_all(&mut self.board);
                Ok(())
            }
            DeferredTask::ResetBoard { reason } => {
                self.reset_board(reason);
                Ok(())
            }
        }
    }

    fn try_resolve(&mut self) -> Result<(), GameError> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        if self.level != LevelState::Playing {
            self.pending = None;
            return Ok(());
        }
        let settled = self
            .board
            .actors()
            .get(pending.actor)
            .is_some_and(|actor| !actor.is_busy() && !actor.in_animation());
        if !settled {
            return Ok(());
        }
        self.pending = None;

        let resolution =
            self.resolver
                .resolve(&mut self.board, pending.cell, &self.config.actor)?;
        self.record_resolution(&resolution);
        self.scheduler
            .schedule(self.resolver.config().grace_window, DeferredTask::UnfreezeAll);

        if self.board.check_win() {
            self.enter_won();
        }
        Ok(())
    }

    fn try_win_check(&mut self) {
        let Some(check) = &self.win_check else {
            return;
        };
        if self.level != LevelState::Playing {
            self.win_check = None;
            return;
        }
        let moving = check.actors.iter().any(|&id| {
            self.board
                .actors()
                .get(id)
                .is_some_and(|actor| actor.is_busy() || actor.in_animation())
        });
        if moving {
            return;
        }
        self.win_check = None;
        if self.board.check_win() {
            self.enter_won();
        }
    }

    fn record_resolution(&mut self, resolution: &Resolution) {
        self.events.push(GameEvent::ResolutionStarted {
            source: resolution.source,
            attacker: resolution.attacker,
        });
        for attack in &resolution.attacks {
            info!(
                attacker = %attack.attacker,
                target = %attack.target,
                cell = %attack.target_cell,
                "Attack issued"
            );
            self.events.push(GameEvent::AttackIssued {
                attacker: attack.attacker,
                target: attack.target,
                target_cell: attack.target_cell,
            });
        }
        for reaction in &resolution.reactions {
            self.events.push(GameEvent::ReactionIssued {
                actor: reaction.actor,
                reaction: reaction.reaction,
            });
        }
        self.events.push(GameEvent::ResolutionFinished {
            attacks: resolution.attacks.len(),
        });
    }

    fn enter_won(&mut self) {
        self.level = LevelState::Won;
        self.won = true;
        self.clear_selection();
        let config = &self.config.actor;
        for actor in self.board.actors_mut().iter_mut() {
            actor.play_reaction(Reaction::Celebrate, config);
        }
        self.scheduler.cancel_resets();
        self.scheduler.schedule(
            self.config.win_reset_delay,
            DeferredTask::ResetBoard {
                reason: ResetReason::Win,
            },
        );
        self.events.push(GameEvent::Won);
        info!(frame = self.frame, reset_in = self.config.win_reset_delay, "Board solved");
    }

    fn reset_board(&mut self, reason: ResetReason) {
        self.scheduler.clear();
        self.pending = None;
        self.win_check = None;
        self.clear_selection();
        self.board.clear_locks();
        let solved = self
            .board
            .shuffle(self.config.board.shuffle_iterations, &mut self.rng);
        for actor in self.board.actors_mut().iter_mut() {
            actor.teleport_to_rest();
            actor.set_flag(ActorFlags::FROZEN | ActorFlags::SELECTED, false);
        }
        self.level = LevelState::Playing;
        self.won = false;
        self.events.push(GameEvent::BoardReset { reason });
        info!(?reason, solved, "Board reset");
    }
}
