//! Room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the single-writer discipline: player
//! commands, transport disconnects, the phase deadline, and the
//! housekeeping sweep all arrive through one `select!` loop, so no two
//! mutations of a room's state can ever interleave. Rooms are fully
//! independent units of concurrency — nothing here blocks another room.
//!
//! The only awaited operation in the whole quiz flow — fetching questions
//! from the content collaborator — happens in the connection handler
//! BEFORE the start command is sent, so the actor body is free of
//! suspension points while holding state.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior, interval_at};
use trivium_content::Question;
use trivium_protocol::{
    GameOptions, Phase, PlayerDelta, PlayerToken, RoomCode, ServerEvent,
};
use trivium_session::{AttachOutcome, EventSink, Roster, RosterConfig};
use trivium_timer::PhaseTimer;
use trivium_transport::ConnectionId;

use crate::registry::{RegistryStats, RoomRegistry};
use crate::{RoomConfig, RoomError, scoring};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` channel report per-request success or failure
/// to the caller only; the actor never broadcasts a rejection.
pub(crate) enum RoomCommand {
    /// Bind a connection to the player identified by `token`
    /// (first join and reconnection both land here).
    Join {
        conn: ConnectionId,
        sink: EventSink,
        token: PlayerToken,
        name: String,
        avatar: Option<String>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player for good (explicit leave, no grace period).
    Leave {
        token: PlayerToken,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Transport-level disconnect: start the reconnection grace period.
    /// Fire-and-forget — a vanished connection has nobody to reply to.
    Disconnect { conn: ConnectionId },

    /// Host command: snapshot the (already fetched) questions and begin.
    Start {
        token: PlayerToken,
        questions: Vec<Question>,
        options: GameOptions,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Player answer for the question at `question_index`.
    Answer {
        token: PlayerToken,
        question_index: usize,
        choice_index: usize,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Host command: close the current answer window immediately.
    Skip {
        token: PlayerToken,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Host command: jump to the final leaderboard, or dismiss a
    /// finished room.
    End {
        token: PlayerToken,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Request a metadata snapshot (observability and tests).
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },
}

/// A point-in-time view of room metadata (not the full game state).
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub phase: Phase,
    pub current_index: usize,
    pub question_count: usize,
    pub players: usize,
    pub connected_players: usize,
    pub host: PlayerToken,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone — an `mpsc::Sender`
/// wrapper. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's shareable code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Binds a connection + token to this room (join or reconnect).
    pub async fn join(
        &self,
        conn: ConnectionId,
        sink: EventSink,
        token: PlayerToken,
        name: String,
        avatar: Option<String>,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            conn,
            sink,
            token,
            name,
            avatar,
            reply,
        })
        .await?
    }

    /// Removes a player for good.
    pub async fn leave(&self, token: PlayerToken) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { token, reply }).await?
    }

    /// Reports a transport-level disconnect (starts the grace period).
    pub async fn disconnect(&self, conn: ConnectionId) {
        let _ = self.sender.send(RoomCommand::Disconnect { conn }).await;
    }

    /// Starts the game with an already-fetched question snapshot.
    pub async fn start(
        &self,
        token: PlayerToken,
        questions: Vec<Question>,
        options: GameOptions,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start {
            token,
            questions,
            options,
            reply,
        })
        .await?
    }

    /// Submits an answer for the question at `question_index`.
    pub async fn submit_answer(
        &self,
        token: PlayerToken,
        question_index: usize,
        choice_index: usize,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Answer {
            token,
            question_index,
            choice_index,
            reply,
        })
        .await?
    }

    /// Host: close the current answer window immediately.
    pub async fn skip_question(&self, token: PlayerToken) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Skip { token, reply }).await?
    }

    /// Host: jump to the final leaderboard / dismiss a finished room.
    pub async fn end_game(&self, token: PlayerToken) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::End { token, reply }).await?
    }

    /// Fetches a metadata snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Tag carried by the phase deadline: the (phase, index) it was armed for.
/// Checked against current state when the deadline fires, so a stale timer
/// can never advance a room that already transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseTag {
    phase: Phase,
    index: usize,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    host: PlayerToken,
    phase: Phase,
    /// Immutable snapshot taken at game start; empty while in the lobby.
    questions: Vec<Question>,
    current: usize,
    /// When the active question's window opened; answer latency baseline.
    question_opened_at: Option<Instant>,
    roster: Roster,
    timer: PhaseTimer<PhaseTag>,
    sweep: Interval,
    config: RoomConfig,
    registry: Arc<RoomRegistry>,
    stats: Arc<RegistryStats>,
    last_activity: Instant,
    /// Set when the last connected player goes away; drives eviction.
    empty_since: Option<Instant>,
    /// Whether this room still counts toward `active_rooms`.
    counted_active: bool,
    closing: bool,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until dismissal or eviction.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room opened");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                tag = self.timer.fired() => self.on_deadline(tag),
                _ = self.sweep.tick() => self.on_sweep(),
            }
            if self.closing {
                break;
            }
        }

        self.finalize();
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                conn,
                sink,
                token,
                name,
                avatar,
                reply,
            } => {
                let result = self.handle_join(conn, sink, token, name, avatar);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { token, reply } => {
                let _ = reply.send(self.handle_leave(token));
            }
            RoomCommand::Disconnect { conn } => self.handle_disconnect(conn),
            RoomCommand::Start {
                token,
                questions,
                options,
                reply,
            } => {
                let _ = reply.send(self.handle_start(token, questions, options));
            }
            RoomCommand::Answer {
                token,
                question_index,
                choice_index,
                reply,
            } => {
                let _ = reply.send(self.handle_answer(token, question_index, choice_index));
            }
            RoomCommand::Skip { token, reply } => {
                let _ = reply.send(self.handle_skip(token));
            }
            RoomCommand::End { token, reply } => {
                let _ = reply.send(self.handle_end(token));
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    // -- Membership -------------------------------------------------------

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        sink: EventSink,
        token: PlayerToken,
        name: String,
        avatar: Option<String>,
    ) -> Result<(), RoomError> {
        // The cap and the finished-game check apply to new members only;
        // a reconnecting token already holds a seat (and may still want
        // the final leaderboard).
        if self.roster.get(&token).is_none() {
            if self.phase == Phase::GameOver {
                return Err(RoomError::InvalidTransition(
                    "this game is already over".into(),
                ));
            }
            if self.roster.len() >= self.config.max_players {
                return Err(RoomError::RoomFull(self.code.clone()));
            }
        }

        let outcome = self.roster.attach(conn, sink, token.clone(), name, avatar);
        match outcome {
            AttachOutcome::Joined(_) | AttachOutcome::Reconnected(_) => {
                self.stats.player_online();
            }
            // One live connection before, one after.
            AttachOutcome::Superseded { .. } => {}
        }

        self.empty_since = None;
        self.touch();
        self.broadcast_room_state();

        // `room_state` carries no question text, so a player arriving
        // mid-question additionally gets the open question directly.
        if self.phase == Phase::QuestionActive {
            self.roster.send_to(&token, self.question_started_event());
        }

        Ok(())
    }

    fn handle_leave(&mut self, token: PlayerToken) -> Result<(), RoomError> {
        let Some(player) = self.roster.remove(&token) else {
            return Err(RoomError::InvalidTransition(
                "not a member of this room".into(),
            ));
        };

        if player.connected() {
            self.stats.player_offline();
        }
        if token == self.host {
            self.transfer_host();
        }
        if self.roster.connected_count() == 0 {
            self.mark_empty();
        }
        self.touch();
        self.broadcast_room_state();
        if self.phase == Phase::QuestionActive {
            self.maybe_advance_early();
        }
        Ok(())
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        // Stale ids (superseded connections) resolve to None and change
        // nothing.
        if self.roster.detach(conn).is_none() {
            return;
        }

        self.stats.player_offline();
        if self.roster.connected_count() == 0 {
            self.mark_empty();
        }
        self.broadcast_room_state();
        if self.phase == Phase::QuestionActive {
            self.maybe_advance_early();
        }
    }

    // -- Host commands ----------------------------------------------------

    fn handle_start(
        &mut self,
        token: PlayerToken,
        mut questions: Vec<Question>,
        options: GameOptions,
    ) -> Result<(), RoomError> {
        if self.phase != Phase::Lobby {
            return Err(RoomError::InvalidTransition(format!(
                "cannot start a game in phase {}",
                self.phase
            )));
        }
        self.require_host(&token)?;
        if self.roster.connected_count() == 0 {
            return Err(RoomError::InvalidTransition(
                "no connected players".into(),
            ));
        }

        if options.shuffle_questions {
            use rand::seq::SliceRandom;
            questions.shuffle(&mut rand::rng());
        }
        if let Some(limit) = options.question_limit {
            questions.truncate(limit);
        }
        if questions.is_empty() {
            return Err(RoomError::InvalidTransition(
                "no questions to play".into(),
            ));
        }

        tracing::info!(
            room = %self.code,
            questions = questions.len(),
            players = self.roster.len(),
            "game started"
        );
        self.questions = questions;
        self.begin_question(0);
        Ok(())
    }

    fn handle_skip(&mut self, token: PlayerToken) -> Result<(), RoomError> {
        self.require_host(&token)?;
        if self.phase != Phase::QuestionActive {
            return Err(RoomError::InvalidTransition(format!(
                "no question to skip in phase {}",
                self.phase
            )));
        }
        tracing::debug!(room = %self.code, index = self.current, "question skipped by host");
        self.enter_reveal();
        Ok(())
    }

    fn handle_end(&mut self, token: PlayerToken) -> Result<(), RoomError> {
        self.require_host(&token)?;
        if self.phase == Phase::GameOver {
            // Second end_game is the host dismissing the room.
            tracing::info!(room = %self.code, "room dismissed by host");
            self.closing = true;
        } else {
            self.enter_game_over();
        }
        Ok(())
    }

    fn require_host(&self, token: &PlayerToken) -> Result<(), RoomError> {
        if *token != self.host {
            return Err(RoomError::InvalidTransition(
                "only the host may do that".into(),
            ));
        }
        Ok(())
    }

    // -- Answers ----------------------------------------------------------

    fn handle_answer(
        &mut self,
        token: PlayerToken,
        question_index: usize,
        choice_index: usize,
    ) -> Result<(), RoomError> {
        if !self.phase.accepts_answers() {
            return Err(RoomError::InvalidTransition(format!(
                "no answer window is open in phase {}",
                self.phase
            )));
        }
        if question_index != self.current {
            return Err(RoomError::InvalidAnswer(format!(
                "question {question_index} is not the active question"
            )));
        }
        let option_count = self.questions[self.current].options.len();
        if choice_index >= option_count {
            return Err(RoomError::InvalidAnswer(format!(
                "choice {choice_index} out of range (question has {option_count} options)"
            )));
        }

        let latency = self
            .question_opened_at
            .map(|t| t.elapsed())
            .unwrap_or_default();
        self.roster
            .record_answer(&token, question_index, choice_index, latency)?;

        self.touch();
        self.maybe_advance_early();
        Ok(())
    }

    /// Advance out of the answer window as soon as every connected player
    /// has answered. Disconnected players don't count, so a dropped
    /// connection can neither stall nor shortcut the room.
    fn maybe_advance_early(&mut self) {
        if self.phase == Phase::QuestionActive
            && self.roster.all_connected_answered(self.current)
        {
            tracing::debug!(
                room = %self.code,
                index = self.current,
                "all connected players answered"
            );
            self.enter_reveal();
        }
    }

    // -- Timers -----------------------------------------------------------

    /// A phase deadline fired. The tag is validated against current state
    /// before acting; transitions always re-arm or clear, so a mismatch
    /// means a stale fire that must be dropped.
    fn on_deadline(&mut self, tag: PhaseTag) {
        let expected = PhaseTag {
            phase: self.phase,
            index: self.current,
        };
        if tag != expected {
            tracing::debug!(room = %self.code, ?tag, ?expected, "stale deadline ignored");
            self.timer.clear();
            return;
        }

        match self.phase {
            Phase::QuestionActive => self.enter_reveal(),
            Phase::Reveal => self.enter_scoreboard(),
            Phase::Scoreboard => self.advance_or_finish(),
            Phase::Lobby | Phase::GameOver => self.timer.clear(),
        }
    }

    /// Housekeeping: grace-period expiry, host succession, eviction.
    fn on_sweep(&mut self) {
        let removed = self.roster.expire_overdue();
        if !removed.is_empty() {
            if removed.iter().any(|p| *p.token() == self.host) {
                self.transfer_host();
            }
            self.broadcast_room_state();
            if self.phase == Phase::QuestionActive {
                self.maybe_advance_early();
            }
        }

        if self.roster.connected_count() == 0 {
            self.mark_empty();
        }

        if let Some(since) = self.empty_since {
            if since.elapsed() >= self.config.idle_timeout {
                tracing::info!(room = %self.code, "idle room evicted");
                self.closing = true;
                return;
            }
        }
        if self.phase == Phase::GameOver
            && self.last_activity.elapsed() >= self.config.idle_timeout
        {
            tracing::info!(room = %self.code, "finished room evicted");
            self.closing = true;
        }
    }

    // -- Phase transitions ------------------------------------------------

    fn begin_question(&mut self, index: usize) {
        debug_assert!(index < self.questions.len());
        self.phase = Phase::QuestionActive;
        self.current = index;
        self.question_opened_at = Some(Instant::now());
        self.timer.arm(
            self.config.answer_window,
            PhaseTag {
                phase: Phase::QuestionActive,
                index,
            },
        );
        self.touch();
        self.roster.broadcast(&self.question_started_event());
    }

    /// Close the answer window: score the collected answers exactly once,
    /// then disclose the correct choice and everyone's delta.
    fn enter_reveal(&mut self) {
        let correct_index = self.questions[self.current].correct_index;
        let window = self.config.answer_window;

        let mut deltas = Vec::with_capacity(self.roster.len());
        let mut awards = Vec::new();
        for player in self.roster.players() {
            let (delta, correct) = match player.answer(self.current) {
                Some(answer) if answer.choice == correct_index => (
                    scoring::points_awarded(answer.latency, window, &self.config),
                    true,
                ),
                _ => (0, false),
            };
            if delta > 0 {
                awards.push((player.token().clone(), delta));
            }
            deltas.push(PlayerDelta {
                id: player.id(),
                delta,
                correct,
            });
        }
        for (token, delta) in awards {
            self.roster.add_score(&token, delta);
        }

        self.phase = Phase::Reveal;
        self.timer.arm(
            self.config.reveal_duration,
            PhaseTag {
                phase: Phase::Reveal,
                index: self.current,
            },
        );
        self.touch();
        self.roster.broadcast(&ServerEvent::AnswerResult {
            correct_index,
            deltas,
        });
    }

    fn enter_scoreboard(&mut self) {
        self.phase = Phase::Scoreboard;
        self.timer.arm(
            self.config.scoreboard_duration,
            PhaseTag {
                phase: Phase::Scoreboard,
                index: self.current,
            },
        );
        self.touch();
        self.roster.broadcast(&ServerEvent::Leaderboard {
            ranked: self.roster.ranked(),
        });
    }

    fn advance_or_finish(&mut self) {
        if self.current + 1 == self.questions.len() {
            self.enter_game_over();
        } else {
            self.begin_question(self.current + 1);
        }
    }

    fn enter_game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.timer.clear();
        if self.counted_active {
            self.stats.room_closed();
            self.counted_active = false;
        }
        self.touch();
        tracing::info!(room = %self.code, "game over");
        self.roster.broadcast(&ServerEvent::GameOver {
            final_ranked: self.roster.ranked(),
        });
    }

    // -- Helpers ----------------------------------------------------------

    fn transfer_host(&mut self) {
        if let Some(next) = self.roster.earliest_connected() {
            tracing::info!(
                room = %self.code,
                from = %self.host,
                to = %next.token(),
                "host privileges transferred"
            );
            self.host = next.token().clone();
        }
        // Nobody connected: leave the host as-is; the room is on its way
        // to eviction anyway.
    }

    fn mark_empty(&mut self) {
        if self.empty_since.is_none() {
            self.empty_since = Some(Instant::now());
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn question_started_event(&self) -> ServerEvent {
        let question = &self.questions[self.current];
        ServerEvent::QuestionStarted {
            question_index: self.current,
            text: question.text.clone(),
            options: question.options.clone(),
            deadline_ms: self
                .timer
                .remaining()
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }

    fn room_state_event(&self) -> ServerEvent {
        ServerEvent::RoomState {
            phase: self.phase,
            current_index: self.current,
            deadline_ms: self.timer.remaining().map(|d| d.as_millis() as u64),
            players: self.roster.summaries(),
        }
    }

    fn broadcast_room_state(&self) {
        self.roster.broadcast(&self.room_state_event());
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            current_index: self.current,
            question_count: self.questions.len(),
            players: self.roster.len(),
            connected_players: self.roster.connected_count(),
            host: self.host.clone(),
        }
    }

    /// Terminal cleanup: deregister, settle the global counters, done.
    fn finalize(&mut self) {
        if self.counted_active {
            self.stats.room_closed();
            self.counted_active = false;
        }
        for _ in 0..self.roster.connected_count() {
            self.stats.player_offline();
        }
        self.registry.remove(&self.code);
        tracing::info!(room = %self.code, "room closed");
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The host is NOT joined here — the registry joins them through the
/// handle right after, so creation and first join share one code path
/// with every later join.
pub(crate) fn spawn_room(
    code: RoomCode,
    host: PlayerToken,
    config: RoomConfig,
    command_buffer: usize,
    registry: Arc<RoomRegistry>,
    stats: Arc<RegistryStats>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(command_buffer);

    // First tick one full period out: the host's join must never race a
    // sweep on a brand-new room.
    let mut sweep = interval_at(
        tokio::time::Instant::now() + config.sweep_interval,
        config.sweep_interval,
    );
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let roster = Roster::new(RosterConfig {
        reconnect_grace: config.reconnect_grace,
    });

    stats.room_opened();

    let actor = RoomActor {
        code: code.clone(),
        host,
        phase: Phase::Lobby,
        questions: Vec::new(),
        current: 0,
        question_opened_at: None,
        roster,
        timer: PhaseTimer::new(),
        sweep,
        config,
        registry,
        stats,
        last_activity: Instant::now(),
        empty_since: None,
        counted_active: true,
        closing: false,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
