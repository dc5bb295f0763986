//! The per-session device driver state machine.
//!
//! A [`CliDriver`] owns one interactive CLI session: it writes commands
//! through its [`Transport`], accumulates inbound bytes until a vendor
//! prompt appears, and advances a state machine that sequences the
//! multi-step operations (enter config, apply lines, commit, abort,
//! rollback). Operations are asynchronous in the callback sense: they
//! return immediately after sending the first command, and completion is
//! signaled through the callback from within [`handle_data`](CliDriver::handle_data).
//!
//! The driver is strictly single-in-flight: only a `Ready` driver accepts a
//! new operation, and callers feeding `handle_data` must serialize calls
//! (an event loop or a per-driver lock both satisfy this).

use std::collections::VecDeque;
use std::mem;

use log::{debug, error, warn};

use crate::buffer::InputBuffer;
use crate::error::DriverError;
use crate::transport::Transport;
use crate::vendor::{DeviceInfo, DeviceKind, VendorProfile};

use super::extract::extract_output;
use super::state::{is_valid_transition, DriverState};

/// Completion callback for driver operations.
///
/// Command execution resolves to the extracted response body; the
/// configuration and rollback operations resolve to the session log. The
/// commit-failure outcome arrives as
/// [`DriverError::CommitFailed`] with the session log attached.
pub type OperationCallback = Box<dyn FnOnce(Result<String, DriverError>) + Send + 'static>;

/// Upper bound on session log accumulation for one operation.
const MAX_SESSION_LOG_BYTES: usize = 1024 * 1024;

const SESSION_LOG_TRUNCATED_MARKER: &str = "\n...[session log truncated]\n";

/// The single in-flight operation, if any.
///
/// Holding the callback and the per-operation queues in one variant keeps
/// the "at most one operation, with exactly the fields it needs" rule
/// enforced by construction.
enum Pending {
    Idle,
    /// `execute_command`: the echoed command is needed for extraction.
    Command {
        callback: OperationCallback,
        command: String,
    },
    /// `configure_and_commit`: `lines` holds the not-yet-sent config
    /// commands, `phase` the remaining commands of the current
    /// enter/commit/abort sequence.
    Config {
        callback: OperationCallback,
        lines: VecDeque<String>,
        phase: VecDeque<String>,
    },
    /// `rollback_configuration`: completes on the first prompt.
    Rollback { callback: OperationCallback },
}

impl Pending {
    fn is_idle(&self) -> bool {
        matches!(self, Pending::Idle)
    }
}

/// Driver for one live CLI session on a network device.
pub struct CliDriver {
    profile: VendorProfile,
    state: DriverState,
    transport: Box<dyn Transport>,
    /// Bytes received since the last consumed prompt.
    input: InputBuffer,
    /// Raw transcript of the current multi-step operation.
    session_log: Vec<u8>,
    session_log_truncated: bool,
    pending: Pending,
    /// Number of commits being reverted, while a rollback is in flight.
    rollback_depth: Option<u32>,
}

impl CliDriver {
    /// Create a driver for the given device family over `transport`.
    ///
    /// The driver starts in `initializing`; call
    /// [`initialize`](Self::initialize) once the transport is live.
    pub fn new(kind: DeviceKind, transport: Box<dyn Transport>) -> Self {
        Self {
            profile: VendorProfile::for_kind(kind),
            state: DriverState::Initializing,
            transport,
            input: InputBuffer::default(),
            session_log: Vec::new(),
            session_log_truncated: false,
            pending: Pending::Idle,
            rollback_depth: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Whether the driver can accept a new operation.
    pub fn is_ready(&self) -> bool {
        self.state == DriverState::Ready
    }

    /// Identity of the device family this driver speaks to.
    pub fn device_info(&self) -> DeviceInfo {
        self.profile.info()
    }

    /// Device family of this driver.
    pub fn kind(&self) -> DeviceKind {
        self.profile.kind()
    }

    /// Send the vendor session-setup commands and become ready.
    ///
    /// The init commands are emitted back-to-back without waiting for
    /// prompts: the session has already produced its first prompt by the
    /// time the transport delivers data, and the init responses are
    /// discarded by the ready-state prompt handling.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NotReady`] if the driver is past
    /// initialization, or [`DriverError::Disconnected`] if the transport
    /// refuses the commands.
    pub fn initialize(&mut self) -> Result<(), DriverError> {
        if self.state != DriverState::Initializing {
            return Err(DriverError::NotReady { state: self.state });
        }

        debug!(
            "initializing {} session ({} init commands)",
            self.profile.kind(),
            self.profile.init_commands().len()
        );

        for cmd in self.profile.init_commands() {
            if !self.send_line(cmd) {
                return Err(DriverError::Disconnected);
            }
        }

        self.transition(DriverState::Ready);
        Ok(())
    }

    /// Execute a single operational command.
    ///
    /// Sends `command` and, once the next prompt arrives, invokes
    /// `callback` with the response body (text between the command echo and
    /// the prompt, whitespace-trimmed). On a precondition violation the
    /// callback fires synchronously with [`DriverError::NotReady`] and the
    /// driver is untouched.
    pub fn execute_command(&mut self, callback: OperationCallback, command: &str) {
        if self.state != DriverState::Ready {
            callback(Err(DriverError::NotReady { state: self.state }));
            return;
        }

        debug!("execute_command: {command:?}");
        self.pending = Pending::Command {
            callback,
            command: command.to_string(),
        };
        if !self.transition(DriverState::ExecutingCommand) {
            return;
        }
        self.send_line(command);
    }

    /// Apply a configuration change set and commit it.
    ///
    /// Enters configuration mode, sends each line of `config_lines` gated
    /// on the preceding prompt, then runs the vendor commit sequence. On
    /// success the callback receives the session log; if the device rejects
    /// the commit the driver runs the vendor abort sequence and the
    /// callback receives [`DriverError::CommitFailed`] carrying the log.
    ///
    /// An empty change set still enters config mode and commits.
    pub fn configure_and_commit(&mut self, callback: OperationCallback, config_lines: Vec<String>) {
        if self.state != DriverState::Ready {
            callback(Err(DriverError::NotReady { state: self.state }));
            return;
        }

        debug!(
            "configure_and_commit: {} line(s) on {}",
            config_lines.len(),
            self.profile.kind()
        );

        self.reset_session_log();
        let phase: VecDeque<String> = self
            .profile
            .enter_config_commands()
            .iter()
            .map(|c| (*c).to_string())
            .collect();
        self.pending = Pending::Config {
            callback,
            lines: config_lines.into(),
            phase,
        };
        if !self.transition(DriverState::EnteringConfig) {
            return;
        }
        self.send_next_phase_command();
    }

    /// Revert the last `commits_back` committed configuration changes.
    ///
    /// Emits the vendor rollback command list in order; the first prompt
    /// observed afterwards completes the operation and the callback
    /// receives the session log. `commits_back` must be at least 1.
    pub fn rollback_configuration(&mut self, callback: OperationCallback, commits_back: u32) {
        if self.state != DriverState::Ready {
            callback(Err(DriverError::NotReady { state: self.state }));
            return;
        }
        if commits_back < 1 {
            callback(Err(DriverError::InvalidArgument {
                message: format!("commits_back must be at least 1, got {commits_back}"),
            }));
            return;
        }

        debug!(
            "rollback_configuration: {commits_back} commit(s) on {}",
            self.profile.kind()
        );

        self.reset_session_log();
        self.rollback_depth = Some(commits_back);
        self.pending = Pending::Rollback { callback };
        if !self.transition(DriverState::RollingBack) {
            return;
        }
        for cmd in self.profile.rollback_commands(commits_back) {
            if !self.send_line(&cmd) {
                return;
            }
        }
    }

    /// Feed inbound bytes from the transport.
    ///
    /// Appends to the input buffer, then advances the state machine once
    /// per complete prompt found, consuming the buffer only through each
    /// prompt line. Bytes consumed during a multi-step operation are
    /// appended to the session log, so output arriving after the
    /// completing prompt in the same chunk stays out of the log. Prompts
    /// split across chunks are handled by the accumulation; a prompt
    /// detected while no operation expects one is discarded.
    pub fn handle_data(&mut self, bytes: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(bytes);
        self.input.extend_stripped(&cleaned);

        // Several prompts may arrive in one chunk; each pass consumes
        // exactly one.
        while self.input.has_prompt_line(self.profile.prompt()) {
            self.step();
        }
    }

    /// Signal that the transport is gone.
    ///
    /// Any in-flight operation fails with [`DriverError::Disconnected`];
    /// repeated calls are no-ops, so the pending callback fires exactly
    /// once.
    pub fn notify_disconnected(&mut self) {
        if self.state == DriverState::Disconnected {
            return;
        }

        error!("transport lost in state {}", self.state);
        let pending = mem::replace(&mut self.pending, Pending::Idle);
        self.input.clear();
        self.session_log.clear();
        self.rollback_depth = None;
        debug!("state transition: {} -> disconnected", self.state);
        self.state = DriverState::Disconnected;

        Self::fail_pending(pending, DriverError::Disconnected);
    }

    /// Leave the error state and accept operations again.
    ///
    /// Returns `false` (and does nothing) unless the driver is in `error`.
    /// Recovery is the caller's decision; the driver never retries.
    pub fn recover(&mut self) -> bool {
        if self.state != DriverState::Error {
            return false;
        }
        debug!("state transition: error -> ready (recover)");
        self.input.clear();
        self.state = DriverState::Ready;
        true
    }

    /// Restart a disconnected session over a fresh transport.
    ///
    /// Returns `false` (and does nothing) unless the driver is in
    /// `disconnected`. The driver returns to `initializing`; call
    /// [`initialize`](Self::initialize) again.
    pub fn reset(&mut self, transport: Box<dyn Transport>) -> bool {
        if self.state != DriverState::Disconnected {
            return false;
        }
        debug!("state transition: disconnected -> initializing (reset)");
        self.transport = transport;
        self.input.clear();
        self.session_log.clear();
        self.session_log_truncated = false;
        self.pending = Pending::Idle;
        self.rollback_depth = None;
        self.state = DriverState::Initializing;
        true
    }

    // ------------------------------------------------------------------
    // State machine internals
    // ------------------------------------------------------------------

    /// Advance on a detected prompt.
    ///
    /// Consumes the buffer through the first prompt line only; anything
    /// after it is left for the next pass.
    fn step(&mut self) {
        let Some(segment) = self.input.take_through_prompt(self.profile.prompt()) else {
            // Detection saw a prompt but consumption found none; drop the
            // buffer so the caller's loop terminates.
            self.input.clear();
            return;
        };

        if self.state.is_config_sequence() {
            self.append_session_log(segment.as_bytes());
        }

        match self.state {
            DriverState::ExecutingCommand => self.step_executing(&segment),
            DriverState::EnteringConfig => self.step_entering_config(),
            DriverState::ApplyingConfig => self.step_applying_config(),
            DriverState::Committing => self.step_committing(&segment),
            DriverState::AbortingConfig => self.step_aborting(),
            DriverState::RollingBack => self.step_rolling_back(),
            // No operation expects a prompt here; discard the segment.
            DriverState::Initializing
            | DriverState::Ready
            | DriverState::ConfigMode
            | DriverState::Error
            | DriverState::Disconnected => {}
        }
    }

    fn step_executing(&mut self, buffer: &str) {
        match mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Command { callback, command } => {
                let output = extract_output(buffer, &command, self.profile.prompt());
                self.transition(DriverState::Ready);
                debug!("command complete: {} byte(s) of output", output.len());
                callback(Ok(output));
            }
            other => {
                self.pending = other;
                self.collapse("prompt in executing_command without a pending command");
            }
        }
    }

    fn step_entering_config(&mut self) {
        if self.phase_has_next() {
            self.send_next_phase_command();
            return;
        }
        if !self.transition(DriverState::ConfigMode) {
            return;
        }
        // Decide immediately: apply the first line or go straight to commit.
        match self.pop_config_line() {
            Some(line) => {
                if self.transition(DriverState::ApplyingConfig) {
                    self.send_line(&line);
                }
            }
            None => self.begin_commit(),
        }
    }

    fn step_applying_config(&mut self) {
        match self.pop_config_line() {
            Some(line) => {
                // Stay in applying_config for the next queued line.
                self.send_line(&line);
            }
            None => self.begin_commit(),
        }
    }

    fn step_committing(&mut self, buffer: &str) {
        if self.profile.is_commit_failure(buffer) {
            warn!("commit rejected by device, running abort sequence");
            self.begin_abort();
            return;
        }
        if self.phase_has_next() {
            self.send_next_phase_command();
            return;
        }

        let log = self.take_session_log();
        match mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Config { callback, .. } => {
                self.transition(DriverState::Ready);
                debug!("commit complete, session log {} byte(s)", log.len());
                callback(Ok(log));
            }
            other => {
                self.pending = other;
                self.collapse("prompt in committing without a pending config operation");
            }
        }
    }

    fn step_aborting(&mut self) {
        if self.phase_has_next() {
            self.send_next_phase_command();
            return;
        }

        let log = self.take_session_log();
        match mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Config { callback, .. } => {
                self.transition(DriverState::Ready);
                error!("configuration commit failed; changes were rolled back");
                callback(Err(DriverError::CommitFailed { session_log: log }));
            }
            other => {
                self.pending = other;
                self.collapse("prompt in aborting_config without a pending config operation");
            }
        }
    }

    fn step_rolling_back(&mut self) {
        let log = self.take_session_log();
        let depth = self.rollback_depth.take();

        match mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Rollback { callback } => {
                self.transition(DriverState::Ready);
                debug!("rollback of {:?} commit(s) complete", depth);
                callback(Ok(log));
            }
            other => {
                self.pending = other;
                self.collapse("prompt in rolling_back without a pending rollback");
            }
        }
    }

    /// Move to `to` if the table allows it; otherwise collapse to error.
    fn transition(&mut self, to: DriverState) -> bool {
        if is_valid_transition(self.state, to) {
            debug!("state transition: {} -> {}", self.state, to);
            self.state = to;
            true
        } else {
            let err = DriverError::InvalidTransition {
                from: self.state,
                to,
            };
            error!("{err}");
            self.fail_to_error(err);
            false
        }
    }

    /// Collapse to the error state over an internal inconsistency.
    fn collapse(&mut self, reason: &str) {
        error!("driver inconsistency: {reason}");
        self.fail_to_error(DriverError::InvalidTransition {
            from: self.state,
            to: DriverState::Error,
        });
    }

    /// Unconditional move to `error`: clear buffers, fail the pending
    /// callback, record the move.
    fn fail_to_error(&mut self, err: DriverError) {
        let pending = mem::replace(&mut self.pending, Pending::Idle);
        self.input.clear();
        self.session_log.clear();
        self.rollback_depth = None;
        debug!("state transition: {} -> error (forced)", self.state);
        self.state = DriverState::Error;

        Self::fail_pending(pending, err);
    }

    fn fail_pending(pending: Pending, err: DriverError) {
        match pending {
            Pending::Idle => {}
            Pending::Command { callback, .. }
            | Pending::Config { callback, .. }
            | Pending::Rollback { callback } => callback(Err(err)),
        }
    }

    /// Send one command line. On transport refusal the session is treated
    /// as disconnected and the pending callback fails.
    fn send_line(&mut self, command: &str) -> bool {
        let mut data = Vec::with_capacity(command.len() + 1);
        data.extend_from_slice(command.as_bytes());
        data.push(b'\n');

        debug!("send: {command:?}");
        if self.transport.send(&data) {
            true
        } else {
            self.notify_disconnected();
            false
        }
    }

    fn begin_commit(&mut self) {
        self.load_phase(self.profile.commit_commands());
        if self.transition(DriverState::Committing) {
            self.send_next_phase_command();
        }
    }

    fn begin_abort(&mut self) {
        self.load_phase(self.profile.abort_commands());
        if self.transition(DriverState::AbortingConfig) {
            self.send_next_phase_command();
        }
    }

    fn load_phase(&mut self, commands: &'static [&'static str]) {
        if let Pending::Config { phase, .. } = &mut self.pending {
            phase.clear();
            phase.extend(commands.iter().map(|c| (*c).to_string()));
        }
    }

    fn phase_has_next(&self) -> bool {
        matches!(&self.pending, Pending::Config { phase, .. } if !phase.is_empty())
    }

    fn send_next_phase_command(&mut self) {
        let next = match &mut self.pending {
            Pending::Config { phase, .. } => phase.pop_front(),
            _ => None,
        };
        if let Some(cmd) = next {
            self.send_line(&cmd);
        }
    }

    fn pop_config_line(&mut self) -> Option<String> {
        match &mut self.pending {
            Pending::Config { lines, .. } => lines.pop_front(),
            _ => None,
        }
    }

    fn reset_session_log(&mut self) {
        self.session_log.clear();
        self.session_log_truncated = false;
    }

    fn append_session_log(&mut self, bytes: &[u8]) {
        if self.session_log_truncated {
            return;
        }
        if self.session_log.len() + bytes.len() > MAX_SESSION_LOG_BYTES {
            let room = MAX_SESSION_LOG_BYTES - self.session_log.len();
            self.session_log.extend_from_slice(&bytes[..room]);
            self.session_log
                .extend_from_slice(SESSION_LOG_TRUNCATED_MARKER.as_bytes());
            self.session_log_truncated = true;
            warn!("session log reached {MAX_SESSION_LOG_BYTES} bytes, truncating");
        } else {
            self.session_log.extend_from_slice(bytes);
        }
    }

    fn take_session_log(&mut self) -> String {
        let log = mem::take(&mut self.session_log);
        self.session_log_truncated = false;
        String::from_utf8_lossy(&log).into_owned()
    }
}

impl std::fmt::Debug for CliDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliDriver")
            .field("kind", &self.profile.kind())
            .field("state", &self.state)
            .field("input_len", &self.input.len())
            .field("session_log_len", &self.session_log.len())
            .field("pending", &!self.pending.is_idle())
            .finish()
    }
}
