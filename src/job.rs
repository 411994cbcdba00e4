//! The job orchestrator: submit one trip request, poll the resulting
//! backend job until a terminal state, and report progress.
//!
//! One [`JobClient::submit_and_await`] call runs one strictly sequential
//! submit-then-poll flow. Backends answer with inconsistent field names,
//! so every poll response is normalized into a [`JobSnapshot`] through
//! ordered alias lookups before the state machine sees it.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::cancel::CancelToken;
use crate::consts::{
    DEFAULT_DEADLINE, POLL_INTERVAL_CAP, POLL_INTERVAL_STEP, POLL_START_INTERVAL,
};
use crate::endpoint::Endpoint;
use crate::error::{JobError, Result};
use crate::ratelimit::RateLimiter;
use crate::sanitize::{TripRequest, sanitize};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Where to field-lookup the job status in a poll response, in order.
const STATUS_ALIASES: &[&str] = &["status", "state", "job_status"];

/// Where to field-lookup the result payload, in order.
const RESULT_ALIASES: &[&str] = &["result", "data", "itinerary"];

/// Where to field-lookup a failure message, in order.
const ERROR_ALIASES: &[&str] = &["error", "message"];

/// Normalized backend-side job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Strict parse. `None` means the backend sent something outside its
    /// contract.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "queued" | "pending" => Some(JobStatus::Queued),
            "running" | "processing" | "in_progress" => Some(JobStatus::Running),
            "done" | "success" | "completed" | "complete" | "succeeded" => {
                Some(JobStatus::Succeeded)
            }
            "failed" | "error" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    fn phase(self) -> Phase {
        match self {
            JobStatus::Queued => Phase::Queued,
            JobStatus::Running => Phase::Running,
            JobStatus::Succeeded => Phase::Done,
            JobStatus::Failed => Phase::Error,
        }
    }
}

/// Total normalization: every string maps to exactly one status.
/// Unrecognized strings mean "keep polling".
pub fn normalize_status(raw: &str) -> JobStatus {
    JobStatus::parse(raw).unwrap_or(JobStatus::Running)
}

/// What the status callback receives. Phases only move forward:
/// `queued → running → done|error`, possibly skipping steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Queued,
    Running,
    Done,
    Error,
}

impl Phase {
    fn rank(self) -> u8 {
        match self {
            Phase::Queued => 0,
            Phase::Running => 1,
            Phase::Done | Phase::Error => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Queued => write!(f, "queued"),
            Phase::Running => write!(f, "running"),
            Phase::Done => write!(f, "done"),
            Phase::Error => write!(f, "error"),
        }
    }
}

/// One progress message from the backend's `steps` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMessage {
    pub seq: u64,
    pub msg: String,
}

/// One normalized poll response. Derived fresh per poll, never mutated.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    /// Progress steps carried on this poll, in wire order. May repeat
    /// entries from earlier polls; de-duplication happens in the loop.
    pub steps: Vec<StepMessage>,
    /// The raw status string when it fell outside the known set.
    pub unrecognized: Option<String>,
}

impl JobSnapshot {
    /// Normalize a poll body through the ordered alias lookups.
    pub fn from_response(body: &Value) -> Self {
        let raw_status = first_alias(body, STATUS_ALIASES)
            .and_then(Value::as_str)
            .unwrap_or("");

        let status = normalize_status(raw_status);
        let unrecognized = if JobStatus::parse(raw_status).is_none() {
            Some(raw_status.to_string())
        } else {
            None
        };

        Self {
            status,
            result: first_alias(body, RESULT_ALIASES)
                .filter(|v| !v.is_null())
                .cloned(),
            error_message: first_alias(body, ERROR_ALIASES)
                .and_then(Value::as_str)
                .map(str::to_string),
            steps: steps_from(body),
            unrecognized,
        }
    }
}

/// Extract well-formed `{seq, msg}` entries; malformed or blank ones
/// are dropped.
fn steps_from(body: &Value) -> Vec<StepMessage> {
    body.get("steps")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|step| {
                    let seq = step.get("seq").and_then(Value::as_u64)?;
                    let msg = step.get("msg").and_then(Value::as_str)?.trim();
                    if msg.is_empty() {
                        return None;
                    }
                    Some(StepMessage {
                        seq,
                        msg: msg.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn first_alias<'a>(body: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| body.get(*key))
}

/// Human-readable message out of an arbitrary error body.
fn body_message(body: &Value) -> String {
    if let Some(s) = body.as_str() {
        return s.to_string();
    }
    for key in ["error", "message", "detail"] {
        if let Some(s) = body.get(key).and_then(Value::as_str) {
            return s.to_string();
        }
    }
    body.to_string()
}

/// Tuning for one job flow.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Whole-flow deadline measured from submission.
    pub deadline: Duration,
    pub poll_start: Duration,
    pub poll_step: Duration,
    pub poll_cap: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            poll_start: POLL_START_INTERVAL,
            poll_step: POLL_INTERVAL_STEP,
            poll_cap: POLL_INTERVAL_CAP,
        }
    }
}

/// Private per-flow loop state. Destroyed when the flow exits.
struct PollState {
    last_rank: Option<u8>,
    interval: Duration,
    deadline: Instant,
    warned_unknown: bool,
    /// Step sequence numbers already streamed to the progress callback.
    seen_steps: HashSet<u64>,
}

/// The long-running-job client. Holds no per-job state; every
/// [`submit_and_await`](JobClient::submit_and_await) call is an
/// independent flow.
pub struct JobClient {
    endpoint: Endpoint,
    transport: Transport,
    limiter: RateLimiter,
    config: JobConfig,
}

impl JobClient {
    pub fn new(
        endpoint: Endpoint,
        transport: Transport,
        limiter: RateLimiter,
        config: JobConfig,
    ) -> Self {
        Self {
            endpoint,
            transport,
            limiter,
            config,
        }
    }

    /// Submit a trip request and await the generated itinerary.
    ///
    /// `on_status` sees each phase at most once, strictly in
    /// `queued → running → done|error` order, and always sees
    /// [`Phase::Error`] before an error is returned. `on_progress`
    /// receives each backend step message exactly once, in sequence
    /// order of arrival.
    pub async fn submit_and_await<F, P>(
        &self,
        request: TripRequest,
        identity: &str,
        mut on_status: F,
        mut on_progress: P,
        cancel: &CancelToken,
    ) -> Result<Value>
    where
        F: FnMut(Phase),
        P: FnMut(&str),
    {
        match self
            .run_flow(request, identity, &mut on_status, &mut on_progress, cancel)
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                on_status(Phase::Error);
                Err(err)
            }
        }
    }

    async fn run_flow<F, P>(
        &self,
        request: TripRequest,
        identity: &str,
        on_status: &mut F,
        on_progress: &mut P,
        cancel: &CancelToken,
    ) -> Result<Value>
    where
        F: FnMut(Phase),
        P: FnMut(&str),
    {
        // Pre-flight gates: no network traffic past this point unless
        // both pass.
        if !self.limiter.admit(identity) {
            return Err(JobError::RateLimited);
        }

        let request = sanitize(request);
        if request.destination.is_empty() {
            return Err(JobError::InvalidInput(
                "destination is empty after sanitization".to_string(),
            ));
        }

        let job_id = self.submit(&request, cancel).await?;

        let mut state = PollState {
            last_rank: None,
            interval: self.config.poll_start,
            deadline: Instant::now() + self.config.deadline,
            warned_unknown: false,
            seen_steps: HashSet::new(),
        };
        emit(&mut state, Phase::Queued, on_status);

        self.poll_until_terminal(&job_id, &mut state, on_status, on_progress, cancel)
            .await
    }

    /// POST the sanitized request; a non-OK response or a body without a
    /// job id is fatal here — transport retries already happened.
    async fn submit(&self, request: &TripRequest, cancel: &CancelToken) -> Result<String> {
        let body = serde_json::to_value(request)
            .map_err(|e| JobError::InvalidInput(e.to_string()))?;
        let http_request = HttpRequest::post(self.endpoint.join("/jobs/itinerary"), body);

        let response = self.transport.send(&http_request, cancel).await?;
        if !response.is_ok() {
            return Err(JobError::SubmissionFailed(format!(
                "HTTP {}: {}",
                response.status,
                body_message(&response.body)
            )));
        }

        job_id_from(&response)
            .ok_or_else(|| JobError::SubmissionFailed("response carried no job id".to_string()))
    }

    async fn poll_until_terminal<F, P>(
        &self,
        job_id: &str,
        state: &mut PollState,
        on_status: &mut F,
        on_progress: &mut P,
        cancel: &CancelToken,
    ) -> Result<Value>
    where
        F: FnMut(Phase),
        P: FnMut(&str),
    {
        loop {
            if cancel.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            let now = Instant::now();
            if now >= state.deadline {
                return Err(JobError::TimedOut);
            }

            let snapshot = self.poll_once(job_id, cancel).await?;

            if let Some(raw) = &snapshot.unrecognized
                && !state.warned_unknown
            {
                eprintln!(
                    "warning: unrecognized job status \"{}\", treating as running",
                    raw
                );
                state.warned_unknown = true;
            }

            // Stream new step messages, including any riding on the
            // terminal poll. Repeats from earlier polls stay silent.
            for step in &snapshot.steps {
                if state.seen_steps.insert(step.seq) {
                    on_progress(&step.msg);
                }
            }

            match snapshot.status {
                JobStatus::Succeeded => {
                    let result = snapshot.result.ok_or(JobError::MissingResult)?;
                    emit(state, Phase::Done, on_status);
                    return Ok(result);
                }
                JobStatus::Failed => {
                    let message = snapshot
                        .error_message
                        .unwrap_or_else(|| "job failed".to_string());
                    return Err(JobError::JobFailed(message));
                }
                live => emit(state, live.phase(), on_status),
            }

            // Sleep no longer than the deadline allows, preemptible by
            // the token.
            let remaining = state.deadline.saturating_duration_since(Instant::now());
            let nap = state.interval.min(remaining);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JobError::Cancelled),
                _ = tokio::time::sleep(nap) => {}
            }

            state.interval = (state.interval + self.config.poll_step).min(self.config.poll_cap);
        }
    }

    /// One GET of the job, read-only on the server side. The nonce query
    /// parameter defeats intermediary caches.
    async fn poll_once(&self, job_id: &str, cancel: &CancelToken) -> Result<JobSnapshot> {
        let url = format!(
            "{}?_={}",
            self.endpoint.join(&format!("/jobs/{}", job_id)),
            rand::random::<u32>()
        );

        let response = self.transport.send(&HttpRequest::get(url), cancel).await?;
        if !response.is_ok() {
            return Err(JobError::PollFailed {
                status: response.status,
                message: body_message(&response.body),
            });
        }

        Ok(JobSnapshot::from_response(&response.body))
    }
}

fn job_id_from(response: &HttpResponse) -> Option<String> {
    for key in ["job_id", "id"] {
        if let Some(id) = response.body.get(key).and_then(Value::as_str)
            && !id.is_empty()
        {
            return Some(id.to_string());
        }
    }
    None
}

/// Notify only on forward movement: no consecutive duplicates, no
/// regressions.
fn emit<F>(state: &mut PollState, phase: Phase, on_status: &mut F)
where
    F: FnMut(Phase),
{
    let rank = phase.rank();
    if state.last_rank.is_none_or(|last| rank > last) {
        on_status(phase);
        state.last_rank = Some(rank);
    }
}
