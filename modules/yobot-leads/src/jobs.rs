//! Asynchronous provider jobs, keyed by job id.
//!
//! A job keeps the session it was launched under, so leads collected by a
//! later poll carry that session id. Once a job's results are stored the
//! outcome is cached and later polls replay it without writing again.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;

use yobot_common::{LeadSource, SystemMode};

use crate::gate::ScrapeContext;
use crate::providers::ScrapeOutcome;

/// Jobs remembered in memory. The oldest is forgotten first.
pub const JOB_CAPACITY: usize = 500;

/// Launch details a poll restores.
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub job_id: String,
    pub source: LeadSource,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub filters: String,
}

impl JobTicket {
    pub fn launched(job_id: &str, ctx: &ScrapeContext, filters: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            source: ctx.source,
            session_id: ctx.session_id.clone(),
            started_at: ctx.started_at,
            filters: filters.to_string(),
        }
    }

    /// The launch session under the given mode.
    pub fn context(&self, mode: SystemMode) -> ScrapeContext {
        ScrapeContext {
            source: self.source,
            mode,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
        }
    }
}

/// Stored result of a job that reached a final state.
#[derive(Debug, Clone)]
pub struct CollectedJob {
    pub mode: SystemMode,
    pub outcome: ScrapeOutcome,
    pub stored: usize,
    pub duplicates_dropped: usize,
    pub rejected_as_test_data: usize,
    pub failed_chunks: usize,
}

#[derive(Debug, Clone)]
enum JobState {
    Running,
    /// One poll is storing the results.
    Collecting,
    Collected(CollectedJob),
}

struct JobEntry {
    ticket: JobTicket,
    state: JobState,
}

/// What a poll should do next.
#[derive(Debug)]
pub enum PollStart {
    /// Ask the provider.
    Poll(JobTicket),
    /// Another poll is storing the results right now.
    Busy(JobTicket),
    /// Already stored; replay without writing.
    Collected(JobTicket, CollectedJob),
}

#[derive(Default)]
struct Jobs {
    entries: HashMap<String, JobEntry>,
    order: VecDeque<String>,
}

impl Jobs {
    fn insert(&mut self, ticket: JobTicket) {
        let job_id = ticket.job_id.clone();
        if self.entries.contains_key(&job_id) {
            return;
        }
        while self.order.len() >= JOB_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                debug!(job_id = %oldest, "Forgetting oldest tracked job");
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(job_id.clone());
        self.entries.insert(
            job_id,
            JobEntry {
                ticket,
                state: JobState::Running,
            },
        );
    }
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<Jobs>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a launched job. A job id already tracked keeps its original session.
    pub fn track(&self, ticket: JobTicket) {
        self.lock().insert(ticket);
    }

    /// Look up a job, tracking it under `untracked()` when it is unknown
    /// (launched before a restart, or forgotten).
    pub fn begin_poll(&self, job_id: &str, untracked: impl FnOnce() -> JobTicket) -> PollStart {
        let mut jobs = self.lock();
        let known = jobs.entries.get(job_id).map(|entry| match &entry.state {
            JobState::Running => PollStart::Poll(entry.ticket.clone()),
            JobState::Collecting => PollStart::Busy(entry.ticket.clone()),
            JobState::Collected(done) => PollStart::Collected(entry.ticket.clone(), done.clone()),
        });
        if let Some(start) = known {
            return start;
        }

        let mut ticket = untracked();
        ticket.job_id = job_id.to_string();
        jobs.insert(ticket.clone());
        PollStart::Poll(ticket)
    }

    /// Claim the right to store a finished job's results. Only the first caller wins.
    pub fn claim(&self, job_id: &str) -> bool {
        let mut jobs = self.lock();
        match jobs.entries.get_mut(job_id) {
            Some(entry) if matches!(entry.state, JobState::Running) => {
                entry.state = JobState::Collecting;
                true
            }
            _ => false,
        }
    }

    /// Record the stored outcome of a claimed job.
    pub fn complete(&self, job_id: &str, collected: CollectedJob) {
        if let Some(entry) = self.lock().entries.get_mut(job_id) {
            entry.state = JobState::Collected(collected);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Jobs> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(job_id: &str, session: &str) -> JobTicket {
        JobTicket {
            job_id: job_id.to_string(),
            source: LeadSource::Phantombuster,
            session_id: session.to_string(),
            started_at: Utc::now(),
            filters: "{}".to_string(),
        }
    }

    fn collected() -> CollectedJob {
        CollectedJob {
            mode: SystemMode::Live,
            outcome: ScrapeOutcome::LiveData(Vec::new()),
            stored: 0,
            duplicates_dropped: 0,
            rejected_as_test_data: 0,
            failed_chunks: 0,
        }
    }

    #[test]
    fn poll_restores_launch_session() {
        let jobs = JobRegistry::new();
        jobs.track(ticket("c-1", "phantombuster-launch"));
        match jobs.begin_poll("c-1", || ticket("c-1", "phantombuster-other")) {
            PollStart::Poll(t) => assert_eq!(t.session_id, "phantombuster-launch"),
            other => panic!("expected poll, got {other:?}"),
        }
    }

    #[test]
    fn unknown_job_is_tracked_once() {
        let jobs = JobRegistry::new();
        jobs.begin_poll("c-9", || ticket("c-9", "first"));
        match jobs.begin_poll("c-9", || ticket("c-9", "second")) {
            PollStart::Poll(t) => assert_eq!(t.session_id, "first"),
            other => panic!("expected poll, got {other:?}"),
        }
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn only_first_claim_wins_and_later_polls_replay() {
        let jobs = JobRegistry::new();
        jobs.track(ticket("c-1", "s"));
        assert!(jobs.claim("c-1"));
        assert!(!jobs.claim("c-1"));
        assert!(matches!(jobs.begin_poll("c-1", || ticket("c-1", "x")), PollStart::Busy(_)));

        jobs.complete("c-1", collected());
        assert!(matches!(
            jobs.begin_poll("c-1", || ticket("c-1", "x")),
            PollStart::Collected(_, _)
        ));
        assert!(!jobs.claim("c-1"));
    }

    #[test]
    fn registry_is_bounded() {
        let jobs = JobRegistry::new();
        for i in 0..(JOB_CAPACITY + 10) {
            jobs.track(ticket(&format!("c-{i}"), "s"));
        }
        assert_eq!(jobs.len(), JOB_CAPACITY);
        assert!(matches!(
            jobs.begin_poll("c-0", || ticket("c-0", "fresh")),
            PollStart::Poll(t) if t.session_id == "fresh"
        ));
    }
}
