//! Test/live mode gate.
//!
//! The mode lives in server state, not a global. Each request snapshots it
//! into a `ScrapeContext`, so a toggle mid-request cannot change that
//! request's decisions.

use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use yobot_common::{looks_like_test_data, new_session_id, Lead, LeadSource, SystemMode};

/// Audit entries kept in memory.
const AUDIT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// Production write refused in test mode.
    Blocked,
    /// Production write allowed in live mode.
    LiveExecute,
    /// Read, always allowed.
    Read,
    /// Write refused because the payload looks like QA fixture data.
    Polluted,
    /// Mode changed.
    ModeChanged,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateAuditEntry {
    pub operation: String,
    pub mode: SystemMode,
    pub verdict: GateVerdict,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Request-scoped snapshot of the gate.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    pub source: LeadSource,
    pub mode: SystemMode,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

/// Leads that passed the write gate and the pollution guard.
#[derive(Debug, Default)]
pub struct Admitted {
    pub leads: Vec<Lead>,
    /// Dropped by the pollution guard.
    pub rejected: usize,
    /// The whole write was refused by the mode.
    pub blocked: bool,
}

pub struct ModeGate {
    mode: RwLock<SystemMode>,
    audit: Mutex<VecDeque<GateAuditEntry>>,
}

impl ModeGate {
    pub fn new(mode: SystemMode) -> Self {
        Self {
            mode: RwLock::new(mode),
            audit: Mutex::new(VecDeque::with_capacity(AUDIT_CAPACITY)),
        }
    }

    pub fn mode(&self) -> SystemMode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Switch modes. Returns the previous mode.
    pub fn set_mode(&self, mode: SystemMode) -> SystemMode {
        let previous = {
            let mut guard = self.mode.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *guard, mode)
        };
        info!(from = %previous, to = %mode, "System mode changed");
        self.record(
            "set_mode",
            mode,
            GateVerdict::ModeChanged,
            Some(format!("{previous} -> {mode}")),
        );
        previous
    }

    /// Snapshot the mode for one scrape and open a new session.
    pub fn begin(&self, source: LeadSource) -> ScrapeContext {
        ScrapeContext {
            source,
            mode: self.mode(),
            session_id: new_session_id(source),
            started_at: Utc::now(),
        }
    }

    /// Decide against the current mode.
    pub fn enforce_gate(&self, operation: &str, is_production_write: bool) -> bool {
        self.enforce_with(self.mode(), operation, is_production_write)
    }

    /// Decide against a snapshot. Writes are refused in test mode; reads always pass.
    pub fn enforce_with(&self, mode: SystemMode, operation: &str, is_production_write: bool) -> bool {
        let (allowed, verdict) = match (mode, is_production_write) {
            (SystemMode::Test, true) => (false, GateVerdict::Blocked),
            (SystemMode::Live, true) => (true, GateVerdict::LiveExecute),
            (_, false) => (true, GateVerdict::Read),
        };
        self.record(operation, mode, verdict, None);
        allowed
    }

    /// Gate a single production write and refuse payloads that look like QA
    /// fixture data.
    pub fn guard_payload(&self, mode: SystemMode, operation: &str, payload: &serde_json::Value) -> bool {
        self.enforce_with(mode, operation, true) && self.is_clean(mode, operation, payload)
    }

    /// Gate a batch write as one payload. When the batch trips the pollution
    /// guard, only the leads that look like test data are dropped.
    pub fn admit_leads(&self, mode: SystemMode, operation: &str, leads: Vec<Lead>) -> Admitted {
        let payload = serde_json::to_value(&leads).unwrap_or_default();
        if self.guard_payload(mode, operation, &payload) {
            return Admitted {
                leads,
                rejected: 0,
                blocked: false,
            };
        }
        if !mode.is_live() {
            return Admitted {
                leads: Vec::new(),
                rejected: 0,
                blocked: true,
            };
        }

        let (clean, polluted): (Vec<Lead>, Vec<Lead>) = leads.into_iter().partition(|lead| {
            looks_like_test_data(&serde_json::to_value(lead).unwrap_or_default()).is_none()
        });
        Admitted {
            leads: clean,
            rejected: polluted.len(),
            blocked: false,
        }
    }

    fn is_clean(&self, mode: SystemMode, operation: &str, payload: &serde_json::Value) -> bool {
        let Some(hit) = looks_like_test_data(payload) else {
            return true;
        };
        warn!(
            operation,
            field = %hit.field,
            reason = hit.reason,
            "Refusing to write test data to production"
        );
        self.record(
            operation,
            mode,
            GateVerdict::Polluted,
            Some(format!("{}: {}", hit.field, hit.reason)),
        );
        false
    }

    /// Most recent entries last.
    pub fn recent_audit(&self, limit: usize) -> Vec<GateAuditEntry> {
        let audit = self.audit.lock().unwrap_or_else(|e| e.into_inner());
        let skip = audit.len().saturating_sub(limit);
        audit.iter().skip(skip).cloned().collect()
    }

    fn record(&self, operation: &str, mode: SystemMode, verdict: GateVerdict, detail: Option<String>) {
        match verdict {
            GateVerdict::Blocked => info!(operation, %mode, "Gate blocked production write"),
            GateVerdict::LiveExecute => info!(operation, %mode, "Gate allowed live write"),
            GateVerdict::Read => tracing::debug!(operation, %mode, "Gate read"),
            GateVerdict::Polluted | GateVerdict::ModeChanged => {}
        }

        let mut audit = self.audit.lock().unwrap_or_else(|e| e.into_inner());
        if audit.len() == AUDIT_CAPACITY {
            audit.pop_front();
        }
        audit.push_back(GateAuditEntry {
            operation: operation.to_string(),
            mode,
            verdict,
            detail,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str, email: &str) -> Lead {
        let mut lead = Lead::new(LeadSource::Apollo, "apollo-session");
        lead.full_name = name.into();
        lead.email = Some(email.into());
        lead
    }

    #[test]
    fn writes_blocked_in_test_allowed_in_live() {
        let gate = ModeGate::new(SystemMode::Test);
        for op in ["lead_store.write", "anything", ""] {
            assert!(!gate.enforce_gate(op, true));
        }
        gate.set_mode(SystemMode::Live);
        for op in ["lead_store.write", "anything", ""] {
            assert!(gate.enforce_gate(op, true));
        }
    }

    #[test]
    fn reads_always_pass() {
        let gate = ModeGate::new(SystemMode::Test);
        assert!(gate.enforce_gate("scraped_leads.read", false));
        gate.set_mode(SystemMode::Live);
        assert!(gate.enforce_gate("scraped_leads.read", false));
    }

    #[test]
    fn audit_records_verdicts_in_order() {
        let gate = ModeGate::new(SystemMode::Test);
        gate.enforce_gate("write", true);
        gate.enforce_gate("read", false);
        let entries = gate.recent_audit(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].verdict, GateVerdict::Blocked);
        assert_eq!(entries[1].verdict, GateVerdict::Read);
        assert_eq!(entries[1].mode, SystemMode::Test);
    }

    #[test]
    fn audit_is_bounded() {
        let gate = ModeGate::new(SystemMode::Live);
        for _ in 0..(AUDIT_CAPACITY + 50) {
            gate.enforce_gate("write", true);
        }
        assert_eq!(gate.recent_audit(usize::MAX).len(), AUDIT_CAPACITY);
        assert_eq!(gate.recent_audit(3).len(), 3);
    }

    #[test]
    fn set_mode_returns_previous() {
        let gate = ModeGate::new(SystemMode::Test);
        assert_eq!(gate.set_mode(SystemMode::Live), SystemMode::Test);
        assert_eq!(gate.mode(), SystemMode::Live);
    }

    #[test]
    fn snapshot_ignores_later_toggles() {
        let gate = ModeGate::new(SystemMode::Live);
        let ctx = gate.begin(LeadSource::Apify);
        gate.set_mode(SystemMode::Test);
        assert_eq!(ctx.mode, SystemMode::Live);
        assert!(gate.enforce_with(ctx.mode, "lead_store.write", true));
        assert!(ctx.session_id.starts_with("apify-"));
    }

    #[test]
    fn pollution_guard_rejects_test_emails_in_live_mode() {
        let gate = ModeGate::new(SystemMode::Live);
        let admitted = gate.admit_leads(
            SystemMode::Live,
            "lead_store.write",
            vec![lead("Jane Doe", "jane@acme.io"), lead("Qa Person", "qa.test@acme.io")],
        );
        assert!(!admitted.blocked);
        assert_eq!(admitted.rejected, 1);
        assert_eq!(admitted.leads.len(), 1);
        assert_eq!(admitted.leads[0].full_name, "Jane Doe");
        assert!(gate
            .recent_audit(10)
            .iter()
            .any(|e| e.verdict == GateVerdict::Polluted));
    }

    #[test]
    fn guard_payload_checks_mode_and_content() {
        let gate = ModeGate::new(SystemMode::Live);
        let clean = serde_json::json!({"Email": "jane@acme.io", "Full Name": "Jane Doe"});
        let fixture = serde_json::json!({"records": [{"Email": "TEST@acme.io"}]});
        assert!(gate.guard_payload(SystemMode::Live, "campaign.write", &clean));
        assert!(!gate.guard_payload(SystemMode::Live, "campaign.write", &fixture));
        assert!(!gate.guard_payload(SystemMode::Test, "campaign.write", &clean));
    }

    #[test]
    fn clean_batch_is_one_audited_write() {
        let gate = ModeGate::new(SystemMode::Live);
        let admitted = gate.admit_leads(
            SystemMode::Live,
            "lead_store.write",
            vec![lead("Jane Doe", "jane@acme.io"), lead("John Roe", "john@acme.io")],
        );
        assert_eq!(admitted.leads.len(), 2);
        let entries = gate.recent_audit(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].verdict, GateVerdict::LiveExecute);
    }

    #[test]
    fn test_mode_blocks_whole_batch() {
        let gate = ModeGate::new(SystemMode::Test);
        let admitted = gate.admit_leads(SystemMode::Test, "lead_store.write", vec![lead("Jane", "jane@acme.io")]);
        assert!(admitted.blocked);
        assert!(admitted.leads.is_empty());
    }
}
