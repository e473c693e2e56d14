//! Decides whether a candidate firmware version should be installed.

use crate::command::UpdateIntent;
use crate::config::VersionPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Accept(UpdateIntent),
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyCurrent,
    Unparseable,
    Downgrade,
    SkipsVersions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGate {
    policy: VersionPolicy,
}

impl VersionGate {
    pub fn new(policy: VersionPolicy) -> Self {
        Self { policy }
    }

    pub fn decide(&self, running_version: &str, intent: UpdateIntent) -> GateDecision {
        if intent.candidate_version == running_version {
            return GateDecision::Reject(RejectReason::AlreadyCurrent);
        }

        match self.policy {
            VersionPolicy::AnyDifferent => GateDecision::Accept(intent),
            VersionPolicy::SingleStepUpgrade => {
                match single_step(running_version, &intent.candidate_version) {
                    Ok(()) => GateDecision::Accept(intent),
                    Err(reason) => GateDecision::Reject(reason),
                }
            }
        }
    }
}

impl Default for VersionGate {
    fn default() -> Self {
        Self::new(VersionPolicy::AnyDifferent)
    }
}

/// `v?MAJOR[.MINOR[.PATCH]]`; missing components read as zero.
fn components(version: &str) -> Option<[u32; 3]> {
    let body = version.strip_prefix('v').unwrap_or(version);
    let mut out = [0u32; 3];
    let mut parts = body.split('.');
    for slot in out.iter_mut() {
        match parts.next() {
            Some(p) => *slot = p.parse().ok()?,
            None => break,
        }
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

fn single_step(running: &str, candidate: &str) -> Result<(), RejectReason> {
    let (Some(running), Some(candidate)) = (components(running), components(candidate)) else {
        return Err(RejectReason::Unparseable);
    };

    // first component that differs decides
    let Some((r, c)) = running
        .iter()
        .zip(candidate.iter())
        .find(|(r, c)| r != c)
    else {
        // e.g. "v1" vs "v1.0.0"
        return Err(RejectReason::AlreadyCurrent);
    };

    if c < r {
        Err(RejectReason::Downgrade)
    } else if c - r > 1 {
        Err(RejectReason::SkipsVersions)
    } else {
        Ok(())
    }
}
