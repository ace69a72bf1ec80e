use crate::acquisition::AcquisitionState;
use crate::error::Result;
use crate::processing::cache::ProcessingCache;
use crate::processing::pipeline::AnalysisReport;
use crate::processing::signal::RawSignal;

use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Online,
    Offline,
}

/// Issued when an analysis starts; newer tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Everything the front end observes: current signal, cache, input mode,
/// acquisition state and the most recently applied report.
pub struct Session {
    raw: Option<RawSignal>,
    cache: ProcessingCache,
    mode: Mode,
    state: AcquisitionState,
    last_report: Option<AnalysisReport>,
    next_ticket: u64,
    committed: Option<Ticket>,
}

pub type SharedSession = Arc<Mutex<Session>>;

/// A panic in another holder does not leave the session half-written: every
/// mutation below is a single field assignment.
pub fn lock_session(shared: &SharedSession) -> MutexGuard<'_, Session> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            raw: None,
            cache: ProcessingCache::new(),
            mode,
            state: AcquisitionState::Idle,
            last_report: None,
            next_ticket: 0,
            committed: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switching source drops the current signal and any cached work.
    /// Analyses still in flight lose to the next ticket issued.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        debug!("switching input mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.raw = None;
        self.cache.invalidate();
        self.last_report = None;
        self.state = AcquisitionState::Idle;
    }

    pub fn raw(&self) -> Option<&RawSignal> {
        self.raw.as_ref()
    }

    pub fn set_raw(&mut self, raw: RawSignal) {
        self.raw = Some(raw);
    }

    /// Installs a payload as the current signal. A payload equal in content
    /// and rate to the current one keeps the existing buffer, so the cache
    /// still recognises it. Returns whether the signal changed.
    pub fn load(&mut self, samples: Vec<f64>, fs: f64) -> Result<bool> {
        if let Some(current) = &self.raw {
            if current.fs() == fs && current.same_samples(&samples) {
                return Ok(false);
            }
        }
        self.raw = Some(RawSignal::new(samples, fs)?);
        Ok(true)
    }

    pub fn cache(&self) -> &ProcessingCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ProcessingCache {
        &mut self.cache
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: AcquisitionState) {
        self.state = state;
    }

    pub fn last_report(&self) -> Option<&AnalysisReport> {
        self.last_report.as_ref()
    }

    pub fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Applies `report` unless a newer ticket has already been committed.
    pub fn commit(&mut self, ticket: Ticket, report: AnalysisReport) -> bool {
        if self.committed.is_some_and(|committed| committed > ticket) {
            return false;
        }
        self.committed = Some(ticket);
        self.last_report = Some(report);
        true
    }
}
