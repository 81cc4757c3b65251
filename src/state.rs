//! Mutable per-server state: captures, analyzers, HLAs, and id counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use salad_protocol::messages::{AppInfo, Device, HlaSettingValue, SettingValue};
use salad_protocol::{RpcStatus, StatusCode};

use crate::clock::Clock;
use crate::plan::Plan;

/// Capture lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Running,
    Stopped,
    Completed,
    Closed,
}

/// How a capture came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOrigin {
    Loaded,
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureModeKind {
    Timed,
    Manual,
    Trigger,
}

/// Capture mode. `duration` is only meaningful for `Timed`; a timed capture
/// with zero duration is immediately completable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMode {
    pub kind: CaptureModeKind,
    pub duration: Duration,
}

impl CaptureMode {
    pub fn timed(duration: Duration) -> Self {
        Self {
            kind: CaptureModeKind::Timed,
            duration,
        }
    }

    pub fn manual() -> Self {
        Self {
            kind: CaptureModeKind::Manual,
            duration: Duration::zero(),
        }
    }

    pub fn trigger() -> Self {
        Self {
            kind: CaptureModeKind::Trigger,
            duration: Duration::zero(),
        }
    }
}

/// One capture row.
#[derive(Debug, Clone)]
pub struct CaptureState {
    pub id: u64,
    pub status: CaptureStatus,
    pub origin: CaptureOrigin,
    pub started_at: DateTime<Utc>,
    pub mode: CaptureMode,
}

/// Metadata for a low-level analyzer attached to a capture.
#[derive(Debug, Clone)]
pub struct AnalyzerState {
    pub id: u64,
    pub capture_id: u64,
    pub name: String,
    pub label: String,
    pub settings: BTreeMap<String, SettingValue>,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a high-level analyzer layered on a low-level analyzer.
#[derive(Debug, Clone)]
pub struct HighLevelAnalyzerState {
    pub id: u64,
    pub capture_id: u64,
    pub extension_directory: String,
    pub hla_name: String,
    pub label: String,
    pub input_analyzer_id: u64,
    pub settings: BTreeMap<String, HlaSettingValue>,
    pub created_at: DateTime<Utc>,
}

/// All mutable server state. Lives behind the dispatch mutex; nothing here
/// is shared outside the critical section.
#[derive(Debug, Clone)]
pub struct State {
    pub app_info: Option<AppInfo>,
    pub devices: Vec<Device>,
    pub captures: BTreeMap<u64, CaptureState>,
    /// capture_id -> analyzer_id -> state
    pub analyzers: BTreeMap<u64, BTreeMap<u64, AnalyzerState>>,
    /// capture_id -> analyzer_id -> state
    pub high_level_analyzers: BTreeMap<u64, BTreeMap<u64, HighLevelAnalyzerState>>,
    pub next_capture_id: u64,
    pub next_analyzer_id: u64,
}

impl State {
    /// Seed state from a compiled plan.
    ///
    /// Fixture captures with Running status and no started-at stamp start
    /// "now"; the capture counter is bumped past every fixture id so ids are
    /// never reused.
    pub fn seed(plan: &Plan, clock: &dyn Clock) -> Self {
        let mut state = Self {
            app_info: plan.fixtures.app_info.clone(),
            devices: plan.fixtures.devices.clone(),
            captures: BTreeMap::new(),
            analyzers: BTreeMap::new(),
            high_level_analyzers: BTreeMap::new(),
            next_capture_id: plan.defaults.capture_id_start,
            next_analyzer_id: plan.defaults.analyzer_id_start,
        };

        for fixture in &plan.fixtures.captures {
            let started_at = match fixture.started_at {
                Some(at) => at,
                None if fixture.status == CaptureStatus::Running => clock.now(),
                None => DateTime::<Utc>::UNIX_EPOCH,
            };
            state.captures.insert(
                fixture.id,
                CaptureState {
                    id: fixture.id,
                    status: fixture.status,
                    origin: fixture.origin,
                    started_at,
                    mode: fixture.mode,
                },
            );
            if fixture.id >= state.next_capture_id {
                state.next_capture_id = fixture.id + 1;
            }
        }

        state
    }

    /// Allocate the next capture id.
    pub fn alloc_capture_id(&mut self) -> u64 {
        let id = self.next_capture_id;
        self.next_capture_id += 1;
        id
    }

    /// Allocate the next analyzer id. Shared between analyzers and HLAs.
    pub fn alloc_analyzer_id(&mut self) -> u64 {
        let id = self.next_analyzer_id;
        self.next_analyzer_id += 1;
        id
    }

    /// Look up a capture, producing the plan-configured status code when the
    /// id is unknown.
    pub fn capture_for(
        &mut self,
        capture_id: u64,
        missing_status: StatusCode,
    ) -> Result<&mut CaptureState, RpcStatus> {
        if capture_id == 0 {
            return Err(RpcStatus::invalid_argument("capture id is required"));
        }
        match self.captures.get_mut(&capture_id) {
            Some(capture) => Ok(capture),
            None if missing_status == StatusCode::Ok => {
                Err(RpcStatus::invalid_argument("capture not found"))
            }
            None => Err(RpcStatus::capture_not_found(missing_status, capture_id)),
        }
    }
}
