//! WaitCapture handler: the wait-policy state machine.
//!
//! Completion is decided instantly against the injected clock, including
//! under `block_until_done`: the handler never sleeps, which keeps replies
//! a pure function of capture mode, timing, and policy.

use salad_protocol::messages::{WaitCaptureReply, WaitCaptureRequest};
use salad_protocol::RpcStatus;

use crate::plan::WaitCapturePolicy;
use crate::server::RuntimeContext;
use crate::state::{CaptureModeKind, CaptureStatus};

pub fn handle(
    ctx: &mut RuntimeContext<'_>,
    req: &WaitCaptureRequest,
) -> Result<WaitCaptureReply, RpcStatus> {
    let behavior = &ctx.plan.behavior.wait_capture;
    let missing = ctx.plan.defaults.status_on_unknown_capture_id;
    let now = ctx.clock.now();

    let capture = match ctx.state.capture_for(req.capture_id, missing) {
        Ok(capture) => capture,
        Err(err) => {
            if behavior.require_capture_exists {
                return Err(err);
            }
            return Ok(WaitCaptureReply {});
        }
    };

    if capture.mode.kind == CaptureModeKind::Manual && behavior.error_on_manual_mode {
        return Err(RpcStatus::invalid_argument(
            "WaitCapture: manual capture mode does not support waiting",
        ));
    }

    if capture.mode.kind == CaptureModeKind::Timed
        && behavior.timed_captures_complete_after_duration
    {
        if capture.mode.duration <= chrono::Duration::zero() {
            capture.status = CaptureStatus::Completed;
        } else if capture.started_at + capture.mode.duration < now {
            capture.status = CaptureStatus::Completed;
        }
    }

    if capture.status == CaptureStatus::Completed {
        return Ok(WaitCaptureReply {});
    }

    match behavior.policy {
        WaitCapturePolicy::Immediate => Err(RpcStatus::deadline_exceeded(
            "WaitCapture: capture still running",
        )),
        WaitCapturePolicy::ErrorIfRunning => {
            if capture.status == CaptureStatus::Running {
                Err(RpcStatus::deadline_exceeded(
                    "WaitCapture: capture still running",
                ))
            } else {
                Ok(WaitCaptureReply {})
            }
        }
        WaitCapturePolicy::BlockUntilDone => {
            if capture.mode.kind == CaptureModeKind::Timed
                && capture.mode.duration > chrono::Duration::zero()
            {
                let deadline = now + behavior.max_block;
                let completion = capture.started_at + capture.mode.duration;
                if completion <= deadline {
                    capture.status = CaptureStatus::Completed;
                    return Ok(WaitCaptureReply {});
                }
            }
            Err(RpcStatus::deadline_exceeded(
                "WaitCapture: capture still running",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Fixture;
    use salad_protocol::StatusCode;

    fn wait(capture_id: u64) -> WaitCaptureRequest {
        WaitCaptureRequest { capture_id }
    }

    #[test]
    fn test_manual_mode_errors_when_configured() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
fixtures:
  captures:
    - capture_id: 7
      status: running
      mode: {kind: manual}
",
        );
        let err = handle(&mut fixture.ctx(), &wait(7)).unwrap_err();
        assert_eq!(err.code, StatusCode::InvalidArgument);
    }

    #[test]
    fn test_manual_mode_allowed_when_toggle_off() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
fixtures:
  captures:
    - capture_id: 7
      status: completed
      mode: {kind: manual}
behavior:
  WaitCapture:
    validate:
      error_on_manual_mode: false
",
        );
        assert!(handle(&mut fixture.ctx(), &wait(7)).is_ok());
    }

    #[test]
    fn test_zero_duration_timed_capture_completes_immediately() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
fixtures:
  captures:
    - capture_id: 7
      status: running
      mode: {kind: timed, duration_seconds: 0}
",
        );
        handle(&mut fixture.ctx(), &wait(7)).unwrap();
        assert_eq!(fixture.state.captures[&7].status, CaptureStatus::Completed);
    }

    #[test]
    fn test_elapsed_timed_capture_completes() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
fixtures:
  captures:
    - capture_id: 7
      status: running
      started_at: \"1970-01-01T00:00:00Z\"
      mode: {kind: timed, duration_seconds: 1.0}
",
        );
        fixture.clock.advance(chrono::Duration::seconds(2));
        handle(&mut fixture.ctx(), &wait(7)).unwrap();
        assert_eq!(fixture.state.captures[&7].status, CaptureStatus::Completed);
    }

    #[test]
    fn test_immediate_policy_rejects_running_capture() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
fixtures:
  captures:
    - capture_id: 7
      status: running
      started_at: \"1970-01-01T00:00:00Z\"
      mode: {kind: timed, duration_seconds: 10.0}
",
        );
        let err = handle(&mut fixture.ctx(), &wait(7)).unwrap_err();
        assert_eq!(err.code, StatusCode::DeadlineExceeded);
    }

    #[test]
    fn test_error_if_running_accepts_stopped_capture() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
defaults:
  timing:
    wait_capture_policy: error_if_running
fixtures:
  captures:
    - capture_id: 7
      status: stopped
      mode: {kind: trigger}
",
        );
        assert!(handle(&mut fixture.ctx(), &wait(7)).is_ok());
    }

    #[test]
    fn test_error_if_running_rejects_running_capture() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
defaults:
  timing:
    wait_capture_policy: error_if_running
fixtures:
  captures:
    - capture_id: 7
      status: running
      mode: {kind: trigger}
",
        );
        let err = handle(&mut fixture.ctx(), &wait(7)).unwrap_err();
        assert_eq!(err.code, StatusCode::DeadlineExceeded);
    }

    #[test]
    fn test_block_until_done_completes_within_window() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
defaults:
  timing:
    wait_capture_policy: block_until_done
    max_block_ms: 2000
fixtures:
  captures:
    - capture_id: 7
      status: running
      started_at: \"1970-01-01T00:00:00Z\"
      mode: {kind: timed, duration_seconds: 1.0}
",
        );
        fixture.clock.advance(chrono::Duration::milliseconds(500));
        handle(&mut fixture.ctx(), &wait(7)).unwrap();
        assert_eq!(fixture.state.captures[&7].status, CaptureStatus::Completed);
    }

    #[test]
    fn test_block_until_done_rejects_beyond_window() {
        let mut fixture = Fixture::from_yaml(
            "
version: 1
defaults:
  timing:
    wait_capture_policy: block_until_done
    max_block_ms: 100
fixtures:
  captures:
    - capture_id: 7
      status: running
      started_at: \"1970-01-01T00:00:00Z\"
      mode: {kind: timed, duration_seconds: 1.0}
",
        );
        fixture.clock.advance(chrono::Duration::milliseconds(500));
        let err = handle(&mut fixture.ctx(), &wait(7)).unwrap_err();
        assert_eq!(err.code, StatusCode::DeadlineExceeded);
        assert_eq!(fixture.state.captures[&7].status, CaptureStatus::Running);
    }

    #[test]
    fn test_unknown_capture_respects_toggle() {
        let mut fixture = Fixture::from_yaml("version: 1\n");
        assert!(handle(&mut fixture.ctx(), &wait(9)).is_err());

        let mut fixture = Fixture::from_yaml(
            "
version: 1
behavior:
  WaitCapture:
    validate:
      require_capture_exists: false
",
        );
        assert!(handle(&mut fixture.ctx(), &wait(9)).is_ok());
    }
}
