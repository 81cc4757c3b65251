//! Fault injection rules and request matchers.

use salad_protocol::messages::AnyRequest;
use salad_protocol::{Method, StatusCode};

/// A compiled fault rule: when it fires, the handler is skipped and the
/// configured status is returned verbatim.
#[derive(Debug, Clone)]
pub struct FaultRule {
    pub method: Method,
    /// 1-based call ordinal this rule is pinned to, if any.
    pub nth_call: Option<u64>,
    pub matcher: Option<RequestMatcher>,
    pub code: StatusCode,
    pub message: String,
}

/// Request predicate, tagged by the scalar it inspects.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestMatcher {
    Filepath(String),
    CaptureId(u64),
    AnalyzerId(u64),
    AnalyzerName(String),
}

impl RequestMatcher {
    /// Whether this matcher kind is meaningful for the given method.
    pub fn supports(&self, method: Method) -> bool {
        match self {
            Self::Filepath(_) => matches!(method, Method::LoadCapture),
            Self::CaptureId(_) => matches!(
                method,
                Method::SaveCapture
                    | Method::StopCapture
                    | Method::WaitCapture
                    | Method::CloseCapture
                    | Method::AddAnalyzer
                    | Method::AddHighLevelAnalyzer
                    | Method::ExportRawDataCsv
                    | Method::ExportRawDataBinary
                    | Method::ExportDataTableCsv
            ),
            Self::AnalyzerId(_) => matches!(
                method,
                Method::RemoveAnalyzer | Method::RemoveHighLevelAnalyzer
            ),
            Self::AnalyzerName(_) => matches!(method, Method::AddAnalyzer),
        }
    }

    pub fn matches(&self, request: &AnyRequest) -> bool {
        match (self, request) {
            (Self::Filepath(want), AnyRequest::LoadCapture(req)) => req.filepath == *want,
            (Self::CaptureId(want), req) => req.capture_id() == Some(*want),
            (Self::AnalyzerId(want), AnyRequest::RemoveAnalyzer(req)) => req.analyzer_id == *want,
            (Self::AnalyzerId(want), AnyRequest::RemoveHighLevelAnalyzer(req)) => {
                req.analyzer_id == *want
            }
            (Self::AnalyzerName(want), AnyRequest::AddAnalyzer(req)) => {
                req.analyzer_name == *want
            }
            _ => false,
        }
    }
}

/// Select the first rule that fires for this call, in definition order.
pub fn first_match<'a>(
    faults: &'a [FaultRule],
    method: Method,
    request: &AnyRequest,
    call_n: u64,
) -> Option<&'a FaultRule> {
    faults.iter().find(|rule| {
        if rule.method != method {
            return false;
        }
        if let Some(nth) = rule.nth_call {
            if nth != call_n {
                return false;
            }
        }
        if let Some(matcher) = &rule.matcher {
            if !matcher.matches(request) {
                return false;
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use salad_protocol::messages::{LoadCaptureRequest, SaveCaptureRequest};

    fn rule(method: Method, message: &str) -> FaultRule {
        FaultRule {
            method,
            nth_call: None,
            matcher: None,
            code: StatusCode::Internal,
            message: message.to_string(),
        }
    }

    fn save_request(capture_id: u64) -> AnyRequest {
        AnyRequest::SaveCapture(SaveCaptureRequest {
            capture_id,
            filepath: "/tmp/a.sal".to_string(),
        })
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let faults = vec![
            rule(Method::SaveCapture, "first"),
            rule(Method::SaveCapture, "second"),
        ];
        let hit = first_match(&faults, Method::SaveCapture, &save_request(1), 1).unwrap();
        assert_eq!(hit.message, "first");

        let hit = first_match(&faults[1..], Method::SaveCapture, &save_request(1), 1).unwrap();
        assert_eq!(hit.message, "second");
    }

    #[test]
    fn test_nth_call_pins_the_ordinal() {
        let mut pinned = rule(Method::SaveCapture, "second call only");
        pinned.nth_call = Some(2);
        let faults = vec![pinned];

        assert!(first_match(&faults, Method::SaveCapture, &save_request(1), 1).is_none());
        assert!(first_match(&faults, Method::SaveCapture, &save_request(1), 2).is_some());
        assert!(first_match(&faults, Method::SaveCapture, &save_request(1), 3).is_none());
    }

    #[test]
    fn test_method_must_match() {
        let faults = vec![rule(Method::StopCapture, "stop only")];
        assert!(first_match(&faults, Method::SaveCapture, &save_request(1), 1).is_none());
    }

    #[test]
    fn test_capture_id_matcher() {
        let mut scoped = rule(Method::SaveCapture, "capture 7 only");
        scoped.matcher = Some(RequestMatcher::CaptureId(7));
        let faults = vec![scoped];

        assert!(first_match(&faults, Method::SaveCapture, &save_request(1), 1).is_none());
        assert!(first_match(&faults, Method::SaveCapture, &save_request(7), 1).is_some());
    }

    #[test]
    fn test_filepath_matcher() {
        let matcher = RequestMatcher::Filepath("/tmp/x.sal".to_string());
        let matching = AnyRequest::LoadCapture(LoadCaptureRequest {
            filepath: "/tmp/x.sal".to_string(),
        });
        let other = AnyRequest::LoadCapture(LoadCaptureRequest {
            filepath: "/tmp/y.sal".to_string(),
        });
        assert!(matcher.matches(&matching));
        assert!(!matcher.matches(&other));
    }

    #[test]
    fn test_matcher_support_table() {
        assert!(RequestMatcher::Filepath(String::new()).supports(Method::LoadCapture));
        assert!(!RequestMatcher::Filepath(String::new()).supports(Method::SaveCapture));
        assert!(RequestMatcher::CaptureId(1).supports(Method::ExportDataTableCsv));
        assert!(!RequestMatcher::CaptureId(1).supports(Method::GetDevices));
        assert!(RequestMatcher::AnalyzerId(1).supports(Method::RemoveHighLevelAnalyzer));
        assert!(RequestMatcher::AnalyzerName(String::new()).supports(Method::AddAnalyzer));
        assert!(!RequestMatcher::AnalyzerName(String::new()).supports(Method::RemoveAnalyzer));
    }
}
