//! # Liveness Probe
//!
//! After the primary config is rewritten, the governed application is asked over HTTP
//! whether it still answers. A fatal error in `wp-config.php` takes the whole site down,
//! so a write that leaves fewer than the configured share of endpoints reachable is
//! rolled back.

use crate::error::ProbeError;
use crate::schemas::app_config::LivenessSettings;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::thread;
use std::time::Duration;

/// Fetches one URL and reports the HTTP status code.
pub trait EndpointProber {
    /// # Errors
    /// `ProbeError::Timeout` when no response arrived within `timeout`, and
    /// `ProbeError::Transport` for DNS, connection and TLS failures.
    fn probe(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError>;
}

/// Default prober over a blocking `ureq` agent. Redirects are not followed.
#[derive(Debug, Clone, Default)]
pub struct UreqProber;

impl EndpointProber for UreqProber {
    fn probe(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError> {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("confguard-liveness/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirects(0)
            .build();

        match agent.get(url).call() {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(transport)) => {
                let reason = transport.to_string();
                if reason.contains("timed out") {
                    Err(ProbeError::Timeout { url: url.to_string() })
                } else {
                    Err(ProbeError::Transport { url: url.to_string(), reason })
                }
            },
        }
    }
}

/// How many endpoints answered with 2xx/3xx.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessReport {
    pub successful: usize,
    pub total: usize,
    min_success_ratio: f64,
}

impl LivenessReport {
    /// True when nothing was probed or the success share reaches the threshold.
    pub fn passes(&self) -> bool {
        if self.total == 0 {
            return true;
        }
        self.successful as f64 / self.total as f64 >= self.min_success_ratio
    }
}

/// Probes a set of endpoints with escalating timeouts.
pub struct LivenessProbe {
    prober: Box<dyn EndpointProber>,
    timeouts: Vec<Duration>,
    retry_delay: Duration,
    min_success_ratio: f64,
}

impl LivenessProbe {
    pub fn new(
        prober: Box<dyn EndpointProber>,
        timeouts: Vec<Duration>,
        retry_delay: Duration,
        min_success_ratio: f64,
    ) -> Self {
        let timeouts = if timeouts.is_empty() {
            vec![Duration::from_secs(10), Duration::from_secs(15)]
        } else {
            timeouts
        };
        LivenessProbe { prober, timeouts, retry_delay, min_success_ratio }
    }

    /// Builds a probe from `config.yaml` settings with the given transport.
    pub fn from_settings(settings: &LivenessSettings, prober: Box<dyn EndpointProber>) -> Self {
        Self::new(
            prober,
            settings.timeouts_secs.iter().map(|secs| Duration::from_secs(*secs)).collect(),
            Duration::from_millis(settings.retry_delay_ms),
            settings.min_success_ratio,
        )
    }

    /// Tries every endpoint; each gets one attempt per configured timeout until one succeeds.
    pub fn probe_liveness(&self, endpoints: &[String]) -> LivenessReport {
        let successful = endpoints.iter().filter(|url| self.probe_endpoint(url)).count();
        let report = LivenessReport {
            successful,
            total: endpoints.len(),
            min_success_ratio: self.min_success_ratio,
        };
        if report.total > 0 {
            log_info!(
                "[Liveness] {}/{} endpoints responded",
                report.successful.to_string().bold(),
                report.total
            );
        }
        report
    }

    fn probe_endpoint(&self, url: &str) -> bool {
        for (attempt, timeout) in self.timeouts.iter().enumerate() {
            if attempt > 0 && !self.retry_delay.is_zero() {
                thread::sleep(self.retry_delay);
            }
            match self.prober.probe(url, *timeout) {
                Ok(status) if (200..400).contains(&status) => {
                    log_debug!("[Liveness] {} answered {}", url.cyan(), status);
                    return true;
                },
                Ok(status) => {
                    log_warn!("[Liveness] {} answered {}", url.cyan(), status.to_string().red());
                },
                Err(e) => log_warn!("[Liveness] {}", e),
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers from a per-URL script; an exhausted script times out.
    struct ScriptedProber {
        script: RefCell<HashMap<String, Vec<Result<u16, ()>>>>,
        seen_timeouts: RefCell<Vec<Duration>>,
    }

    impl ScriptedProber {
        fn new(entries: &[(&str, Vec<Result<u16, ()>>)]) -> Self {
            ScriptedProber {
                script: RefCell::new(
                    entries.iter().map(|(url, answers)| (url.to_string(), answers.clone())).collect(),
                ),
                seen_timeouts: RefCell::new(Vec::new()),
            }
        }
    }

    impl EndpointProber for std::rc::Rc<ScriptedProber> {
        fn probe(&self, url: &str, timeout: Duration) -> Result<u16, ProbeError> {
            self.seen_timeouts.borrow_mut().push(timeout);
            let mut script = self.script.borrow_mut();
            let answers = script.entry(url.to_string()).or_default();
            if answers.is_empty() {
                return Err(ProbeError::Timeout { url: url.to_string() });
            }
            answers.remove(0).map_err(|_| ProbeError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    fn probe_with(prober: std::rc::Rc<ScriptedProber>) -> LivenessProbe {
        LivenessProbe::new(
            Box::new(prober),
            vec![Duration::from_secs(10), Duration::from_secs(15)],
            Duration::ZERO,
            0.5,
        )
    }

    #[test]
    fn second_attempt_uses_longer_timeout() {
        let prober = std::rc::Rc::new(ScriptedProber::new(&[("http://site/", vec![Err(()), Ok(200)])]));
        let report = probe_with(prober.clone()).probe_liveness(&["http://site/".to_string()]);
        assert_eq!(report.successful, 1);
        assert!(report.passes());
        assert_eq!(
            *prober.seen_timeouts.borrow(),
            vec![Duration::from_secs(10), Duration::from_secs(15)]
        );
    }

    #[test]
    fn redirects_count_as_alive_and_server_errors_do_not() {
        let prober = std::rc::Rc::new(ScriptedProber::new(&[
            ("http://a/", vec![Ok(302)]),
            ("http://b/", vec![Ok(500), Ok(503)]),
            ("http://c/", vec![]),
        ]));
        let endpoints: Vec<String> = ["http://a/", "http://b/", "http://c/"].iter().map(|s| s.to_string()).collect();
        let report = probe_with(prober).probe_liveness(&endpoints);
        assert_eq!((report.successful, report.total), (1, 3));
        assert!(!report.passes());
    }

    #[test]
    fn half_reachable_passes() {
        let prober = std::rc::Rc::new(ScriptedProber::new(&[("http://a/", vec![Ok(200)])]));
        let endpoints = vec!["http://a/".to_string(), "http://b/".to_string()];
        assert!(probe_with(prober).probe_liveness(&endpoints).passes());
    }

    #[test]
    fn no_endpoints_passes_trivially() {
        let prober = std::rc::Rc::new(ScriptedProber::new(&[]));
        let report = probe_with(prober.clone()).probe_liveness(&[]);
        assert_eq!(report.total, 0);
        assert!(report.passes());
        assert!(prober.seen_timeouts.borrow().is_empty());
    }
}
