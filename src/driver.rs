//! Two threads, one asking for Duke and one asking for Logger, each reporting
//! when it entered and left its call.

use std::io::Write;
use std::panic;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::HazardConfig;
use crate::services::Services;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
    pub duke_wait: Duration,
    pub logger_wait: Duration,
}

impl DriverReport {
    /// True when the Logger caller waited at least as long as Duke's own
    /// delay, i.e. it was held up by Duke's construction and not just by
    /// Logger's.
    pub fn logger_stalled_by_duke(&self, config: &HazardConfig) -> bool {
        self.logger_wait >= config.duke_delay()
    }
}

pub fn run<W: Write + Send>(services: &Services, timeline: &Timeline<W>) -> DriverReport {
    thread::scope(|s| {
        let duke = s.spawn(|| {
            timed_call(timeline, "get_duke", || {
                services.duke();
            })
        });
        let logger = s.spawn(|| {
            timed_call(timeline, "get_logger", || {
                services.logger();
            })
        });

        DriverReport {
            duke_wait: duke.join().unwrap_or_else(|payload| panic::resume_unwind(payload)),
            logger_wait: logger.join().unwrap_or_else(|payload| panic::resume_unwind(payload)),
        }
    })
}

fn timed_call<W: Write>(timeline: &Timeline<W>, function: &str, call: impl FnOnce()) -> Duration {
    if let Err(err) = timeline.entered(function) {
        warn!(function, %err, "failed to write entered line");
    }
    debug!(function, "calling");

    let start = Instant::now();
    call();
    let waited = start.elapsed();

    debug!(function, ?waited, "returned");
    if let Err(err) = timeline.exiting(function) {
        warn!(function, %err, "failed to write exiting line");
    }
    waited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardMode;

    fn run_captured(services: &Services) -> (DriverReport, Vec<String>) {
        let timeline = Timeline::new(Vec::new());
        let report = run(services, &timeline);
        let output = String::from_utf8(timeline.into_inner()).unwrap();
        (report, output.lines().map(str::to_string).collect())
    }

    #[test]
    fn test_entered_lines_precede_exiting_lines() {
        let services = Services::new(HazardConfig::fast(GuardMode::Shared));
        let (_, lines) = run_captured(&services);

        assert_eq!(lines.len(), 4);
        let mut entered: Vec<&str> = lines[..2]
            .iter()
            .map(|l| l.split_whitespace().nth(1).unwrap())
            .collect();
        entered.sort();
        assert_eq!(entered, ["get_duke", "get_logger"]);
        assert!(lines[..2].iter().all(|l| l.starts_with("Entered ")));
        assert!(lines[2..].iter().all(|l| l.starts_with("Exiting ")));
    }

    #[test]
    fn test_both_services_built_once_and_logger_before_its_caller_exits() {
        let services = Services::new(HazardConfig::fast(GuardMode::Shared));
        let (report, _) = run_captured(&services);

        assert_eq!(services.logger_cell().constructions(), 1);
        assert_eq!(services.duke_cell().constructions(), 1);

        let config = services.config();
        assert!(report.duke_wait >= config.duke_delay());
        assert!(report.logger_wait + Duration::from_millis(50) >= config.logger_delay());
        assert!(report.logger_wait <= report.duke_wait + Duration::from_millis(50));
    }

    #[test]
    fn test_stall_detection() {
        let config = HazardConfig::fast(GuardMode::Shared);
        let stalled = DriverReport {
            duke_wait: Duration::from_millis(500),
            logger_wait: Duration::from_millis(490),
        };
        let clean = DriverReport {
            duke_wait: Duration::from_millis(500),
            logger_wait: Duration::from_millis(100),
        };
        assert!(stalled.logger_stalled_by_duke(&config));
        assert!(!clean.logger_stalled_by_duke(&config));
    }

    #[test]
    fn test_second_run_returns_immediately() {
        let services = Services::new(HazardConfig::fast(GuardMode::Isolated));
        run_captured(&services);

        let (report, lines) = run_captured(&services);
        assert_eq!(lines.len(), 4);
        assert!(report.duke_wait < Duration::from_millis(50));
        assert!(report.logger_wait < Duration::from_millis(50));
        assert_eq!(services.duke_cell().attempts(), 1);
    }
}
