//! The two lazily-built services and the context that owns their cells.
//!
//! `Duke` needs `Logger` while it is being built, and it is slow to build.
//! With a shared guard the first thread to touch `Duke` holds up every thread
//! that asks for `Logger`, even though `Logger` itself is ready long before
//! `Duke` is.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::{GuardMode, HazardConfig};
use crate::domain::InitDomain;
use crate::lazy::{Initializer, LazyCell};

pub type LoggerCell = LazyCell<Logger, Initializer<Logger>>;
pub type DukeCell = LazyCell<Duke, Initializer<Duke>>;

#[derive(Debug)]
pub struct Logger {
    ready_at: Instant,
}

impl Logger {
    pub(crate) fn start(delay: Duration) -> Self {
        thread::sleep(delay);
        Logger {
            ready_at: Instant::now(),
        }
    }

    /// Accepts a message and discards it; returns `self` so calls chain.
    pub fn append(&self, message: &str) -> &Self {
        trace!(target: "logger", "{}", message);
        self
    }

    pub fn ready_at(&self) -> Instant {
        self.ready_at
    }
}

#[derive(Debug)]
pub struct Duke {
    ready_at: Instant,
}

impl Duke {
    pub(crate) fn start(logger: &LoggerCell, delay: Duration) -> Self {
        logger.get_or_init().append("started Duke's initialization");
        thread::sleep(delay);
        logger.get_or_init().append("finishing Duke's initialization");
        Duke {
            ready_at: Instant::now(),
        }
    }

    pub fn ready_at(&self) -> Instant {
        self.ready_at
    }
}

/// Owns one lazy cell per service.
///
/// Fields drop in declaration order, so `duke` goes first. The logger cell is
/// also held by Duke's initializer and is freed with whichever goes last.
pub struct Services {
    config: HazardConfig,
    duke: DukeCell,
    logger: Arc<LoggerCell>,
    domain: Option<Arc<InitDomain>>,
}

static GLOBAL: LazyCell<Services> = LazyCell::new("services", Services::from_defaults);

impl Services {
    pub fn new(config: HazardConfig) -> Self {
        let domain = match config.guard {
            GuardMode::Shared => Some(Arc::new(InitDomain::new())),
            GuardMode::Isolated => None,
        };

        let logger_delay = config.logger_delay();
        let logger_init: Initializer<Logger> = Box::new(move || Logger::start(logger_delay));
        let logger = Arc::new(cell("logger", logger_init, domain.as_ref()));

        let duke_delay = config.duke_delay();
        let duke_logger = Arc::clone(&logger);
        let duke_init: Initializer<Duke> = Box::new(move || Duke::start(&duke_logger, duke_delay));
        let duke = cell("duke", duke_init, domain.as_ref());

        Services {
            config,
            duke,
            logger,
            domain,
        }
    }

    /// The process-wide context, built from the default configuration on
    /// first use and never dropped.
    pub fn global() -> &'static Services {
        GLOBAL.get_or_init()
    }

    fn from_defaults() -> Services {
        Services::new(HazardConfig::default())
    }

    pub fn logger(&self) -> &Logger {
        self.logger.get_or_init()
    }

    pub fn duke(&self) -> &Duke {
        self.duke.get_or_init()
    }

    pub fn logger_cell(&self) -> &LoggerCell {
        &self.logger
    }

    pub fn duke_cell(&self) -> &DukeCell {
        &self.duke
    }

    pub fn domain(&self) -> Option<&Arc<InitDomain>> {
        self.domain.as_ref()
    }

    pub fn config(&self) -> &HazardConfig {
        &self.config
    }
}

fn cell<T>(
    name: &'static str,
    init: Initializer<T>,
    domain: Option<&Arc<InitDomain>>,
) -> LazyCell<T, Initializer<T>> {
    match domain {
        Some(domain) => LazyCell::in_domain(name, init, Arc::clone(domain)),
        None => LazyCell::new(name, init),
    }
}
