//! Generic lazy cell: an optional value, a one-time-initialization guard and
//! the function that builds the value.
//!
//! A cell either owns its guard (isolated) or initializes under an
//! [`InitDomain`] shared with other cells. In both cases a cell constructs its
//! value at most once, every concurrent first caller blocks until that
//! construction finishes, and every later caller takes a lock-free fast path.
//!
//! Failure policy: an initializer that returns `Err` or panics leaves the cell
//! empty and releases the guard. The failing caller sees the error (or the
//! panic); the next access runs the initializer again.

use std::convert::Infallible;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::domain::{DomainGuard, InitDomain};

/// Boxed initializer used by cells that are built at runtime.
pub type Initializer<T> = Box<dyn Fn() -> T + Send + Sync>;

pub struct LazyCell<T, F = fn() -> T> {
    name: &'static str,
    value: OnceCell<T>,
    init: F,
    domain: Option<Arc<InitDomain>>,
    attempts: AtomicUsize,
    constructions: AtomicUsize,
}

impl<T, F> LazyCell<T, F> {
    /// An empty cell with its own guard. Usable in `static` items.
    pub const fn new(name: &'static str, init: F) -> Self {
        LazyCell {
            name,
            value: OnceCell::new(),
            init,
            domain: None,
            attempts: AtomicUsize::new(0),
            constructions: AtomicUsize::new(0),
        }
    }

    /// An empty cell whose initializer runs while owning `domain`.
    pub fn in_domain(name: &'static str, init: F, domain: Arc<InitDomain>) -> Self {
        LazyCell {
            domain: Some(domain),
            ..Self::new(name, init)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value, if it has been constructed. Never blocks.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }

    /// Times the initializer has been invoked, failed runs included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    /// Times the initializer has completed successfully: 0 or 1.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Acquire)
    }

    pub fn domain(&self) -> Option<&Arc<InitDomain>> {
        self.domain.as_ref()
    }

    fn guard(&self) -> Option<DomainGuard<'_>> {
        self.domain.as_deref().map(InitDomain::enter)
    }

    fn construct<E>(&self, build: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        info!(cell = self.name, attempt, "constructing");
        let start = Instant::now();

        let built = build();
        match &built {
            Ok(_) => {
                self.constructions.fetch_add(1, Ordering::AcqRel);
                info!(cell = self.name, elapsed = ?start.elapsed(), "constructed");
            }
            Err(_) => info!(cell = self.name, attempt, "initializer failed, cell left empty"),
        }
        built
    }
}

impl<T, F: Fn() -> T> LazyCell<T, F> {
    /// Returns the value, constructing it if no thread has done so yet.
    pub fn get_or_init(&self) -> &T {
        if let Some(value) = self.value.get() {
            return value;
        }

        let _guard = self.guard();
        let built = self
            .value
            .get_or_try_init(|| self.construct(|| Ok::<T, Infallible>((self.init)())));
        match built {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<T, E, F: Fn() -> Result<T, E>> LazyCell<T, F> {
    /// Returns the value, running the fallible initializer if needed.
    ///
    /// On `Err` the cell stays empty and a later call tries again.
    pub fn get_or_try_init(&self) -> Result<&T, E> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let _guard = self.guard();
        self.value.get_or_try_init(|| self.construct(&self.init))
    }
}

impl<T, F: Fn() -> T> Deref for LazyCell<T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get_or_init()
    }
}

impl<T: fmt::Debug, F> fmt::Debug for LazyCell<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCell")
            .field("name", &self.name)
            .field("value", &self.value.get())
            .field("shared_guard", &self.domain.is_some())
            .finish()
    }
}
