//! A one-time-initialization guard shared between several lazy cells.
//!
//! Every cell joined to an [`InitDomain`] runs its initializer while owning the
//! domain, so at most one initializer of the whole domain runs at a time. This
//! is how a `call_once` built on a single global mutex behaves, and it is the
//! source of the stall: a caller that needs a cheap, unrelated object still
//! waits for whatever slow initializer currently owns the domain.
//!
//! The domain is re-entrant. An initializer that forces another cell of the
//! same domain (Duke forcing Logger) enters again on the same thread instead of
//! deadlocking.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::info;

struct Owner {
    thread: Option<ThreadId>,
    depth: usize,
}

pub struct InitDomain {
    owner: Mutex<Owner>,
    released: Condvar,
    contended: AtomicUsize,
}

impl InitDomain {
    pub const fn new() -> Self {
        InitDomain {
            owner: Mutex::new(Owner {
                thread: None,
                depth: 0,
            }),
            released: Condvar::new(),
            contended: AtomicUsize::new(0),
        }
    }

    /// Blocks until the calling thread owns the domain.
    ///
    /// Ownership is released when the outermost guard is dropped, which also
    /// happens while unwinding out of a panicking initializer.
    pub fn enter(&self) -> DomainGuard<'_> {
        let me = thread::current().id();
        let mut owner = self.lock_owner();
        let mut waited = false;

        loop {
            match owner.thread {
                None => {
                    owner.thread = Some(me);
                    owner.depth = 1;
                    break;
                }
                Some(holder) if holder == me => {
                    owner.depth += 1;
                    break;
                }
                Some(holder) => {
                    if !waited {
                        waited = true;
                        self.contended.fetch_add(1, Ordering::Relaxed);
                        info!(?holder, "waiting for another thread's initializer");
                    }
                    owner = self
                        .released
                        .wait(owner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }

        DomainGuard {
            domain: self,
            _not_send: PhantomData,
        }
    }

    /// Number of times a thread had to block because another thread was
    /// running an initializer.
    pub fn contended(&self) -> usize {
        self.contended.load(Ordering::Relaxed)
    }

    pub fn is_held(&self) -> bool {
        self.lock_owner().thread.is_some()
    }

    fn lock_owner(&self) -> MutexGuard<'_, Owner> {
        // Owner is only mutated in short non-panicking sections.
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn leave(&self) {
        let mut owner = self.lock_owner();
        owner.depth -= 1;
        if owner.depth == 0 {
            owner.thread = None;
            drop(owner);
            self.released.notify_all();
        }
    }
}

impl Default for InitDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InitDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDomain")
            .field("held", &self.is_held())
            .field("contended", &self.contended())
            .finish()
    }
}

/// Proof of ownership of an [`InitDomain`]. Must be dropped on the thread
/// that created it.
pub struct DomainGuard<'a> {
    domain: &'a InitDomain,
    _not_send: PhantomData<*const ()>,
}

impl Drop for DomainGuard<'_> {
    fn drop(&mut self) {
        self.domain.leave();
    }
}
