//! Bounded cache of reusable execution contexts.
//!
//! Capacity only bounds how many idle contexts are kept; it never limits
//! concurrency. `acquire` hands out a cached context when one is available
//! and creates a fresh one otherwise.
//!
//! The lock is held only around the `Vec` mutation. Contexts are reset,
//! created and dropped outside it, since each of those may need the script
//! runtime's own lock.

use log::{trace, warn};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A context that can be wiped for reuse.
pub trait PooledContext: Send {
    type Error: fmt::Display;

    /// Removes every entry left by a previous execution.
    fn reset(&mut self) -> Result<(), Self::Error>;
}

type Factory<C> = Box<dyn Fn() -> Result<C, <C as PooledContext>::Error> + Send + Sync>;

pub struct ContextPool<C: PooledContext> {
    contexts: Mutex<Vec<C>>,
    /// Mirror of `contexts.len()` for the lock-free pre-check.
    len: AtomicUsize,
    capacity: usize,
    factory: Factory<C>,
}

impl<C: PooledContext> ContextPool<C> {
    /// Creates a pool and pre-seeds it with `capacity` contexts.
    pub fn new<F>(capacity: usize, factory: F) -> Result<Self, C::Error>
    where
        F: Fn() -> Result<C, C::Error> + Send + Sync + 'static,
    {
        let mut contexts = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            contexts.push(factory()?);
        }
        trace!("Context pool seeded with {} context(s)", capacity);

        Ok(Self {
            len: AtomicUsize::new(contexts.len()),
            contexts: Mutex::new(contexts),
            capacity,
            factory: Box::new(factory),
        })
    }

    /// Takes a cached context or creates a new one. Never waits for a release.
    pub fn acquire(&self) -> Result<PoolGuard<'_, C>, C::Error> {
        if self.len.load(Ordering::Acquire) > 0 {
            let mut contexts = self.lock();
            if !contexts.is_empty() {
                let context = contexts.remove(0);
                self.len.store(contexts.len(), Ordering::Release);
                drop(contexts);
                trace!("Context taken from pool");
                return Ok(PoolGuard::new(self, context));
            }
        }

        trace!("Context pool empty, creating a new context");
        let context = (self.factory)()?;
        Ok(PoolGuard::new(self, context))
    }

    /// Resets `context` and keeps it if there is room.
    ///
    /// A context that fails to reset is discarded rather than cached dirty.
    pub fn release(&self, mut context: C) {
        if let Err(e) = context.reset() {
            warn!("Discarding execution context that failed to reset: {}", e);
            return;
        }

        let mut rejected = Some(context);
        if self.len.load(Ordering::Acquire) < self.capacity {
            let mut contexts = self.lock();
            if contexts.len() < self.capacity
                && let Some(context) = rejected.take()
            {
                contexts.push(context);
                self.len.store(contexts.len(), Ordering::Release);
            }
        }

        if rejected.is_some() {
            trace!("Context pool full, discarding context");
        }
    }

    /// Number of idle contexts currently cached.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Vec<C>> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: PooledContext> fmt::Debug for ContextPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A context on loan from the pool; returned on drop.
pub struct PoolGuard<'a, C: PooledContext> {
    pool: &'a ContextPool<C>,
    context: Option<C>,
}

impl<'a, C: PooledContext> PoolGuard<'a, C> {
    fn new(pool: &'a ContextPool<C>, context: C) -> Self {
        Self {
            pool,
            context: Some(context),
        }
    }
}

impl<C: PooledContext> Deref for PoolGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        // Only `None` after drop has taken it.
        match &self.context {
            Some(context) => context,
            None => unreachable!("pool guard used after release"),
        }
    }
}

impl<C: PooledContext> DerefMut for PoolGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        match &mut self.context {
            Some(context) => context,
            None => unreachable!("pool guard used after release"),
        }
    }
}

impl<C: PooledContext> Drop for PoolGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            self.pool.release(context);
        }
    }
}
