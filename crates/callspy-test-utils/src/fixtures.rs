//! Observer constructors for tests.
//!
//! - [`fake_observer`]: full-fidelity observer over a [`FakeMemory`].
//! - [`lightweight_fake_observer`]: the same with application capture off.

use callspy_observer::{CallObserver, ObserverConfig};

use crate::FakeMemory;

/// Full-fidelity observer that captures from `memory`.
pub fn fake_observer<'call>(memory: &'call FakeMemory) -> CallObserver<'call, &'call FakeMemory> {
    CallObserver::with_reader(&ObserverConfig::full_fidelity(), memory)
}

/// Observer with application-pool capture disabled, capturing from `memory`.
pub fn lightweight_fake_observer<'call>(
    memory: &'call FakeMemory,
) -> CallObserver<'call, &'call FakeMemory> {
    CallObserver::with_reader(&ObserverConfig::lightweight(), memory)
}
