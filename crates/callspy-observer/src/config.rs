//! Observer configuration.

use callspy_arena::ArenaConfig;

/// Per-call observer settings, fixed at construction.
///
/// The interception layer decides, per call, whether full-fidelity capture
/// is wanted and hands the result over as
/// [`ObserverConfig::observe_application_pool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverConfig {
    /// Whether application-pool memory is captured at all.
    ///
    /// When `false` the observer runs as a lightweight trace: typed-view
    /// registrations become no-ops and tool-side writes happen eagerly.
    ///
    /// Default: `true`.
    pub observe_application_pool: bool,

    /// Configuration of the call's scratch arena.
    pub scratch: ArenaConfig,
}

impl ObserverConfig {
    /// Capture application memory (the default).
    pub fn full_fidelity() -> Self {
        Self {
            observe_application_pool: true,
            scratch: ArenaConfig::default(),
        }
    }

    /// Skip application-memory capture.
    pub fn lightweight() -> Self {
        Self {
            observe_application_pool: false,
            ..Self::full_fidelity()
        }
    }

    /// Replace the scratch arena configuration.
    pub fn with_scratch(mut self, scratch: ArenaConfig) -> Self {
        self.scratch = scratch;
        self
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self::full_fidelity()
    }
}
