//! The per-call observer facade.

use std::ffi::{c_char, CStr};
use std::io::Write;
use std::rc::Rc;

use callspy_arena::ScratchArena;
use callspy_core::codec::encode_extra;
use callspy_core::{AbortError, CodecError, Encodable, ErrorCode, Observation, Observations};
use callspy_pool::{Element, MemoryView, Pool, Slice};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::config::ObserverConfig;
use crate::extra::{Extra, Extras};
use crate::memory::{MemoryReader, ProcessMemory};
use crate::pending::PendingRanges;

/// Which call phase a registration or materialization belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Read,
    Write,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Collects memory observations for one intercepted call.
///
/// Create one at the start of the call and drop it at the end. Everything
/// the observer allocates (scratch memory, the observations record, retained
/// pools) is released on drop, on every exit path.
///
/// The read and write phases share one pending set: register inputs, call
/// [`observe_reads`](Self::observe_reads), run the real call, register
/// outputs, call [`observe_writes`](Self::observe_writes). Captured bytes
/// reflect memory at materialization time, not at registration time.
///
/// # Example
///
/// ```
/// use callspy_observer::{CallObserver, ObserverConfig};
/// use callspy_pool::Slice;
///
/// let mut input = [1u8, 2, 3, 4];
/// let mut output = [0u8; 2];
/// let config = ObserverConfig::full_fidelity();
///
/// let mut observer = CallObserver::new(&config);
/// observer.set_command_name("glBufferSubData");
///
/// let src = Slice::application(&mut input);
/// let dst = Slice::application(&mut output);
/// observer.read_view(&src);
/// observer.observe_reads();
///
/// // The real call writes the output buffer.
/// dst.set(0, 9);
/// observer.write_view(&dst);
/// observer.observe_writes();
///
/// let record = observer.observations().unwrap();
/// assert_eq!(record.reads[0].bytes(), &[1, 2, 3, 4]);
/// assert_eq!(record.writes[0].bytes(), &[9, 0]);
/// ```
pub struct CallObserver<'call, R: MemoryReader = ProcessMemory> {
    command_name: Option<&'call str>,
    error: ErrorCode,
    observe_application_pool: bool,
    scratch: ScratchArena,
    observations: Option<Observations>,
    pending: PendingRanges,
    extras: SmallVec<[Extra<'call>; 4]>,
    /// Tool pools behind pending ranges, kept alive until materialized.
    retained: Vec<Rc<Pool>>,
    reader: R,
}

impl<'call> CallObserver<'call, ProcessMemory> {
    /// Create an observer that captures from the current process.
    pub fn new(config: &ObserverConfig) -> Self {
        Self::with_reader(config, ProcessMemory)
    }
}

impl<'call, R: MemoryReader> CallObserver<'call, R> {
    /// Create an observer that captures bytes through `reader`.
    pub fn with_reader(config: &ObserverConfig, reader: R) -> Self {
        Self {
            command_name: None,
            error: ErrorCode::NO_ERROR,
            observe_application_pool: config.observe_application_pool,
            scratch: ScratchArena::new(config.scratch.clone()),
            observations: None,
            pending: PendingRanges::new(),
            extras: SmallVec::new(),
            retained: Vec::new(),
            reader,
        }
    }

    // ── Call metadata ───────────────────────────────────────────

    /// Name the command being observed. The name is borrowed for the whole
    /// call, typically from a `'static` table.
    pub fn set_command_name(&mut self, name: &'call str) {
        self.command_name = Some(name);
    }

    /// The command name, if one was set.
    pub fn command_name(&self) -> Option<&'call str> {
        self.command_name
    }

    /// The error code recorded for this call.
    pub fn error(&self) -> ErrorCode {
        self.error
    }

    /// Record an error code for this call. Not validated.
    pub fn set_error(&mut self, error: ErrorCode) {
        self.error = error;
    }

    /// Scratch memory that lives exactly as long as the call.
    pub fn scratch(&self) -> &ScratchArena {
        &self.scratch
    }

    /// Whether application-pool memory is observed by this call.
    pub fn observes_application_pool(&self) -> bool {
        self.observe_application_pool
    }

    /// Ranges registered but not yet materialized.
    pub fn pending(&self) -> &PendingRanges {
        &self.pending
    }

    /// The observations record, once the first non-empty materialization
    /// has created it.
    pub fn observations(&self) -> Option<&Observations> {
        self.observations.as_ref()
    }

    // ── Raw registration ────────────────────────────────────────

    /// Register `size` bytes at `base` as a pending read. Nothing is copied
    /// and pool classification is not consulted. `size == 0` is a no-op.
    ///
    /// # Safety
    ///
    /// When the observer's reader is backed by real memory, the range must
    /// stay readable until the next materialization.
    #[allow(unsafe_code)]
    pub unsafe fn read(&mut self, base: u64, size: u64) {
        self.register(base, size, Phase::Read);
    }

    /// Register `size` bytes at `base` as a pending write. Nothing is copied
    /// and pool classification is not consulted. `size == 0` is a no-op.
    ///
    /// # Safety
    ///
    /// Same as [`CallObserver::read`].
    #[allow(unsafe_code)]
    pub unsafe fn write(&mut self, base: u64, size: u64) {
        self.register(base, size, Phase::Write);
    }

    // ── Typed views ─────────────────────────────────────────────

    /// Register the whole view as a pending read if it is observable.
    pub fn read_view<V: MemoryView<'call> + ?Sized>(&mut self, view: &V) {
        if self.should_observe(view) {
            self.register_view(view, Phase::Read);
        }
    }

    /// Return element `index` of `src`, registering that element as a
    /// pending read if the view is observable.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn read_element<T: Element>(&mut self, src: &Slice<'call, T>, index: usize) -> T {
        let value = src.get(index);
        if self.should_observe(src) {
            self.register(src.element_address(index), element_len::<T>(), Phase::Read);
        }
        value
    }

    /// Register the whole view as a pending write if it is observable.
    pub fn write_view<V: MemoryView<'call> + ?Sized>(&mut self, view: &V) {
        if self.should_observe(view) {
            self.register_view(view, Phase::Write);
        }
    }

    /// Store `value` at `index` of a tool-side view, or, for an observable
    /// application view, leave memory untouched and register the element as
    /// a pending write. Application memory is written by the real call, not
    /// by the observer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn write_element<T: Element>(&mut self, dst: &Slice<'call, T>, index: usize, value: T) {
        if self.should_observe(dst) {
            self.register(dst.element_address(index), element_len::<T>(), Phase::Write);
        } else {
            dst.set(index, value);
        }
    }

    /// Register `src` as a pending read (regardless of pool) and copy
    /// `min(src.count, dst.count)` elements into `dst` unless `dst` is
    /// observable. Returns `dst` so the caller can register it as a write
    /// once the real call has filled it.
    pub fn copy<'a, T: Element>(&mut self, dst: &Slice<'a, T>, src: &Slice<'call, T>) -> Slice<'a, T> {
        self.register_view(src, Phase::Read);
        if !(self.observe_application_pool && dst.is_application_pool()) {
            let n = src.count().min(dst.count());
            src.copy_to(dst, 0, n, 0);
        }
        dst.clone()
    }

    /// Copy `src` into a fresh tool-owned pool, registering `src` as a
    /// pending read.
    pub fn clone_slice<T: Element>(&mut self, src: &Slice<'call, T>) -> Slice<'static, T> {
        let dst = Slice::make(src.count());
        self.copy(&dst, src)
    }

    /// Read the NUL-terminated string at `ptr`, registering it and its
    /// terminator as one pending read. Never gated on pool classification.
    ///
    /// # Errors
    ///
    /// Returns [`AbortError::NullPointer`] if `ptr` is null; nothing is
    /// registered in that case.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable NUL-terminated string that
    /// stays readable until the next materialization.
    #[allow(unsafe_code)]
    pub unsafe fn string(&mut self, ptr: *const c_char) -> Result<String, AbortError> {
        if ptr.is_null() {
            warn!(
                command = self.command_name.unwrap_or("<unnamed>"),
                "null string pointer"
            );
            return Err(AbortError::NullPointer {
                operation: "CallObserver::string",
            });
        }
        // SAFETY: non-null, and the caller guarantees a readable
        // NUL-terminated string.
        let text = unsafe { CStr::from_ptr(ptr) };
        let len = text.to_bytes_with_nul().len() as u64;
        self.register(ptr as usize as u64, len, Phase::Read);
        Ok(text.to_string_lossy().into_owned())
    }

    /// Register the whole character view as a pending read (never gated)
    /// and return its text.
    pub fn string_slice(&mut self, slice: &Slice<'call, c_char>) -> String {
        self.register_view(slice, Phase::Read);
        let bytes: Vec<u8> = slice.to_vec().into_iter().map(|c| c as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    // ── Materialization ─────────────────────────────────────────

    /// Capture every pending range into the record's `reads` list.
    /// A no-op on an empty pending set.
    pub fn observe_reads(&mut self) {
        self.observe_phase(Phase::Read);
    }

    /// Capture every pending range into the record's `writes` list.
    /// A no-op on an empty pending set.
    pub fn observe_writes(&mut self) {
        self.observe_phase(Phase::Write);
    }

    /// Capture every pending range into `out`, in ascending address order,
    /// and clear the pending set.
    pub fn observe(&mut self, out: &mut Vec<Observation>) {
        materialize(&mut self.pending, &self.reader, out, "observe");
        self.retained.clear();
    }

    fn observe_phase(&mut self, phase: Phase) {
        if self.pending.is_empty() {
            return;
        }
        if self.observations.is_none() {
            self.extras.push(Extra::Observations);
            debug!(
                command = self.command_name.unwrap_or("<unnamed>"),
                extra_index = self.extras.len() - 1,
                "observations record attached"
            );
        }
        let record = self.observations.get_or_insert_with(Observations::new);
        let out = match phase {
            Phase::Read => &mut record.reads,
            Phase::Write => &mut record.writes,
        };
        materialize(&mut self.pending, &self.reader, out, phase.as_str());
        self.retained.clear();
    }

    // ── Extras ──────────────────────────────────────────────────

    /// Extras attached to the call, in attachment order.
    pub fn extras(&self) -> Extras<'_, 'call> {
        Extras::new(&self.extras, self.observations.as_ref())
    }

    /// Append a caller-owned extra.
    pub fn add_extra(&mut self, extra: &'call dyn Encodable) {
        self.extras.push(Extra::External(extra));
    }

    /// Encode every extra, in order, with the reference framing from
    /// [`callspy_core::codec`].
    pub fn encode_extras(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        for extra in self.extras() {
            encode_extra(w, extra.as_encodable())?;
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────

    fn should_observe<V: MemoryView<'call> + ?Sized>(&self, view: &V) -> bool {
        self.observe_application_pool && view.is_application_pool()
    }

    fn register_view<V: MemoryView<'call> + ?Sized>(&mut self, view: &V, phase: Phase) {
        let len = view.byte_len();
        if len == 0 {
            return;
        }
        if let Some(pool) = view.backing_pool() {
            self.retained.push(pool);
        }
        self.register(view.base_address(), len, phase);
    }

    fn register(&mut self, base: u64, size: u64, phase: Phase) {
        if size == 0 {
            return;
        }
        trace!(base, size, phase = phase.as_str(), "pending range registered");
        self.pending.insert(base, size);
    }
}

fn element_len<T>() -> u64 {
    std::mem::size_of::<T>() as u64
}

#[allow(unsafe_code)]
fn materialize<R: MemoryReader>(
    pending: &mut PendingRanges,
    reader: &R,
    out: &mut Vec<Observation>,
    phase: &'static str,
) {
    if pending.is_empty() {
        return;
    }
    let intervals = pending.count();
    let bytes = pending.total_bytes();
    // SAFETY: typed-view ranges are readable under the `MemoryView` contract:
    // the view borrows for `'call`, or its backing pool sits in `retained`
    // until after this call. Raw ranges carry the guarantee made by the
    // caller of the unsafe `read`, `write`, or `string`.
    unsafe { pending.materialize_into(out, reader) };
    debug!(phase, intervals, bytes, "observations materialized");
}
