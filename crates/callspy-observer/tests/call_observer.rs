//! End-to-end observer scenarios over a fake address space.

use callspy_core::codec::{decode_observations, read_extra};
use callspy_core::{Encodable, Observation, EXTRA_OBSERVATIONS};
use callspy_observer::{CallObserver, ExtraRef, ObserverConfig};
use callspy_pool::{MemoryView, PoolKind, Slice};
use callspy_test_utils::fixtures::{fake_observer, lightweight_fake_observer};
use callspy_test_utils::{FakeMemory, TagExtra};

fn spans(list: &[Observation]) -> Vec<(u64, u64)> {
    list.iter().map(|o| (o.address(), o.len())).collect()
}

#[test]
fn adjacent_reads_become_one_observation() {
    let memory = FakeMemory::new();
    memory.fill_pattern(100, 20);
    let mut obs = fake_observer(&memory);
    unsafe {
        obs.read(100, 10);
        obs.read(110, 10);
    }
    obs.observe_reads();

    let record = obs.observations().unwrap();
    assert_eq!(spans(&record.reads), vec![(100, 20)]);
    assert_eq!(record.reads[0].bytes(), memory.peek(100, 20).as_slice());
    assert!(record.writes.is_empty());
}

#[test]
fn overlapping_and_disjoint_ranges() {
    let memory = FakeMemory::new();
    let mut obs = fake_observer(&memory);
    unsafe {
        obs.read(500, 8);
        obs.read(0, 16);
        obs.read(8, 16);
        obs.read(200, 4);
    }
    let mut out = Vec::new();
    obs.observe(&mut out);
    assert_eq!(spans(&out), vec![(0, 24), (200, 4), (500, 8)]);
    assert!(obs.pending().is_empty());
}

#[test]
fn second_observe_on_empty_set_adds_nothing() {
    let memory = FakeMemory::new();
    let mut obs = fake_observer(&memory);
    unsafe { obs.read(64, 4) };
    obs.observe_reads();
    obs.observe_reads();
    obs.observe_writes();
    let record = obs.observations().unwrap();
    assert_eq!(record.reads.len(), 1);
    assert!(record.writes.is_empty());
    assert_eq!(obs.extras().count(), 1);
}

#[test]
fn bytes_are_captured_at_materialization() {
    let memory = FakeMemory::new();
    memory.poke(0x1000, &[1, 2, 3, 4]);
    let mut obs = fake_observer(&memory);

    unsafe { obs.read(0x1000, 4) };
    obs.observe_reads();

    // The real call overwrites its buffer after the read phase.
    memory.poke(0x1000, &[9, 9]);
    unsafe { obs.write(0x1000, 4) };
    memory.poke(0x1002, &[7]);
    obs.observe_writes();

    let record = obs.observations().unwrap();
    assert_eq!(record.reads[0].bytes(), &[1, 2, 3, 4]);
    assert_eq!(record.writes[0].bytes(), &[9, 9, 7, 4]);
}

#[test]
fn raw_registration_ignores_lightweight_policy() {
    let memory = FakeMemory::new();
    let mut obs = lightweight_fake_observer(&memory);
    assert!(!obs.observes_application_pool());
    unsafe { obs.write(32, 8) };
    obs.observe_writes();
    assert_eq!(spans(&obs.observations().unwrap().writes), vec![(32, 8)]);
}

#[test]
fn typed_views_capture_only_application_memory() {
    let mut vertices = [1.0f32, 2.0, 3.0];
    let app = Slice::application(&mut vertices);
    let tool = Slice::<f32>::make(3);
    let mut obs = CallObserver::new(&ObserverConfig::full_fidelity());

    obs.read_view(&app);
    obs.read_view(&tool);
    obs.observe_reads();

    let record = obs.observations().unwrap();
    assert_eq!(spans(&record.reads), vec![(app.base_address(), 12)]);
    assert_eq!(&record.reads[0].bytes()[4..8], &2.0f32.to_ne_bytes());
}

/// Application memory handed over as an owned heap buffer.
struct DeviceMapping(Box<[u8]>);

// SAFETY: the buffer is neither freed nor moved while it is borrowed.
unsafe impl<'a> MemoryView<'a> for DeviceMapping {
    fn base_address(&self) -> u64 {
        self.0.as_ptr() as u64
    }

    fn byte_len(&self) -> u64 {
        self.0.len() as u64
    }

    fn pool_kind(&self) -> PoolKind {
        PoolKind::Application
    }
}

#[test]
fn foreign_view_is_captured_through_its_contract() {
    let mapping = DeviceMapping(vec![5u8, 6, 7].into_boxed_slice());
    let mut obs = CallObserver::new(&ObserverConfig::full_fidelity());
    obs.read_view(&mapping);
    obs.observe_reads();
    let reads = &obs.observations().unwrap().reads;
    assert_eq!(spans(reads), vec![(mapping.base_address(), 3)]);
    assert_eq!(reads[0].bytes(), &[5, 6, 7]);
}

#[test]
fn lightweight_observer_skips_application_views() {
    let mut buf = [0u8; 16];
    let app = Slice::application(&mut buf);
    let mut obs = CallObserver::new(&ObserverConfig::lightweight());
    obs.read_view(&app);
    obs.write_view(&app);
    obs.observe_reads();
    obs.observe_writes();
    assert!(obs.observations().is_none());
}

#[test]
fn copy_from_application_into_smaller_tool_slice() {
    let mut src_buf = [10u16, 20, 30, 40, 50];
    let src = Slice::application(&mut src_buf);
    let dst = Slice::<u16>::make(3);
    let mut obs = CallObserver::new(&ObserverConfig::full_fidelity());

    let out = obs.copy(&dst, &src);
    assert_eq!(out.to_vec(), vec![10, 20, 30]);
    obs.observe_reads();
    assert_eq!(
        spans(&obs.observations().unwrap().reads),
        vec![(src.base_address(), 10)]
    );
}

#[test]
fn string_registers_terminator() {
    let text = c"abc";
    let mut obs = CallObserver::new(&ObserverConfig::lightweight());
    let s = unsafe { obs.string(text.as_ptr()) }.unwrap();
    assert_eq!(s, "abc");
    obs.observe_reads();
    let reads = &obs.observations().unwrap().reads;
    assert_eq!(spans(reads), vec![(text.as_ptr() as u64, 4)]);
    assert_eq!(reads[0].bytes(), b"abc\0");
}

#[test]
fn null_string_is_an_abort() {
    let mut obs = CallObserver::new(&ObserverConfig::full_fidelity());
    let err = unsafe { obs.string(std::ptr::null()) }.unwrap_err();
    assert!(err.to_string().contains("null"));
    obs.observe_reads();
    assert!(obs.observations().is_none());
}

#[test]
fn extras_keep_attachment_order() {
    let memory = FakeMemory::new();
    let before = TagExtra::new(7, b"pre".as_slice());
    let after = TagExtra::new(9, b"post".as_slice());
    let mut obs = fake_observer(&memory);

    obs.add_extra(&before);
    unsafe { obs.read(0, 2) };
    obs.observe_reads();
    obs.add_extra(&after);

    let tags: Vec<u8> = obs.extras().map(|e| e.as_encodable().type_tag()).collect();
    assert_eq!(tags, vec![7, EXTRA_OBSERVATIONS, 9]);
    assert!(matches!(obs.extras().nth(1), Some(ExtraRef::Observations(_))));
}

#[test]
fn encoded_extras_decode_back() {
    let memory = FakeMemory::new();
    memory.poke(40, &[0xAA, 0xBB]);
    let marker = TagExtra::new(3, b"x".as_slice());
    let mut obs = fake_observer(&memory);
    obs.add_extra(&marker);
    unsafe { obs.read(40, 2) };
    obs.observe_reads();
    unsafe { obs.write(80, 1) };
    obs.observe_writes();

    let mut wire = Vec::new();
    obs.encode_extras(&mut wire).unwrap();

    let mut r = wire.as_slice();
    assert_eq!(read_extra(&mut r).unwrap(), Some((3, b"x".to_vec())));
    let (tag, payload) = read_extra(&mut r).unwrap().unwrap();
    assert_eq!(tag, EXTRA_OBSERVATIONS);
    let decoded = decode_observations(&mut payload.as_slice()).unwrap();
    assert_eq!(&decoded, obs.observations().unwrap());
    assert_eq!(read_extra(&mut r).unwrap(), None);
}

#[test]
fn metadata_does_not_affect_capture() {
    let memory = FakeMemory::new();
    let mut obs = fake_observer(&memory);
    obs.set_command_name("vkCmdCopyBuffer");
    obs.set_error(callspy_core::ErrorCode(3));
    unsafe { obs.read(1, 1) };
    obs.observe_reads();
    assert_eq!(obs.command_name(), Some("vkCmdCopyBuffer"));
    assert_eq!(obs.error().0, 3);
    assert_eq!(obs.observations().unwrap().reads.len(), 1);
}
