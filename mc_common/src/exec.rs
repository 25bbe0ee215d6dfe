//! Realtime execution bitfields and override FIFOs (SPEC_FULL.md §3, §9).
//!
//! `exec_state` and `exec_alarm` are written from the stream-interrupt path
//! and read-and-cleared by the realtime executor. Modeled as `bitflags`
//! newtypes over `AtomicU16`, mirroring the bitflags-over-integer pattern the
//! workspace uses for cross-context error/state signals.

use core::sync::atomic::{AtomicU16, Ordering};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExecState: u16 {
        const CYCLE_START       = 1 << 0;
        const FEED_HOLD         = 1 << 1;
        const STOP              = 1 << 2;
        const RESET             = 1 << 3;
        const STATUS_REPORT     = 1 << 4;
        const GCODE_REPORT      = 1 << 5;
        const PID_REPORT        = 1 << 6;
        const MOTION_CANCEL     = 1 << 7;
        const SAFETY_DOOR       = 1 << 8;
        const SLEEP             = 1 << 9;
        const TOOL_CHANGE_ACK   = 1 << 10;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExecAlarm: u16 {
        const HARD_LIMIT            = 1 << 0;
        const SOFT_LIMIT             = 1 << 1;
        const E_STOP                 = 1 << 2;
        const ABORT_CYCLE            = 1 << 3;
        const HOMING_REQUIRED        = 1 << 4;
        const HOMING_FAIL_RESET      = 1 << 5;
        const LIMITS_ENGAGED         = 1 << 6;
        const PROBE_FAIL_INITIAL     = 1 << 7;
        const PROBE_FAIL_CONTACT     = 1 << 8;
    }
}

/// Atomic, read-and-clear holder for an `ExecState`/`ExecAlarm` bitflag set.
/// Single producer (stream ISR path), single consumer (realtime executor).
#[derive(Debug, Default)]
pub struct AtomicExecState(AtomicU16);

impl AtomicExecState {
    pub const fn new() -> Self {
        Self(AtomicU16::new(0))
    }

    pub fn set(&self, flags: ExecState) {
        self.0.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub fn clear(&self, flags: ExecState) {
        self.0.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Read-and-clear the entire bitfield atomically (SPEC_FULL.md §3 invariant:
    /// no flag is processed twice).
    pub fn take(&self) -> ExecState {
        ExecState::from_bits_truncate(self.0.swap(0, Ordering::AcqRel))
    }

    pub fn peek(&self) -> ExecState {
        ExecState::from_bits_truncate(self.0.load(Ordering::Acquire))
    }
}

#[derive(Debug, Default)]
pub struct AtomicExecAlarm(AtomicU16);

impl AtomicExecAlarm {
    pub const fn new() -> Self {
        Self(AtomicU16::new(0))
    }

    pub fn set(&self, alarm: ExecAlarm) {
        self.0.fetch_or(alarm.bits(), Ordering::AcqRel);
    }

    pub fn take(&self) -> ExecAlarm {
        ExecAlarm::from_bits_truncate(self.0.swap(0, Ordering::AcqRel))
    }

    pub fn peek(&self) -> ExecAlarm {
        ExecAlarm::from_bits_truncate(self.0.load(Ordering::Acquire))
    }
}

/// Single-byte override command codes pushed by the stream-interrupt path
/// and drained by the realtime executor (SPEC_FULL.md §4.8 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FeedOverrideCmd {
    Reset,
    CoarsePlus,
    CoarseMinus,
    FinePlus,
    FineMinus,
    RapidReset,
    RapidMedium,
    RapidLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessoryOverrideCmd {
    SpindleReset,
    SpindleCoarsePlus,
    SpindleCoarseMinus,
    SpindleFinePlus,
    SpindleFineMinus,
    SpindleStop,
    CoolantFloodToggle,
    CoolantMistToggle,
}

/// Bounded single-producer/single-consumer ring buffer used for both
/// override FIFOs (SPEC_FULL.md §3: "two small bounded ring buffers (≤16 entries)").
#[derive(Debug)]
pub struct OverrideFifo<T, const N: usize> {
    buf: heapless::Deque<T, N>,
}

impl<T, const N: usize> OverrideFifo<T, N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Deque::new(),
        }
    }

    /// Push a command; silently drops the oldest entry if the FIFO is full
    /// rather than blocking the (potentially interrupt-context) producer.
    pub fn push(&mut self, item: T) {
        if self.buf.is_full() {
            self.buf.pop_front();
        }
        let _ = self.buf.push_back(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

impl<T, const N: usize> Default for OverrideFifo<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type FeedOverrideFifo = OverrideFifo<FeedOverrideCmd, { crate::consts::OVERRIDE_FIFO_SIZE }>;
pub type AccessoryOverrideFifo =
    OverrideFifo<AccessoryOverrideCmd, { crate::consts::OVERRIDE_FIFO_SIZE }>;
