//! Byte-level input filter (SPEC_FULL.md §4.7): realtime-command extraction
//! at the stream-interrupt boundary, then line assembly with comment,
//! block-delete, and `MSG,` handling for everything that isn't a realtime
//! command.
//!
//! Grounded on `protocol.c`'s `protocol_enqueue_realtime_command` (byte
//! classification table) and `protocol_main_loop`'s inner while-loop
//! (comment/block-delete/MSG state machine).

use mc_common::consts::LINE_BUFFER_SIZE;
use mc_common::exec::{AccessoryOverrideCmd, ExecState, FeedOverrideCmd};
use mc_common::state::MachineState;

use crate::sys::SystemState;

/// Discard the current line; if jogging, request a motion cancel.
pub const CAN: u8 = 0x18;

pub const CMD_STATUS_REPORT: u8 = 0x80;
pub const CMD_STATUS_REPORT_ALL: u8 = 0x81;
pub const CMD_CYCLE_START: u8 = 0x82;
pub const CMD_FEED_HOLD: u8 = 0x83;
pub const CMD_SAFETY_DOOR: u8 = 0x84;
pub const CMD_JOG_CANCEL: u8 = 0x85;
pub const CMD_GCODE_REPORT: u8 = 0x86;
pub const CMD_OPTIONAL_STOP_TOGGLE: u8 = 0x87;
pub const CMD_PID_REPORT: u8 = 0x88;
pub const CMD_RESET: u8 = 0x90;
pub const CMD_STOP: u8 = 0x91;
pub const CMD_EXIT: u8 = 0x92;

pub const CMD_FEED_OVERRIDE_RESET: u8 = 0x93;
pub const CMD_FEED_OVERRIDE_COARSE_PLUS: u8 = 0x94;
pub const CMD_FEED_OVERRIDE_COARSE_MINUS: u8 = 0x95;
pub const CMD_FEED_OVERRIDE_FINE_PLUS: u8 = 0x96;
pub const CMD_FEED_OVERRIDE_FINE_MINUS: u8 = 0x97;
pub const CMD_RAPID_OVERRIDE_RESET: u8 = 0x98;
pub const CMD_RAPID_OVERRIDE_MEDIUM: u8 = 0x99;
pub const CMD_RAPID_OVERRIDE_LOW: u8 = 0x9A;

pub const CMD_SPINDLE_OVERRIDE_RESET: u8 = 0x9B;
pub const CMD_SPINDLE_OVERRIDE_COARSE_PLUS: u8 = 0x9C;
pub const CMD_SPINDLE_OVERRIDE_COARSE_MINUS: u8 = 0x9D;
pub const CMD_SPINDLE_OVERRIDE_FINE_PLUS: u8 = 0x9E;
pub const CMD_SPINDLE_OVERRIDE_FINE_MINUS: u8 = 0x9F;
pub const CMD_SPINDLE_STOP_TOGGLE: u8 = 0xA0;
pub const CMD_COOLANT_FLOOD_TOGGLE: u8 = 0xA1;
pub const CMD_COOLANT_MIST_TOGGLE: u8 = 0xA2;

const LEGACY_STATUS_REPORT: u8 = b'?';
const LEGACY_CYCLE_START: u8 = b'~';
const LEGACY_FEED_HOLD: u8 = b'!';

/// Try to consume `byte` as a realtime command. Returns `true` if the byte
/// was handled (and must never reach the line buffer), `false` if it is
/// ordinary line content.
///
/// `keep_rt_commands` is true while inside a `$` system command or a
/// comment, where the legacy single-character forms (`?`, `~`, `!`) must
/// NOT be intercepted unless `legacy_rt_commands` is configured on
/// (SPEC_FULL.md §4.7).
pub fn enqueue_realtime_command(
    byte: u8,
    sys: &mut SystemState,
    settings: &mc_common::config::Settings,
    keep_rt_commands: bool,
) -> bool {
    let legacy_allowed = !keep_rt_commands || settings.flags.legacy_rt_commands;

    match byte {
        CMD_RESET => {
            sys.exec_state.set(ExecState::RESET);
            true
        }
        CMD_STOP => {
            sys.exec_state.set(ExecState::STOP);
            true
        }
        CMD_EXIT => {
            sys.flags.exit = true;
            true
        }
        CMD_STATUS_REPORT => {
            sys.exec_state.set(ExecState::STATUS_REPORT);
            true
        }
        CMD_STATUS_REPORT_ALL => {
            sys.exec_state.set(ExecState::STATUS_REPORT);
            true
        }
        CMD_CYCLE_START => {
            sys.exec_state.set(ExecState::CYCLE_START);
            true
        }
        CMD_FEED_HOLD => {
            sys.flags.feed_hold_pending = true;
            true
        }
        CMD_SAFETY_DOOR => {
            sys.exec_state.set(ExecState::SAFETY_DOOR);
            true
        }
        CMD_JOG_CANCEL => {
            sys.exec_state.set(ExecState::MOTION_CANCEL);
            true
        }
        CMD_GCODE_REPORT => {
            sys.exec_state.set(ExecState::GCODE_REPORT);
            true
        }
        CMD_OPTIONAL_STOP_TOGGLE => {
            sys.flags.optional_stop_disable = !sys.flags.optional_stop_disable;
            true
        }
        CMD_PID_REPORT => {
            sys.exec_state.set(ExecState::PID_REPORT);
            true
        }
        CMD_FEED_OVERRIDE_RESET => push_feed(sys, FeedOverrideCmd::Reset),
        CMD_FEED_OVERRIDE_COARSE_PLUS => push_feed(sys, FeedOverrideCmd::CoarsePlus),
        CMD_FEED_OVERRIDE_COARSE_MINUS => push_feed(sys, FeedOverrideCmd::CoarseMinus),
        CMD_FEED_OVERRIDE_FINE_PLUS => push_feed(sys, FeedOverrideCmd::FinePlus),
        CMD_FEED_OVERRIDE_FINE_MINUS => push_feed(sys, FeedOverrideCmd::FineMinus),
        CMD_RAPID_OVERRIDE_RESET => push_feed(sys, FeedOverrideCmd::RapidReset),
        CMD_RAPID_OVERRIDE_MEDIUM => push_feed(sys, FeedOverrideCmd::RapidMedium),
        CMD_RAPID_OVERRIDE_LOW => push_feed(sys, FeedOverrideCmd::RapidLow),
        CMD_SPINDLE_OVERRIDE_RESET => push_accessory(sys, AccessoryOverrideCmd::SpindleReset),
        CMD_SPINDLE_OVERRIDE_COARSE_PLUS => {
            push_accessory(sys, AccessoryOverrideCmd::SpindleCoarsePlus)
        }
        CMD_SPINDLE_OVERRIDE_COARSE_MINUS => {
            push_accessory(sys, AccessoryOverrideCmd::SpindleCoarseMinus)
        }
        CMD_SPINDLE_OVERRIDE_FINE_PLUS => push_accessory(sys, AccessoryOverrideCmd::SpindleFinePlus),
        CMD_SPINDLE_OVERRIDE_FINE_MINUS => {
            push_accessory(sys, AccessoryOverrideCmd::SpindleFineMinus)
        }
        CMD_SPINDLE_STOP_TOGGLE => push_accessory(sys, AccessoryOverrideCmd::SpindleStop),
        CMD_COOLANT_FLOOD_TOGGLE => push_accessory(sys, AccessoryOverrideCmd::CoolantFloodToggle),
        CMD_COOLANT_MIST_TOGGLE => push_accessory(sys, AccessoryOverrideCmd::CoolantMistToggle),
        LEGACY_STATUS_REPORT if legacy_allowed => {
            sys.exec_state.set(ExecState::STATUS_REPORT);
            true
        }
        LEGACY_CYCLE_START if legacy_allowed => {
            sys.exec_state.set(ExecState::CYCLE_START);
            true
        }
        LEGACY_FEED_HOLD if legacy_allowed => {
            sys.flags.feed_hold_pending = true;
            true
        }
        0x7F..=0xBF => true, // unmapped top-bit-set byte: dropped silently
        _ => false,
    }
}

fn push_feed(sys: &mut SystemState, cmd: FeedOverrideCmd) -> bool {
    sys.feed_override_fifo.push(cmd);
    true
}

fn push_accessory(sys: &mut SystemState, cmd: AccessoryOverrideCmd) -> bool {
    sys.accessory_override_fifo.push(cmd);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    None,
    Paren,
    Semicolon,
}

const MSG_PATTERN: &[u8] = b"MSG,";

/// One assembled line, ready for dispatch (SPEC_FULL.md §4.6 step 2).
#[derive(Debug, Clone, Default)]
pub struct LineEvent {
    pub line: heapless::Vec<u8, LINE_BUFFER_SIZE>,
    pub overflow: bool,
    pub block_deleted: bool,
    pub user_message: Option<String>,
}

/// Incrementally assembles one line from a byte stream, applying comment
/// stripping, block-delete marking, and `(MSG, ...)` extraction
/// (SPEC_FULL.md §4.7).
#[derive(Debug)]
pub struct LineFilter {
    line: heapless::Vec<u8, LINE_BUFFER_SIZE>,
    overflow: bool,
    block_deleted: bool,
    is_first_byte: bool,
    nocaps: bool,
    comment: CommentKind,
    msg_tracker: Option<usize>,
    user_message: Option<String>,
    /// Last terminator byte seen, for CR/LF pair dedup across calls.
    eol: u8,
}

impl LineFilter {
    pub fn new() -> Self {
        Self {
            line: heapless::Vec::new(),
            overflow: false,
            block_deleted: false,
            is_first_byte: true,
            nocaps: false,
            comment: CommentKind::None,
            msg_tracker: None,
            user_message: None,
            eol: 0,
        }
    }

    fn reset_line_state(&mut self) {
        self.line.clear();
        self.overflow = false;
        self.block_deleted = false;
        self.is_first_byte = true;
        self.nocaps = false;
        self.comment = CommentKind::None;
        self.msg_tracker = None;
        self.user_message = None;
    }

    /// Discard the in-progress line without emitting an event (the `CAN`
    /// byte, or an explicit external cancel).
    pub fn discard(&mut self) {
        self.reset_line_state();
    }

    fn finish_line(&mut self) -> LineEvent {
        let event = LineEvent {
            line: self.line.clone(),
            overflow: self.overflow,
            block_deleted: self.block_deleted,
            user_message: self.user_message.take(),
        };
        self.reset_line_state();
        event
    }

    fn push_char(&mut self, byte: u8) {
        let byte = if self.nocaps {
            byte
        } else {
            byte.to_ascii_uppercase()
        };
        if self.line.push(byte).is_err() {
            self.overflow = true;
        }
    }

    /// Feed one byte (already known not to be a realtime command) into the
    /// assembler. Returns `Some(event)` on line termination.
    pub fn push_byte(
        &mut self,
        byte: u8,
        block_delete_enabled: bool,
        sys: &mut SystemState,
    ) -> Option<LineEvent> {
        if byte == CAN {
            self.reset_line_state();
            if sys.state() == MachineState::Jog {
                sys.exec_state.set(ExecState::MOTION_CANCEL);
            }
            self.eol = 0;
            return None;
        }

        if byte == b'\n' || byte == b'\r' {
            if self.eol != 0 && self.eol != byte {
                // Second half of a CR-LF / LF-CR pair: already handled.
                self.eol = 0;
                return None;
            }
            self.eol = byte;
            return Some(self.finish_line());
        }
        self.eol = 0;

        if self.comment != CommentKind::None {
            self.advance_comment(byte);
            return None;
        }

        if self.is_first_byte {
            self.is_first_byte = false;
            if byte == b'/' {
                if block_delete_enabled {
                    self.block_deleted = true;
                }
                return None;
            }
            if byte == b'$' {
                self.nocaps = true;
                self.push_char(byte);
                return None;
            }
        }

        match byte {
            b'(' => {
                self.comment = CommentKind::Paren;
                self.msg_tracker = Some(0);
            }
            b';' => {
                self.comment = CommentKind::Semicolon;
            }
            _ if byte.is_ascii_whitespace() || byte < 0x20 => {
                // dropped silently
            }
            _ => self.push_char(byte),
        }
        None
    }

    fn advance_comment(&mut self, byte: u8) {
        match self.comment {
            CommentKind::Semicolon => {
                // ';' comments run to EOL; nothing terminates them early.
            }
            CommentKind::Paren => {
                if byte == b')' {
                    if self.msg_tracker == Some(MSG_PATTERN.len()) {
                        if self.user_message.is_none() {
                            self.user_message = Some(String::new());
                        }
                    }
                    self.comment = CommentKind::None;
                    self.msg_tracker = None;
                    return;
                }
                match self.msg_tracker {
                    Some(idx) if idx == MSG_PATTERN.len() => {
                        self.user_message.get_or_insert_with(String::new).push(byte as char);
                    }
                    Some(idx) if byte.to_ascii_uppercase() == MSG_PATTERN[idx] => {
                        self.msg_tracker = Some(idx + 1);
                    }
                    _ => {
                        self.msg_tracker = None;
                    }
                }
            }
            CommentKind::None => unreachable!(),
        }
    }
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::new()
    }
}
