//! Integration tests for the poll loop against a scripted link.
//!
//! These drive `PollLoop::run` end to end: commands in, reply bytes out,
//! and the link's lifecycle on interrupt and on fault.

use std::io::ErrorKind;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use fpga_clock_host::link::MockEvent;
use fpga_clock_host::{
    Exit, FixedClock, HostConfig, LinkError, MockLink, PollLoop, SerialLink, ShutdownSignal,
};
use fpga_clock_protocol::{DateReply, TimeReply};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Run a scripted session with no pacing and return the link afterwards.
fn run_session(script: Vec<MockEvent>, now: NaiveDateTime) -> (Exit, MockLink, ShutdownSignal) {
    let shutdown = ShutdownSignal::new();
    let link = MockLink::new(script).with_interrupt(shutdown.clone());
    let mut poll = PollLoop::new(link, FixedClock::new(now), shutdown.clone())
        .with_byte_delay(Duration::ZERO)
        .with_poll_interval(Duration::ZERO);
    let exit = poll.run();
    (exit, poll.into_link(), shutdown)
}

// ============================================================================
// Replies
// ============================================================================

#[test]
fn test_time_request_sends_hour_minute_second() {
    let (exit, link, _) = run_session(vec![MockEvent::Byte(0)], at(2024, 1, 1, 14, 5, 9));
    assert!(matches!(exit, Exit::Interrupted));
    assert_eq!(link.written(), vec![14, 5, 9]);
    // One byte per write.
    assert_eq!(link.writes(), &[vec![14], vec![5], vec![9]]);
}

#[test]
fn test_date_request_sends_day_month_year() {
    let (_, link, _) = run_session(vec![MockEvent::Byte(1)], at(2031, 3, 7, 0, 0, 0));
    assert_eq!(link.written(), vec![7, 3, 31]);
}

#[test]
fn test_reply_bytes_decode_back() {
    let now = at(2099, 12, 31, 23, 59, 59);
    let (_, link, _) = run_session(vec![MockEvent::Byte(0), MockEvent::Byte(1)], now);
    let written = link.written();
    assert_eq!(
        TimeReply::decode(&written[..3]).unwrap(),
        TimeReply { hour: 23, minute: 59, second: 59 }
    );
    assert_eq!(
        DateReply::decode(&written[3..]).unwrap(),
        DateReply { day: 31, month: 12, year: 99 }
    );
}

#[test]
fn test_unknown_commands_write_nothing() {
    let script = [2u8, 3, 0x30, 0xFF].iter().copied().map(MockEvent::Byte).collect();
    let (exit, link, _) = run_session(script, at(2024, 1, 1, 12, 0, 0));
    assert!(matches!(exit, Exit::Interrupted));
    assert!(link.written().is_empty());
    assert_eq!(link.reads(), 4);
}

#[test]
fn test_unknown_command_between_known_ones() {
    let script = vec![MockEvent::Byte(0), MockEvent::Byte(7), MockEvent::Byte(1)];
    let (_, link, _) = run_session(script, at(2031, 3, 7, 14, 5, 9));
    assert_eq!(link.written(), vec![14, 5, 9, 7, 3, 31]);
}

// ============================================================================
// Idle polling
// ============================================================================

#[test]
fn test_silence_writes_nothing() {
    let script = vec![MockEvent::Silence; 5];
    let (_, link, _) = run_session(script, at(2024, 1, 1, 0, 0, 0));
    assert!(link.written().is_empty());
    assert_eq!(link.reads(), 0);
    // Five silent polls, then the one that ends the script.
    assert_eq!(link.polls(), 6);
}

#[test]
fn test_idle_repolls_after_interval() {
    let interval = Duration::from_millis(20);
    let shutdown = ShutdownSignal::new();
    let link = MockLink::new(vec![MockEvent::Silence; 3]).with_interrupt(shutdown.clone());
    let mut poll = PollLoop::new(link, FixedClock::new(at(2024, 1, 1, 0, 0, 0)), shutdown)
        .with_byte_delay(Duration::ZERO)
        .with_poll_interval(interval);
    poll.run();

    let link = poll.into_link();
    assert!(link.written().is_empty());
    for pair in link.poll_times().windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= interval);
    }
}

#[test]
fn test_byte_delay_paces_reply() {
    let delay = Duration::from_millis(10);
    let shutdown = ShutdownSignal::new();
    let link = MockLink::from_bytes(&[0]).with_interrupt(shutdown.clone());
    let mut poll = PollLoop::new(link, FixedClock::new(at(2024, 1, 1, 1, 2, 3)), shutdown)
        .with_byte_delay(delay)
        .with_poll_interval(Duration::ZERO);

    let started = std::time::Instant::now();
    poll.run();
    assert!(started.elapsed() >= delay * 3);
    assert_eq!(poll.link().written(), vec![1, 2, 3]);
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_interrupt_closes_link_once() {
    let script = vec![MockEvent::Byte(0), MockEvent::Interrupt, MockEvent::Byte(1)];
    let (exit, link, shutdown) = run_session(script, at(2024, 1, 1, 8, 30, 0));

    assert!(matches!(exit, Exit::Interrupted));
    assert!(shutdown.is_triggered());
    assert_eq!(link.close_calls(), 1);
    assert!(!link.is_open());
    assert_eq!(link.calls_after_close(), 0);
    // The date request queued behind the interrupt is never read.
    assert_eq!(link.remaining(), 1);
    assert_eq!(link.written(), vec![8, 30, 0]);
}

#[test]
fn test_interrupt_before_start_touches_nothing() {
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let link = MockLink::from_bytes(&[0, 1]);
    let mut poll = PollLoop::new(link, FixedClock::new(at(2024, 1, 1, 0, 0, 0)), shutdown);

    assert!(matches!(poll.run(), Exit::Interrupted));
    let link = poll.into_link();
    assert_eq!(link.polls(), 0);
    assert_eq!(link.reads(), 0);
    assert!(link.written().is_empty());
    assert_eq!(link.close_calls(), 1);
}

#[test]
fn test_fault_closes_link_once() {
    let script = vec![
        MockEvent::Byte(1),
        MockEvent::Fault(ErrorKind::BrokenPipe),
        MockEvent::Byte(0),
    ];
    let (exit, link, shutdown) = run_session(script, at(2031, 3, 7, 0, 0, 0));

    match exit {
        Exit::Fault(LinkError::Io(e)) => assert_eq!(e.kind(), ErrorKind::BrokenPipe),
        other => panic!("expected link fault, got {:?}", other),
    }
    assert!(!shutdown.is_triggered());
    assert_eq!(link.close_calls(), 1);
    assert_eq!(link.calls_after_close(), 0);
    assert_eq!(link.written(), vec![7, 3, 31]);
    assert_eq!(link.remaining(), 1);
}

#[test]
fn test_fault_message_is_reported() {
    let (exit, _, _) = run_session(
        vec![MockEvent::Fault(ErrorKind::NotConnected)],
        at(2024, 1, 1, 0, 0, 0),
    );
    match exit {
        Exit::Fault(e) => assert!(e.to_string().contains("scripted fault")),
        other => panic!("expected link fault, got {:?}", other),
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_loop_from_config_uses_configured_pacing() {
    let config = HostConfig::from_yaml_str("byte_delay_ms: 0\npoll_interval_ms: 0\n").unwrap();
    let shutdown = ShutdownSignal::new();
    let link = MockLink::from_bytes(&[0]).with_interrupt(shutdown.clone());
    let mut poll = PollLoop::from_config(
        link,
        FixedClock::new(at(2024, 1, 1, 9, 8, 7)),
        shutdown,
        &config,
    );
    assert!(matches!(poll.run(), Exit::Interrupted));
    assert_eq!(poll.link().written(), vec![9, 8, 7]);
}
