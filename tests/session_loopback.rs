use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use stickpad::session::{SessionOutput, StickSide};
use stickpad::{
    ConnectionState, ControllerSession, LinkOptions, NormalizedPosition, SessionNotice,
    SessionOptions, SessionPhase, SettingsManager,
};

const WAIT: Duration = Duration::from_secs(5);

struct Clock(Instant);

impl Clock {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

fn options() -> SessionOptions {
    SessionOptions {
        max_attempts: 3,
        poll_period: Duration::from_millis(50),
    }
}

fn poll_until(
    session: &mut ControllerSession,
    clock: &Clock,
    mut done: impl FnMut(&ControllerSession, &SessionOutput) -> bool,
) -> Vec<SessionNotice> {
    let deadline = Instant::now() + WAIT;
    let mut notices = Vec::new();
    while Instant::now() < deadline {
        let out = session.poll(clock.now_ms());
        notices.extend(out.notices.iter().copied());
        if done(session, &out) {
            return notices;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("session stuck in {:?}", session.phase());
}

fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    line
}

/// Accepts `count` connections on a side thread so the session keeps being polled.
fn acceptor(listener: TcpListener, count: usize) -> Receiver<(TcpStream, BufReader<TcpStream>)> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for _ in 0..count {
            let (peer, _) = listener.accept().unwrap();
            peer.set_read_timeout(Some(WAIT)).unwrap();
            let reader = BufReader::new(peer.try_clone().unwrap());
            if tx.send((peer, reader)).is_err() {
                return;
            }
        }
    });
    rx
}

#[test]
fn stored_server_is_connected_and_streamed_to() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peers = acceptor(listener, 2);

    let settings = SettingsManager::open(dir.path().join("settings.toml")).unwrap();
    settings
        .set_server_connection_info(Some("127.0.0.1".into()), Some(port))
        .recv_timeout(WAIT)
        .unwrap()
        .unwrap();

    let clock = Clock(Instant::now());
    let mut session = ControllerSession::tcp(LinkOptions::default(), options());
    session.on_stick_moved(StickSide::Left, NormalizedPosition::new(-1.0, 0.25));
    assert_eq!(session.start(&settings).phase, SessionPhase::AwaitingTarget);

    let notices = poll_until(&mut session, &clock, |s, _| s.phase() == SessionPhase::Ready);
    assert!(notices.is_empty());
    assert_eq!(session.link_state(), ConnectionState::Connected);

    let (mut peer, mut reader) = peers.recv_timeout(WAIT).unwrap();
    assert_eq!(read_line(&mut reader), "X -32768\n");
    assert_eq!(read_line(&mut reader), "Y 8192\n");
    assert_eq!(read_line(&mut reader), "RX 0\n");
    assert_eq!(read_line(&mut reader), "RY 0\n");

    // Peer asks to quit: a later tick opens a fresh connection and re-sends the sticks.
    peer.write_all(b"QUIT\n").unwrap();
    let mut second = None;
    poll_until(&mut session, &clock, |s, _| {
        if second.is_none() {
            second = peers.try_recv().ok();
        }
        second.is_some() && s.phase() == SessionPhase::Ready
    });
    let Some((_peer, mut reader)) = second else {
        unreachable!()
    };
    assert_eq!(read_line(&mut reader), "X -32768\n");

    session.stop();
    let mut line = read_line(&mut reader);
    while line != "QUIT\n" && !line.is_empty() {
        line = read_line(&mut reader);
    }
    assert_eq!(line, "QUIT\n");
}

#[test]
fn unreachable_server_gives_up_with_one_notice() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let settings = SettingsManager::open(dir.path().join("settings.toml")).unwrap();
    settings
        .set_server_connection_info(Some("127.0.0.1".into()), Some(port))
        .recv_timeout(WAIT)
        .unwrap()
        .unwrap();

    let clock = Clock(Instant::now());
    let mut session = ControllerSession::tcp(LinkOptions::default(), options());
    session.start(&settings);
    let notices = poll_until(&mut session, &clock, |_, out| {
        out.phase == SessionPhase::Unavailable
    });
    assert_eq!(notices, [SessionNotice::CannotConnect]);
}

#[test]
fn empty_settings_prompt_for_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsManager::open(dir.path().join("settings.toml")).unwrap();

    let clock = Clock(Instant::now());
    let mut session = ControllerSession::tcp(LinkOptions::default(), options());
    session.start(&settings);
    let notices = poll_until(&mut session, &clock, |_, out| {
        out.phase == SessionPhase::Unavailable
    });
    assert_eq!(notices, [SessionNotice::OpenSettings]);
}
