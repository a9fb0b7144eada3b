use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

use super::{ConnectionTarget, Link, LinkOptions};
use crate::config::{LINK_READ_CHUNK, LINK_THREAD_NAME};
use crate::protocol::{self, InboundCommand, LineReadEvent, LineReader, OutgoingCommand};
use crate::telemetry;

/// Status shared between the worker thread and its handle. Only the worker thread
/// writes `connected` and `connecting`; only the handle writes `stop`.
#[derive(Debug)]
struct LinkFlags {
    connected: AtomicBool,
    connecting: AtomicBool,
    stop: AtomicBool,
}

impl LinkFlags {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            // Set before the thread starts so a fresh worker never reads as idle.
            connecting: AtomicBool::new(true),
            stop: AtomicBool::new(false),
        }
    }

    fn mark_connected(&self) {
        // Clear first: readers may see both false, never both true.
        self.connecting.store(false, Ordering::Release);
        self.connected.store(true, Ordering::Release);
    }

    fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.connecting.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
enum Exit {
    Closed,
    PeerQuit,
    PeerEof,
    ReadFailed(io::Error),
    WriteFailed(io::Error),
}

/// One TCP connection lifecycle on a dedicated thread.
///
/// The thread connects, then alternates between a bounded read (watching for `QUIT`
/// or EOF) and draining queued commands onto the socket. On every exit path it marks
/// itself disconnected, sends a final `QUIT` and releases the socket.
pub struct ConnectionWorker {
    target: ConnectionTarget,
    flags: Arc<LinkFlags>,
    commands: Sender<OutgoingCommand>,
    handle: Option<JoinHandle<()>>,
}

impl ConnectionWorker {
    pub fn spawn(target: ConnectionTarget) -> Self {
        Self::spawn_with(target, LinkOptions::default())
    }

    pub fn spawn_with(target: ConnectionTarget, options: LinkOptions) -> Self {
        let flags = Arc::new(LinkFlags::new());
        let (commands, queue) = crossbeam_channel::unbounded();

        let thread_flags = Arc::clone(&flags);
        let thread_target = target.clone();
        let handle = thread::Builder::new()
            .name(LINK_THREAD_NAME.into())
            .spawn(move || run(thread_target, options, &thread_flags, queue));
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("link: worker spawn failed target={target} err={err}");
                flags.mark_disconnected();
                None
            }
        };

        Self {
            target,
            flags,
            commands,
            handle,
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Whether the worker thread has exited (or never started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Requests shutdown and waits for the worker thread to exit.
    pub fn join(mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("link: worker thread panicked target={}", self.target);
            }
        }
    }
}

impl Link for ConnectionWorker {
    fn is_connected(&self) -> bool {
        self.flags.connected.load(Ordering::Acquire)
    }

    fn is_connecting(&self) -> bool {
        self.flags.connecting.load(Ordering::Acquire)
    }

    fn enqueue(&self, command: OutgoingCommand) {
        // The receiver is gone once the worker exits; late commands are discarded.
        let _ = self.commands.send(command);
    }

    fn close(&self) {
        if !self.flags.stop.swap(true, Ordering::AcqRel) {
            debug!("link: close requested target={}", self.target);
        }
    }
}

impl Drop for ConnectionWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    target: ConnectionTarget,
    options: LinkOptions,
    flags: &LinkFlags,
    queue: Receiver<OutgoingCommand>,
) {
    telemetry::record_link_connect_attempt();
    info!("link: connecting target={target}");
    let mut stream = match open_stream(&target, options) {
        Ok(stream) => stream,
        Err(err) => {
            telemetry::record_link_connect_failure();
            warn!("link: connect failed target={target} err={err}");
            flags.mark_disconnected();
            telemetry::record_link_dropped_commands(queue.len());
            return;
        }
    };
    telemetry::record_link_connect_success();
    flags.mark_connected();
    info!("link: connected target={target}");

    let exit = pump(&mut stream, flags, &queue);
    match &exit {
        Exit::Closed => info!("link: closed target={target}"),
        Exit::PeerQuit => info!("link: peer quit target={target}"),
        Exit::PeerEof => info!("link: peer hung up target={target}"),
        Exit::ReadFailed(err) => warn!("link: read failed target={target} err={err}"),
        Exit::WriteFailed(err) => warn!("link: write failed target={target} err={err}"),
    }

    flags.mark_disconnected();
    if let Err(err) = stream
        .write_all(protocol::QUIT_COMMAND)
        .and_then(|()| stream.flush())
    {
        debug!("link: final quit not delivered target={target} err={err}");
    }
    if let Err(err) = stream.shutdown(Shutdown::Both) {
        debug!("link: shutdown failed target={target} err={err}");
    }
    telemetry::record_link_dropped_commands(queue.len());
}

fn open_stream(target: &ConnectionTarget, options: LinkOptions) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (target.host(), target.port()).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, options.connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(options.read_timeout))?;
                // Bounds blocked writes too, so a peer that stops reading cannot hide `close`.
                stream.set_write_timeout(Some(options.read_timeout))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(ErrorKind::AddrNotAvailable, "host resolved to no addresses")
    }))
}

fn pump(stream: &mut TcpStream, flags: &LinkFlags, queue: &Receiver<OutgoingCommand>) -> Exit {
    let mut reader = LineReader::new();
    let mut chunk = [0u8; LINK_READ_CHUNK];
    loop {
        if flags.stop.load(Ordering::Acquire) {
            return Exit::Closed;
        }

        match stream.read(&mut chunk) {
            Ok(0) => {
                telemetry::record_link_peer_eof();
                return Exit::PeerEof;
            }
            Ok(len) => {
                let quit = reader.feed(&chunk[..len], |event| match event {
                    LineReadEvent::Complete(line) => protocol::parse_inbound(line),
                    LineReadEvent::Overflow => {
                        telemetry::record_link_inbound_overflow();
                        None
                    }
                    LineReadEvent::None => None,
                });
                if quit == Some(InboundCommand::Quit) {
                    telemetry::record_link_peer_quit();
                    return Exit::PeerQuit;
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(err) => return Exit::ReadFailed(err),
        }

        if let Some(exit) = drain(stream, flags, queue) {
            return exit;
        }
    }
}

fn drain(
    stream: &mut TcpStream,
    flags: &LinkFlags,
    queue: &Receiver<OutgoingCommand>,
) -> Option<Exit> {
    let mut wrote = false;
    while let Ok(command) = queue.try_recv() {
        if let Some(exit) = write_command(stream, flags, command.as_bytes()) {
            return Some(exit);
        }
        wrote = true;
    }
    if wrote {
        if let Err(err) = stream.flush() {
            telemetry::record_link_write_failure();
            return Some(Exit::WriteFailed(err));
        }
    }
    None
}

/// Writes one line, re-checking the stop flag whenever the write timeout expires. A
/// line cut short by `close` is acceptable: delivery is best effort.
fn write_command(stream: &mut TcpStream, flags: &LinkFlags, mut bytes: &[u8]) -> Option<Exit> {
    let len = bytes.len();
    loop {
        if flags.stop.load(Ordering::Acquire) {
            return Some(Exit::Closed);
        }
        if bytes.is_empty() {
            telemetry::record_link_write(len);
            return None;
        }
        match stream.write(bytes) {
            Ok(0) => {
                telemetry::record_link_write_failure();
                return Some(Exit::WriteFailed(ErrorKind::WriteZero.into()));
            }
            Ok(written) => bytes = &bytes[written..],
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(err) => {
                telemetry::record_link_write_failure();
                return Some(Exit::WriteFailed(err));
            }
        }
    }
}
