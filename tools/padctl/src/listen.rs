use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
};

use anyhow::{Context, Result};
use log::{info, warn};
use stickpad::protocol::{self, Command};

pub struct ListenOptions {
    pub bind: String,
    /// Send `QUIT` after this many command lines.
    pub quit_after: Option<usize>,
    /// Serve a single client, then exit.
    pub once: bool,
}

pub fn run_listen(options: ListenOptions) -> Result<()> {
    let listener = TcpListener::bind(&options.bind)
        .with_context(|| format!("failed binding {}", options.bind))?;
    info!("listen: bound {}", listener.local_addr()?);

    for stream in listener.incoming() {
        let stream = stream.context("accept failed")?;
        let peer = stream.peer_addr()?;
        info!("listen: client {peer} connected");
        let received = serve_client(stream, options.quit_after)?;
        info!("listen: client {peer} gone after {received} lines");
        if options.once {
            break;
        }
    }
    Ok(())
}

fn serve_client(stream: TcpStream, quit_after: Option<usize>) -> Result<usize> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    let mut received = 0usize;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("listen: read failed: {err}");
                break;
            }
        };
        if line.as_bytes() == protocol::QUIT_LINE {
            info!("listen: client sent QUIT");
            break;
        }
        received += 1;
        println!("{}", describe(&line));

        if quit_after.is_some_and(|limit| received >= limit) {
            writer.write_all(protocol::QUIT_COMMAND)?;
            writer.flush()?;
            info!("listen: sent QUIT");
        }
    }
    Ok(received)
}

fn describe(line: &str) -> String {
    match protocol::parse_command(line) {
        Some(Command::Axis { axis, value }) => format!("axis {axis:?} {value}"),
        Some(Command::Button { button, pressed }) => {
            format!("button {button:?} {}", if pressed { "down" } else { "up" })
        }
        None => format!("unparsed {line:?}"),
    }
}
