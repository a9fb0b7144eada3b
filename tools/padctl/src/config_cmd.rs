use std::{path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use stickpad::settings::address::{parse_port_input, AddressInput, AddressMode};
use stickpad::{ServerInfo, SettingsManager};

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ConfigSetOptions {
    pub address: Option<String>,
    pub port: Option<String>,
    pub any_host: bool,
}

pub fn run_show(path: &Path) -> Result<()> {
    let settings = open(path)?;
    let info = load(&settings)?;
    println!("settings = {}", path.display());
    println!("server_address = {}", info.address.as_deref().unwrap_or("<unset>"));
    match info.port {
        Some(port) => println!("server_port = {port}"),
        None => println!("server_port = <unset>"),
    }
    match info.target() {
        Some(target) => println!("target = {target}"),
        None => println!("target = <none>"),
    }
    Ok(())
}

pub fn run_set(path: &Path, options: ConfigSetOptions) -> Result<()> {
    let settings = open(path)?;
    let current = load(&settings)?;
    let info = apply(current, &options)?;

    settings
        .set_server_connection_info(info.address.clone(), info.port)
        .recv_timeout(REPLY_TIMEOUT)
        .context("settings manager did not reply")?
        .with_context(|| format!("failed writing {}", path.display()))?;

    match info.target() {
        Some(target) => info!("config: saved target={target}"),
        None => info!("config: saved (no complete target)"),
    }
    Ok(())
}

/// Applies form-style edits on top of the stored values. Omitted fields are kept.
fn apply(current: ServerInfo, options: &ConfigSetOptions) -> Result<ServerInfo> {
    let address = match &options.address {
        Some(text) => {
            let mut input = AddressInput::new();
            input.set_text(current.address.as_deref().unwrap_or_default());
            if options.any_host && input.mode() == AddressMode::Ipv4Only {
                input.toggle_mode();
            }
            let text = text.trim();
            if let Some(ch) = text.chars().find(|ch| !input.accepts_char(*ch)) {
                bail!("address `{text}` has `{ch}`; pass --any-host for host names");
            }
            input.set_text(text);
            if input.is_flagged_invalid() {
                warn!("config: `{}` is not a valid IP address; saving anyway", input.text());
            }
            input.value()
        }
        None => current.address,
    };
    let port = match &options.port {
        Some(text) => {
            let port = parse_port_input(text.trim());
            if port.is_none() && !text.trim().is_empty() {
                warn!("config: port `{text}` is not a number; clearing it");
            }
            port
        }
        None => current.port,
    };
    Ok(ServerInfo::new(address, port))
}

fn open(path: &Path) -> Result<SettingsManager> {
    SettingsManager::open(path).with_context(|| format!("failed opening {}", path.display()))
}

fn load(settings: &SettingsManager) -> Result<ServerInfo> {
    settings
        .get_server_connection_info()
        .recv_timeout(REPLY_TIMEOUT)
        .map_err(|err| anyhow!("settings manager did not reply: {err}"))?
        .with_context(|| format!("failed reading {}", settings.path().display()))
}
