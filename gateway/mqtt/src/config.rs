//! Gateway configuration.
//!
//! Environment variables with positional-argument override, in that
//! order of precedence: `argv[1..]` beats `MQTT_BROKER`,
//! `MQTT_CLIENT_ID` and `ISA95_PREFIX`, which beat the built-in defaults.

use anyhow::{ensure, Context, Result};

pub const DEFAULT_BROKER: &str = "tcp://localhost:1883";
pub const DEFAULT_CLIENT_ID: &str = "celima-integration";
pub const DEFAULT_ISA95_PREFIX: &str = "celima/punta_hermosa/planta/linea";

#[derive(Debug, Clone)]
pub struct Config {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    /// Concatenated verbatim with the line id and machine suffix; the
    /// deployment supplies any trailing delimiter it wants.
    pub isa95_prefix: String,
}

impl Config {
    pub fn from_env_and_args(args: &[String]) -> Result<Config> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let broker = args
            .get(1)
            .cloned()
            .or_else(|| env("MQTT_BROKER"))
            .unwrap_or_else(|| DEFAULT_BROKER.to_string());
        let client_id = args
            .get(2)
            .cloned()
            .or_else(|| env("MQTT_CLIENT_ID"))
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
        let isa95_prefix = args
            .get(3)
            .cloned()
            .or_else(|| env("ISA95_PREFIX"))
            .unwrap_or_else(|| DEFAULT_ISA95_PREFIX.to_string());

        let (broker_host, broker_port) = parse_broker_uri(&broker)?;

        Ok(Config {
            broker_host,
            broker_port,
            client_id,
            isa95_prefix,
        })
    }
}

fn parse_broker_uri(uri: &str) -> Result<(String, u16)> {
    let rest = uri
        .strip_prefix("tcp://")
        .or_else(|| uri.strip_prefix("mqtt://"))
        .unwrap_or(uri);

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (
            host.to_string(),
            port.parse::<u16>()
                .with_context(|| format!("invalid broker port in '{uri}'"))?,
        ),
        None => (rest.to_string(), 1883),
    };
    ensure!(!host.is_empty(), "empty broker host in '{uri}'");
    Ok((host, port))
}
