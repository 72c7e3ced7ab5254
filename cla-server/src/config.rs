use bpwire_cla::config::{MtcpConfig, TcpclConfig};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ListenerConfig {
    Tcpcl(TcpclConfig),
    Mtcp(MtcpConfig),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default log level, overridden by RUST_LOG
    pub log_level: String,

    /// Listeners to start, a TCPCLv3 listener on [::]:4556 if unset
    pub listeners: Vec<ListenerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            listeners: vec![ListenerConfig::Tcpcl(TcpclConfig::default())],
        }
    }
}

pub fn load(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    } else {
        // Optional default config file in current directory
        builder = builder.add_source(
            config::File::from(std::path::Path::new("bpwire-cla.toml")).required(false),
        );
    }

    // Allow environment variables to override
    builder = builder.add_source(config::Environment::with_prefix("BPWIRE_CLA"));

    builder.build()?.try_deserialize().map_err(Into::into)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn listeners_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
log_level = "debug"

[[listeners]]
protocol = "tcpcl"
address = "127.0.0.1:4556"
local_eid = "dtn://node.dtn/"
keepalive_interval = 30

[[listeners]]
protocol = "mtcp"
address = "127.0.0.1:4224"
"#
        )
        .unwrap();

        let config = load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listeners.len(), 2);
        let ListenerConfig::Tcpcl(tcpcl) = &config.listeners[0] else {
            panic!("expected a TCPCL listener");
        };
        assert_eq!(tcpcl.local_eid, "dtn://node.dtn/");
        assert_eq!(tcpcl.keepalive_interval, 30);
        assert_eq!(tcpcl.contact_timeout, 15);
        assert!(matches!(&config.listeners[1], ListenerConfig::Mtcp(m) if m.address.port() == 4224));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(matches!(
            &config.listeners[..],
            [ListenerConfig::Tcpcl(t)] if t.address.port() == 4556
        ));
    }
}
