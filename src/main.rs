use clap::{Arg, ArgMatches, Command};
use o3admin::quorum::DecodePolicy;
use o3admin::{Config, Node, O3AdminError};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), O3AdminError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let matches = cli().get_matches();

    let config = config_from_matches(&matches)?;
    info!(
        "Node configuration: address={}, endpoints={:?}, config_dir={:?}, data_dir={:?}",
        config.address, config.endpoints, config.config_dir, config.data_dir
    );

    let node = Node::new(config).await?;
    node.start().await?;

    Ok(())
}

fn cli() -> Command {
    Command::new("o3admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cluster-wide administration for distributed object storage nodes")
        .arg(
            Arg::new("address")
                .long("address")
                .help("host:port this node listens on, as listed in --endpoints")
                .default_value("127.0.0.1:9000"),
        )
        .arg(
            Arg::new("endpoints")
                .long("endpoints")
                .help("Comma-separated host:port of every node, this one included"),
        )
        .arg(
            Arg::new("advertise")
                .long("advertise")
                .help("Address announced to peers instead of the detected one"),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .help("Directory holding config.json"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding format.json"),
        )
        .arg(
            Arg::new("access-key")
                .long("access-key")
                .env("O3ADMIN_ACCESS_KEY")
                .help("Cluster access key"),
        )
        .arg(
            Arg::new("secret-key")
                .long("secret-key")
                .env("O3ADMIN_SECRET_KEY")
                .help("Cluster secret key"),
        )
        .arg(
            Arg::new("tls-ca")
                .long("tls-ca")
                .help("PEM CA bundle; enables HTTPS towards peers"),
        )
        .arg(
            Arg::new("call-timeout-ms")
                .long("call-timeout-ms")
                .help("Per-peer call timeout in milliseconds, 0 to disable")
                .default_value("30000"),
        )
        .arg(
            Arg::new("decode-policy")
                .long("decode-policy")
                .help("What an undecodable peer config does to a read: abort-round or exclude-vote")
                .value_parser(["abort-round", "exclude-vote"])
                .default_value("abort-round"),
        )
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, O3AdminError> {
    let address = matches
        .get_one::<String>("address")
        .cloned()
        .ok_or_else(|| O3AdminError::InvalidConfig("missing --address".to_string()))?;

    let endpoints = match matches.get_one::<String>("endpoints") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => vec![address.clone()],
    };

    let mut config = Config::new(address, endpoints);
    config.advertise = matches.get_one::<String>("advertise").cloned();
    if let Some(dir) = matches.get_one::<String>("config-dir") {
        config.config_dir = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("data-dir") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(key) = matches.get_one::<String>("access-key") {
        config.access_key = key.clone();
    }
    if let Some(key) = matches.get_one::<String>("secret-key") {
        config.secret_key = key.clone();
    }
    config.tls_ca = matches.get_one::<String>("tls-ca").map(PathBuf::from);

    if let Some(ms) = matches.get_one::<String>("call-timeout-ms") {
        config.call_timeout_ms = ms
            .parse()
            .map_err(|e| O3AdminError::InvalidConfig(format!("Invalid call timeout: {}", e)))?;
    }
    config.decode_policy = match matches.get_one::<String>("decode-policy").map(String::as_str) {
        Some("exclude-vote") => DecodePolicy::ExcludeVote,
        _ => DecodePolicy::AbortRound,
    };

    Ok(config)
}
