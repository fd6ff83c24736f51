use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pollbox-server", version, about = "Anonymous channel polls over HTTP")]
pub struct Args {
    /// Path to the TOML config file. A missing file means built-in defaults.
    #[arg(short, long, default_value = "pollbox.toml")]
    pub config: String,

    /// Listen address, overriding `server.bind_address`.
    #[arg(long)]
    pub bind: Option<String>,
}
