use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, Command};
use tracing_subscriber::{fmt, EnvFilter};

use registrard::db::Store;
use registrard::server::Server;

fn main() -> Result<()> {
    let matches = Command::new("registrard")
        .about("Academic records daemon: enrollment, grading and reporting over TCP")
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("FILE")
                .default_value("registrar.sqlite3")
                .help("SQLite database file"),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .value_name("ADDR")
                .default_value("127.0.0.1:8888")
                .help("Listen address for the TCP gateway"),
        )
        .get_matches();

    let db_path = PathBuf::from(matches.get_one::<String>("db").expect("has default"));
    let listen = matches.get_one::<String>("listen").expect("has default");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let store = Store::open(&db_path)?;
    let server = Server::bind(listen, store)?;
    server.run()
}
