//! Binary entry point for `cargo-inject`.

use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    if let Err(e) = cargo_inject::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
