use smart_rmsd::command_line::smart_rmsd::{action, command};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();
    action(&matches)
}
