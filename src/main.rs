use clap::Parser;
use nestegg::cli::{Cli, run};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            log::error!("run failed: {e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
