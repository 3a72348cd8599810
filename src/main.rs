// src/main.rs

use chainwatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level, args.verbose) {
        eprintln!("chainwatch error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(err) => {
            eprintln!("chainwatch error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
