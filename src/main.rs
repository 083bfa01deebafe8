// src/main.rs

use pipe_while_read::types::{EXIT_FAILURE, EXIT_USAGE};
use pipe_while_read::{cli, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    match run(args).await {
        Ok(result) => std::process::exit(result.exit_code()),
        Err(err) => {
            eprintln!("pipe-while-read error: {err}");
            let code = if err.is_usage() { EXIT_USAGE } else { EXIT_FAILURE };
            std::process::exit(code);
        }
    }
}
