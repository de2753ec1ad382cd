use apidocs::cli::{self, Args};
use clap::Parser;

#[tokio::main]
async fn main() -> apidocs::Result<()> {
    let args = Args::parse();
    let _logging = apidocs::logging::init(&args.command)?;
    cli::run(args).await
}
