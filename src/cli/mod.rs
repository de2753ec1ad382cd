pub mod args;
pub mod commands;

pub use args::{ConvertArgs, ServeArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser, Debug)]
#[command(name = "apidocs")]
#[command(version = crate::VERSION)]
#[command(about = "Convert Postman collections to OpenAPI and serve them with Swagger UI")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: export the collection, run `apidocs convert`, then `apidocs serve` to browse the result."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Convert a collection into an OpenAPI document",
        long_about = "Convert reads the collection, unwraps a `collection` envelope if present, tries the built-in converter and falls back to an external CLI converter when it produces nothing.",
        after_help = "Examples:\n    apidocs convert\n    apidocs convert ./docs --collection postman.json --output openapi.yml\n    apidocs convert --no-fallback"
    )]
    Convert(ConvertArgs),
    #[command(
        about = "Serve the OpenAPI document with Swagger UI",
        long_about = "Serve loads the OpenAPI document once at startup and exposes Swagger UI on the docs route plus the raw document as JSON and YAML.",
        after_help = "Example:\n    apidocs serve . --bind 0.0.0.0:8080 --docs-route /docs"
    )]
    Serve(ServeArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Convert(convert_args) => commands::convert(convert_args).await,
        Command::Serve(serve_args) => commands::serve(serve_args).await,
    }
}
