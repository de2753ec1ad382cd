use crate::{
    cli::args::{ConvertArgs, ServeArgs},
    core::{
        config::loader::resolve_path, ConfigLoader, ConfigValidator, ConversionPipeline,
        DocsConfig, PipelineOutcome, PipelineReport,
    },
    server::{DocsServer, DocsSettings},
    Result,
};
use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use std::path::Path;

/// Convert the workspace collection into an OpenAPI document.
///
/// Returns an error when every stage fails so the process exits non-zero.
pub async fn convert(args: ConvertArgs) -> Result<()> {
    ensure_workspace(&args.path)?;

    let mut config = ConfigLoader::load(&args.path, args.config.as_deref())?;
    apply_convert_overrides(&mut config, &args);
    ConfigValidator::validate(&config)?;

    let pipeline = ConversionPipeline::from_config(&config)?;
    let report = pipeline.run_in_workspace(&config, &args.path).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    match report.outcome {
        PipelineOutcome::Failed { exit_code } => Err(anyhow!(
            "conversion of {} failed{}",
            report.collection.display(),
            exit_code
                .map(|code| format!(" (subprocess exit code {})", code))
                .unwrap_or_default()
        )),
        _ => Ok(()),
    }
}

/// Serve the OpenAPI document until the process is stopped.
pub async fn serve(args: ServeArgs) -> Result<()> {
    ensure_workspace(&args.path)?;

    let mut config = ConfigLoader::load(&args.path, args.config.as_deref())?;
    apply_serve_overrides(&mut config, &args);
    ConfigValidator::validate(&config)?;

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid server.bind '{}'", config.server.bind))?;
    let settings = DocsSettings {
        document_path: resolve_path(&args.path, &config.paths.output),
        bind,
        docs_route: config.server.docs_route.clone(),
    };

    let server = DocsServer::new(settings)?;
    server.serve().await?;
    Ok(())
}

fn ensure_workspace(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(anyhow!("workspace {} is not a directory", path.display()));
    }
    Ok(())
}

/// CLI flags take precedence over the config file and `APIDOCS_*` variables.
fn apply_convert_overrides(config: &mut DocsConfig, args: &ConvertArgs) {
    if let Some(collection) = &args.collection {
        config.paths.collection = collection.clone();
    }
    if let Some(output) = &args.output {
        config.paths.output = output.clone();
    }
    if let Some(tag) = &args.default_tag {
        config.conversion.default_tag = tag.clone();
    }
    if let Some(cmd) = &args.fallback_cmd {
        config.fallback.command = cmd.clone();
        config.fallback.enabled = true;
    }
    if let Some(seconds) = args.fallback_timeout {
        config.fallback.timeout = if seconds == 0 {
            "off".to_string()
        } else {
            format!("{}s", seconds)
        };
    }
    if args.no_fallback {
        config.fallback.enabled = false;
    }
}

fn apply_serve_overrides(config: &mut DocsConfig, args: &ServeArgs) {
    if let Some(spec) = &args.spec {
        config.paths.output = spec.clone();
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind.to_string();
    }
    if let Some(route) = &args.docs_route {
        config.server.docs_route = route.clone();
    }
}

fn print_summary(report: &PipelineReport) {
    let source = match &report.outcome {
        PipelineOutcome::Converted { stage } => format!("built-in converter ({})", stage),
        PipelineOutcome::ConverterWroteFile { stage } => {
            format!("built-in converter wrote the file ({})", stage)
        }
        PipelineOutcome::SubprocessSucceeded => "external converter".to_string(),
        PipelineOutcome::Failed { .. } => {
            println!("Conversion failed: {}", report.collection.display());
            return;
        }
    };
    println!("OpenAPI document written to {}", report.destination.display());
    println!("Source: {}", source);
    if report.was_enveloped {
        println!("Unwrapped `collection` envelope");
    }
    println!("Duration: {}ms", report.duration_ms);
}
