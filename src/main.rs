use agent_resource_config::config::AppConfig;
use agent_resource_config::logic::{validate_document, DocumentStatus};
use agent_resource_config::model::Document;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let path = config.document_path(std::env::args_os().nth(1).map(PathBuf::from))?;
    log::info!("validating {}", path.display());

    let document = Document::load(&path, config.document.format)?;
    let canonical = document.to_canonical_value()?;
    println!("{}", serde_json::to_string_pretty(&canonical)?);

    let report = validate_document(&document);
    for issue in &report.errors {
        println!("error: {}", issue);
    }
    for issue in &report.warnings {
        println!("warning: {}", issue);
    }

    match report.status {
        DocumentStatus::Empty => println!("Document is empty"),
        DocumentStatus::Incomplete => {
            println!("Document has no agents, tools or app yet; issues are informational")
        }
        DocumentStatus::Checked => println!(
            "Validation: {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        ),
    }

    // Only a document that has agents, tools or an app can fail
    let passed =
        report.status != DocumentStatus::Checked || report.passes(config.validation.strict);
    if passed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
