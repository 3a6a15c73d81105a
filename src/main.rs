//! lmtic command-line tool
//!
//! Resolves a local model server and runs structured prompts against it.

use clap::Parser;
use lmtic::cli::{self, Cli, Command};
use lmtic::{LmSession, matcher, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::Config { output } = &cli.command {
        let template = cli::generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(path, template)?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = cli::load_config(cli.config.as_deref())?;
    telemetry::init(&config.observability.log_level);

    match cli.command {
        Command::Config { .. } => {}
        Command::Models { target } => {
            let options = cli::session_options(&config, &target)?;
            let requested = options.model_name.clone();
            let session = LmSession::connect(options).await?;

            println!("Endpoint: {}", session.endpoint());
            for (model, score) in matcher::rank_models(&session.models().data, &requested) {
                let marker = if model.id == session.model().id { "*" } else { " " };
                println!("{} {:<48} {:.3}  {}", marker, model.id, score, model.owned_by);
            }
        }
        Command::Prompt {
            prompt,
            fields,
            schema_name,
            target,
        } => {
            let schema = cli::schema_from_fields(&schema_name, &fields);
            let options = cli::session_options(&config, &target)?;
            let session = LmSession::connect(options).await?;

            tracing::info!(
                endpoint = %session.endpoint(),
                model_id = %session.model().id,
                "Running prompt"
            );

            let results = session.run_prompt_with_schema(&prompt, &schema).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
