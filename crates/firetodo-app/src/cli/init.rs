/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When AppConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::PathBuf;

use firetodo_app::AppConfig;

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to firetodo init").bold().cyan());
    println!(
        "{}",
        style("Copy the values from your Firebase project's web app settings.").dim()
    );

    let theme = ColorfulTheme::default();

    let project_id: String = Input::with_theme(&theme)
        .with_prompt("Project ID")
        .interact_text()?;
    let api_key: String = Input::with_theme(&theme)
        .with_prompt("API key")
        .interact_text()?;
    let auth_domain: String = Input::with_theme(&theme)
        .with_prompt("Auth domain")
        .default(format!("{project_id}.firebaseapp.com"))
        .interact_text()?;
    let storage_bucket: String = Input::with_theme(&theme)
        .with_prompt("Storage bucket")
        .default(format!("{project_id}.appspot.com"))
        .interact_text()?;
    let messaging_sender_id: String = Input::with_theme(&theme)
        .with_prompt("Messaging sender ID")
        .interact_text()?;
    let app_id: String = Input::with_theme(&theme)
        .with_prompt("App ID")
        .interact_text()?;
    let measurement_id: String = Input::with_theme(&theme)
        .with_prompt("Measurement ID (optional)")
        .allow_empty(true)
        .interact_text()?;

    println!("\n{}", style("--- Local ---").bold());
    let tasks_collection: String = Input::with_theme(&theme)
        .with_prompt("Tasks collection")
        .default("tasks".to_string())
        .interact_text()?;
    let persist_session = Confirm::with_theme(&theme)
        .with_prompt("Stay signed in between runs?")
        .default(true)
        .interact()?;

    let config = AppConfig {
        api_key: Some(api_key),
        auth_domain: Some(auth_domain),
        project_id: Some(project_id),
        storage_bucket: Some(storage_bucket),
        messaging_sender_id: Some(messaging_sender_id),
        app_id: Some(app_id),
        measurement_id: Some(measurement_id).filter(|value| !value.trim().is_empty()),
        tasks_collection,
        persist_session,
        ..AppConfig::default()
    };
    config.validate()?;

    let yaml = serde_yaml::to_string(&config).context("serialize config")?;
    std::fs::write(&output, yaml)
        .with_context(|| format!("write config to {}", output.display()))?;

    println!(
        "\n{} {}",
        style("Configuration written to").green(),
        output.display()
    );
    Ok(())
}
