//! One sync run: `board-sync run`.

use anyhow::{Context, Result};
use std::path::Path;

use board_sync::board::TrelloClient;
use board_sync::config::Config;
use board_sync::errors::SyncError;
use board_sync::publish::github::GitHubClient;
use board_sync::sync::{self, RunOptions, RunReport};

pub async fn cmd_run(
    config_path: &Path,
    branch: Option<&str>,
    dry_run: bool,
    show_content: bool,
) -> Result<()> {
    let config = Config::load(config_path, branch).map_err(SyncError::Config)?;

    let source = TrelloClient::new(
        &config.trello_api_url,
        &config.trello_api_key,
        &config.trello_token,
        config.timeout,
    )
    .context("Failed to build Trello client")?;
    let host = GitHubClient::new(
        &config.github_api_url,
        &config.owner,
        &config.repo,
        &config.github_token,
        config.timeout,
    )
    .context("Failed to build GitHub client")?;

    let report = sync::run(&config, &source, &host, RunOptions { dry_run }).await?;
    print_report(&config, &report, show_content);
    Ok(())
}

fn print_report(config: &Config, report: &RunReport, show_content: bool) {
    println!(
        "Board {}: {}/{} lists public, {}/{} cards public",
        console::style(&report.board_id).cyan(),
        report.lists_public,
        report.lists_total,
        report.cards_public,
        report.cards_total,
    );

    match &report.receipt {
        Some(receipt) => {
            println!(
                "{} {} files to {}/{}@{}",
                console::style("Committed").green().bold(),
                report.delta.len(),
                config.owner,
                config.repo,
                config.branch,
            );
            println!("  commit {}", console::style(&receipt.commit_sha).yellow());
            println!("  parent {}", console::style(&receipt.parent_sha).dim());
        }
        None => {
            println!(
                "{} {} files would be committed to {}/{}@{}",
                console::style("Dry run:").yellow().bold(),
                report.delta.len(),
                config.owner,
                config.repo,
                config.branch,
            );
            for entry in report.delta.entries() {
                println!(
                    "  {} {}",
                    entry.path,
                    console::style(format!("({} bytes)", entry.content.len())).dim()
                );
                if show_content {
                    println!("{}", entry.content);
                    println!();
                }
            }
        }
    }
}
