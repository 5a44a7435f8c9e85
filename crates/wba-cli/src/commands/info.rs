//! Info command - show configuration and job routes
//!
//! Usage:
//! ```bash
//! wba info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use wba_tasks::{JobKind, PollOptions};

use super::load_config;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let config = load_config()?;
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "WBA - WB seller-analytics jobs".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Configuration:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!("  {} {}", "API URL:".dimmed(), config.base_url.green());
    let session = if config.init_data.is_some() {
        "configured".green()
    } else {
        "not set (WBA_INIT_DATA)".yellow()
    };
    println!("  {} {}", "Telegram session:".dimmed(), session);
    println!(
        "  {} {:?}",
        "HTTP timeout:".dimmed(),
        config.http_timeout
    );
    println!();

    println!("{}", "Job routes:".bold());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Kind").fg(Color::Cyan),
            Cell::new("Submit").fg(Color::Cyan),
            Cell::new("Result").fg(Color::Cyan),
            Cell::new("Cadence").fg(Color::Cyan),
        ]);

    for kind in JobKind::builtin() {
        let Some(endpoints) = kind.endpoints(&config.base_url) else {
            continue;
        };
        let options = PollOptions::for_kind(&kind, &config);
        table.add_row(vec![
            Cell::new(kind.as_str()).fg(Color::Green),
            Cell::new(&endpoints.submit),
            Cell::new(endpoints.result_url("{task_id}")),
            Cell::new(format!("{:?} × {}", options.interval, options.max_attempts)),
        ]);
    }
    println!("{table}");

    Ok(())
}
