// Headless entry point: load the configured data directory and print the
// revenue roll-up. The UI shell drives the library API directly.

use clientdesk::services::billing;
use clientdesk::{AppError, AppState};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("clientdesk: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = clientdesk::state::load_or_init_config()?;
    let app = AppState::from_config(&config)?;

    let summary = app.read(billing::revenue_summary);
    println!(
        "{} client(s), {} active, monthly total {}",
        summary.total_clients, summary.active_clients, summary.monthly_total
    );
    for (category, total) in &summary.by_category {
        println!("  {:<12} {}", category.to_string(), total);
    }
    Ok(())
}
