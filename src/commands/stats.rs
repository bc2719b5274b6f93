// src/commands/stats.rs

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::persistence;

// Helper function to print the verdict counts
fn print_summary(summary: &[(String, i64)], total: i64) {
    if total == 0 {
        println!("  No incidents stored.");
        return;
    }
    for (label, count) in summary {
        let share = *count as f64 * 100.0 / total as f64;
        println!("  {:<40}: {:>6} ({:>5.1}%)", label, count, share);
    }
    println!("  {:<40}: {:>6}", "Total incidents", total);
}

pub fn execute(app_config: &AppConfig) -> AppResult<()> {
    println!("Showing {} SLA statistics...", app_config.app_name);
    println!("Database path: {:?}", app_config.database_path);

    let mut conn = persistence::open_connection_ensure_path(&app_config.database_path)?;
    persistence::initialize_db(&mut conn)?;

    let total = persistence::count_incidents(&conn)?;
    let summary = persistence::count_verdicts(&conn)?;

    println!("\n--- Stored SLA Verdicts ---");
    print_summary(&summary, total);
    println!("---------------------------------------------");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            app_name: "test".into(),
            database_path: dir.path().join("nested").join("db.sqlite"),
            settings_path: dir.path().join("settings.toml"),
        };
        execute(&config).unwrap();
        assert!(config.database_path.exists());
    }
}
