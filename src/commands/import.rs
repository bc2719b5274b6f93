// src/commands/import.rs

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::persistence::{import_incidents, initialize_db, open_connection_ensure_path};
use crate::types::Incident;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn read_incidents(file: &Path) -> AppResult<Vec<Incident>> {
    let reader = BufReader::new(File::open(file).map_err(|e| AppError::io(file, e))?);
    let incidents: Vec<Incident> = serde_json::from_reader(reader)?;
    if let Some(blank) = incidents.iter().position(|inc| inc.code.trim().is_empty()) {
        return Err(AppError::InvalidInput(format!(
            "Incident #{} in {:?} has no code.",
            blank + 1,
            file
        )));
    }
    Ok(incidents)
}

pub fn execute(app_config: &AppConfig, file: &Path) -> AppResult<()> {
    println!("Importing incidents from {:?}...", file);
    let incidents = read_incidents(file)?;

    let mut conn = open_connection_ensure_path(&app_config.database_path)?;
    initialize_db(&mut conn)?;
    let written = import_incidents(&mut conn, &incidents)?;

    log::info!("Imported {} incident(s) into {:?}.", written, app_config.database_path);
    println!("Imported {} incident(s).", written);
    Ok(())
}
