use std::path::PathBuf;

use crate::db::{get_connection, init_db, DB_FILE};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_file_exists, shellexpand_path};

pub fn run(data_dir: Option<String>, building: Option<String>, user: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if !settings_file_exists() {
        // First run: prompt for data dir
        let default = &settings.data_dir;
        println!("Data directory [{}]: ", default);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }
    if let Some(b) = building {
        settings.building_id = b.trim().to_string();
    }
    if let Some(u) = user {
        settings.user_name = u.trim().to_string();
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let conn = get_connection(&resolved.join(DB_FILE))?;
    init_db(&conn)?;

    println!(
        "Initialized aidat at {} (building: {})",
        resolved.display(),
        settings.building_id
    );
    Ok(())
}
