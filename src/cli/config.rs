use crate::cli::render::metrics;
use crate::cli::Session;
use crate::error::Result;
use crate::settings::{save_settings, settings_path, shellexpand_path};

pub fn show(session: &Session) -> String {
    let s = &session.settings;
    let mut out = format!("Settings file: {}\n", settings_path().display());
    out.push_str(&metrics(&[
        ("db_path", s.db_path.clone()),
        ("effective store", session.db.display().to_string()),
        ("cache_ttl_secs", s.cache_ttl_secs.to_string()),
        ("primary_top_n", s.primary_top_n.to_string()),
        ("timeline_top_n", s.timeline_top_n.to_string()),
        ("secondary_top_n", s.secondary_top_n.to_string()),
        ("export_dir", s.export_dir.clone()),
    ]));
    out
}

pub fn set_db(session: &mut Session, path: &str) -> Result<String> {
    let resolved = shellexpand_path(path);
    session.settings.db_path = resolved.clone();
    save_settings(&session.settings)?;
    session.db = resolved.clone().into();
    Ok(format!("Store path set to {resolved}"))
}
