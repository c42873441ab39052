use anyhow::{Context, Result};
use googlecalendar_core::Config;

pub async fn run(config: Config) -> Result<()> {
    let calendar = config.calendar();

    let calendars = calendar
        .list_calendars()
        .await
        .context("Failed to list calendars")?;

    println!("User agent: {}", calendar.user_agent());
    println!("Credentials OK, {} calendar(s) visible:", calendars.len());

    for entry in calendars {
        let marker = if entry.primary { " (primary)" } else { "" };
        let role = entry.access_role.as_deref().unwrap_or("unknown");
        println!("  {} [{}] {}{}", entry.id, role, entry.summary, marker);
    }

    Ok(())
}
