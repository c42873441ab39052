use anyhow::{Context, Result};
use googlecalendar_core::Config;

pub async fn run(config: Config, id: &str) -> Result<()> {
    let calendar = config
        .calendar()
        .get_calendar(id)
        .await
        .with_context(|| format!("Failed to fetch calendar {}", id))?;

    println!("ID:        {}", calendar.id);
    println!("Summary:   {}", calendar.summary);
    if let Some(description) = &calendar.description {
        println!("About:     {}", description);
    }
    if let Some(location) = &calendar.location {
        println!("Location:  {}", location);
    }
    if let Some(time_zone) = &calendar.time_zone {
        println!("Time zone: {}", time_zone);
    }

    Ok(())
}
