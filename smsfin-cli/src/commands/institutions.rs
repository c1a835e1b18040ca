//! Institutions command - what the engine can recognise

use anyhow::Result;
use smsfin_core::InstitutionRegistry;

use super::load_config;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let config = load_config()?;
    let registry = InstitutionRegistry::with_custom(&config.custom_senders());
    let available = registry.available();

    if json {
        println!("{}", serde_json::to_string_pretty(&available)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name", "Country", "Currency", "Monitored"]);
    let enabled = config.enabled_sender_ids();
    for institution in &available {
        let monitored = enabled.iter().any(|id| id.eq_ignore_ascii_case(&institution.id));
        table.add_row(vec![
            institution.id.clone(),
            institution.name.clone(),
            institution.country.clone().unwrap_or_else(|| "-".to_string()),
            institution.currency.clone(),
            if monitored { "yes".to_string() } else { String::new() },
        ]);
    }
    println!("{table}");
    Ok(())
}
