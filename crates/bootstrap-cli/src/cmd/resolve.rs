use crate::output::{print_json, print_pairs};
use anyhow::Context;
use bootstrap_core::{config::BootstrapConfig, env::ResolvedConfig, paths};
use std::path::Path;

/// `site-bootstrap resolve`: show what a run would write, without running it.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = BootstrapConfig::load(root).context("failed to load bootstrap.yaml")?;
    let resolved = ResolvedConfig::resolve().with_site_name(config.site_name.clone());
    let entries = resolved.masked_entries();

    if json {
        print_json(&serde_json::json!({
            "config": entries,
            "database_url_set": resolved.database_url.is_some(),
            "site_config_path": paths::site_config_path(root, &resolved.site_name),
        }))?;
        return Ok(());
    }

    print_pairs(("KEY", "VALUE"), &entries);

    println!();
    println!(
        "site config: {}",
        paths::site_config_path(root, &resolved.site_name).display()
    );
    if resolved.database_url.is_none() {
        println!("DATABASE_URL not set; PG* connection defaults apply");
    }
    for warning in config.validate() {
        println!("warning: {}", warning.message);
    }
    Ok(())
}
