use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use cloogy::{Client, ClientConfig, ConsumptionRequest, Granularity, ListQuery, ReadingsOptions};
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example readings -- <login> <password> [tag-id ...]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(login), Some(password)) = (args.next(), args.next()) else {
        bail!("usage: readings <login> <password> [tag-id ...]");
    };
    let mut tags = args
        .map(|a| a.parse().with_context(|| format!("invalid tag id `{a}`")))
        .collect::<Result<Vec<i64>>>()?;

    let client = Client::login(ClientConfig::default(), &login, &password)?;

    for unit in client.units(&ListQuery::new())? {
        let unit_tags = unit.tags(&ListQuery::new())?;
        println!(
            "unit {} (last seen {:?}): {} tag(s)",
            unit.id,
            unit.last_communication(),
            unit_tags.len()
        );
        if tags.is_empty() {
            tags.extend(unit_tags.iter().map(|t| t.id));
        }
    }

    let end = Utc::now();
    let request = ConsumptionRequest::new(Granularity::Hourly, tags, end - TimeDelta::days(1), end);
    let table = client.readings_table(&request, &ReadingsOptions::default())?;
    println!("{table}");
    Ok(())
}
