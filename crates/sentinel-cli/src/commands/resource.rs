//! show and import.

use anyhow::{Context, Result};
use colored::Colorize;
use sentinel_resource::Provider;

use crate::cli::OutputFormat;
use crate::output::{print_success, print_value, print_warning};
use crate::state::{StateEntry, StateFile};

pub async fn show(provider: &Provider, resource_type: &str, id: &str, format: OutputFormat) -> Result<()> {
    let resource = provider.resource(resource_type)?;
    match resource
        .read(id)
        .await
        .with_context(|| format!("reading {id}"))?
    {
        Some(attributes) => print_value(&attributes, format),
        None => print_warning(&format!("{resource_type} {id} does not exist")),
    }
    Ok(())
}

/// Adopts an existing remote rule under `address`.
pub async fn import(
    provider: &Provider,
    state: &mut StateFile,
    resource_type: &str,
    address: &str,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    if let Some(existing) = state.get(address) {
        anyhow::bail!(
            "{address} is already managed (id {}); remove it from the resource file and apply before importing again",
            existing.id
        );
    }
    let resource = provider.resource(resource_type)?;
    let attributes = resource
        .import(id)
        .await
        .with_context(|| format!("importing {id}"))?;

    state.insert(address, StateEntry::from_attributes(resource_type, attributes.clone())?);
    state.save()?;
    print_success(&format!("Imported {} as {}", id.cyan(), address.cyan()));
    print_value(&attributes, format);
    Ok(())
}
