//! plan, apply and destroy.

use anyhow::{Context, Result};
use colored::Colorize;
use sentinel_resource::{Plan, Provider};
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::manifest::Manifest;
use crate::output::{print_plan, print_success, print_warning};
use crate::state::{StateEntry, StateFile};

/// One step of an execution plan.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub address: String,
    pub resource_type: String,
    pub plan: Plan,
    /// Desired configuration; absent for deletions.
    pub config: Option<Value>,
    /// Refreshed prior state; absent for creations.
    pub prior: Option<StateEntry>,
}

/// Re-reads every resource in state, dropping the ones that no longer exist
/// remotely and updating the rest with what was read.
pub async fn refresh(provider: &Provider, state: &mut StateFile) -> Result<()> {
    for address in state.addresses() {
        let Some(entry) = state.get(&address).cloned() else {
            continue;
        };
        let resource = provider.resource(&entry.resource_type)?;
        match resource
            .refresh(&entry.attributes)
            .await
            .with_context(|| format!("refreshing {address}"))?
        {
            Some(attributes) => {
                state.insert(address, StateEntry::from_attributes(entry.resource_type, attributes)?);
            }
            None => {
                print_warning(&format!("{address} no longer exists remotely, removing it from state"));
                state.remove(&address);
            }
        }
    }
    Ok(())
}

/// Diffs the manifest against (refreshed) state. Resources in state that the
/// manifest no longer names are planned for deletion.
pub fn compute(provider: &Provider, manifest: &Manifest, state: &StateFile) -> Result<Vec<PlannedChange>> {
    let mut changes = Vec::new();

    for block in &manifest.resources {
        let config = block.config()?;
        let prior = state.get(&block.address).cloned();

        if let Some(prior) = prior.as_ref().filter(|p| p.resource_type != block.resource_type) {
            // A type change cannot happen in place: destroy the old object first.
            changes.push(PlannedChange {
                address: block.address.clone(),
                resource_type: prior.resource_type.clone(),
                plan: Plan::Delete,
                config: None,
                prior: Some(prior.clone()),
            });
            changes.push(planned(provider, &block.address, &block.resource_type, None, config)?);
            continue;
        }

        changes.push(planned(provider, &block.address, &block.resource_type, prior, config)?);
    }

    for (address, entry) in state.iter() {
        if manifest.get(address).is_none() {
            changes.push(PlannedChange {
                address: address.clone(),
                resource_type: entry.resource_type.clone(),
                plan: Plan::Delete,
                config: None,
                prior: Some(entry.clone()),
            });
        }
    }

    Ok(changes)
}

fn planned(
    provider: &Provider,
    address: &str,
    resource_type: &str,
    prior: Option<StateEntry>,
    config: Value,
) -> Result<PlannedChange> {
    let resource = provider.resource(resource_type)?;
    let plan = resource
        .plan(prior.as_ref().map(|p| &p.attributes), Some(&config))
        .with_context(|| format!("planning {address}"))?;
    Ok(PlannedChange {
        address: address.to_string(),
        resource_type: resource_type.to_string(),
        plan,
        config: Some(config),
        prior,
    })
}

/// Executes a plan, saving state after every step so a failure keeps the
/// progress made so far.
pub async fn execute(provider: &Provider, state: &mut StateFile, changes: &[PlannedChange]) -> Result<()> {
    for change in changes {
        let resource = provider.resource(&change.resource_type)?;
        let address = change.address.as_str();

        match &change.plan {
            Plan::NoOp => continue,
            Plan::Create => {
                let attributes = resource
                    .create(required(change.config.as_ref(), address)?)
                    .await
                    .with_context(|| format!("creating {address}"))?;
                state.insert(address, StateEntry::from_attributes(&change.resource_type, attributes)?);
                print_success(&format!("Created {}", address.cyan()));
            }
            Plan::Update { .. } => {
                let attributes = resource
                    .update(required(change.config.as_ref(), address)?)
                    .await
                    .with_context(|| format!("updating {address}"))?;
                state.insert(address, StateEntry::from_attributes(&change.resource_type, attributes)?);
                print_success(&format!("Updated {}", address.cyan()));
            }
            Plan::Replace { .. } => {
                let prior = required(change.prior.as_ref(), address)?;
                resource
                    .delete(&prior.id)
                    .await
                    .with_context(|| format!("deleting {address} for replacement"))?;
                state.remove(address);
                state.save()?;

                let attributes = resource
                    .create(required(change.config.as_ref(), address)?)
                    .await
                    .with_context(|| format!("creating {address}"))?;
                state.insert(address, StateEntry::from_attributes(&change.resource_type, attributes)?);
                print_success(&format!("Replaced {}", address.cyan()));
            }
            Plan::Delete => {
                let prior = required(change.prior.as_ref(), address)?;
                resource
                    .delete(&prior.id)
                    .await
                    .with_context(|| format!("deleting {address}"))?;
                state.remove(address);
                print_success(&format!("Destroyed {}", address.cyan()));
            }
        }
        state.save()?;
    }
    Ok(())
}

fn required<T: Clone>(value: Option<&T>, address: &str) -> Result<T> {
    value
        .cloned()
        .with_context(|| format!("plan for {address} is missing data"))
}

pub async fn plan(provider: &Provider, state: &mut StateFile, file: &str, format: OutputFormat) -> Result<()> {
    let manifest = Manifest::load(file)?;
    refresh(provider, state).await?;
    let changes = compute(provider, &manifest, state)?;
    print_plan(&changes, format);
    Ok(())
}

pub async fn apply(provider: &Provider, state: &mut StateFile, file: &str, format: OutputFormat) -> Result<()> {
    let manifest = Manifest::load(file)?;
    refresh(provider, state).await?;
    state.save()?;
    let changes = compute(provider, &manifest, state)?;
    print_plan(&changes, format);
    execute(provider, state, &changes).await
}

/// Deletes every resource the file names that is present in state.
pub async fn destroy(provider: &Provider, state: &mut StateFile, file: &str, format: OutputFormat) -> Result<()> {
    let manifest = Manifest::load(file)?;
    refresh(provider, state).await?;
    state.save()?;

    let changes: Vec<PlannedChange> = manifest
        .resources
        .iter()
        .filter_map(|block| state.get(&block.address).map(|entry| (block, entry)))
        .map(|(block, entry)| PlannedChange {
            address: block.address.clone(),
            resource_type: entry.resource_type.clone(),
            plan: Plan::Delete,
            config: None,
            prior: Some(entry.clone()),
        })
        .collect();

    print_plan(&changes, format);
    execute(provider, state, &changes).await
}
