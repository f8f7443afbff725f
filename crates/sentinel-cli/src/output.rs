use colored::Colorize;
use sentinel_resource::Plan;
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::commands::plan::PlannedChange;
use crate::state::StateFile;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_as_table(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => print_error(&format!("rendering JSON: {e}")),
    }
}

/// Key/value table of a single resource's attributes.
fn print_as_table(value: &Value) {
    let Some(obj) = value.as_object() else {
        print_json(value);
        return;
    };
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Value"]);
    for (key, val) in obj {
        let rendered = match val {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        builder.push_record([key.clone(), rendered]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

pub fn print_plan(changes: &[PlannedChange], format: OutputFormat) {
    if format == OutputFormat::Json {
        let rendered: Vec<Value> = changes
            .iter()
            .map(|c| {
                json!({
                    "address": c.address,
                    "type": c.resource_type,
                    "plan": c.plan,
                })
            })
            .collect();
        print_json(&Value::Array(rendered));
        return;
    }

    let pending: Vec<&PlannedChange> = changes.iter().filter(|c| !c.plan.is_noop()).collect();
    if pending.is_empty() {
        println!("No changes. Remote alert rules match the configuration.");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["", "Address", "Type", "Details"]);
    for change in &pending {
        let details = match &change.plan {
            Plan::Update { changed } => format!("update {}", changed.join(", ")),
            Plan::Replace { force_new } => format!("{} forces replacement", force_new.join(", ")),
            other => other.action().to_string(),
        };
        builder.push_record([
            symbol(&change.plan),
            change.address.clone(),
            change.resource_type.clone(),
            details,
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));

    let count = |action: &str| pending.iter().filter(|c| c.plan.action() == action).count();
    println!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        count("create"),
        count("update"),
        count("replace"),
        count("delete"),
    );
}

fn symbol(plan: &Plan) -> String {
    match plan {
        Plan::Create => "+".green().to_string(),
        Plan::Update { .. } => "~".yellow().to_string(),
        Plan::Replace { .. } => "-/+".magenta().to_string(),
        Plan::Delete => "-".red().to_string(),
        Plan::NoOp => " ".to_string(),
    }
}

pub fn print_state(state: &StateFile, format: OutputFormat) {
    if format == OutputFormat::Json {
        let rendered: serde_json::Map<String, Value> = state
            .iter()
            .map(|(address, entry)| {
                (
                    address.clone(),
                    json!({ "type": entry.resource_type, "id": entry.id }),
                )
            })
            .collect();
        print_json(&Value::Object(rendered));
        return;
    }

    if state.is_empty() {
        println!("No resources in state.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Address", "Type", "ID"]);
    for (address, entry) in state.iter() {
        builder.push_record([address.clone(), entry.resource_type.clone(), entry.id.clone()]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("Total: {}", state.len());
}
