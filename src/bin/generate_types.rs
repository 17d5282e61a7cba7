//! Export TypeScript bindings and JSON schemas for the frontend.
//!
//! Usage: `cargo run --bin generate_types -- [OUT_DIR]` (default `bindings/`)
//!
//! TypeScript files land in `OUT_DIR/`, JSON schemas in `OUT_DIR/schemas/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use schemars::{schema_for, JsonSchema};
use ts_rs::TS;

use devpulse::config::Config;
use devpulse::tour::{StepCatalog, TourEventPayload, TourView};

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("bindings"), PathBuf::from);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    // Dependencies (StepDescriptor, TourAction, Placement, ...) are exported alongside
    TourView::export_all_to(&out_dir).context("Failed to export TourView")?;
    TourEventPayload::export_all_to(&out_dir).context("Failed to export TourEventPayload")?;
    StepCatalog::export_all_to(&out_dir).context("Failed to export StepCatalog")?;
    println!("TypeScript bindings written to {}", out_dir.display());

    let schema_dir = out_dir.join("schemas");
    fs::create_dir_all(&schema_dir)?;
    write_schema::<TourView>(&schema_dir, "tour_view")?;
    write_schema::<TourEventPayload>(&schema_dir, "tour_event_payload")?;
    write_schema::<StepCatalog>(&schema_dir, "step_catalog")?;
    write_schema::<Config>(&schema_dir, "config")?;
    println!("JSON schemas written to {}", schema_dir.display());

    Ok(())
}

fn write_schema<T: JsonSchema>(dir: &Path, name: &str) -> Result<()> {
    let schema = schema_for!(T);
    let path = dir.join(format!("{name}.schema.json"));
    fs::write(&path, serde_json::to_string_pretty(&schema)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
