//! Application service: `claw health`.
//!
//! Every container of the compose project is probed through the driver
//! named by its `claw.type` label; containers without one report the
//! engine's own state.

use std::path::Path;

use anyhow::Result;
use claw_common::labels::{compose, image};

use crate::application::ports::ContainerEngine;
use crate::domain::health::{HealthRow, short_container_id};
use crate::domain::resolved::ContainerRef;
use crate::drivers::DriverRegistry;

const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// One row per running container; empty when nothing is running.
///
/// # Errors
///
/// Returns an error only when the container list cannot be read. Per
/// container failures become `error` rows.
pub async fn check_health(
    engine: &dyn ContainerEngine,
    registry: &DriverRegistry,
    compose_file: &Path,
) -> Result<Vec<HealthRow>> {
    let ids = engine.compose_ps_ids(compose_file, None).await?;
    let mut rows = Vec::with_capacity(ids.len());
    for id in &ids {
        rows.push(probe(engine, registry, id).await);
    }
    Ok(rows)
}

async fn probe(engine: &dyn ContainerEngine, registry: &DriverRegistry, id: &str) -> HealthRow {
    let details = match engine.container_details(id).await {
        Ok(d) => d,
        Err(e) => return HealthRow::error(short_container_id(id), format!("inspect failed: {e:#}")),
    };
    let label = |key: &str| details.labels.get(key).filter(|v| !v.is_empty()).cloned();
    let service = label(compose::SERVICE)
        .or_else(|| label(COMPOSE_SERVICE_LABEL))
        .unwrap_or_else(|| short_container_id(id).to_string());

    let Some(claw_type) = label(image::TYPE) else {
        return HealthRow::native(&service, &details.state);
    };
    let driver = match registry.lookup(&claw_type) {
        Ok(d) => d,
        Err(_) => return HealthRow::error(&service, format!("unknown driver: {claw_type}")),
    };
    let target = ContainerRef {
        container_id: id.to_string(),
        service_name: service.clone(),
    };
    match driver.health_probe(&target, engine).await {
        Ok(health) => HealthRow::from_probe(&service, &health),
        Err(e) => HealthRow::error(&service, format!("{e:#}")),
    }
}
