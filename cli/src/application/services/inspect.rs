//! Application service: `claw inspect`.

use anyhow::{Context, Result};

use crate::application::ports::ContainerEngine;
use crate::domain::inspect::ClawInfo;

/// Decode the claw metadata of a local image.
///
/// # Errors
///
/// Returns an error when the image cannot be inspected.
pub async fn inspect_image(engine: &dyn ContainerEngine, image: &str) -> Result<ClawInfo> {
    let labels = engine
        .image_labels(image)
        .await
        .with_context(|| format!("inspect image {image:?}"))?;
    Ok(ClawInfo::from_labels(&labels))
}

/// Human-readable lines for `info`, or the non-claw notice.
#[must_use]
pub fn render_lines(info: &ClawInfo) -> Vec<String> {
    if !info.is_claw() {
        return vec!["Not a Claw image (no claw.type label)".to_string()];
    }
    let mut lines = vec![
        format!("Claw Type: {}", info.claw_type),
        format!("Agent:     {}", info.agent.as_deref().unwrap_or_default()),
    ];
    if !info.cllama.is_empty() {
        lines.push(format!("Cllama:    {}", info.cllama.join(", ")));
    }
    if let Some(persona) = info.persona.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("Persona:   {persona}"));
    }
    lines.extend(info.models.iter().map(|(slot, model)| format!("Model[{slot}]: {model}")));
    lines.extend(info.surfaces.iter().map(|s| format!("Surface:   {s}")));
    lines.extend(info.privileges.iter().map(|(mode, user)| format!("Privilege[{mode}]: {user}")));
    lines
}
