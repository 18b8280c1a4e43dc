//! Pod manifest (`pod-manifest.json`) assembly.

use std::collections::BTreeMap;

use claw_common::{PodManifest, ProxyManifest, ServiceManifest, SurfaceManifest};

use crate::domain::pod::{CllamaProxyConfig, Pod};
use crate::domain::resolved::{ResolvedClaw, ResolvedSkill};
use crate::domain::surface::Surface;

/// File name of the manifest inside `.claw-runtime/`.
pub const POD_MANIFEST_FILE: &str = "pod-manifest.json";

/// Merge the parsed pod with each service's resolved view.
///
/// Services without a resolved entry keep what the pod itself declares.
#[must_use]
pub fn build_pod_manifest(
    pod: &Pod,
    resolved: &BTreeMap<String, ResolvedClaw>,
    proxies: &[CllamaProxyConfig],
) -> PodManifest {
    let mut services = BTreeMap::new();
    for (name, svc) in &pod.services {
        let mut entry = ServiceManifest {
            image_ref: svc.image.clone(),
            count: svc.claw.as_ref().map_or(1, |c| c.count.max(1)),
            ..ServiceManifest::default()
        };
        if let Some(rc) = resolved.get(name) {
            entry.claw_type.clone_from(&rc.claw_type);
            entry.agent.clone_from(&rc.agent);
            entry.models.clone_from(&rc.models);
            entry.handles.clone_from(&rc.handles);
            entry.peer_handles.clone_from(&rc.peer_handles);
            entry.surfaces = surface_manifests(&rc.surfaces);
            entry.skills = skill_names(&rc.skills);
            entry.invocations.clone_from(&rc.invocations);
            entry.cllama.clone_from(&rc.cllama);
            if rc.count > 0 {
                entry.count = rc.count;
            }
        } else if let Some(claw) = &svc.claw {
            entry.handles.clone_from(&claw.handles);
            entry.surfaces = surface_manifests(&claw.surfaces);
            entry.cllama.clone_from(&claw.cllama);
        }
        services.insert(name.clone(), entry);
    }

    let mut proxies: Vec<ProxyManifest> = proxies
        .iter()
        .map(|p| ProxyManifest {
            proxy_type: p.proxy_type.clone(),
            service_name: p.service_name(),
            image: p.image.clone(),
        })
        .collect();
    proxies.sort_by(|a, b| a.service_name.cmp(&b.service_name));

    PodManifest {
        pod_name: pod.name.clone(),
        services,
        proxies,
    }
}

/// Two-space indented JSON with a trailing newline.
pub fn render_pod_manifest(manifest: &PodManifest) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(manifest)?;
    out.push('\n');
    Ok(out)
}

fn surface_manifests(surfaces: &[Surface]) -> Vec<SurfaceManifest> {
    surfaces
        .iter()
        .map(|s| SurfaceManifest {
            scheme: s.scheme.clone(),
            target: s.target.clone(),
            access_mode: s.access_mode.clone(),
            ports: s.ports.clone(),
            channel_config: s.channel_config.clone(),
        })
        .collect()
}

fn skill_names(skills: &[ResolvedSkill]) -> Vec<String> {
    skills
        .iter()
        .map(|s| s.name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}
