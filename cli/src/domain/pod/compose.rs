//! Compose document generation.
//!
//! Output is a pure function of its inputs: services, labels, environment and
//! volumes are all kept in sorted maps, and struct field order fixes the key
//! order within each service.

use std::collections::{BTreeMap, BTreeSet};

use claw_common::labels::compose as label;
use serde::Serialize;

use super::{CLAW_NETWORK, Pod, Service, expand_ordinals};
use crate::domain::error::EmissionError;
use crate::domain::resolved::{Healthcheck, MaterializeResult};
use crate::domain::surface::{
    SCHEME_CHANNEL, SCHEME_EGRESS, SCHEME_HOST, SCHEME_SERVICE, SCHEME_VOLUME, Surface,
};

/// Default dashboard listen address.
pub const DEFAULT_CLAWCTL_ADDR: &str = ":8082";
const DEFAULT_CLAWCTL_PORT: &str = "8082";
const DEFAULT_DOCKER_SOCK: &str = "/var/run/docker.sock";

/// An LLM proxy service shared by the pod's cllama-enabled agents.
#[derive(Debug, Clone, Default)]
pub struct CllamaProxyConfig {
    pub proxy_type: String,
    pub image: String,
    pub context_host_dir: String,
    pub auth_host_dir: String,
    /// Proxy-only environment (provider keys, `CLAW_POD`).
    pub environment: BTreeMap<String, String>,
    pub pod_name: String,
}

impl CllamaProxyConfig {
    /// Compose service name, `cllama-<type>`.
    #[must_use]
    pub fn service_name(&self) -> String {
        proxy_service_name(&self.proxy_type)
    }
}

/// `cllama-<type>`
#[must_use]
pub fn proxy_service_name(proxy_type: &str) -> String {
    format!("cllama-{proxy_type}")
}

/// The read-only dashboard service.
#[derive(Debug, Clone, Default)]
pub struct ClawctlConfig {
    pub image: String,
    pub addr: String,
    pub manifest_host_path: String,
    /// Defaults to `/var/run/docker.sock`.
    pub docker_sock_host_path: String,
    pub pod_name: String,
}

/// Inputs beyond the pod and the driver results.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Proxy bearer tokens keyed by compose service name (`bot`, `bot-0`).
    pub cllama_tokens: BTreeMap<String, String>,
    pub proxies: Vec<CllamaProxyConfig>,
    pub clawctl: Option<ClawctlConfig>,
}

#[derive(Serialize)]
struct ComposeFile {
    services: BTreeMap<String, ComposeService>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    volumes: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    networks: BTreeMap<String, NetworkSpec>,
}

#[derive(Serialize)]
struct NetworkSpec {
    internal: bool,
}

#[derive(Serialize, Default)]
struct ComposeService {
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    read_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tmpfs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    restart: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    healthcheck: Option<ComposeHealthcheck>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    networks: Vec<String>,
}

#[derive(Serialize)]
struct ComposeHealthcheck {
    test: Vec<String>,
    interval: String,
    timeout: String,
    retries: u32,
}

impl From<&Healthcheck> for ComposeHealthcheck {
    fn from(h: &Healthcheck) -> Self {
        Self {
            test: h.test.clone(),
            interval: h.interval.clone(),
            timeout: h.timeout.clone(),
            retries: h.retries,
        }
    }
}

fn cmd_healthcheck(binary: String) -> ComposeHealthcheck {
    ComposeHealthcheck {
        test: vec!["CMD".into(), binary, "-healthcheck".into()],
        interval: "15s".into(),
        timeout: "5s".into(),
        retries: 3,
    }
}

/// Render the compose document for `pod`.
///
/// `results` holds each claw service's driver contribution, keyed by the
/// pod service name. A claw service without an entry gets fail-closed
/// defaults.
///
/// # Errors
///
/// Returns `EmissionError` for unsupported surface schemes, access modes on
/// schemes that do not take one, non-absolute host surfaces, service
/// surfaces naming an unknown service, and incomplete proxy or dashboard
/// configuration.
pub fn emit_compose(
    pod: &Pod,
    results: &BTreeMap<String, MaterializeResult>,
    opts: &EmitOptions,
) -> Result<String, EmissionError> {
    let mut file = ComposeFile {
        services: BTreeMap::new(),
        volumes: BTreeMap::new(),
        networks: BTreeMap::new(),
    };
    let mut has_claw = false;

    let surface_targets: BTreeSet<&str> = pod
        .services
        .values()
        .filter_map(|s| s.claw.as_ref())
        .flat_map(|c| c.surfaces.iter())
        .filter(|s| s.scheme == SCHEME_SERVICE)
        .map(|s| s.target.trim())
        .collect();

    let handle_env = handle_envs(pod);
    let unmanaged = MaterializeResult::unmanaged();
    let fail_closed = MaterializeResult::default();

    for (name, svc) in &pod.services {
        let is_claw = svc.claw.is_some();
        has_claw |= is_claw;
        let result = match results.get(name) {
            Some(r) => r,
            None if is_claw => &fail_closed,
            None => &unmanaged,
        };

        let surface_mounts = surface_mounts(pod, name, svc, &mut file.volumes)?;
        let count = svc.claw.as_ref().map_or(1, |c| c.count.max(1));
        let joins_network = is_claw || surface_targets.contains(name.as_str());

        for compose_name in expand_ordinals(name, count) {
            let mut labels = BTreeMap::from([
                (label::POD.to_string(), pod.name.clone()),
                (label::SERVICE.to_string(), name.clone()),
            ]);
            if count > 1 {
                let ordinal = compose_name.rsplit('-').next().unwrap_or_default();
                labels.insert(label::ORDINAL.to_string(), ordinal.to_string());
            }

            let mut volumes: Vec<String> = result.mounts.iter().map(|m| m.compose_spec()).collect();
            volumes.extend(surface_mounts.iter().cloned());

            // Handle broadcast < pod env < driver env.
            let mut environment = handle_env.clone();
            environment.extend(svc.environment.clone());
            environment.extend(result.environment.clone());
            if is_claw {
                let token = opts
                    .cllama_tokens
                    .get(&compose_name)
                    .or_else(|| opts.cllama_tokens.get(name))
                    .filter(|t| !t.trim().is_empty());
                if let Some(token) = token {
                    environment.insert("CLLAMA_TOKEN".into(), token.clone());
                }
            }

            file.services.insert(
                compose_name,
                ComposeService {
                    image: svc.image.clone(),
                    ports: Vec::new(),
                    read_only: result.read_only,
                    tmpfs: result.tmpfs.clone(),
                    volumes,
                    environment,
                    restart: result.restart.clone(),
                    healthcheck: result.healthcheck.as_ref().map(ComposeHealthcheck::from),
                    labels,
                    networks: if joins_network {
                        vec![CLAW_NETWORK.to_string()]
                    } else {
                        Vec::new()
                    },
                },
            );
        }
    }

    for proxy in &opts.proxies {
        has_claw = true;
        let (name, service) = proxy_service(proxy)?;
        file.services.insert(name, service);
    }

    if has_claw {
        if let Some(clawctl) = &opts.clawctl {
            file.services.insert("clawctl".into(), clawctl_service(clawctl)?);
        }
        file.networks
            .insert(CLAW_NETWORK.to_string(), NetworkSpec { internal: true });
    }

    Ok(serde_yaml::to_string(&file)?)
}

/// Validate a service's surfaces and return its volume/host mounts,
/// declaring named volumes at the top level.
fn surface_mounts(
    pod: &Pod,
    name: &str,
    svc: &Service,
    volumes: &mut BTreeMap<String, BTreeMap<String, String>>,
) -> Result<Vec<String>, EmissionError> {
    let Some(claw) = &svc.claw else {
        return Ok(Vec::new());
    };
    let mut mounts = Vec::new();
    for surface in &claw.surfaces {
        let uri = surface.uri();
        let target = surface.target.trim();
        match surface.scheme.as_str() {
            SCHEME_VOLUME => {
                let mode = access_mode(name, surface)?;
                if target.is_empty() {
                    return Err(EmissionError::MissingTarget {
                        service: name.to_string(),
                        uri,
                    });
                }
                volumes.entry(target.to_string()).or_default();
                mounts.push(format!("{target}:/mnt/{target}:{mode}"));
            }
            SCHEME_HOST => {
                let mode = access_mode(name, surface)?;
                if target.is_empty() {
                    return Err(EmissionError::MissingTarget {
                        service: name.to_string(),
                        uri,
                    });
                }
                if !target.starts_with('/') {
                    return Err(EmissionError::HostPathNotAbsolute {
                        service: name.to_string(),
                        uri,
                    });
                }
                mounts.push(format!("{target}:{target}:{mode}"));
            }
            SCHEME_SERVICE | SCHEME_CHANNEL | SCHEME_EGRESS => {
                if surface.scheme == SCHEME_SERVICE && !pod.services.contains_key(target) {
                    return Err(EmissionError::UnknownServiceTarget {
                        service: name.to_string(),
                        uri,
                        target: target.to_string(),
                    });
                }
                if !surface.access_mode.trim().is_empty() {
                    return Err(EmissionError::AccessModeNotSupported {
                        service: name.to_string(),
                        uri,
                        mode: surface.access_mode.clone(),
                    });
                }
            }
            other => {
                return Err(EmissionError::UnsupportedScheme {
                    service: name.to_string(),
                    scheme: other.to_string(),
                    uri,
                });
            }
        }
    }
    Ok(mounts)
}

fn access_mode(service: &str, surface: &Surface) -> Result<&'static str, EmissionError> {
    match surface.access_mode.trim().to_ascii_lowercase().as_str() {
        "" | "read-write" | "rw" => Ok("rw"),
        "read-only" | "ro" => Ok("ro"),
        _ => Err(EmissionError::InvalidAccessMode {
            service: service.to_string(),
            uri: surface.uri(),
            mode: surface.access_mode.clone(),
        }),
    }
}

/// `CLAW_HANDLE_<SERVICE>_<PLATFORM>_{ID,USERNAME,GUILDS,JSON}` for every
/// claw handle in the pod.
fn handle_envs(pod: &Pod) -> BTreeMap<String, String> {
    let mut envs = BTreeMap::new();
    for (name, svc) in &pod.services {
        let Some(claw) = &svc.claw else { continue };
        let service_key = name.replace('-', "_").to_ascii_uppercase();
        for (platform, info) in &claw.handles {
            let prefix = format!("CLAW_HANDLE_{service_key}_{}", platform.to_ascii_uppercase());
            envs.insert(format!("{prefix}_ID"), info.id.clone());
            if !info.username.is_empty() {
                envs.insert(format!("{prefix}_USERNAME"), info.username.clone());
            }
            if !info.guilds.is_empty() {
                let ids: Vec<&str> = info.guilds.iter().map(|g| g.id.as_str()).collect();
                envs.insert(format!("{prefix}_GUILDS"), ids.join(","));
            }
            if let Ok(json) = serde_json::to_string(info) {
                envs.insert(format!("{prefix}_JSON"), json);
            }
        }
    }
    envs
}

fn require(value: &str, err: EmissionError) -> Result<(), EmissionError> {
    if value.trim().is_empty() {
        return Err(err);
    }
    Ok(())
}

fn proxy_service(proxy: &CllamaProxyConfig) -> Result<(String, ComposeService), EmissionError> {
    require(&proxy.proxy_type, EmissionError::Proxy { field: "type" })?;
    require(&proxy.image, EmissionError::Proxy { field: "image" })?;
    require(
        &proxy.context_host_dir,
        EmissionError::Proxy {
            field: "context host dir",
        },
    )?;
    require(
        &proxy.auth_host_dir,
        EmissionError::Proxy {
            field: "auth host dir",
        },
    )?;

    let name = proxy.service_name();
    let mut environment = BTreeMap::from([
        ("CLAW_CONTEXT_ROOT".to_string(), "/claw/context".to_string()),
        ("CLAW_AUTH_DIR".to_string(), "/claw/auth".to_string()),
    ]);
    environment.extend(proxy.environment.clone());

    let service = ComposeService {
        image: proxy.image.clone(),
        ports: vec!["8081:8081".into()],
        volumes: vec![
            format!("{}:/claw/context:ro", proxy.context_host_dir),
            format!("{}:/claw/auth:rw", proxy.auth_host_dir),
        ],
        environment,
        restart: "on-failure".into(),
        healthcheck: Some(cmd_healthcheck(format!("/cllama-{}", proxy.proxy_type))),
        labels: BTreeMap::from([
            (label::POD.to_string(), proxy.pod_name.clone()),
            (label::ROLE.to_string(), label::ROLE_PROXY.to_string()),
            (label::PROXY_TYPE.to_string(), proxy.proxy_type.clone()),
            (label::SERVICE.to_string(), name.clone()),
        ]),
        networks: vec![CLAW_NETWORK.to_string()],
        ..ComposeService::default()
    };
    Ok((name, service))
}

fn clawctl_service(cfg: &ClawctlConfig) -> Result<ComposeService, EmissionError> {
    require(&cfg.image, EmissionError::Clawctl { field: "image" })?;
    require(
        &cfg.manifest_host_path,
        EmissionError::Clawctl {
            field: "manifest host path",
        },
    )?;

    let addr = match cfg.addr.trim() {
        "" => DEFAULT_CLAWCTL_ADDR,
        a => a,
    };
    let port = clawctl_port(addr);
    let socket = match cfg.docker_sock_host_path.trim() {
        "" => DEFAULT_DOCKER_SOCK,
        s => s,
    };

    Ok(ComposeService {
        image: cfg.image.clone(),
        ports: vec![format!("{port}:{port}")],
        read_only: true,
        tmpfs: vec!["/tmp".into()],
        volumes: vec![
            format!("{}:/claw/pod-manifest.json:ro", cfg.manifest_host_path),
            format!("{socket}:/var/run/docker.sock:ro"),
        ],
        environment: BTreeMap::from([
            ("CLAWCTL_ADDR".to_string(), addr.to_string()),
            (
                "CLAWCTL_MANIFEST".to_string(),
                "/claw/pod-manifest.json".to_string(),
            ),
            ("CLAW_POD".to_string(), cfg.pod_name.clone()),
        ]),
        restart: "on-failure".into(),
        healthcheck: Some(cmd_healthcheck("/clawctl".into())),
        labels: BTreeMap::from([
            (label::POD.to_string(), cfg.pod_name.clone()),
            (label::ROLE.to_string(), label::ROLE_DASHBOARD.to_string()),
            (label::SERVICE.to_string(), "clawctl".to_string()),
        ]),
        networks: vec![CLAW_NETWORK.to_string()],
    })
}

/// Port to publish for a listen address; falls back to 8082 when the
/// address carries no valid port.
#[must_use]
pub fn clawctl_port(addr: &str) -> String {
    let addr = addr.trim();
    let port = addr.rsplit_once(':').map_or(addr, |(_, p)| p);
    match port.trim().parse::<u16>() {
        Ok(p) if p >= 1 => p.to_string(),
        _ => DEFAULT_CLAWCTL_PORT.to_string(),
    }
}
