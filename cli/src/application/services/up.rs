//! Application service: `claw up`.
//!
//! Runs the pipeline for one pod: resolve and validate every claw service,
//! wire the LLM proxy, materialize runtime files, emit the compose file,
//! start the pod, and verify each container through its driver.
//!
//! No container starts unless every service validated and every artifact
//! was written.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use claw_common::{HandleInfo, Invocation};
use thiserror::Error;

use crate::application::ports::{ContainerEngine, LocalFs, ProgressReporter};
use crate::application::services::lifecycle::{COMPOSE_GENERATED, pod_dir};
use crate::domain::ClawdapusConfig;
use crate::domain::error::EngineError;
use crate::domain::health::short_container_id;
use crate::domain::inspect::ClawInfo;
use crate::domain::manifest::{POD_MANIFEST_FILE, build_pod_manifest, render_pod_manifest};
use crate::domain::markdown::clawdapus_md;
use crate::domain::pod::{
    ClawBlock, ClawctlConfig, CllamaProxyConfig, EmitOptions, Pod, Service, emit_compose,
    expand_ordinals, parse_pod,
};
use crate::domain::resolved::{
    MaterializeOpts, MaterializeResult, PostApplyOpts, ResolvedClaw,
};
use crate::domain::surface::SCHEME_SERVICE;
use crate::drivers::{Driver, DriverRegistry};
use crate::runtime::context::{
    AgentContext, AgentMetadata, auth_dir, context_root, write_context_dirs,
};
use crate::runtime::skills::{merge_skills, projection_mounts, write_generated_skills};
use crate::runtime::{RUNTIME_DIR, TokenStore, resolve_contract, resolve_skills};

const DOCKER_SOCK: &str = "/var/run/docker.sock";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Pipeline step a per-service failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inspect,
    Resolve,
    Lookup,
    Validate,
    Materialize,
    Emit,
    PostApply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inspect => "inspect",
            Self::Resolve => "resolve",
            Self::Lookup => "lookup",
            Self::Validate => "validate",
            Self::Materialize => "materialize",
            Self::Emit => "emit",
            Self::PostApply => "post-apply",
        })
    }
}

/// A failure tagged with the service and phase it belongs to.
#[derive(Debug, Error)]
#[error("[claw] {service}: {phase}: {cause:#}")]
pub struct PhaseError {
    pub service: String,
    pub phase: Phase,
    pub cause: anyhow::Error,
}

impl PhaseError {
    pub fn new(service: &str, phase: Phase, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            service: service.to_string(),
            phase,
            cause: cause.into(),
        }
    }
}

/// `map_err` adapter tagging an error with its service and phase.
fn at<E: Into<anyhow::Error>>(service: &str, phase: Phase) -> impl FnOnce(E) -> PhaseError + '_ {
    move |e| PhaseError::new(service, phase, e)
}

// ── Options and results ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    pub pod_file: PathBuf,
    pub detach: bool,
    /// `CLAWCTL_ADDR` from the environment, if set.
    pub clawctl_addr: Option<String>,
}

/// What `generate` wrote, and the drivers that own each claw service.
pub struct Generated {
    pub compose_path: PathBuf,
    pub manifest_path: PathBuf,
    pub resolved: BTreeMap<String, ResolvedClaw>,
    drivers: BTreeMap<String, Arc<dyn Driver>>,
}

/// Shared inputs of one `up`.
pub struct UpDeps<'a, R: ProgressReporter> {
    pub engine: &'a dyn ContainerEngine,
    pub registry: &'a DriverRegistry,
    pub config: &'a ClawdapusConfig,
    pub reporter: &'a R,
    pub fs: &'a dyn LocalFs,
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Generate, start, and verify the pod.
///
/// # Errors
///
/// Returns a [`PhaseError`] for per-service failures, and a plain error
/// for pod-level failures or a non-zero engine exit.
pub async fn up<R: ProgressReporter>(deps: &UpDeps<'_, R>, opts: &UpOptions) -> Result<()> {
    let generated = generate(deps, opts).await?;

    if !generated.resolved.is_empty() && !opts.detach {
        bail!(
            "claw-managed services require detached mode for fail-closed post-apply verification; rerun with 'claw up -d -f {}'",
            opts.pod_file.display()
        );
    }

    let mut args = vec!["up"];
    if opts.detach {
        args.push("-d");
    }
    let status = deps.engine.compose(&generated.compose_path, &args).await?;
    if !status.success() {
        bail!("compose up failed ({status})");
    }

    verify(deps, &generated).await?;
    deps.reporter.event("pod is up");
    Ok(())
}

/// Everything before the engine starts containers: resolve, validate,
/// materialize, and write the manifest and compose file.
///
/// # Errors
///
/// See [`up`].
pub async fn generate<R: ProgressReporter>(
    deps: &UpDeps<'_, R>,
    opts: &UpOptions,
) -> Result<Generated> {
    let pod_yaml = deps
        .fs
        .read_to_string(&opts.pod_file)
        .with_context(|| format!("open pod file {}", opts.pod_file.display()))?;
    let pod = parse_pod(&pod_yaml)?;
    let pod_dir = std::path::absolute(pod_dir(&opts.pod_file)).context("resolve pod directory")?;
    let runtime_dir = pod_dir.join(RUNTIME_DIR);
    deps.fs.ensure_dir(&runtime_dir, 0o700).context("create runtime dir")?;

    let mut pipeline = Pipeline {
        deps,
        pod: &pod,
        pod_dir,
        runtime_dir,
        labels: HashMap::new(),
    };

    let mut resolved = BTreeMap::new();
    let mut drivers = BTreeMap::new();
    for (name, svc) in &pod.services {
        let Some(claw) = &svc.claw else { continue };
        let rc = pipeline.resolve_service(name, svc, claw).await?;
        let driver = deps.registry.lookup(&rc.claw_type).map_err(at(name, Phase::Lookup))?;
        driver.validate(&rc).map_err(at(name, Phase::Validate))?;
        deps.reporter.event(&format!("{name}: validated ({} driver)", rc.claw_type));
        drivers.insert(name.clone(), driver);
        resolved.insert(name.clone(), rc);
    }

    let (proxies, tokens) = pipeline.wire_cllama(&mut resolved).await?;

    let manifest_path = pipeline.runtime_dir.join(POD_MANIFEST_FILE);
    let manifest = render_pod_manifest(&build_pod_manifest(&pod, &resolved, &proxies))
        .context("encode pod manifest")?;
    deps.fs.write_with_mode(&manifest_path, &manifest, 0o644)?;
    deps.reporter.event(&format!("wrote {}", manifest_path.display()));

    let clawctl = deps.config.dashboard.enabled.then(|| ClawctlConfig {
        image: deps.config.images.clawctl.clone(),
        addr: deps.config.dashboard.effective_addr(opts.clawctl_addr.as_deref()),
        manifest_host_path: manifest_path.display().to_string(),
        docker_sock_host_path: DOCKER_SOCK.to_string(),
        pod_name: pod.name.clone(),
    });

    let mut results: BTreeMap<String, MaterializeResult> = BTreeMap::new();
    for (name, rc) in &resolved {
        let Some(driver) = drivers.get(name) else { continue };
        let mat_opts = MaterializeOpts {
            runtime_dir: pipeline.runtime_dir.join(name),
            pod_name: pod.name.clone(),
        };
        let mut result = driver
            .materialize(rc, &mat_opts)
            .map_err(at(name, Phase::Materialize))?;
        if !rc.cllama_token.is_empty() {
            result
                .environment
                .entry("CLLAMA_TOKEN".to_string())
                .or_insert_with(|| rc.cllama_token.clone());
        }
        let skill_mounts = projection_mounts(&rc.skills, &result.skill_dir, result.skill_layout);
        result.mounts.extend(skill_mounts);
        deps.reporter.event(&format!("{name}: materialized ({} driver)", rc.claw_type));
        results.insert(name.clone(), result);
    }

    let compose = emit_compose(
        &pod,
        &results,
        &EmitOptions {
            cllama_tokens: tokens,
            proxies,
            clawctl,
        },
    )
    .context("emit compose")?;
    let compose_path = pipeline.pod_dir.join(COMPOSE_GENERATED);
    deps.fs.write_with_mode(&compose_path, &compose, 0o644)?;
    deps.reporter.event(&format!("wrote {}", compose_path.display()));

    if resolved.is_empty() {
        deps.reporter
            .warn("no x-claw services found; running plain compose lifecycle");
    }

    Ok(Generated {
        compose_path,
        manifest_path,
        resolved,
        drivers,
    })
}

/// Run every driver's post-apply check against each started container.
async fn verify<R: ProgressReporter>(deps: &UpDeps<'_, R>, generated: &Generated) -> Result<()> {
    for (name, rc) in &generated.resolved {
        let Some(driver) = generated.drivers.get(name) else { continue };
        for service in expand_ordinals(name, rc.count) {
            let ids = deps
                .engine
                .compose_ps_ids(&generated.compose_path, Some(&service))
                .await
                .map_err(at(&service, Phase::PostApply))?;
            if ids.is_empty() {
                return Err(PhaseError::new(
                    &service,
                    Phase::PostApply,
                    EngineError::NoContainer(service.clone()),
                )
                .into());
            }
            for id in ids {
                let opts = PostApplyOpts {
                    container_id: id.clone(),
                };
                driver
                    .post_apply(rc, &opts, deps.engine)
                    .await
                    .map_err(at(&service, Phase::PostApply))?;
                deps.reporter.event(&format!(
                    "{service} ({}): post-apply verified",
                    short_container_id(&id)
                ));
            }
        }
    }
    Ok(())
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

struct Pipeline<'a, 'd, R: ProgressReporter> {
    deps: &'a UpDeps<'d, R>,
    pod: &'a Pod,
    pod_dir: PathBuf,
    runtime_dir: PathBuf,
    /// Decoded image labels by image ref.
    labels: HashMap<String, ClawInfo>,
}

impl<R: ProgressReporter> Pipeline<'_, '_, R> {
    async fn inspect(&mut self, image: &str) -> Result<ClawInfo> {
        if let Some(info) = self.labels.get(image) {
            return Ok(info.clone());
        }
        let labels = self
            .deps
            .engine
            .image_labels(image)
            .await
            .with_context(|| format!("inspect image {image:?}"))?;
        let info = ClawInfo::from_labels(&labels);
        self.labels.insert(image.to_string(), info.clone());
        Ok(info)
    }

    /// Merge image labels with the pod's `x-claw` block. Pod values win.
    async fn resolve_service(
        &mut self,
        name: &str,
        svc: &Service,
        claw: &ClawBlock,
    ) -> Result<ResolvedClaw, PhaseError> {
        let info = self
            .inspect(&svc.image)
            .await
            .map_err(at(name, Phase::Inspect))?;
        if !info.is_claw() {
            return Err(PhaseError::new(
                name,
                Phase::Inspect,
                anyhow!("image {:?} has no claw.type label", svc.image),
            ));
        }

        let pod_agent = claw.agent.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let image_agent = info.agent.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let (agent, agent_host_path) = match pod_agent.or(image_agent) {
            Some(file) => {
                let contract =
                    resolve_contract(&self.pod_dir, file).map_err(at(name, Phase::Resolve))?;
                let mounted = if pod_agent.is_some() {
                    Path::new(&contract.relative_path)
                        .file_name()
                        .map_or_else(|| contract.relative_path.clone(), |n| n.to_string_lossy().into_owned())
                } else {
                    contract.relative_path.clone()
                };
                (mounted, contract.host_path)
            }
            None => (String::new(), PathBuf::new()),
        };

        let mut surfaces = claw.surfaces.clone();
        for surface in surfaces.iter_mut().filter(|s| s.scheme == SCHEME_SERVICE) {
            if let Some(target) = self.pod.services.get(surface.target.trim()) {
                surface.ports = merged_ports(&target.expose, &target.ports);
            }
        }
        let emitted = self.emitted_skills(name, claw).await;

        let service_dir = self.runtime_dir.join(name);
        self.deps
            .fs
            .ensure_dir(&service_dir, 0o700)
            .map_err(at(name, Phase::Resolve))?;

        let image_skills =
            resolve_skills(&self.pod_dir, &info.skills).map_err(at(name, Phase::Resolve))?;
        let pod_skills =
            resolve_skills(&self.pod_dir, &claw.skills).map_err(at(name, Phase::Resolve))?;
        let generated = write_generated_skills(&service_dir, &surfaces, &claw.handles, &emitted)
            .map_err(at(name, Phase::Resolve))?;
        let skills = merge_skills(generated, merge_skills(image_skills, pod_skills));

        let peer_handles: BTreeMap<String, BTreeMap<String, HandleInfo>> = self
            .pod
            .services
            .iter()
            .filter(|(peer, _)| peer.as_str() != name)
            .filter_map(|(peer, s)| {
                let c = s.claw.as_ref().filter(|c| !c.handles.is_empty())?;
                Some((peer.clone(), c.handles.clone()))
            })
            .collect();

        Ok(ResolvedClaw {
            service_name: name.to_string(),
            image_ref: svc.image.clone(),
            claw_type: info.claw_type.clone(),
            agent,
            agent_host_path,
            models: info.models.clone(),
            configures: info.configures.clone(),
            privileges: info.privileges.clone(),
            cllama: if claw.cllama.is_empty() {
                info.cllama.clone()
            } else {
                claw.cllama.clone()
            },
            cllama_token: String::new(),
            persona: claw.persona.clone().or_else(|| info.persona.clone()),
            handles: claw.handles.clone(),
            peer_handles,
            surfaces,
            skills,
            invocations: self.invocations(name, &info, claw),
            count: claw.count,
            environment: svc.environment.clone(),
        })
    }

    /// Skills published (`claw.skill.emit`) by the images of this
    /// service's service-surface targets, keyed by target.
    ///
    /// Extraction failures fall back to the generated skill.
    async fn emitted_skills(&mut self, name: &str, claw: &ClawBlock) -> BTreeMap<String, Vec<u8>> {
        let mut emitted = BTreeMap::new();
        let targets: BTreeSet<&str> = claw
            .surfaces
            .iter()
            .filter(|s| s.scheme == SCHEME_SERVICE)
            .map(|s| s.target.trim())
            .collect();
        for target in targets {
            let Some(image) = self.pod.services.get(target).map(|s| s.image.clone()) else {
                continue;
            };
            let emit_path = match self.inspect(&image).await {
                Ok(info) => info.skill_emit.filter(|p| !p.trim().is_empty()),
                Err(e) => {
                    tracing::debug!(service = name, target, error = %format!("{e:#}"), "target image not inspectable; using generated skill");
                    None
                }
            };
            let Some(emit_path) = emit_path else { continue };
            match self.deps.engine.copy_from_image(&image, emit_path.trim()).await {
                Ok(content) => {
                    emitted.insert(target.to_string(), content);
                }
                Err(e) => {
                    tracing::warn!(service = name, target, path = %emit_path, error = %format!("{e:#}"), "emitted skill extraction failed");
                    self.deps.reporter.warn(&format!(
                        "service {name:?}: could not extract emitted skill {emit_path:?} from {image:?}: {e:#} (using fallback)"
                    ));
                }
            }
        }
        emitted
    }

    /// Image INVOKE entries followed by the pod's, with `to` channel names
    /// resolved to IDs through the service's discord handle.
    fn invocations(&self, name: &str, info: &ClawInfo, claw: &ClawBlock) -> Vec<Invocation> {
        let mut out: Vec<Invocation> = info
            .invocations
            .iter()
            .map(|c| Invocation {
                schedule: c.schedule.clone(),
                message: c.command.clone(),
                ..Invocation::default()
            })
            .collect();
        for inv in &claw.invoke {
            let mut inv = inv.clone();
            if !inv.to.is_empty() {
                let channel = std::mem::take(&mut inv.to);
                match resolve_channel_id(&claw.handles, &channel) {
                    Some(id) => inv.to = id,
                    None => self.deps.reporter.warn(&format!(
                        "service {name:?}: invoke channel {channel:?} not found in handles; delivery will use last channel"
                    )),
                }
            }
            out.push(inv);
        }
        out
    }

    /// Mint proxy tokens, enforce credential starvation, and write the
    /// proxy's context and auth directories.
    async fn wire_cllama(
        &mut self,
        resolved: &mut BTreeMap<String, ResolvedClaw>,
    ) -> Result<(Vec<CllamaProxyConfig>, BTreeMap<String, String>)> {
        let agents: Vec<String> = resolved
            .iter()
            .filter(|(_, rc)| !rc.cllama.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        if agents.is_empty() {
            return Ok((Vec::new(), BTreeMap::new()));
        }

        let proxy_types: BTreeSet<String> = resolved
            .values()
            .flat_map(|rc| rc.cllama.iter())
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if proxy_types.len() > 1 {
            bail!(
                "multi-proxy chaining is not supported: found proxy types {}; use one proxy type per pod",
                proxy_types.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        let mut store = TokenStore::load(&self.runtime_dir);
        let mut tokens = BTreeMap::new();
        let mut ids_in_use = Vec::new();
        for name in &agents {
            let Some(rc) = resolved.get_mut(name) else { continue };
            let ids = expand_ordinals(name, rc.count);
            for id in &ids {
                tokens.insert(id.clone(), store.get_or_mint(id));
            }
            if let Some(first) = ids.first().and_then(|id| tokens.get(id)) {
                rc.cllama_token.clone_from(first);
            }
            ids_in_use.extend(ids);
        }
        store.retain(&ids_in_use);
        store.save()?;

        let mut image_env: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        for name in &agents {
            let Some(svc) = self.pod.services.get(name) else { continue };
            if let Some(key) = svc.environment.keys().find(|k| is_provider_key(k)) {
                return Err(PhaseError::new(
                    name,
                    Phase::Validate,
                    anyhow!(
                        "provider key {key:?} found in pod env; cllama requires credential starvation (move provider keys to x-claw.cllama-env)"
                    ),
                )
                .into());
            }
            if !image_env.contains_key(&svc.image) {
                let env = self
                    .deps
                    .engine
                    .image_env(&svc.image)
                    .await
                    .map_err(at(name, Phase::Inspect))?;
                image_env.insert(svc.image.clone(), env);
            }
            if let Some(key) = image_env
                .get(&svc.image)
                .and_then(|env| env.keys().find(|k| is_provider_key(k)))
            {
                return Err(PhaseError::new(
                    name,
                    Phase::Validate,
                    anyhow!("provider key {key:?} found in image-baked env; cllama requires credential starvation"),
                )
                .into());
            }
        }
        for name in &agents {
            if let Some(rc) = resolved.get_mut(name) {
                rc.environment.retain(|k, _| !is_provider_key(k));
            }
        }

        let mut proxy_env = BTreeMap::from([("CLAW_POD".to_string(), self.pod.name.clone())]);
        for name in &agents {
            let Some(claw) = self.pod.services.get(name).and_then(|s| s.claw.as_ref()) else {
                continue;
            };
            for (k, v) in &claw.cllama_env {
                proxy_env.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        let mut contexts = Vec::new();
        for name in &agents {
            let Some(rc) = resolved.get(name) else { continue };
            if rc.agent_host_path.as_os_str().is_empty() {
                return Err(PhaseError::new(
                    name,
                    Phase::Resolve,
                    anyhow!("no agent contract available for cllama context generation"),
                )
                .into());
            }
            let agents_md = self
                .deps
                .fs
                .read_to_string(&rc.agent_host_path)
                .context("read contract for cllama context")
                .map_err(at(name, Phase::Resolve))?;
            for (ordinal, id) in (0u32..).zip(expand_ordinals(name, rc.count)) {
                let mut view = rc.clone();
                view.service_name.clone_from(&id);
                contexts.push(AgentContext {
                    clawdapus_md: clawdapus_md(&view, &self.pod.name),
                    agents_md: agents_md.clone(),
                    metadata: AgentMetadata {
                        service: name.clone(),
                        ordinal: (rc.count > 1).then_some(ordinal),
                        pod: self.pod.name.clone(),
                        claw_type: rc.claw_type.clone(),
                        token: tokens.get(&id).cloned().unwrap_or_default(),
                    },
                    agent_id: id,
                });
            }
        }
        write_context_dirs(&self.runtime_dir, &contexts).context("generate cllama context dir")?;
        let auth = auth_dir(&self.runtime_dir);
        self.deps.fs.ensure_dir(&auth, 0o700).context("create cllama auth dir")?;

        let proxies: Vec<CllamaProxyConfig> = proxy_types
            .iter()
            .map(|proxy_type| CllamaProxyConfig {
                proxy_type: proxy_type.clone(),
                image: self.deps.config.images.cllama_image(proxy_type),
                context_host_dir: context_root(&self.runtime_dir).display().to_string(),
                auth_host_dir: auth.display().to_string(),
                environment: proxy_env.clone(),
                pod_name: self.pod.name.clone(),
            })
            .collect();
        self.deps.reporter.event(&format!(
            "cllama proxies enabled: {} (agents: {})",
            proxy_types.iter().cloned().collect::<Vec<_>>().join(", "),
            agents.join(", ")
        ));
        Ok((proxies, tokens))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Keys that carry an LLM provider credential.
#[must_use]
pub fn is_provider_key(key: &str) -> bool {
    matches!(key, "OPENAI_API_KEY" | "ANTHROPIC_API_KEY" | "OPENROUTER_API_KEY")
        || key.starts_with("PROVIDER_API_KEY")
}

/// `expose` then `ports`, first occurrence wins.
#[must_use]
pub fn merged_ports(expose: &[String], ports: &[String]) -> Vec<String> {
    let mut seen: BTreeSet<&String> = BTreeSet::new();
    expose
        .iter()
        .chain(ports)
        .filter(|p| seen.insert(*p))
        .cloned()
        .collect()
}

/// ID of the first channel called `channel` in the discord handle's guilds.
#[must_use]
pub fn resolve_channel_id(handles: &BTreeMap<String, HandleInfo>, channel: &str) -> Option<String> {
    handles
        .get("discord")?
        .guilds
        .iter()
        .flat_map(|g| g.channels.iter())
        .find(|c| c.name == channel)
        .map(|c| c.id.clone())
}
