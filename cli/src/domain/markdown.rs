//! Generated markdown: `CLAWDAPUS.md` and the surface and handle skills.
//!
//! One generator per document, shared by every driver.

use std::fmt::Write as _;

use claw_common::{HandleInfo, platform_token_var};

use crate::domain::pod::CLAW_NETWORK;
use crate::domain::resolved::ResolvedClaw;
use crate::domain::surface::{
    ACCESS_READ_WRITE, SCHEME_CHANNEL, SCHEME_EGRESS, SCHEME_HOST, SCHEME_SERVICE, SCHEME_VOLUME,
    Surface,
};

/// Relative directory skills are referenced under in `CLAWDAPUS.md`.
const SKILLS_REF: &str = "skills";

fn title(platform: &str) -> String {
    let mut chars = platform.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Skill file name for a `service://` surface, `None` for an empty target.
#[must_use]
pub fn service_skill_name(target: &str) -> Option<String> {
    let slug = target.replace('/', "-");
    let slug = slug.trim();
    (!slug.is_empty()).then(|| format!("surface-{slug}.md"))
}

/// Skill file name for a `channel://` surface.
#[must_use]
pub fn channel_skill_name(platform: &str) -> String {
    format!("surface-{}.md", platform.trim())
}

/// Skill file name for a platform handle.
#[must_use]
pub fn handle_skill_name(platform: &str) -> String {
    format!("handle-{platform}.md")
}

/// Pod context for an agent: identity, surfaces, proxy, handles, peers and
/// the skill index.
#[must_use]
pub fn clawdapus_md(rc: &ResolvedClaw, pod_name: &str) -> String {
    let mut b = String::new();
    b.push_str("# CLAWDAPUS.md\n\n");
    b.push_str("Generated by Clawdapus on every `claw up`. It describes the infrastructure you run in.\n\n");

    b.push_str("## Identity\n\n");
    let _ = writeln!(b, "- **Pod:** {pod_name}");
    let _ = writeln!(b, "- **Service:** {}", rc.service_name);
    let _ = writeln!(b, "- **Type:** {}", rc.claw_type);
    if !rc.agent.is_empty() {
        let _ = writeln!(b, "- **Contract:** `/claw/{}`", rc.agent);
    }
    b.push('\n');

    b.push_str("## Surfaces\n\n");
    if rc.surfaces.is_empty() {
        b.push_str("No surfaces declared.\n");
    }
    for surface in &rc.surfaces {
        b.push_str(&surface_line(surface));
        b.push('\n');
    }
    b.push('\n');

    if let Some(proxy) = rc.cllama_proxy() {
        b.push_str("## LLM Proxy\n\n");
        let _ = writeln!(
            b,
            "Model calls are routed through `cllama-{proxy}`. The base URL is `http://cllama-{proxy}:8080/v1`."
        );
        b.push_str("Authenticate with the bearer token in `CLLAMA_TOKEN`. Provider keys are held by the proxy, not by you.\n\n");
    }

    if !rc.handles.is_empty() {
        b.push_str("## Handles\n\n");
        for (platform, info) in &rc.handles {
            let _ = writeln!(b, "### {platform}\n");
            let _ = writeln!(b, "- **ID:** {}", info.id);
            if !info.username.is_empty() {
                let _ = writeln!(b, "- **Username:** {}", info.username);
            }
            for guild in &info.guilds {
                if guild.name.is_empty() {
                    let _ = writeln!(b, "- **Guild:** {}", guild.id);
                } else {
                    let _ = writeln!(b, "- **Guild:** {} ({})", guild.id, guild.name);
                }
            }
            let _ = writeln!(b, "- **Skill:** `{SKILLS_REF}/{}`\n", handle_skill_name(platform));
        }
    }

    if !rc.peer_handles.is_empty() {
        b.push_str("## Peers\n\n");
        b.push_str("Other agents in this pod and how to reach them:\n\n");
        for (service, handles) in &rc.peer_handles {
            for (platform, info) in handles {
                let mut line = format!("- **{service}** on {platform}: ID `{}`", info.id);
                if !info.username.is_empty() {
                    let _ = write!(line, ", username `{}`", info.username);
                }
                b.push_str(&line);
                b.push('\n');
            }
        }
        b.push('\n');
    }

    if !rc.skills.is_empty() {
        b.push_str("## Skills\n\n");
        for skill in &rc.skills {
            let _ = writeln!(b, "- `{SKILLS_REF}/{}`", skill.name);
        }
        b.push('\n');
    }

    b
}

fn surface_line(surface: &Surface) -> String {
    let target = surface.target.as_str();
    match surface.scheme.as_str() {
        SCHEME_VOLUME => format!(
            "- **volume** `{target}` ({}): mounted at `/mnt/{target}`",
            access_label(surface)
        ),
        SCHEME_HOST => format!(
            "- **host** `{target}` ({}): mounted at `{target}`",
            access_label(surface)
        ),
        SCHEME_CHANNEL => {
            let mut line = format!("- **channel** `{target}`");
            if let Some(var) = platform_token_var(target) {
                let _ = write!(line, ": token in `{var}`");
            }
            let _ = write!(line, ". Skill: `{SKILLS_REF}/{}`", channel_skill_name(target));
            line
        }
        SCHEME_SERVICE => {
            let mut line = format!("- **service** `{target}`: hostname `{target}`");
            if !surface.ports.is_empty() {
                let _ = write!(line, ", ports {}", surface.ports.join(", "));
            }
            if let Some(name) = service_skill_name(target) {
                let _ = write!(line, ". Skill: `{SKILLS_REF}/{name}`");
            }
            line
        }
        SCHEME_EGRESS => format!("- **egress** `{target}`: outbound access permitted"),
        other => format!("- **{other}** `{target}`"),
    }
}

fn access_label(surface: &Surface) -> &str {
    if surface.access_mode.is_empty() {
        ACCESS_READ_WRITE
    } else {
        &surface.access_mode
    }
}

/// Companion skill for a `channel://` surface.
#[must_use]
pub fn channel_skill(surface: &Surface) -> String {
    let platform = title(&surface.target);
    let mut b = String::new();
    let _ = writeln!(b, "# {platform} Channel Surface\n");
    let _ = writeln!(b, "**Platform:** {platform}");
    if let Some(var) = platform_token_var(&surface.target) {
        let _ = writeln!(b, "**Token env var:** `{var}`");
    }
    b.push('\n');

    let mut restricted = false;
    if let Some(cc) = &surface.channel_config {
        if !cc.guilds.is_empty() {
            restricted = true;
            b.push_str("## Guild Access\n\n");
            for (guild_id, guild) in &cc.guilds {
                let mut line = format!("- Guild `{guild_id}`");
                if !guild.policy.is_empty() {
                    let _ = write!(line, ": {} policy", guild.policy);
                }
                if guild.require_mention {
                    line.push_str(", mentions required");
                }
                if !guild.users.is_empty() {
                    let _ = write!(line, ", users {}", guild.users.join(", "));
                }
                b.push_str(&line);
                b.push('\n');
            }
            b.push('\n');
        }

        let dm = &cc.dm;
        if dm.enabled || !dm.policy.is_empty() || !dm.allow_from.is_empty() {
            restricted |= !dm.policy.is_empty();
            b.push_str("## Direct Messages\n\n");
            let mut line = String::from("- DMs");
            if dm.enabled {
                line.push_str(" enabled");
            }
            if !dm.policy.is_empty() {
                let _ = write!(line, ": policy={}", dm.policy);
            }
            if !dm.allow_from.is_empty() {
                let _ = write!(line, ", allowed from {}", dm.allow_from.join(", "));
            }
            b.push_str(&line);
            b.push_str("\n\n");
        }
    }

    b.push_str("## Usage\n\n");
    let _ = writeln!(
        b,
        "Use the {platform} channel to send messages and receive commands from users."
    );
    b.push_str("Messages arrive as agent invocations via your runtime's channel integration.\n");
    if restricted {
        b.push_str("Only reply to users matching the configured policy.\n");
    }
    b
}

/// Identity and membership skill for one platform handle.
#[must_use]
pub fn handle_skill(platform: &str, info: &HandleInfo) -> String {
    let name = title(platform);
    let mut b = String::new();
    let _ = writeln!(b, "# {name} Handle\n");
    let _ = writeln!(
        b,
        "Your identity on {name}. Use it when sending messages, mentioning yourself, or routing responses.\n"
    );

    b.push_str("## Identity\n");
    let _ = writeln!(b, "- **ID:** {}", info.id);
    if !info.username.is_empty() {
        let _ = writeln!(b, "- **Username:** {}", info.username);
    }
    b.push('\n');

    if !info.guilds.is_empty() {
        b.push_str("## Memberships\n\n");
        for guild in &info.guilds {
            if guild.name.is_empty() {
                let _ = writeln!(b, "### {}", guild.id);
            } else {
                let _ = writeln!(b, "### {} ({})", guild.id, guild.name);
            }
            if !guild.channels.is_empty() {
                b.push_str("\nChannels:\n");
                for ch in &guild.channels {
                    if ch.name.is_empty() {
                        let _ = writeln!(b, "- `{}`", ch.id);
                    } else {
                        let _ = writeln!(b, "- `{}` (#{})", ch.id, ch.name);
                    }
                }
            }
            b.push('\n');
        }
    }

    b.push_str("## Usage\n");
    let _ = write!(b, "- When referring to yourself on {name}, use your ID `{}`", info.id);
    if !info.username.is_empty() {
        let _ = write!(b, " or username `{}`", info.username);
    }
    b.push_str(".\n");
    if !info.guilds.is_empty() {
        b.push_str("- Your guild memberships and channel access are listed above.\n");
        b.push_str("- Other agents in this pod know your ID via the `CLAW_HANDLE_*` environment variables.\n");
    }
    b
}

/// Fallback skill for a `service://` surface whose image publishes none.
#[must_use]
pub fn service_skill(target: &str, ports: &[String]) -> String {
    let mut b = String::new();
    let _ = writeln!(b, "# {target} (service surface)\n");
    b.push_str("## Connection\n");
    let _ = writeln!(b, "- **Hostname:** {target}");
    let _ = writeln!(b, "- **Network:** {CLAW_NETWORK} (pod-internal)");
    if !ports.is_empty() {
        let _ = writeln!(b, "- **Ports:** {}", ports.join(", "));
    }
    b.push_str("\n## Usage\n");
    b.push_str("This service is available to you within the pod network.\n");
    let _ = writeln!(b, "Use the hostname `{target}` to connect.");
    b.push_str("Credentials, if required, are provided via environment variables.\n");
    b
}
