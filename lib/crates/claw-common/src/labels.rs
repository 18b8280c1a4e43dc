/// Image labels written by `claw build` and read back by `claw inspect`/`claw up`
pub mod image {
    /// Namespace shared by every claw label
    pub const PREFIX: &str = "claw.";

    /// Runtime type used for driver lookup
    pub const TYPE: &str = "claw.type";

    /// Contract file name (basename, relative to the pod directory)
    pub const AGENT_FILE: &str = "claw.agent.file";

    /// Default LLM proxy chain
    pub const CLLAMA_DEFAULT: &str = "claw.cllama.default";

    /// Default persona
    pub const PERSONA_DEFAULT: &str = "claw.persona.default";

    /// Format: claw.model.{slot}
    pub const MODEL: &str = "claw.model.";

    /// Format: claw.surface.{index}
    /// Value: raw SURFACE declaration, access mode included
    pub const SURFACE: &str = "claw.surface.";

    /// Format: claw.handle.{platform}
    /// Value: "true"
    pub const HANDLE: &str = "claw.handle.";

    /// Format: claw.skill.{index}
    pub const SKILL: &str = "claw.skill.";

    /// Path inside a service image to a skill file it publishes for its consumers
    pub const SKILL_EMIT: &str = "claw.skill.emit";

    /// Format: claw.privilege.{mode}
    pub const PRIVILEGE: &str = "claw.privilege.";

    /// Format: claw.track.{index}
    pub const TRACK: &str = "claw.track.";

    /// Format: claw.configure.{index}
    pub const CONFIGURE: &str = "claw.configure.";

    /// Format: claw.invoke.{index}
    /// Value: "{schedule}\t{command}"
    pub const INVOKE: &str = "claw.invoke.";
}

/// Labels stamped on generated compose services
pub mod compose {
    pub const POD: &str = "claw.pod";
    pub const SERVICE: &str = "claw.service";
    pub const ORDINAL: &str = "claw.ordinal";
    pub const ROLE: &str = "claw.role";
    pub const PROXY_TYPE: &str = "claw.proxy.type";

    /// Value of `claw.role` for cllama proxies
    pub const ROLE_PROXY: &str = "proxy";

    /// Value of `claw.role` for the clawctl dashboard
    pub const ROLE_DASHBOARD: &str = "dashboard";
}

/// Build an indexed label key such as `claw.surface.3`.
#[must_use]
pub fn indexed(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}")
}

/// Parse the numeric suffix of an indexed label key.
///
/// Returns `None` when the key does not carry `prefix` or the suffix is not
/// a plain non-negative integer.
#[must_use]
pub fn index_of(key: &str, prefix: &str) -> Option<usize> {
    key.strip_prefix(prefix)?.parse().ok()
}
