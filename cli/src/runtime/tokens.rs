//! Proxy bearer tokens.
//!
//! A token is `<agent-id>:<48 hex>`. Tokens are persisted in
//! `.claw-runtime/cllama-tokens.json` and reused on the next `up`, so a
//! rerun does not rotate credentials or change generated files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::RngCore;

/// File name under the runtime directory.
pub const TOKENS_FILE: &str = "cllama-tokens.json";

const SECRET_BYTES: usize = 24;

/// Mint a fresh token for `agent_id`.
#[must_use]
pub fn generate_token(agent_id: &str) -> String {
    let mut secret = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut secret);
    format!("{agent_id}:{}", hex_encode(&secret))
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}

/// True when `token` is well formed for `agent_id`.
fn is_valid_for(agent_id: &str, token: &str) -> bool {
    token.strip_prefix(agent_id).and_then(|r| r.strip_prefix(':')).is_some_and(|secret| {
        secret.len() == SECRET_BYTES * 2 && secret.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

/// Tokens keyed by agent id, backed by a JSON file.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    tokens: BTreeMap<String, String>,
}

impl TokenStore {
    /// Load the store from `runtime_dir`. A missing or unreadable file
    /// starts an empty store.
    #[must_use]
    pub fn load(runtime_dir: &Path) -> Self {
        let path = runtime_dir.join(TOKENS_FILE);
        let tokens = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed token store");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, tokens }
    }

    /// Existing token for `agent_id`, or a newly minted one.
    pub fn get_or_mint(&mut self, agent_id: &str) -> String {
        if let Some(existing) = self.tokens.get(agent_id)
            && is_valid_for(agent_id, existing)
        {
            return existing.clone();
        }
        let token = generate_token(agent_id);
        self.tokens.insert(agent_id.to_string(), token.clone());
        token
    }

    /// Drop tokens for agents no longer in the pod.
    pub fn retain(&mut self, agent_ids: &[String]) {
        self.tokens.retain(|id, _| agent_ids.contains(id));
    }

    #[must_use]
    pub fn tokens(&self) -> &BTreeMap<String, String> {
        &self.tokens
    }

    /// Persist the store (mode 0600).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let mut json = serde_json::to_string_pretty(&self.tokens).context("encoding token store")?;
        json.push('\n');
        super::files::write_file(&self.path, json, 0o600)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}
