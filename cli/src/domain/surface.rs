//! Surface URIs: `scheme://target[ access-mode]`.

use claw_common::ChannelConfig;

use crate::domain::error::SurfaceError;

pub const SCHEME_CHANNEL: &str = "channel";
pub const SCHEME_SERVICE: &str = "service";
pub const SCHEME_VOLUME: &str = "volume";
pub const SCHEME_HOST: &str = "host";
pub const SCHEME_EGRESS: &str = "egress";

pub const ACCESS_READ_ONLY: &str = "read-only";
pub const ACCESS_READ_WRITE: &str = "read-write";

/// A parsed surface, optionally enriched with the target service's ports
/// (service surfaces) or routing policy (channel surfaces).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    pub scheme: String,
    pub target: String,
    pub access_mode: String,
    pub ports: Vec<String>,
    pub channel_config: Option<ChannelConfig>,
}

impl Surface {
    /// `scheme://target`, without access mode.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}://{}", self.scheme, self.target)
    }

    /// Whether the scheme accepts an access mode.
    #[must_use]
    pub fn takes_access_mode(&self) -> bool {
        self.scheme == SCHEME_VOLUME || self.scheme == SCHEME_HOST
    }
}

/// Parse a raw declaration such as `volume://research-cache read-only`.
///
/// Access modes are checked only for schemes that define them; unknown
/// schemes pass through and are rejected at compose emission.
///
/// # Errors
///
/// Returns `SurfaceError` for an empty declaration, a URI without scheme or
/// target, or an access mode that the scheme does not support.
pub fn parse_surface(raw: &str) -> Result<Surface, SurfaceError> {
    let mut parts = raw.split_whitespace();
    let uri = parts.next().ok_or(SurfaceError::Empty)?;
    let access_mode = parts.collect::<Vec<_>>().join(" ");

    let (scheme, target) = split_uri(uri)?;
    let surface = Surface {
        scheme,
        target,
        access_mode,
        ..Surface::default()
    };

    if !surface.access_mode.is_empty() {
        match surface.scheme.as_str() {
            SCHEME_VOLUME | SCHEME_HOST => {
                if surface.access_mode != ACCESS_READ_ONLY
                    && surface.access_mode != ACCESS_READ_WRITE
                {
                    return Err(SurfaceError::InvalidAccessMode {
                        mode: surface.access_mode,
                    });
                }
            }
            SCHEME_CHANNEL | SCHEME_SERVICE | SCHEME_EGRESS => {
                return Err(SurfaceError::AccessModeNotSupported {
                    scheme: surface.scheme,
                });
            }
            _ => {}
        }
    }
    Ok(surface)
}

/// Split a URI into lowercase scheme and target.
///
/// `volume://cache` → (`volume`, `cache`); `host:///srv/data` and
/// `host:/srv/data` → (`host`, `/srv/data`).
fn split_uri(uri: &str) -> Result<(String, String), SurfaceError> {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return Err(SurfaceError::MissingScheme(uri.to_string()));
    };
    let valid_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return Err(SurfaceError::MissingScheme(uri.to_string()));
    }

    let target = rest.strip_prefix("//").unwrap_or(rest);
    let target = target.split(['?', '#']).next().unwrap_or_default();
    if target.is_empty() {
        return Err(SurfaceError::MissingTarget(uri.to_string()));
    }
    Ok((scheme.to_ascii_lowercase(), target.to_string()))
}
