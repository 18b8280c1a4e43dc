pub mod handles;
pub mod labels;
pub mod manifest;

pub use handles::{
    ChannelConfig, ChannelDmConfig, ChannelGuildConfig, ChannelInfo, GuildInfo, HandleInfo,
    Invocation, platform_token_var,
};
pub use manifest::{PodManifest, ProxyManifest, ServiceManifest, SurfaceManifest};
