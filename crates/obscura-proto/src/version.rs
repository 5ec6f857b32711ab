//! Protocol version type and negotiation.

/// A 16-bit protocol version identifier.
pub type Version = u16;

/// The first (and, currently, only) protocol version.
pub const V1_0: Version = 1;

/// Ordered set of versions this build implements.
pub const SUPPORTED_VERSIONS: &[Version] = &[V1_0];

/// Pick the highest version that appears in both `client_supported` and
/// `server_supported`. Order of either input does not affect the result;
/// returns `None` if the intersection is empty.
pub fn negotiate(client_supported: &[Version], server_supported: &[Version]) -> Option<Version> {
    client_supported
        .iter()
        .copied()
        .filter(|v| server_supported.contains(v))
        .max()
}
