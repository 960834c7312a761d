//! The ACL gate: set-intersection check between a manifest's acls and a user's groups.

use coreason_types::{SourceManifest, UserContext};

/// `true` iff `ctx.claims.is_service_account` is true, or `manifest.acls` and `ctx.groups`
/// intersect. Comparison is exact, case-sensitive. An empty `manifest.acls` denies every
/// non-service-account caller — it does not mean "everyone".
pub fn check_access(manifest: &SourceManifest, ctx: &UserContext) -> bool {
    if ctx.is_service_account() {
        return true;
    }
    manifest.acls.iter().any(|group| ctx.groups.contains(group))
}
