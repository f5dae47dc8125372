//! Cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a site's sitemap tree.
///
/// `homepage` is expected to already be stripped to `scheme://host[:port]/`,
/// so every URL on the same site shares one key.
pub fn compute_cache_key(homepage: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"sitemap-tree\n");
    hasher.update(homepage.as_bytes());
    hex::encode(hasher.finalize())
}
