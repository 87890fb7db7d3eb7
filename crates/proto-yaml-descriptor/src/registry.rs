//! Type resolution for polymorphic `Any` envelopes.
//!
//! The decoder resolves a type-identifier URL to a [`MessageDescriptor`]
//! through this trait. The default is the process-wide [`GlobalRegistry`];
//! callers can inject their own resolver to sandbox or extend lookup.

use std::sync::{OnceLock, RwLock};

use crate::pool::{DescriptorPool, MessageDescriptor};

/// Resolves a type-identifier URL (e.g.
/// `type.googleapis.com/test.Message`) to a message descriptor.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, type_url: &str) -> Option<MessageDescriptor>;
}

impl TypeResolver for DescriptorPool {
    fn resolve(&self, type_url: &str) -> Option<MessageDescriptor> {
        self.message_by_name(type_name(type_url))
    }
}

/// The full type name is the final `/`-separated segment of the URL.
fn type_name(type_url: &str) -> &str {
    type_url.rsplit('/').next().unwrap_or(type_url)
}

static POOLS: OnceLock<RwLock<Vec<DescriptorPool>>> = OnceLock::new();

fn pools() -> &'static RwLock<Vec<DescriptorPool>> {
    POOLS.get_or_init(|| RwLock::new(Vec::new()))
}

/// Adds a pool to the process-wide registry consulted by
/// [`GlobalRegistry`].
pub fn register_pool(pool: &DescriptorPool) {
    if let Ok(mut pools) = pools().write() {
        pools.push(pool.clone());
    }
}

/// Resolver over every pool passed to [`register_pool`]. Later
/// registrations win on name clashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalRegistry;

impl TypeResolver for GlobalRegistry {
    fn resolve(&self, type_url: &str) -> Option<MessageDescriptor> {
        let pools = pools().read().ok()?;
        pools.iter().rev().find_map(|pool| pool.resolve(type_url))
    }
}
