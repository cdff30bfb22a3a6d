//! Embedded engine payload registry.
//!
//! The engine binaries are baked into the shim executable so a single file
//! can be shipped to CI workers. The payloads committed under `resources/`
//! are small development stubs that honor the `-c <config>` contract; the
//! release packaging step substitutes the real engine binaries before
//! building.

use simbridge_core::unpack::ToolRegistry;

/// Name of the engine runner payload.
pub const ENGINE: &str = "parsim";

/// Name of the per-simulator worker payload the runner re-executes.
pub const ENGINE_WORKER: &str = "parsim-worker";

static ENGINE_BYTES: &[u8] = include_bytes!("../resources/parsim");
static WORKER_BYTES: &[u8] = include_bytes!("../resources/parsim-worker");

/// Registry of all payloads embedded in this build.
pub fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ENGINE, ENGINE_BYTES);
    registry.register(ENGINE_WORKER, WORKER_BYTES);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_payloads_are_embedded() {
        let registry = registry();
        assert!(registry.bytes(ENGINE).is_some());
        assert!(registry.bytes(ENGINE_WORKER).is_some());
        assert!(registry.bytes("no-such-payload").is_none());
    }
}
