//! Test utilities for the scenarist crates.
//!
//! Provides temporary scenario workspaces with ready-made catalogs, and a
//! scoped environment guard for tests that read process-wide variables.

pub mod env;
pub mod workspace;

pub use env::ScopedEnv;
pub use workspace::ScenarioWorkspace;

/// Three-step chain `Sandbox <- Roles <- Users`.
pub const CHAIN_CATALOG: &str = r"
scenarios:
  - name: Sandbox
    tables:
      tenants:
        - { id: 1, name: sandbox }
  - name: Roles
    preload: Sandbox
    tables:
      roles:
        - { id: 1, name: admin }
        - { id: 2, name: viewer }
  - name: Users
    preload: Roles
    tables:
      users:
        - { id: 1, name: ada, role: 1 }
        - { id: 2, name: grace, role: 2 }
";

/// Catalog whose `A` and `B` scenarios preload each other.
pub const CYCLE_CATALOG: &str = r"
scenarios:
  - name: A
    preload: B
  - name: B
    preload: A
";

/// Catalog whose `Broken` scenario inserts a duplicate primary key.
pub const FAILING_CATALOG: &str = r"
scenarios:
  - name: Sandbox
    tables:
      tenants:
        - { id: 1, name: sandbox }
  - name: Broken
    preload: Sandbox
    tables:
      users:
        - { id: 1, name: ada }
        - { id: 1, name: duplicate }
";
