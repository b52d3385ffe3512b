//! Registries rebuilt from config-cache state: endpoints, write schemas,
//! and dynamic enums (spec.md §4.2, §4.6, §1 supplement).

pub mod endpoint_registry;
pub mod enum_registry;
pub mod schema_augmentor;
pub mod schema_registry;

pub use endpoint_registry::{EndpointRegistry, EndpointSnapshot};
pub use enum_registry::EnumRegistry;
pub use schema_registry::{load_schema_defs, SchemaRegistry, SchemaRegistryError};
