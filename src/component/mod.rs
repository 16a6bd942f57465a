//! Component blocks
//!
//! This module provides:
//! - The block and inline component grammar
//! - Ordered property alias resolution
//! - The component registry contract and a schema-backed registry
//! - Resolution of a raw body into validated props

pub mod aliases;
pub mod grammar;
pub mod registry;
pub mod resolve;

pub use aliases::AliasTable;
pub use grammar::{
    find_code_blocks, find_inline_components, format_block, is_valid_component_name, parse_info_string,
    parse_inline, InlineSpan, COMPONENT_PREFIX,
};
pub use registry::{
    ComponentRegistry, ComponentSchema, FieldError, PropKind, PropSchema, SchemaRegistry,
    Skeleton, ValidationResult,
};
pub use resolve::resolve_component;
