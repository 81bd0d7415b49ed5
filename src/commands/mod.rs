//! Command implementations.

mod assembly_info;
mod common;
mod generate;
mod revision;

pub use assembly_info::{
    AssemblyInfoArgs,
    assembly_info,
};
pub use common::{
    SvnArgs,
    emit_label,
    load_config,
};
pub use generate::{
    GenerateArgs,
    generate,
};
pub use revision::{
    RevisionArgs,
    revision,
};
