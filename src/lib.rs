#![doc = include_str!("../README.md")]

/// Version lookup from `AssemblyInfo` files.
pub mod assembly_info;
/// Clock and clock-derived label values.
pub mod clock;
/// Command implementations and argument types.
///
/// # Example: labelling from a CI script
///
/// ```no_run
/// use clap::Parser;
/// use revision_labeller::commands::{
///     GenerateArgs,
///     generate,
/// };
///
/// let args = GenerateArgs::parse_from([
///     "generate",
///     "--url",
///     "https://svn.example.com/repo/trunk",
///     "--previous-label",
///     "1.0.4.1200",
///     "--status",
///     "success",
/// ]);
/// generate(args)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub mod commands;
/// Labeller configuration file.
pub mod config;
/// Label generation engine.
pub mod labeller;
/// Label patterns.
pub mod pattern;
/// Repository revision lookup.
pub mod svn;
/// Four-part version numbers.
pub mod version;
