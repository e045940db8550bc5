use crate::config::Config;
use crate::error::GlpsError;
use crate::parser::Parser;
use std::path::Path;

/// Parses GLPS source text into its configuration.
///
/// This is the primary entry point for in-memory input. Nested
/// `parse("path")` includes resolve relative to the current working
/// directory; use [`parse_with_base`] or [`parse_file`] when includes
/// should resolve elsewhere.
///
/// # Errors
///
/// Returns a [`GlpsError`] if lexing, parsing, evaluation, or beamline
/// expansion fails. No partial configuration is returned.
pub fn parse(source: &str) -> Result<Config, GlpsError> {
    parse_bytes(source.as_bytes())
}

/// Parses raw GLPS input bytes.
///
/// The input does not have to be valid UTF-8: quoted text admits any byte
/// 1–255, and bytes that are invalid *outside* quotes are reported as
/// lexical errors rather than rejected up front.
pub fn parse_bytes(input: &[u8]) -> Result<Config, GlpsError> {
    let mut parser = Parser::new(input, "<input>")?;
    Ok(parser.parse_config()?)
}

/// Parses raw GLPS input bytes, resolving nested `parse("path")` includes
/// against the given base directory.
pub fn parse_with_base(input: &[u8], base: &Path) -> Result<Config, GlpsError> {
    let mut parser = Parser::with_includes(input, "<input>", Some(base.to_path_buf()), Vec::new())?;
    Ok(parser.parse_config()?)
}

/// Reads and parses a GLPS lattice file.
///
/// Nested includes resolve against the file's own directory, and the file
/// itself is placed on the include stack so direct self-inclusion is
/// reported as a cycle.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config, GlpsError> {
    let path = path.as_ref();
    let io_err = |e: std::io::Error| GlpsError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    let bytes = std::fs::read(path).map_err(io_err)?;
    let canonical = path.canonicalize().map_err(io_err)?;
    let base = canonical.parent().map(Path::to_path_buf);
    let name = path.display().to_string();
    let mut parser = Parser::with_includes(&bytes, &name, base, vec![canonical])?;
    Ok(parser.parse_config()?)
}
