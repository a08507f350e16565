//! Intermediate JSON serialization.
//!
//! The layout matches a 4-space pretty printer that escapes every non-ASCII
//! character as `\uXXXX`. The tfvars rewrite in [`super::tfvars`] depends on
//! this exact line shape.

use crate::record::ResourceSet;
use anyhow::Result;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io::{self, Write};

/// A `PrettyFormatter` with 4-space indentation and ASCII-only string output.
pub struct AsciiPrettyFormatter {
    inner: PrettyFormatter<'static>,
}

impl AsciiPrettyFormatter {
    pub fn new() -> Self {
        AsciiPrettyFormatter {
            inner: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Default for AsciiPrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for AsciiPrettyFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serializes a value as 4-space, ASCII-only pretty JSON without a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, AsciiPrettyFormatter::new());
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Renders the pre-reformat block: `<sheet> = {`, one `"<key>": <json>,` entry
/// per record, then `}`.
///
/// Record keys are written verbatim between the quotes.
pub fn to_assignment_block(set: &ResourceSet) -> Result<String> {
    let mut block = format!("{} = {{\n", set.name);
    for (key, record) in set.iter() {
        block.push_str(&format!("\"{}\": {},\n", key, to_pretty_json(record)?));
    }
    block.push_str("}\n");
    Ok(block)
}
