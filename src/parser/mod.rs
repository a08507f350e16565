//! Input side of the conversion.
//!
//! Worksheets are read into [`workbook::Sheet`]s, cells are decoded by the
//! grammar in [`cell`], and [`assembler`] turns each sheet into a
//! [`crate::record::ResourceSet`].

pub mod assembler;
pub mod cell;
pub mod workbook;
