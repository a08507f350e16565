//! Output generators for the intermediate and final artifacts.
//!
//! [`json`] renders the intermediate JSON document and assignment block;
//! [`tfvars`] and [`direct`] produce the final tfvars text.

pub mod base;
pub mod direct;
pub mod json;
pub mod tfvars;

use clap::ValueEnum;

use base::Generator;

/// Selects how the final tfvars file is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Emitter {
    /// Rewrite the JSON assignment block line by line.
    #[default]
    Legacy,
    /// Walk the records and print tfvars syntax directly.
    Direct,
}

impl Emitter {
    pub fn generator(&self) -> Box<dyn Generator> {
        match self {
            Emitter::Legacy => Box::new(tfvars::LegacyGenerator),
            Emitter::Direct => Box::new(direct::DirectGenerator),
        }
    }
}
