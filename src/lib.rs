pub mod cli;
pub mod config;
pub mod generator;
pub mod parser;
pub mod record;

use parser::assembler::CATEGORIES;

pub fn get_sheet_types() -> Vec<String> {
    CATEGORIES.iter().map(|c| c.sheet.to_string()).collect()
}
