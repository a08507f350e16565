use crate::record::ResourceSet;
use anyhow::Result;

pub trait Generator {
    fn generate(&self, data: &ResourceSet) -> Result<String>;
}
