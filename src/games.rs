use anyhow::Result;

pub mod connect4;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
