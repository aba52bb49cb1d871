use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("osc-watch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
