use crate::error::Result;
use crate::report::Report;

pub fn print_json(report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
    println!("{}", json);
    Ok(())
}
