use anyhow::Result;
use serde::Serialize;

pub fn display_json<T: Serialize>(o: T) -> Result<()> {
    println!("{}", pretty_json(&o)?);
    Ok(())
}

pub fn pretty_json<T: Serialize>(o: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(o)?)
}
