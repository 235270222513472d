use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Two aligned columns under a heading row, e.g. `KEY  VALUE`.
pub fn print_pairs<K, V>(headings: (&str, &str), pairs: impl IntoIterator<Item = (K, V)>)
where
    K: Display,
    V: Display,
{
    let rows: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let width = rows
        .iter()
        .map(|(k, _)| k.len())
        .chain([headings.0.len()])
        .max()
        .unwrap_or(0);

    println!("{:width$}  {}", headings.0, headings.1);
    println!("{}  {}", "-".repeat(width), "-".repeat(headings.1.len()));
    for (key, value) in rows {
        println!("{}", format!("{key:width$}  {value}").trim_end());
    }
}
