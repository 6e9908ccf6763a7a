use crate::domain::models::JsonOut;
use serde::Serialize;

pub fn print_json<T: Serialize>(ok: bool, data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&JsonOut { ok, data })?);
    Ok(())
}

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        return print_json(true, data);
    }
    for d in data {
        println!("{}", row(d));
    }
    Ok(())
}

/// Single result; `lines` renders the human form, possibly over several lines.
pub fn print_one<T: Serialize>(
    json: bool,
    ok: bool,
    data: T,
    lines: impl Fn(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    if json {
        return print_json(ok, data);
    }
    for line in lines(&data) {
        println!("{}", line);
    }
    Ok(())
}
