//! Truncate command implementation.

use crate::input::read_text;
use fieldcanon::truncate_rendered_value;

pub fn run(input: Option<String>, max_length: i64) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_text(input.as_deref())?;
    let rendered = text.strip_suffix('\n').unwrap_or(&text);
    println!("{}", truncate_rendered_value(rendered, max_length));
    Ok(())
}
