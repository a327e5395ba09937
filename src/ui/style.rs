use console::style;
use std::fmt::Display;

/// White bold — section headers, session titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim — metadata lines, secondary text
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Cyan bold — the active session marker, YOU label
pub fn accent<D: Display>(text: D) -> String {
    style(text).cyan().bold().to_string()
}

/// Green — BOT label, confirmed values
pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}

/// Yellow — warnings, undelivered-message markers
pub fn warning<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}
