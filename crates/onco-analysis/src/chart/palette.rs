//! Colours used by the charts.

/// Scatter points and the Kaplan-Meier line.
pub const STEEL_BLUE: &str = "#4682b4";

pub const RED: &str = "red";
pub const BLUE: &str = "blue";
pub const GRAY: &str = "gray";
pub const BLACK: &str = "black";
pub const WHITE: &str = "white";

/// Outline of mutation scatter points.
pub const DARK_GRAY: &str = "#333";

/// Mutation scatter trend line.
pub const CORAL: &str = "#ff7f50";

/// High-expression group boxes.
pub const HIGH_EXPRESSION: &str = "#ff6b6b";

/// Low-expression group boxes, and methylation boxes.
pub const LOW_EXPRESSION: &str = "#4dabf7";

/// The 10-colour categorical palette (d3 `schemeCategory10`).
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Colour of the `index`-th category, cycling through [`CATEGORY10`].
pub fn category_color(index: usize) -> &'static str {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Colour of an expression group box, keyed on its label.
pub fn expression_group_color(label: &str) -> &'static str {
    if label.to_lowercase().contains("high") {
        HIGH_EXPRESSION
    } else {
        LOW_EXPRESSION
    }
}
