//! Table Rendering
//!
//! Plain ASCII tables for the help screen.

use crate::core::dice::Die;
use crate::game::probability::ProbabilityMatrix;

/// Corner label of the probability table.
const CORNER: &str = "User dice v";

/// Render a grid with `+---+` borders. The first row is the header.
pub fn render_grid(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border = widths.iter().fold(String::from("+"), |mut line, w| {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
        line
    });

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for (c, width) in widths.iter().enumerate() {
            let cell = row.get(c).map(String::as_str).unwrap_or("");
            let pad = width - cell.chars().count();
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(pad + 1));
            out.push('|');
        }
        out.push('\n');
        if i == 0 {
            out.push_str(&border);
            out.push('\n');
        }
    }
    out.push_str(&border);
    out
}

/// Probability table: row die vs column die, `-` on the diagonal.
pub fn render_matrix(dice: &[Die], matrix: &ProbabilityMatrix) -> String {
    let mut rows = Vec::with_capacity(dice.len() + 1);

    let mut header = vec![CORNER.to_string()];
    header.extend(dice.iter().map(Die::to_string));
    rows.push(header);

    for (i, die) in dice.iter().enumerate() {
        let mut row = vec![die.to_string()];
        row.extend((0..dice.len()).map(|j| match matrix.get(i, j) {
            Some(p) => p.to_string(),
            None => "-".to_string(),
        }));
        rows.push(row);
    }

    render_grid(&rows)
}

/// Step-by-step table of one commit round for a die with `faces` faces.
pub fn render_protocol(faces: usize) -> String {
    let last = faces.saturating_sub(1);
    let step = |n: &str, computer: String, user: String| vec![n.to_string(), computer, user];

    let rows = vec![
        step("#", "Computer".into(), "User".into()),
        step("1", format!("Picks x in 0..{}", last), String::new()),
        step("2", "Generates a secret key".into(), String::new()),
        step("3", "Shows HMAC(key, x)".into(), String::new()),
        step("4", String::new(), format!("Picks y in 0..{}", last)),
        step("5", format!("Computes (x + y) % {}", faces), String::new()),
        step("6", "Shows the result and the key".into(), String::new()),
    ];

    render_grid(&rows)
}
