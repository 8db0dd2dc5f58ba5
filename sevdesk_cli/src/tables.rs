//! Plain-text table rendering for list output.

/// Renders rows as an aligned table with a header rule.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() && cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        if i + 1 == headers.len() {
            out.push_str(header);
        } else {
            out.push_str(&format!("{header:<width$}", width = widths[i]));
        }
    }
    out.push('\n');
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push_str("-+-");
        }
        out.push_str(&"-".repeat(*width));
    }
    out.push('\n');
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            if i + 1 == row.len() {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{cell:<width$}", width = widths[i]));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_the_widest_cell() {
        let rows = vec![
            vec!["1".to_string(), "Rent March".to_string()],
            vec!["23".to_string(), "Fees".to_string()],
        ];
        let table = render(&["ID", "Purpose"], &rows);
        assert_eq!(
            table,
            "ID | Purpose\n---+-----------\n1  | Rent March\n23 | Fees\n"
        );
    }

    #[test]
    fn renders_headers_for_empty_tables() {
        let table = render(&["ID", "Name"], &[]);
        assert_eq!(table, "ID | Name\n---+-----\n");
    }
}
