//! Plain text tables with columns sized to their widest cell.

/// Render rows under a header line. The last column is not padded, so
/// the output carries no trailing whitespace.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();
    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str(" | ");
        }
        if i + 1 == headers.len() {
            output.push_str(header);
        } else {
            output.push_str(&format!("{:<width$}", header, width = widths[i]));
        }
    }
    output.push('\n');
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            output.push_str("-+-");
        }
        output.push_str(&"-".repeat(*width));
    }
    output.push('\n');
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str(" | ");
            }
            if i + 1 == row.len() {
                output.push_str(cell);
            } else {
                output.push_str(&format!("{:<width$}", cell, width = widths[i]));
            }
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::render;

    #[test]
    fn columns_are_sized_to_the_widest_cell() {
        let rows = vec![
            vec!["1".to_string(), "Invoice".to_string(), "12".to_string()],
            vec!["23".to_string(), "Tax".to_string(), "7".to_string()],
        ];
        let table = render(&["ID", "Name", "Documents"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID | Name    | Documents");
        assert_eq!(lines[1], "---+---------+----------");
        assert_eq!(lines[2], "1  | Invoice | 12");
        assert_eq!(lines[3], "23 | Tax     | 7");
    }

    #[test]
    fn rows_may_be_empty() {
        let table = render(&["ID", "Name"], &[]);
        assert_eq!(table, "ID | Name\n---+-----\n");
    }
}
