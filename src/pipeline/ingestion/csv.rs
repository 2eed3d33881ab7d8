//! Minimal delimited-text helpers for the raw feed and the analytics export.

/// One logical CSV record and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Reads every record in `text`, respecting quoted fields.
///
/// A quoted field may contain commas, doubled quotes and line breaks, so one
/// record can span several physical lines. Blank lines between records are
/// skipped. CRLF line endings are accepted outside quotes.
pub fn read_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut start = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    current.push(ch);
                }
                _ => current.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                quoted = true;
            }
            ',' => fields.push(std::mem::take(&mut current)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut current));
                push_record(&mut records, start, std::mem::take(&mut fields), quoted);
                line += 1;
                start = line;
                quoted = false;
            }
            _ => current.push(ch),
        }
    }

    if quoted || !fields.is_empty() || !current.is_empty() {
        fields.push(current);
        push_record(&mut records, start, fields, quoted);
    }
    records
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>, quoted: bool) {
    let blank = !quoted && fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push(Record { line, fields });
    }
}

/// Quote a field only when it would otherwise break the record.
pub fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn join_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_commas_and_escaped_quotes() {
        let records = read_records(r#"EVT1,"a, b","say ""hi""",,N/A"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields, vec!["EVT1", "a, b", "say \"hi\"", "", "N/A"]);
    }

    #[test]
    fn quoted_line_breaks_stay_inside_the_field() {
        let text = "id,time\r\nE1,\"2025-11-01\n04:00\"\r\n\r\nE2,plain\n";
        let records = read_records(text);

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].line, 2);
        assert_eq!(records[1].fields, vec!["E1", "2025-11-01\n04:00"]);
        // The quoted break pushes the next record two lines further down.
        assert_eq!(records[2].line, 5);
        assert_eq!(records[2].fields, vec!["E2", "plain"]);
    }

    #[test]
    fn joined_records_read_back_unchanged() {
        let first = vec!["x,y", "plain", "", "q\"uote"];
        let second = vec!["multi\nline", "cr\r\nlf", "  padded "];
        let text = format!("{}\n{}\n", join_line(&first), join_line(&second));

        let records = read_records(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, first);
        assert_eq!(records[1].fields, second);
    }

    #[test]
    fn empty_quoted_field_is_not_a_blank_line() {
        let records = read_records("\"\"\n\n   \n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields, vec![""]);
    }
}
