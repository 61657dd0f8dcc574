//! Minimal, tolerant HTML scanning for the source page.
//!
//! This is deliberately not a general HTML parser: the extractor needs one
//! table out of one page. Scanning is case-insensitive, local to known
//! blocks, and resilient to attribute order and harmless markup noise, so it
//! can be tested offline against captured fixtures.

/// Returns the body of the first `<table>` whose class attribute contains
/// `class_name`, excluding the outer table tags. Nested tables are kept
/// intact inside the returned slice.
pub(crate) fn first_table_with_class<'a>(html: &'a str, class_name: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(relative) = find_ci(&html[search_from..], "<table") {
        let tag_start = search_from + relative;
        let open_end = html[tag_start..].find('>')? + tag_start;
        let opening_tag = &html[tag_start..=open_end];

        if attr_value_ci(opening_tag, "class")
            .is_some_and(|classes| classes.to_ascii_lowercase().contains(&class_name.to_ascii_lowercase()))
        {
            let body_start = open_end + 1;
            let body_end = matching_table_end(html, body_start)?;
            return Some(&html[body_start..body_end]);
        }

        search_from = open_end + 1;
    }
    None
}

/// Finds the `</table>` that closes the table whose body starts at `from`,
/// accounting for nested tables. Returns the byte offset of the closer.
fn matching_table_end(html: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut cursor = from;

    while depth > 0 {
        let rest = &html[cursor..];
        let next_open = find_ci(rest, "<table");
        let next_close = find_ci(rest, "</table")?;

        if let Some(open) = next_open
            && open < next_close
        {
            depth += 1;
            cursor += open + "<table".len();
            continue;
        }

        depth -= 1;
        if depth == 0 {
            return Some(cursor + next_close);
        }
        cursor += next_close + "</table".len();
    }
    None
}

/// Splits a table body into row slices, one per `<tr>`.
pub(crate) fn table_rows(table_body: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let mut cursor = 0;

    while let Some(relative) = find_ci(&table_body[cursor..], "<tr") {
        let tag_start = cursor + relative;
        let Some(open_end) = table_body[tag_start..].find('>').map(|i| i + tag_start) else {
            break;
        };
        let content_start = open_end + 1;

        let content_end = find_ci(&table_body[content_start..], "</tr")
            .map(|i| i + content_start)
            .unwrap_or(table_body.len());

        rows.push(&table_body[content_start..content_end]);
        cursor = content_end;
    }

    rows
}

/// Extracts the text of each `<td>`/`<th>` cell in a row, tags stripped and
/// entities decoded. Unclosed cells end at the next cell or end of row.
pub(crate) fn row_cells(row_html: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cursor = 0;

    loop {
        let next_td = find_ci(&row_html[cursor..], "<td");
        let next_th = find_ci(&row_html[cursor..], "<th");
        let Some(relative) = min_offset(next_td, next_th) else {
            break;
        };

        let tag_start = cursor + relative;
        let Some(open_end) = row_html[tag_start..].find('>').map(|i| i + tag_start) else {
            break;
        };
        let content_start = open_end + 1;

        let rest = &row_html[content_start..];
        let closers = [
            find_ci(rest, "</td"),
            find_ci(rest, "</th"),
            find_ci(rest, "<td"),
            find_ci(rest, "<th"),
        ];
        let content_end = closers
            .into_iter()
            .flatten()
            .min()
            .map(|i| i + content_start)
            .unwrap_or(row_html.len());

        cells.push(cell_text(&row_html[content_start..content_end]));
        cursor = content_end;
    }

    cells
}

/// Reads an attribute value out of an opening tag, tolerating either quote
/// style or an unquoted token. Attribute names match case-insensitively.
fn attr_value_ci<'a>(opening_tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = opening_tag.to_ascii_lowercase();
    let pattern = format!("{}=", name.to_ascii_lowercase());

    let mut from = 0;
    while let Some(relative) = lower[from..].find(&pattern) {
        let at = from + relative;
        let preceded_ok = at == 0
            || lower.as_bytes()[at - 1].is_ascii_whitespace();
        if !preceded_ok {
            from = at + pattern.len();
            continue;
        }

        let value_start = at + pattern.len();
        let rest = &opening_tag[value_start..];
        let mut chars = rest.chars();
        return match chars.next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &rest[1..];
                inner.find(quote).map(|end| &inner[..end])
            }
            Some(_) => {
                let end = rest
                    .find(|ch: char| ch.is_ascii_whitespace() || ch == '>')
                    .unwrap_or(rest.len());
                Some(&rest[..end])
            }
            None => None,
        };
    }
    None
}

fn min_offset(left: Option<usize>, right: Option<usize>) -> Option<usize> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn cell_text(fragment: &str) -> String {
    decode_entities(&strip_tags(fragment))
}

/// Removes `<...>` spans, keeping the text between them.
pub(crate) fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut inside_tag = false;

    for ch in fragment.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' if inside_tag => inside_tag = false,
            _ if !inside_tag => text.push(ch),
            _ => {}
        }
    }

    text
}

/// Decodes the named and numeric entities that actually occur in the source
/// tables. Unknown entities are left as-is rather than guessed at.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let Some(semi) = tail.find(';').filter(|&i| i <= 10) else {
            decoded.push('&');
            rest = &rest[amp + 1..];
            continue;
        };

        let entity = &tail[1..semi];
        let replacement = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => decode_numeric_entity(entity),
        };

        match replacement {
            Some(ch) => {
                decoded.push(ch);
                rest = &rest[amp + semi + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[amp + 1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded.replace('\u{a0}', " ")
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code)
}

// Bytewise so repeated scans over a large page never re-allocate a
// lowercased copy of the remaining haystack. Needles are ASCII tag literals.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::{
        decode_entities, find_ci, first_table_with_class, row_cells, strip_tags, table_rows,
    };

    #[test]
    fn find_ci_matches_any_case_at_the_byte_offset() {
        assert_eq!(find_ci("xx<TaBlE>", "<table"), Some(2));
        assert_eq!(find_ci("<TR><td>", "<td"), Some(4));
        assert_eq!(find_ci("<tr>", "<table"), None);
        assert_eq!(find_ci("", "<tr"), None);
    }

    #[test]
    fn finds_first_table_by_class_ignoring_case_and_attr_order() {
        let html = r#"
            <table class="infobox"><tr><td>noise</td></tr></table>
            <TABLE style="width:100%" CLASS="wikitable sortable">
              <tr><th>Rank</th></tr>
            </TABLE>
        "#;

        let body = first_table_with_class(html, "wikitable");
        assert!(body.is_some());
        if let Some(body) = body {
            assert!(body.contains("Rank"));
            assert!(!body.contains("noise"));
        }
    }

    #[test]
    fn missing_table_class_yields_none() {
        let html = "<table class=\"plain\"><tr><td>1</td></tr></table>";
        assert!(first_table_with_class(html, "wikitable").is_none());
    }

    #[test]
    fn nested_tables_do_not_truncate_the_outer_body() {
        let html = "<table class=\"wikitable\"><tr><td>\
                    <table><tr><td>inner</td></tr></table>\
                    </td></tr><tr><td>after</td></tr></table>";

        let body = first_table_with_class(html, "wikitable");
        assert!(body.is_some());
        if let Some(body) = body {
            assert!(body.contains("inner"));
            assert!(body.contains("after"));
        }
    }

    #[test]
    fn rows_and_cells_are_sliced_in_order() {
        let body = "<tr><th>Rank</th><th>Name</th></tr>\
                    <tr><td>1</td><td><a href=\"/x\">Big Bank</a></td></tr>";

        let rows = table_rows(body);
        assert_eq!(rows.len(), 2);

        let header = row_cells(rows[0]);
        assert_eq!(header, vec!["Rank".to_string(), "Name".to_string()]);

        let data = row_cells(rows[1]);
        assert_eq!(data, vec!["1".to_string(), "Big Bank".to_string()]);
    }

    #[test]
    fn unclosed_cells_end_at_the_next_cell() {
        let cells = row_cells("<td>1<td>2<td>3");
        assert_eq!(
            cells,
            vec!["1".to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[test]
    fn strip_tags_keeps_only_text() {
        assert_eq!(strip_tags("<a href=\"x\"><b>JPMorgan</b> Chase</a>"), "JPMorgan Chase");
    }

    #[test]
    fn entities_decode_including_numeric_forms() {
        assert_eq!(decode_entities("Barclays &amp; Co"), "Barclays & Co");
        assert_eq!(decode_entities("Soci&#233;t&#xE9;"), "Société");
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
        assert_eq!(decode_entities("5 &unknown; left"), "5 &unknown; left");
    }
}
