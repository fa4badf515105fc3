//! Assertions for comparing rendered text in snapshot tests.

/// Trims the block and the end of every line, rendered blocks pad their columns.
pub fn normalize(text: &str) -> String {
    text.trim().lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Asserts that two rendered blocks are equal up to surrounding whitespace, printing a line diff
/// when they differ.
///
/// `context_name` names the compared text in the panic message, `additional_context` is an
/// optional `(label, value)` pair printed before the diff, e.g. the input the text was rendered
/// from.
pub fn assert_strings_with_diff(
    actual: &str,
    expected: &str,
    context_name: &str,
    additional_context: Option<(&str, &str)>,
) {
    let actual = normalize(actual);
    let expected = normalize(expected);
    if actual == expected {
        return;
    }

    if let Some((label, value)) = additional_context {
        eprintln!("=== {label} ===\n{}\n", value.trim());
    }
    eprintln!("=== Expected ===\n{expected}\n");
    eprintln!("=== Actual ===\n{actual}\n");
    eprintln!("=== Diff ===");
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    for i in 0..expected_lines.len().max(actual_lines.len()) {
        match (expected_lines.get(i), actual_lines.get(i)) {
            (Some(e), Some(a)) if e == a => {}
            (e, a) => {
                if let Some(e) = e {
                    eprintln!("Line {}: - {e}", i + 1);
                }
                if let Some(a) = a {
                    eprintln!("Line {}: + {a}", i + 1);
                }
            }
        }
    }

    panic!("{context_name} mismatch");
}
