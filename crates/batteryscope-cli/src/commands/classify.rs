use batteryscope_core::OutputRecord;

pub fn run(stdout_path: &str, stderr_path: Option<&str>) {
    let mut record = OutputRecord::new();
    match std::fs::read(stdout_path) {
        Ok(bytes) => record.append_standard_output_bytes(&bytes),
        Err(e) => {
            eprintln!("Failed to read {stdout_path}: {e}");
            std::process::exit(1);
        }
    }
    if let Some(path) = stderr_path {
        match std::fs::read(path) {
            Ok(bytes) => record.append_standard_error(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                eprintln!("Failed to read {path}: {e}");
                std::process::exit(1);
            }
        }
    }

    print!("{}", render(&record));
}

fn render(record: &OutputRecord) -> String {
    let mut out = String::new();
    for (title, lines) in [("Warnings", record.warnings()), ("Errors", record.errors())] {
        out.push_str(&format!("{title} ({}):\n", lines.len()));
        for line in lines {
            out.push_str(&format!("  {line}\n"));
        }
    }
    if !record.standard_error().is_empty() {
        out.push_str(&format!(
            "Standard error: {} bytes (not scanned)\n",
            record.standard_error().len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_findings() {
        let record = OutputRecord::from_parts("ok\nWARNING: short\nERROR: bad input\n", "");
        assert_eq!(
            render(&record),
            "Warnings (1):\n  WARNING: short\nErrors (1):\n  ERROR: bad input\n"
        );
    }

    #[test]
    fn test_render_mentions_stderr() {
        let record = OutputRecord::from_parts("", "error on stderr");
        let text = render(&record);
        assert!(text.starts_with("Warnings (0):\nErrors (0):\n"));
        assert!(text.contains("15 bytes"));
    }
}
