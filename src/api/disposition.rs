use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};

pub const DEFAULT_FILENAME: &str = "file";

/// Suggested filename from the `Content-Disposition` header. The server
/// writes the stored name as raw UTF-8, so the value is not required to be
/// ASCII.
pub fn download_filename(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .and_then(|v| parse_filename(&v))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Extracts `filename="..."`, falling back to an unquoted `filename=...`
/// running up to the next `;`.
pub fn parse_filename(header: &str) -> Option<String> {
    let lower = header.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("filename=") {
        let value_at = from + pos + "filename=".len();
        from = value_at;
        let rest = &header[value_at..];

        if let Some(quoted) = rest.strip_prefix('"') {
            match quoted.find('"') {
                Some(0) | None => continue,
                Some(end) => return Some(quoted[..end].to_string()),
            }
        }

        let value = rest.split(';').next().unwrap_or("").trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn quoted_filename() {
        assert_eq!(
            parse_filename(r#"attachment; filename="report.pdf""#).as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn unquoted_filename_stops_at_semicolon() {
        assert_eq!(
            parse_filename("attachment; FileName= notes.txt ; size=10").as_deref(),
            Some("notes.txt")
        );
    }

    #[test]
    fn header_without_filename() {
        assert_eq!(parse_filename("inline"), None);
        assert_eq!(parse_filename("attachment; filename="), None);
    }

    #[test]
    fn missing_header_defaults_to_file() {
        assert_eq!(download_filename(&HeaderMap::new()), "file");

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static(r#"attachment; filename="lab 3.docx""#),
        );
        assert_eq!(download_filename(&headers), "lab 3.docx");
    }

    #[test]
    fn utf8_filename_survives() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_bytes(r#"attachment; filename="Отчёт по лабе.pdf""#.as_bytes()).unwrap(),
        );
        assert_eq!(download_filename(&headers), "Отчёт по лабе.pdf");
    }
}
