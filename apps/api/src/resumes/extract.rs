use bytes::Bytes;

use crate::errors::AppError;

/// PDFs start with this signature; checked before handing bytes to the parser.
const PDF_MAGIC: &[u8] = b"%PDF-";

pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Extracts plain text from a PDF on a blocking thread.
/// A PDF without extractable text (e.g. a scanned image) is rejected.
pub async fn extract_pdf_text(data: Bytes) -> Result<String, AppError> {
    if !is_pdf(&data) {
        return Err(AppError::Validation("File is not a PDF".to_string()));
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    let text = normalize_whitespace(&text);
    if text.split_whitespace().count() < 20 {
        return Err(AppError::UnprocessableEntity(
            "No readable text found in the PDF. Upload a text-based PDF, not a scan.".to_string(),
        ));
    }
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn test_non_pdf_rejected() {
        let result = extract_pdf_text(Bytes::from_static(b"hello world")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "Name   \n\n\n\nEducation\n  \nB.Tech\n\n";
        assert_eq!(normalize_whitespace(input), "Name\n\nEducation\n\nB.Tech");
    }
}
