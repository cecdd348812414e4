//! HTML export: wrap a rendered fragment into a styled standalone document
//! and save artifacts under computed filenames.
//!
//! Saves are atomic (write to a temp name, then rename) so an interrupted
//! process never leaves a half-written report behind.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};

/// Inline stylesheet for the exported document. Inlined so the downloaded
/// file renders identically with no network access.
const DOCUMENT_STYLE: &str = r#"
        :root {
            --primary-blue: #49B9FF;
            --primary-blue-light: #A8DDFF;
            --primary-dark: #1a2332;
            --dark-gray: #6c757d;
            --text-dark: #212529;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: 'Roboto', sans-serif;
            font-weight: 300;
            line-height: 1.6;
            color: var(--text-dark);
            background: #ffffff;
            padding: 40px;
            max-width: 800px;
            margin: 0 auto;
        }
        .header {
            text-align: center;
            margin-bottom: 40px;
            padding-bottom: 20px;
            border-bottom: 3px solid var(--primary-blue);
        }
        .header h1 {
            font-size: 2.5rem;
            font-weight: 700;
            color: var(--primary-dark);
        }
        .analysis-section { margin-bottom: 30px; page-break-inside: avoid; }
        .analysis-section h3 {
            font-size: 1.4rem;
            font-weight: 700;
            color: var(--primary-dark);
            margin-bottom: 15px;
            padding: 10px 0;
            border-bottom: 2px solid var(--primary-blue-light);
        }
        .analysis-section p { margin-bottom: 15px; text-align: justify; }
        .analysis-section ul { margin-left: 20px; margin-bottom: 15px; }
        .analysis-section li { margin-bottom: 8px; }
        .footer {
            margin-top: 40px;
            padding-top: 20px;
            border-top: 2px solid var(--primary-blue-light);
            text-align: center;
            font-size: 0.9rem;
            color: var(--dark-gray);
        }
        @media print {
            body { padding: 20px; }
            .analysis-section { page-break-inside: avoid; }
        }
"#;

/// Wrap a rendered analysis fragment into a complete HTML document,
/// stamping the footer with `generated_at`.
pub fn wrap_analysis_document_at(fragment: &str, generated_at: DateTime<Local>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Report Analysis</title>
    <link href="https://fonts.googleapis.com/css2?family=Roboto:wght@300;700&display=swap" rel="stylesheet">
    <style>{style}</style>
</head>
<body>
    <div class="header">
        <h1>Report Analysis</h1>
    </div>

    <div class="analysis-content">
        {fragment}
    </div>

    <div class="footer">
        <p>Generated on {date} at {time}</p>
    </div>
</body>
</html>"#,
        style = DOCUMENT_STYLE,
        fragment = fragment,
        date = generated_at.format("%Y-%m-%d"),
        time = generated_at.format("%H:%M:%S"),
    )
}

/// [`wrap_analysis_document_at`] stamped with the current local time.
pub fn wrap_analysis_document(fragment: &str) -> String {
    wrap_analysis_document_at(fragment, Local::now())
}

/// Timestamp-based filename for the download endpoint's attachment.
pub fn download_filename_at(now: DateTime<Local>) -> String {
    format!("report-analysis-{}.html", now.timestamp_millis())
}

/// [`download_filename_at`] for the current local time.
pub fn download_filename() -> String {
    download_filename_at(Local::now())
}

/// Atomically write `contents` to `dir/filename`: temp file then rename, so
/// readers never observe a partial file.
pub async fn save_atomic(dir: &Path, filename: &str, contents: &str) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, &path).await?;
    Ok(path)
}

/// Save extracted text as `<stem>.txt` in `dir`.
pub async fn save_text_file(dir: &Path, stem: &str, text: &str) -> io::Result<PathBuf> {
    save_atomic(dir, &format!("{stem}.txt"), text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, 14, 30, 0).unwrap()
    }

    #[test]
    fn document_embeds_fragment_and_footer() {
        let doc = wrap_analysis_document_at("<p>body</p>", fixed_time());
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<p>body</p>"));
        assert!(doc.contains("Generated on 2026-08-05 at 14:30:00"));
        assert!(doc.contains("analysis-section"));
    }

    #[test]
    fn download_filename_is_timestamped_html() {
        let name = download_filename_at(fixed_time());
        assert!(name.starts_with("report-analysis-"));
        assert!(name.ends_with(".html"));
    }

    #[tokio::test]
    async fn save_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_atomic(dir.path(), "out.html", "<html></html>")
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
        assert!(!dir.path().join("out.tmp").exists());
    }

    #[tokio::test]
    async fn save_text_file_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_text_file(dir.path(), "extracted", "page text")
            .await
            .unwrap();
        assert!(path.ends_with("extracted.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "page text");
    }
}
