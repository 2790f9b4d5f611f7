//! 书籍文本提取
//!
//! PDF 交给外部 `pdftotext` 工具；EPUB 是 zip 容器，按归档顺序读取其中的 (X)HTML 文档并去掉标签。

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{AppError, Result};
use crate::models::upload::BookFormat;

/// 不含正文的元素
const SKIPPED_ELEMENTS: [&str; 5] = ["head", "script", "style", "template", "noscript"];

/// 前后各断一行的块级元素
const BLOCK_ELEMENTS: [&str; 16] = [
    "body", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "section", "article",
    "blockquote", "pre", "td",
];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 提取书籍的纯文本
    async fn extract(&self, path: &Path, format: BookFormat) -> Result<String>;
}

pub struct BookTextExtractor {
    pdftotext: PathBuf,
}

impl BookTextExtractor {
    pub fn new() -> Self {
        Self {
            pdftotext: PathBuf::from("pdftotext"),
        }
    }

    pub fn with_pdftotext(mut self, binary: impl Into<PathBuf>) -> Self {
        self.pdftotext = binary.into();
        self
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String> {
        let output = tokio::process::Command::new(&self.pdftotext)
            .arg(path)
            .arg("-")
            .output()
            .await
            .map_err(|e| AppError::Io(format!("failed to run pdftotext: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::Io(format!(
                "pdftotext exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn extract_epub(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        tokio::task::spawn_blocking(move || epub_text(&bytes))
            .await
            .map_err(|e| AppError::Internal(format!("epub extraction task failed: {}", e)))?
    }
}

impl Default for BookTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for BookTextExtractor {
    async fn extract(&self, path: &Path, format: BookFormat) -> Result<String> {
        debug!(path = %path.display(), ?format, "Extracting book text");
        match format {
            BookFormat::Pdf => self.extract_pdf(path).await,
            BookFormat::Epub => self.extract_epub(path).await,
        }
    }
}

fn is_html_document(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
}

/// 读取 EPUB 容器中的全部 (X)HTML 文档
pub fn epub_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut documents = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() || !is_html_document(file.name()) {
            continue;
        }
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        let text = strip_markup(&String::from_utf8_lossy(&raw));
        if !text.is_empty() {
            documents.push(text);
        }
    }

    if documents.is_empty() {
        return Err(AppError::Validation(
            "epub contains no readable documents".to_string(),
        ));
    }
    Ok(documents.join("\n"))
}

/// 解析 HTML 并取出正文，块级元素换行，每行去除首尾空白，空行最多保留一行
pub fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
    if block {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_epub(documents: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = FileOptions::default();
            writer.start_file("mimetype", options).unwrap();
            writer.write_all(b"application/epub+zip").unwrap();
            for (name, content) in documents {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_strip_markup_keeps_block_structure() {
        let html = "<html><head><title>x</title></head><body>\
            <h1>Chapter 1 Worry</h1><p>Fear &amp; avoidance<br/>go together.</p>\
            <script>var a = 1;</script></body></html>";
        let text = strip_markup(html);
        assert_eq!(text, "Chapter 1 Worry\n\nFear & avoidance\ngo together.");
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        let html = "<p>It&#8217;s fear &hellip; and avoidance&#x2019;s cost&nbsp;&lt;3&gt;</p>";
        assert_eq!(
            strip_markup(html),
            "It\u{2019}s fear \u{2026} and avoidance\u{2019}s cost\u{a0}<3>"
        );
    }

    #[test]
    fn test_strip_markup_xhtml_chapter_headers_start_lines() {
        let xhtml = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
            <html xmlns=\"http://www.w3.org/1999/xhtml\"><head><style>h2 { }</style></head>\
            <body><section><h2>Chapter 3 Panic</h2><div>Breathing <em>slowly</em> helps.</div>\
            </section></body></html>";
        assert_eq!(
            strip_markup(xhtml),
            "Chapter 3 Panic\n\nBreathing slowly helps."
        );
    }

    #[test]
    fn test_epub_documents_in_archive_order() {
        let bytes = build_epub(&[
            ("OEBPS/ch1.xhtml", "<p>Chapter 1 First</p>"),
            ("OEBPS/style.css", "p { color: red }"),
            ("OEBPS/ch2.html", "<p>Chapter 2 Second</p>"),
        ]);
        let text = epub_text(&bytes).unwrap();
        assert_eq!(text, "Chapter 1 First\nChapter 2 Second");
    }

    #[test]
    fn test_epub_without_documents_is_rejected() {
        let bytes = build_epub(&[("OEBPS/style.css", "p {}")]);
        assert!(matches!(epub_text(&bytes), Err(AppError::Validation(_))));
        assert!(epub_text(b"not a zip").is_err());
    }

    #[tokio::test]
    async fn test_missing_pdftotext_binary_is_error() {
        let extractor = BookTextExtractor::new().with_pdftotext("/nonexistent/pdftotext");
        let result = extractor
            .extract(Path::new("/tmp/book.pdf"), BookFormat::Pdf)
            .await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_extract_epub_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, build_epub(&[("a.xhtml", "<p>Section 1 Hello</p>")])).unwrap();
        let text = BookTextExtractor::new()
            .extract(&path, BookFormat::Epub)
            .await
            .unwrap();
        assert_eq!(text, "Section 1 Hello");
    }
}
