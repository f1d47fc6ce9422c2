use std::io::Cursor;
use std::io::Write;

/// Builds a minimal DOCX archive where each entry of `paragraphs` becomes a
/// `<w:p>` element.
pub fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    let body = paragraphs
        .iter()
        .map(|paragraph| {
            return format!(r#"<w:p><w:r><w:t xml:space="preserve">{paragraph}</w:t></w:r></w:p>"#);
        })
        .collect::<Vec<String>>()
        .join("");

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(document.as_bytes()).unwrap();

    return writer.finish().unwrap().into_inner();
}

pub fn document_fixture() -> &'static str {
    return r#"
Parlor Field Guide

Chapter 1: Tea. Oolong is partially oxidised tea, sitting between green and black tea. Steep it at 90 degrees for three minutes.

Chapter 2: Bread. Sourdough relies on a starter of wild yeast and lactobacilli. Feed the starter daily with equal weights of flour and water.

Chapter 3: Bicycles. A derailleur moves the chain between sprockets. Keep the chain lubricated and check tyre pressure weekly.

Chapter 4: Astronomy. Jupiter is the largest planet in the solar system, and its four Galilean moons are visible with binoculars.
"#
    .trim();
}
