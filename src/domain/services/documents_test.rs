use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use test_utils::document_fixture;
use test_utils::docx_fixture;

use super::Documents;
use super::CHUNK_OVERLAP;
use super::CHUNK_SIZE;
use crate::domain::models::fake_embedders::FailingEmbedder;
use crate::domain::models::fake_embedders::KeywordEmbedder;
use crate::domain::models::Attachment;
use crate::domain::models::AttachmentPayload;
use crate::domain::models::FileUpload;
use crate::domain::models::RETRIEVAL_K;

fn upload(file_name: &str, bytes: &[u8]) -> FileUpload {
    return Attachment::from_upload(file_name, bytes.to_vec())
        .unwrap()
        .document()
        .unwrap()
        .clone();
}

mod extract_text {
    use super::*;

    #[test]
    fn it_reads_plain_text() -> Result<()> {
        let text = Documents::extract_text(&upload("notes.md", b"# Notes\nHello"))?;
        assert_eq!(text, "# Notes\nHello");
        return Ok(());
    }

    #[test]
    fn it_reads_docx() -> Result<()> {
        let bytes = docx_fixture(&["First paragraph.", "Fish &amp; chips &lt;3"]);
        let text = Documents::extract_text(&upload("notes.docx", &bytes))?;

        insta::assert_snapshot!(text, @r###"
        First paragraph.
        Fish & chips <3
        "###);
        return Ok(());
    }

    #[test]
    fn it_fails_on_invalid_docx() {
        let res = Documents::extract_text(&upload("notes.docx", b"not a zip"));
        assert!(res.is_err());
    }

    #[test]
    fn it_fails_on_invalid_pdf() {
        let res = Documents::extract_text(&upload("report.pdf", b"not a pdf"));
        assert!(res.is_err());
    }
}

mod split_text {
    use super::*;

    #[test]
    fn it_splits_with_overlap() {
        let res = Documents::split_text("abcdefghij", 4, 1);
        assert_eq!(res, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn it_prefers_whitespace_boundaries() {
        let res = Documents::split_text("aaa bbb ccc", 5, 0);
        assert_eq!(res, vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn it_returns_single_chunk_for_short_text() {
        let res = Documents::split_text("  short text  ", CHUNK_SIZE, CHUNK_OVERLAP);
        assert_eq!(res, vec!["short text"]);
    }

    #[test]
    fn it_returns_nothing_for_blank_text() {
        assert!(Documents::split_text("   \n  ", CHUNK_SIZE, CHUNK_OVERLAP).is_empty());
        assert!(Documents::split_text("abc", 0, 0).is_empty());
    }

    #[test]
    fn it_bounds_chunk_sizes_and_overlaps() {
        let text = "steep the oolong tea ".repeat(200);
        let res = Documents::split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);

        assert!(res.len() > 1);
        for chunk in res.iter() {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }

        let tail = &res[0][res[0].len() - 50..];
        assert!(res[1].contains(tail));
    }

    #[test]
    fn it_counts_characters_not_bytes() {
        let res = Documents::split_text("ééééé", 2, 0);
        assert_eq!(res, vec!["éé", "éé", "é"]);
    }
}

mod prepare_payload {
    use super::*;

    #[test]
    fn it_prepares_nothing() -> Result<()> {
        let res = Documents::prepare_payload(&Attachment::None)?;
        assert_eq!(res, AttachmentPayload::None);
        return Ok(());
    }

    #[test]
    fn it_prepares_images() -> Result<()> {
        let attachment = Attachment::from_upload("cat.png", vec![1, 2, 3])?;
        let res = Documents::prepare_payload(&attachment)?;
        assert_eq!(
            res,
            AttachmentPayload::Image {
                mime_type: "image/png".to_string(),
                data: STANDARD.encode([1, 2, 3]),
            }
        );
        return Ok(());
    }

    #[test]
    fn it_prepares_pdfs_without_extraction() -> Result<()> {
        let attachment = Attachment::from_upload("report.pdf", b"%PDF-1.4".to_vec())?;
        let res = Documents::prepare_payload(&attachment)?;
        assert_eq!(
            res,
            AttachmentPayload::Pdf {
                file_name: "report.pdf".to_string(),
                data: STANDARD.encode(b"%PDF-1.4"),
            }
        );
        return Ok(());
    }

    #[test]
    fn it_prepares_text_documents() -> Result<()> {
        let attachment = Attachment::from_upload("notes.docx", docx_fixture(&["Hello"]))?;
        let res = Documents::prepare_payload(&attachment)?;
        assert_eq!(
            res,
            AttachmentPayload::Text {
                file_name: "notes.docx".to_string(),
                text: "Hello".to_string(),
            }
        );
        return Ok(());
    }

    #[test]
    fn it_fails_on_unreadable_documents() {
        let attachment = Attachment::from_upload("notes.docx", b"garbage".to_vec()).unwrap();
        assert!(Documents::prepare_payload(&attachment).is_err());
    }
}

mod index {
    use super::*;

    #[tokio::test]
    async fn it_indexes_documents() -> Result<()> {
        let uploads = vec![upload("guide.txt", document_fixture().as_bytes())];
        let index = Documents::index(&uploads, Box::<KeywordEmbedder>::default()).await?;

        assert!(!index.is_empty());
        let res = index.query("Which moons orbit Jupiter?", RETRIEVAL_K).await?;
        assert!(!res.is_empty());
        assert!(res.len() <= RETRIEVAL_K);
        assert!(res[0].text.contains("Galilean moons"));

        return Ok(());
    }

    #[tokio::test]
    async fn it_batches_embedding_requests() -> Result<()> {
        let embedder = KeywordEmbedder::default();
        let text = "steep the oolong tea ".repeat(10_000);
        let uploads = vec![upload("tea.txt", text.as_bytes())];

        let index = Documents::index(&uploads, Box::new(embedder.clone())).await?;

        assert!(index.len() > 100);
        assert_eq!(embedder.call_count(), (index.len() + 99) / 100);

        return Ok(());
    }

    #[tokio::test]
    async fn it_aborts_when_embedding_fails() {
        let uploads = vec![upload("guide.txt", document_fixture().as_bytes())];
        let res = Documents::index(&uploads, Box::new(FailingEmbedder {})).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn it_aborts_when_any_document_is_unreadable() {
        let uploads = vec![
            upload("guide.txt", document_fixture().as_bytes()),
            upload("broken.docx", b"garbage"),
        ];
        let res = Documents::index(&uploads, Box::<KeywordEmbedder>::default()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn it_aborts_on_empty_documents() {
        let uploads = vec![upload("empty.txt", b"   ")];
        let res = Documents::index(&uploads, Box::<KeywordEmbedder>::default()).await;
        assert!(res.is_err());
    }
}
