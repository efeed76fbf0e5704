mod common;

use common::RecordingWriter;
use serlink::input;

#[tokio::test]
async fn forwards_lines_and_stops_at_exit_keyword() {
    let mut writer = RecordingWriter::default();

    assert!(input::forward_line(&mut writer, "?").await.unwrap());
    assert!(!input::forward_line(&mut writer, "quit").await.unwrap());

    // Exactly one line forwarded, terminator included, as a single write.
    assert_eq!(writer.writes, vec![b"?\n".to_vec()]);
}

#[tokio::test]
async fn exit_keywords_are_never_forwarded() {
    for keyword in ["quit", "EXIT", "q", "Q"] {
        let mut writer = RecordingWriter::default();
        assert!(!input::forward_line(&mut writer, keyword).await.unwrap());
        assert!(writer.writes.is_empty());
    }
}

#[tokio::test]
async fn empty_line_is_skipped_but_session_continues() {
    let mut writer = RecordingWriter::default();
    assert!(input::forward_line(&mut writer, "").await.unwrap());
    assert!(writer.writes.is_empty());
}

#[tokio::test]
async fn line_with_trailing_whitespace_matching_keyword_still_exits() {
    let mut writer = RecordingWriter::default();
    assert!(!input::forward_line(&mut writer, "quit ").await.unwrap());
    assert!(writer.writes.is_empty());
}
