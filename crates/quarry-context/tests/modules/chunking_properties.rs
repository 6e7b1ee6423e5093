//! Chunking properties over realistic documents.

use quarry_context::chunking::ChunkWindows;
use quarry_context::{StreamingAssembler, chunk_text, estimate_tokens};
use quarry_core::{ChunkingConfig, Passage};

fn lecture_notes(paragraphs: usize) -> String {
    let sentences = [
        "The derivative of a function measures its instantaneous rate of change.",
        "Newton's second law states that force equals mass times acceleration.",
        "Integration by parts follows from the product rule for derivatives.",
        "Entropy of an isolated system never decreases over time.",
        "Kırmızı ışık dalga boyu en uzun olan görünür ışıktır.",
    ];
    (0..paragraphs)
        .map(|index| {
            let mut paragraph = String::default();
            for offset in 0..4 {
                paragraph.push_str(sentences[(index + offset) % sentences.len()]);
                paragraph.push(' ');
            }
            paragraph
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn test_windows_cover_document_with_overlap() {
    let text = lecture_notes(40);
    let config = ChunkingConfig::new(50, 10);
    let windows: Vec<_> = ChunkWindows::new(&text, &config).collect();

    assert_eq!(windows[0].start, 0);
    assert_eq!(windows[windows.len() - 1].end, text.len());
    for pair in windows.windows(2) {
        assert!(pair[1].start > pair[0].start, "starts strictly increase");
        assert!(pair[1].start <= pair[0].end, "no gaps between windows");
    }
    for window in &windows {
        assert!(text[window.clone()].chars().count() <= config.chunk_chars());
    }
}

#[test]
fn test_passages_fit_token_budget() {
    let text = lecture_notes(25);
    let config = ChunkingConfig::new(40, 8);
    for passage in chunk_text(&text, &config) {
        assert!(estimate_tokens(passage) <= 40);
        assert_eq!(passage, passage.trim());
        assert!(!passage.is_empty());
    }
}

#[test]
fn test_streamed_file_keeps_sources_apart() {
    let config = ChunkingConfig::new(30, 5).with_flush_threshold(500);
    let mut assembler = StreamingAssembler::new(config);
    let first = lecture_notes(10);
    let second = lecture_notes(3);

    let mut passages: Vec<Passage> = Vec::default();
    let chars: Vec<char> = first.chars().collect();
    for piece in chars.chunks(97) {
        let fragment: String = piece.iter().collect();
        passages.extend(assembler.feed(&fragment, "notes-1.txt"));
    }
    passages.extend(assembler.feed(&second, "notes-2.txt"));
    passages.extend(assembler.finish());

    let split = passages
        .iter()
        .position(|passage| passage.source == "notes-2.txt")
        .unwrap();
    assert!(split > 0);
    assert!(passages[..split].iter().all(|passage| passage.source == "notes-1.txt"));
    assert!(passages[split..].iter().all(|passage| passage.source == "notes-2.txt"));
    for passage in &passages[split..] {
        assert!(second.contains(&passage.content));
    }
}
