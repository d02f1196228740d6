use memo_core::{decode, encode, try_decode, DecodeReason, Memo};

fn memo(title: &str, body: &str) -> Memo {
    Memo {
        id: "c1f0a0de-7d3b-4b43-8d6e-0f2e9a1b2c3d".to_string(),
        title: title.to_string(),
        body: body.to_string(),
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_123_456,
        order: 4,
    }
}

#[test]
fn unicode_and_escapes_survive_roundtrip() {
    let cases = [
        ("Einkaufsliste ✓", "Milch\nEier\n"),
        ("She said \"hi\"", "quoted \"body\" stays raw"),
        ("C:\\Users\\memo", "path\\with\\backslashes"),
        ("two\nlines", "---\nnot a delimiter inside body\n---\n"),
        ("literal \\n sequence", ""),
        ("日本語のタイトル", "本文 🎈"),
        ("", "\n\n"),
    ];
    for (title, body) in cases {
        let original = memo(title, body);
        let decoded = decode(&encode(&original), "case.md").expect("roundtrip decode");
        assert_eq!(decoded, original, "title {title:?} body {body:?}");
    }
}

#[test]
fn hand_written_record_with_crlf_and_extra_keys_decodes() {
    let text = "---\r\nid: \"abc\"\r\ntags: [a, b]\r\ntitle: \"Hello\"\r\ncreatedAt: 10\r\nupdatedAt: 20\r\norder: 0\r\n---\r\nbody";
    let decoded = decode(text, "abc.md").expect("crlf record");
    assert_eq!(decoded.id, "abc");
    assert_eq!(decoded.title, "Hello");
    assert_eq!(decoded.body, "body");
    assert_eq!(decoded.order, 0);
}

#[test]
fn failures_report_their_reason() {
    let missing = try_decode("just some text", "notes.md").unwrap_err();
    assert_eq!(missing.reason, DecodeReason::MissingDelimiters);
    assert_eq!(missing.source_name, "notes.md");

    let no_order = "---\nid: \"a\"\ntitle: \"t\"\ncreatedAt: 1\nupdatedAt: 2\n---\nbody";
    assert_eq!(
        try_decode(no_order, "a.md").unwrap_err().reason,
        DecodeReason::MissingField("order")
    );
}
