use pretty_assertions::assert_eq;
use rtfbook::HtmlRtfConverter;

#[test]
fn golden_snapshot_editor_page_to_rtf() {
    let converter = HtmlRtfConverter::with_defaults();
    let rtf = converter.encode(include_str!("golden/page.html"));

    let expected = include_str!("golden/page_expected.rtf");
    assert_eq!(rtf.trim_end(), expected.trim_end());
}

#[test]
fn golden_snapshot_legacy_rtf_to_html() {
    let converter = HtmlRtfConverter::with_defaults();
    let report = converter.decode_with_report(include_str!("golden/legacy.rtf"));

    assert!(report.diagnostics.is_empty());
    let expected = include_str!("golden/legacy_expected.html");
    assert_eq!(report.output.trim_end(), expected.trim_end());
}

#[test]
fn golden_snapshot_encoded_page_decodes_to_same_structure() {
    let converter = HtmlRtfConverter::with_defaults();
    let rtf = include_str!("golden/page_expected.rtf");
    let html = converter.decode(rtf);

    assert!(html.starts_with("<h1>"));
    assert!(html.contains("<li>Pears &amp; plums</li>"));
    assert!(html.contains("<blockquote>"));
    assert!(html.contains("<pre><code>"));
    assert!(html.contains("<hr>"));
    assert!(html.contains("<table>"));
}
