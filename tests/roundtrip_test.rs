use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageBuffer, ImageFormat as RasterFormat, Rgb};
use pretty_assertions::assert_eq;
use rtfbook::{decode, encode, ConvertOptions, HtmlRtfConverter, UploadDirResolver};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, RasterFormat::Png)
        .expect("png encoding should work");
    out.into_inner()
}

fn temp_uploads_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time must be after UNIX_EPOCH")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "rtfbook_roundtrip_{}_{}_{}",
        prefix,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("failed to create uploads dir");
    dir
}

#[test]
fn plain_paragraph_round_trips() {
    let html = "<p>Hello world</p>";
    assert_eq!(decode(&encode(html)), html);
}

#[test]
fn heading_round_trips() {
    let rtf = encode("<h2>Title</h2>");
    assert!(rtf.contains("\\pard\\sb200\\sa100{\\b\\fs36 Title}\\par"));
    assert_eq!(decode(&rtf), "<h2>Title</h2>");
}

#[test]
fn ordered_list_round_trips_with_numbers() {
    let rtf = encode("<ol><li>A</li><li>B</li></ol>");
    assert!(rtf.contains("{\\pntext\\f0 1.\\tab}A\\par"));
    assert!(rtf.contains("{\\pntext\\f0 2.\\tab}B\\par"));
    assert_eq!(decode(&rtf), "<ol>\n<li>A</li>\n<li>B</li>\n</ol>");
}

#[test]
fn unordered_list_round_trips() {
    let html = "<ul>\n<li>one</li>\n<li><strong>two</strong></li>\n</ul>";
    assert_eq!(decode(&encode(html)), html);
}

#[test]
fn accented_text_round_trips() {
    let rtf = encode("<p>caf\u{e9}</p>");
    assert!(rtf.contains("caf\\u233?"));
    assert!(rtf.is_ascii());
    assert_eq!(decode(&rtf), "<p>caf\u{e9}</p>");
}

#[test]
fn astral_characters_round_trip() {
    let html = "<p>smile \u{1F600}</p>";
    assert_eq!(decode(&encode(html)), html);
}

#[test]
fn empty_rtf_decodes_to_placeholder() {
    assert_eq!(decode(""), "<p>Empty document or unrecognized RTF format</p>");
}

#[test]
fn png_data_uri_round_trips_byte_exact() {
    let png = png_bytes(4, 3);
    let uri = format!("data:image/png;base64,{}", BASE64.encode(&png));
    let html = format!("<p><img src=\"{}\"></p>", uri);

    let rtf = encode(&html);
    assert!(rtf.contains("{\\pict\\pngblip\\picw4\\pich3\\picwgoal60\\pichgoal45\n"));

    let decoded = decode(&rtf);
    assert_eq!(
        decoded,
        format!(
            "<p><img src=\"{}\" alt=\"image\" style=\"max-width: 100%; height: auto;\" /></p>",
            uri
        )
    );
}

#[test]
fn oversized_image_is_clamped() {
    let png = png_bytes(800, 100);
    let uri = format!("data:image/png;base64,{}", BASE64.encode(&png));
    let rtf = encode(&format!("<img src=\"{}\">", uri));

    assert!(rtf.contains("\\picw800\\pich100\\picwgoal6000\\pichgoal750\n"));
}

#[test]
fn max_image_width_is_configurable() {
    let png = png_bytes(200, 100);
    let uri = format!("data:image/png;base64,{}", BASE64.encode(&png));
    let mut options = ConvertOptions::default();
    options.image.max_image_width = 100;
    let converter = HtmlRtfConverter::new(options, rtfbook::DataUriResolver);

    let rtf = converter.encode(&format!("<p><img src=\"{}\"></p>", uri));
    assert!(rtf.contains("\\picwgoal1500\\pichgoal750\n"));
}

#[test]
fn uploaded_image_is_embedded_from_directory() {
    let dir = temp_uploads_dir("upload");
    let png = png_bytes(10, 20);
    std::fs::write(dir.join("photo.png"), &png).expect("failed to write upload");

    let converter =
        HtmlRtfConverter::new(ConvertOptions::default(), UploadDirResolver::new(&dir));
    let report = converter.encode_with_report(
        "<p><img src=\"http://localhost:3001/uploads/photo.png\"><img src=\"missing.png\"></p>",
    );
    let _ = std::fs::remove_dir_all(&dir);

    assert!(report.output.contains("\\pngblip\\picw10\\pich20"));
    assert_eq!(report.diagnostics.len(), 1);

    let html = converter.decode(&report.output);
    assert!(html.contains(&format!("data:image/png;base64,{}", BASE64.encode(&png))));
}

#[test]
fn mixed_document_round_trips() {
    let html = [
        "<h1>Book</h1>",
        "<p style=\"text-align:center\">centered <em>words</em></p>",
        "<p>see <a href=\"https://example.com/a?b=1&amp;c=2\">the site</a></p>",
        "<blockquote>quoted</blockquote>",
        "<pre><code>fn main() {\n    println!();\n}</code></pre>",
        "<hr>",
        "<table>\n<tr><td><strong>k</strong></td><td>v</td></tr>\n<tr><td>x</td><td>y</td></tr>\n</table>",
        "<p>a<br>b <s>gone</s> H<sub>2</sub>O x<sup>2</sup> <u>under</u> <code>tick</code></p>",
    ]
    .join("\n");
    assert_eq!(decode(&encode(&html)), html);
}

#[test]
fn blockquote_with_links_round_trips() {
    let html = "<blockquote>see <a href=\"https://x.y\">x</a> and <a>here</a></blockquote>";
    assert_eq!(
        decode(&encode(html)),
        "<blockquote>see <a href=\"https://x.y\">x</a> and <a href=\"#\">here</a></blockquote>"
    );
}

#[test]
fn bold_inside_heading_merges_into_heading_text() {
    // Heading runs are bold already, so inner bold has no RTF trace.
    let rtf = encode("<h2>Title <b>bold</b></h2>");
    assert!(rtf.contains("{\\b\\fs36 Title {\\b bold}}"));
    assert_eq!(decode(&rtf), "<h2>Title bold</h2>");
}
