// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_article_html(sections: usize) -> String {
    let mut html = String::from("<h1>Field Notes</h1>");
    for section in 0..sections {
        html.push_str(&format!("<h2>Section {section}</h2>"));
        html.push_str(
            "<p>Plain prose with <b>bold</b>, <i>italic</i> and \
             <a href=\"https://example.com\">linked</a> spans in it.</p>",
        );
        html.push_str("<ul><li>first point</li><li>second point</li></ul>");
        html.push_str(&format!(
            "<figure><img src=\"https://example.com/{section}.jpg\" alt=\"photo\" \
             style=\"width: 540px\"><figcaption>Caption {section}</figcaption>\
             <span class=\"resize-handle\"></span></figure>"
        ));
        html.push_str("<blockquote>Something somebody said once.</blockquote>");
    }
    html.push_str("<p>fin</p>");
    html
}
