//! End-to-end editing flows through the public API
//!
//! Each test drives a whole host interaction: seed, events, commands,
//! then asserts on the emitted HTML and metrics the way a binding
//! layer would consume them.

use pretty_assertions::assert_eq;

use proseforge_engine::{
    Caret, Cmd, Editor, ImageAsset, Key, KeyResult, ListKind, Selection,
};

fn caret(editor: &Editor, index: usize, offset: usize) -> Selection {
    Selection::caret(Caret::new(editor.document().blocks()[index].id(), offset))
}

fn asset() -> ImageAsset {
    ImageAsset {
        image_url: "https://example.com/photo.jpg".to_string(),
        alt_text: "A photo".to_string(),
        description: "Sunset over the bay".to_string(),
        source: "Jane Doe".to_string(),
        formatted_caption: String::new(),
    }
}

#[test]
fn pasting_plain_lines_into_an_empty_article() {
    // Given a fresh, empty editor
    let mut editor = Editor::new();

    // When two plain lines arrive from the clipboard
    let summary = editor
        .apply(&Cmd::Paste {
            text: "Line one\n\nLine two".to_string(),
        })
        .unwrap();

    // Then each line sits in its own block
    assert_eq!(summary.html, "<div>Line one</div><div>Line two</div>");
    assert_eq!(summary.word_count, 4);
}

#[test]
fn seeding_reports_word_count_and_reading_time() {
    let mut editor = Editor::new();

    let summary = editor.set_content("<p>Hello world</p>").unwrap();

    assert_eq!(summary.word_count, 2);
    assert_eq!(summary.reading_time_mins, 1);
}

#[test]
fn reading_time_rounds_up_for_longer_articles() {
    let words: Vec<String> = (1..=300).map(|n| format!("w{n}")).collect();
    let mut editor = Editor::new();

    let summary = editor
        .set_content(&format!("<p>{}</p>", words.join(" ")))
        .unwrap();

    assert_eq!(summary.word_count, 300);
    assert_eq!(summary.reading_time_mins, 2);
}

#[test]
fn toggling_bold_at_a_caret_styles_what_is_typed_next() {
    let mut editor = Editor::from_html("<p>plain</p>").unwrap();
    editor.on_selection_change(Some(caret(&editor, 0, 5)));

    // The toggle itself changes no content, only the reported state
    assert!(editor.apply(&Cmd::ToggleBold).is_none());
    assert!(editor.format_state().bold);

    let summary = editor
        .apply(&Cmd::InsertText {
            text: "hi".to_string(),
        })
        .unwrap();

    assert_eq!(summary.html, "<p>plain<b>hi</b></p>");
}

#[test]
fn backspace_after_a_figure_removes_the_figure_not_text() {
    let html = concat!(
        "<p>before</p>",
        r#"<figure><img src="pic.jpg"><span class="resize-handle"></span></figure>"#,
        "<p>after</p>"
    );
    let mut editor = Editor::from_html(html).unwrap();
    editor.on_selection_change(Some(caret(&editor, 2, 0)));

    let (result, summary) = editor.on_keydown(Key::Backspace);

    assert_eq!(result, KeyResult::Handled);
    assert_eq!(summary.unwrap().html, "<p>before</p><p>after</p>");
}

#[test]
fn clicking_a_figure_then_deleting_it_keeps_the_trailing_block() {
    let mut editor =
        Editor::from_html(r#"<p>text</p><figure><img src="pic.jpg"></figure>"#).unwrap();
    let figure = editor.document().blocks()[1].id();

    editor.on_click(Some(figure));
    assert_eq!(editor.selected_figure(), Some(figure));

    let (_, summary) = editor.on_keydown(Key::Delete);

    // The figure goes; the document keeps its text and trailing block
    assert_eq!(summary.unwrap().html, "<p>text</p><p><br></p>");
    assert_eq!(editor.selected_figure(), None);
}

#[test]
fn emitted_html_fed_back_through_set_content_stays_silent() {
    let mut editor = Editor::from_html("<p>bind me</p>").unwrap();
    editor.on_selection_change(Some(caret(&editor, 0, 7)));

    let summary = editor
        .apply(&Cmd::InsertText {
            text: "!".to_string(),
        })
        .unwrap();

    // A two-way binding echoes the emission straight back
    assert!(editor.set_content(&summary.html).is_none());
    assert_eq!(editor.version(), summary.version);
}

#[test]
fn an_authoring_session_from_scratch() {
    let mut editor = Editor::new();

    // Type a title and promote it
    editor.apply(&Cmd::InsertText {
        text: "My Trip".to_string(),
    });
    editor.apply(&Cmd::SetHeading { level: 1 });

    // Continue into a body paragraph
    editor.apply(&Cmd::InsertParagraph);
    editor.apply(&Cmd::InsertText {
        text: "We walked for hours.".to_string(),
    });

    // Add a two-item list
    editor.apply(&Cmd::InsertParagraph);
    editor.apply(&Cmd::InsertText {
        text: "boots".to_string(),
    });
    editor.apply(&Cmd::ToggleList {
        kind: ListKind::Unordered,
    });
    editor.apply(&Cmd::InsertParagraph);
    let summary = editor
        .apply(&Cmd::InsertText {
            text: "water".to_string(),
        })
        .unwrap();

    assert_eq!(
        summary.html,
        concat!(
            "<h1>My Trip</h1>",
            "<p>We walked for hours.</p>",
            "<ul><li>boots</li><li>water</li></ul>"
        )
    );
    assert_eq!(editor.version(), 9);
}

#[test]
fn inserting_and_resizing_an_image() {
    let mut editor = Editor::from_html("<p>intro</p>").unwrap();
    editor.on_selection_change(Some(caret(&editor, 0, 5)));

    let summary = editor.apply(&Cmd::InsertImage { asset: asset() }).unwrap();
    assert!(summary.html.contains(r#"<img src="https://example.com/photo.jpg" alt="A photo">"#));
    assert!(summary
        .html
        .contains("<figcaption>Sunset over the bay — Jane Doe</figcaption>"));

    // The caption counts toward the article's words, dash included
    assert_eq!(summary.word_count, 8);

    // Drag the handle 80px to the right within a 700px container
    let figure = editor.document().blocks()[1].id();
    assert!(editor.pointer_down_on_handle(figure, 210.0, 320.0, 700.0));
    assert_eq!(editor.pointer_move(290.0), Some(400.0));
    let resized = editor.pointer_up(290.0).unwrap();

    assert!(resized.html.contains(r#"style="width: 400px""#));
}

#[test]
fn select_all_then_retag_spans_every_text_block() {
    let mut editor =
        Editor::from_html("<p>one</p><div>two</div><blockquote>three</blockquote>").unwrap();

    editor.apply(&Cmd::SelectAll);
    let summary = editor.apply(&Cmd::SetHeading { level: 3 }).unwrap();

    assert_eq!(
        summary.html,
        "<h3>one</h3><h3>two</h3><h3>three</h3>"
    );
}

#[test]
fn a_messy_seed_normalizes_to_canonical_markup() {
    let editor = Editor::from_html(concat!(
        "<P >Intro with <STRONG>bold</STRONG> and <em>italic</em></P>",
        "<h5>Deep heading</h5>",
        "<div><ul><li>one</li><li>two</li></ul></div>",
        "<blockquote>said</blockquote>"
    ))
    .unwrap();

    insta::assert_snapshot!(
        editor.serialize(),
        @"<p>Intro with <b>bold</b> and <i>italic</i></p><h3>Deep heading</h3><ul><li>one</li><li>two</li></ul><blockquote>said</blockquote>"
    );
}

#[test]
fn serialized_form_survives_a_reload_round_trip() {
    let mut editor = Editor::new();
    editor.apply(&Cmd::Paste {
        text: "alpha\nbeta".to_string(),
    });
    editor.apply(&Cmd::ToggleBold);
    let first = editor.serialize();

    let reloaded = Editor::from_html(&first).unwrap();

    assert_eq!(reloaded.serialize(), first);
}
