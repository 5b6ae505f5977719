use anyhow::{Context, Result};
use proseforge_engine::{Editor, reading_time_mins, word_count};
use std::{env, fs, path::Path, process};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some((raw, path)) = parse_args(&args) else {
        eprintln!("Usage: {} [--raw] <article.html>", args[0]);
        eprintln!("Reads an article, normalizes it and reports its metrics.");
        eprintln!("  --raw   print only the normalized HTML");
        process::exit(1);
    };

    let editor = load_article(Path::new(path))?;
    if raw {
        println!("{}", editor.serialize());
    } else {
        print!("{}", report(&editor));
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Option<(bool, &str)> {
    match args {
        [_, path] => Some((false, path)),
        [_, flag, path] if flag == "--raw" => Some((true, path)),
        _ => None,
    }
}

/// Read a serialized article and seed an editor from it, which also
/// normalizes whatever markup the file carried
fn load_article(path: &Path) -> Result<Editor> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    log::debug!("read {} bytes from '{}'", html.len(), path.display());
    Editor::from_html(&html).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn report(editor: &Editor) -> String {
    let words = word_count(editor.document());
    format!(
        "blocks: {}\nwords: {}\nreading time: {} min\n\n{}\n",
        editor.document().blocks().len(),
        words,
        reading_time_mins(words),
        editor.serialize(),
    )
}
