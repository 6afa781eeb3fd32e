use strash_aiger::{
    binary::{Config, Layout, Parser, Writer},
    ReadError,
};

fn main() {
    if let Err(err) = main_err() {
        eprintln!("error: {err}");
    }
}

fn main_err() -> Result<(), ReadError> {
    let layout = match std::env::args().nth(1).as_deref() {
        Some("--delta") => Layout::DeltaCoded,
        _ => Layout::Ascii,
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    let reader = Parser::from_read(stdin.lock(), Config::default())?;
    let outcome = reader.parse()?;

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }

    let mut writer = Writer::from_write(stdout.lock(), layout);
    writer.write_network(&outcome.network);
    if let Some(comment) = &outcome.comment {
        writer.write_comment(comment);
    }
    writer.finish()?;
    Ok(())
}
