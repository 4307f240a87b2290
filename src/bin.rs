use clap::Parser;
use gridfill::find_fill;
use gridfill::grid_config::{
    generate_grid_config, generate_slots_from_cells, parse_template, render_grid,
};
use gridfill::word_list::{WordList, WordListSourceConfig};
use log::info;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

const NO_SOLUTION: &str = "No solution.";

/// Extensions we refuse to write to, since the output is plain text.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg"];

/// gridfill: Fill a crossword structure from a vocabulary file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with # representing blocks, _ or . representing empty squares,
    /// and letters representing prefilled squares. Rows shorter than the longest row are padded
    /// with blocks.
    structure_path: String,

    /// Path to the vocabulary file, one word per line
    words_path: String,

    /// Path to write the filled grid to as UTF-8 text (the same rendering that's printed; image
    /// formats aren't supported)
    output_path: Option<String>,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn check_output_path(output_path: &str) -> Result<(), Error> {
    let extension = Path::new(output_path)
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase());

    match extension {
        Some(extension) if IMAGE_EXTENSIONS.contains(&extension.as_str()) => Err(Error(format!(
            "Can't write '{output_path}': output is a text rendering, not a .{extension} image"
        ))),
        _ => Ok(()),
    }
}

/// Load the inputs, fill the grid, and write the output file if there is one. Returns the text to
/// print: the rendered grid, or a note that there's no solution.
fn run(args: &Args) -> Result<String, Error> {
    if let Some(output_path) = &args.output_path {
        check_output_path(output_path)?;
    }

    let template = fs::read_to_string(&args.structure_path)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure_path)))?;

    let (cells, width, height) =
        parse_template(&template).map_err(|error| Error(error.to_string()))?;

    let word_list = WordList::new(
        &[WordListSourceConfig::File {
            id: "0".into(),
            path: args.words_path.clone().into(),
        }],
        Some(width.max(height)),
    );

    #[allow(clippy::comparison_chain)]
    if let Some(errors) = word_list.get_source_errors().get("0") {
        if errors.len() == 1 {
            return Err(Error(format!("{}", errors[0])));
        } else if errors.len() > 1 {
            let mut full_error = String::new();
            for error in errors {
                full_error.push_str(&format!("\n- {error}"));
            }
            return Err(Error(full_error));
        }
    }

    info!(
        "Loaded {width}x{height} structure and {} words",
        word_list.len()
    );

    let slot_specs = generate_slots_from_cells(&cells, width, height);
    let grid_config = generate_grid_config(word_list, &slot_specs, cells, width, height)
        .map_err(|error| Error(error.to_string()))?;
    let config = grid_config.to_config_ref();

    let Ok(result) = find_fill(&config) else {
        return Ok(NO_SOLUTION.into());
    };

    info!("{:?}", result.statistics);

    let rendered = render_grid(&config, &result.choices);

    if let Some(output_path) = &args.output_path {
        fs::write(output_path, format!("{rendered}\n"))
            .map_err(|_| Error(format!("Couldn't write file '{output_path}'")))?;
    }

    Ok(rendered)
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    println!("{}", run(&args)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{run, Args, NO_SOLUTION};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn resource(name: &str) -> String {
        format!("{}/resources/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    fn path_string(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_fill_is_printed_and_written() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("filled.txt");

        let output = run(&Args {
            structure_path: resource("structure0.txt"),
            words_path: resource("words0.txt"),
            output_path: Some(path_string(&output_path)),
        })
        .unwrap();

        let expected = ["█SIX█", "█E██F", "█V██I", "█E██V", "█NINE"].join("\n");
        assert_eq!(output, expected);
        assert_eq!(fs::read_to_string(&output_path).unwrap(), expected + "\n");
    }

    #[test]
    fn test_unsolvable_puzzle_is_not_an_error() {
        let dir = tempdir().unwrap();
        let words_path = dir.path().join("words.txt");
        fs::write(&words_path, "one\ntwo\nsix\n").unwrap();
        let output_path = dir.path().join("filled.txt");

        let output = run(&Args {
            structure_path: resource("structure0.txt"),
            words_path: path_string(&words_path),
            output_path: Some(path_string(&output_path)),
        })
        .unwrap();

        assert_eq!(output, NO_SOLUTION);
        assert!(!output_path.exists());
    }

    #[test]
    fn test_word_list_errors_are_collected() {
        let dir = tempdir().unwrap();
        let words_path = dir.path().join("words.txt");
        fs::write(&words_path, "one\n;10\ntwo\n;20\n").unwrap();

        let error = run(&Args {
            structure_path: resource("structure0.txt"),
            words_path: path_string(&words_path),
            output_path: None,
        })
        .unwrap_err();

        assert_eq!(
            error.0,
            "\n- Word list contains invalid word: “;10”\n- Word list contains invalid word: “;20”"
        );
    }

    #[test]
    fn test_missing_inputs_are_errors() {
        let dir = tempdir().unwrap();
        let missing = path_string(&dir.path().join("missing.txt"));

        let error = run(&Args {
            structure_path: missing.clone(),
            words_path: resource("words0.txt"),
            output_path: None,
        })
        .unwrap_err();
        assert_eq!(error.0, format!("Couldn't read file '{missing}'"));

        let error = run(&Args {
            structure_path: resource("structure0.txt"),
            words_path: missing.clone(),
            output_path: None,
        })
        .unwrap_err();
        assert_eq!(error.0, format!("Can’t read file: “{missing}”"));
    }

    #[test]
    fn test_image_output_is_rejected() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("filled.PNG");

        let error = run(&Args {
            structure_path: resource("structure0.txt"),
            words_path: resource("words0.txt"),
            output_path: Some(path_string(&output_path)),
        })
        .unwrap_err();

        assert!(error.0.contains("not a .png image"), "{}", error.0);
        assert!(!output_path.exists());
    }
}
