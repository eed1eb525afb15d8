//! Loading a multi-node TIS-100 source file into per-node programs.
//!
//! Source files assign code to compute nodes with `@N` section markers,
//! where `N` is the zero-based index of the compute node among all compute
//! nodes in the grid (in row-major order), not its absolute grid index. Text
//! before the first `@N` marker is ignored.

use std::collections::HashMap;
use std::fs;
use std::io;

use crate::core::Program;
use crate::parse::{parse_program, ProgramErrors};

/// Programs assigned to specific compute nodes, keyed by compute-node index.
pub type Save = HashMap<usize, Program>;

/// Parse errors for each compute node that failed to parse, keyed by
/// compute-node index.
pub type SaveErrors = HashMap<usize, ProgramErrors>;

/// An error returned when loading a save from a file.
#[derive(Debug)]
pub enum LoadSaveError {
    ParseFailed(SaveErrors),
    Io(io::Error),
}

use self::LoadSaveError::*;

/// Load a [`Save`] from a file.
pub fn load_save(filename: &str) -> Result<Save, LoadSaveError> {
    let src = fs::read_to_string(filename).map_err(Io)?;
    parse_save(&src).map_err(ParseFailed)
}

/// Parse the text of a TIS-100 source file into a map from compute-node
/// index to program.
pub fn parse_save(src: &str) -> Result<Save, SaveErrors> {
    let mut save = HashMap::new();
    let mut errors = HashMap::new();

    // Skip the first result since it precedes the first `@N` marker.
    for section in src.split('@').skip(1) {
        let maybe_num = section
            .chars()
            .take_while(|c| c.is_numeric())
            .collect::<String>()
            .parse::<usize>()
            .ok();

        if let Some(num) = maybe_num {
            // Skip the marker line itself; only the remainder is source.
            let prog_src = section
                .chars()
                .skip_while(|&c| c != '\n')
                .skip(1)
                .collect::<String>();

            match parse_program(&prog_src) {
                Ok(prog) => {
                    save.insert(num, prog);
                }
                Err(errs) => {
                    errors.insert(num, errs);
                }
            }
        }
    }

    if !errors.is_empty() {
        Err(errors)
    } else {
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save() {
        let save = parse_save("@0\nADD 1\n@1\nADD 1\n").unwrap();
        assert_eq!(save.len(), 2);
    }

    #[test]
    fn test_parse_save_ignores_preamble() {
        let save = parse_save("# this node intentionally left blank\n@0\nNOP\n").unwrap();
        assert_eq!(save.len(), 1);
    }

    #[test]
    fn test_parse_save_collects_node_errors() {
        let errs = parse_save("@0\nJMP nowhere\n").unwrap_err();
        assert!(errs.contains_key(&0));
    }
}
