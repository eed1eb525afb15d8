//! Tokenises the source text assigned to a single compute node into labelled
//! lines of lexemes, ready for the parser in [`crate::parse`].

/// A label and the index of the instruction that it refers to.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label(pub String, pub usize);

/// A lexed source line: its 1-based line number within the node's section,
/// an optional label, and the words that make up an instruction (empty if
/// the line held only a label, a comment, or nothing at all).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Line(pub usize, pub Option<Label>, pub Vec<String>);

/// Split a compute node's source text into lines of labels and lexemes.
///
/// Labels attach to the instruction about to be emitted; a label on a line
/// with no instruction attaches to whichever instruction comes next (or, if
/// none follows, to a synthetic trailing `NOP` inserted by the parser).
pub fn lex_program(src: &str) -> Vec<Line> {
    let mut next_op = 0;
    let mut lines = Vec::new();

    for (index, line) in src.lines().enumerate() {
        let (maybe_label, words) = lex_line(line);
        let label = maybe_label.map(|name| Label(name, next_op));

        if !words.is_empty() {
            next_op += 1;
        }

        lines.push(Line(index + 1, label, words));
    }

    lines
}

/// Lex a single line of source code.
fn lex_line(line: &str) -> (Option<String>, Vec<String>) {
    let mut label = None;
    let mut words = Vec::new();
    let mut word = String::new();

    for c in line.to_uppercase().chars() {
        if is_comment_delimiter(c) {
            break;
        } else if is_whitespace(c) {
            if !word.is_empty() {
                words.push(word.clone());
                word.clear();
            }
        } else if label.is_some() || !is_label_delimiter(c) {
            word.push(c);
        } else {
            label = Some(word.clone());
            word.clear();
        }
    }

    if !word.is_empty() {
        words.push(word);
    }

    (label, words)
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == ','
}

fn is_comment_delimiter(c: char) -> bool {
    c == '#'
}

fn is_label_delimiter(c: char) -> bool {
    c == ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_whitespace() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace(','));
        assert!(!is_whitespace('1'));
        assert!(!is_whitespace('A'));
    }

    #[test]
    fn test_is_comment_delimiter() {
        assert!(is_comment_delimiter('#'));
        assert!(!is_comment_delimiter('1'));
    }

    #[test]
    fn test_is_label_delimiter() {
        assert!(is_label_delimiter(':'));
        assert!(!is_label_delimiter('1'));
    }

    #[test]
    fn test_lex_line() {
        let (lbl, lex) = lex_line("LABEL: MOV UP ACC # comment");
        assert_eq!(lbl, Some("LABEL".to_string()));
        assert_eq!(lex, vec!["MOV", "UP", "ACC"]);

        let (lbl, lex) = lex_line("ADD 1");
        assert_eq!(lbl, None);
        assert_eq!(lex, vec!["ADD", "1"]);

        let (lbl, lex) = lex_line(",,LABEL:,,ADD,1,,,,,");
        assert_eq!(lbl, Some("LABEL".to_string()));
        assert_eq!(lex, vec!["ADD", "1"]);

        let (lbl, lex) = lex_line("# LABEL: MOV UP ACC");
        assert_eq!(lbl, None);
        assert!(lex.is_empty());

        let (lbl, lex) = lex_line("mov left, right");
        assert_eq!(lbl, None);
        assert_eq!(lex, vec!["MOV", "LEFT", "RIGHT"]);
    }

    #[test]
    fn test_lex_program() {
        let lines = lex_program("MOV UP ACC\nADD 1\nMOV ACC DOWN");
        assert_eq!(lines.len(), 3);

        let lines = lex_program("one:\ntwo:\nthree: ADD 1\nfour: ADD 1\n");
        assert_eq!(lines[0].1, Some(Label("ONE".to_string(), 0)));
        assert_eq!(lines[1].1, Some(Label("TWO".to_string(), 0)));
        assert_eq!(lines[2].1, Some(Label("THREE".to_string(), 0)));
        assert_eq!(lines[3].1, Some(Label("FOUR".to_string(), 1)));
    }
}
