//! The reference scanner.
//!
//! Scans OpenSCAD source text for `include`, `use`, and `import` directives
//! and nothing else. The scanner is a byte cursor over the text: it tracks
//! comments and string literals so directives inside them are never
//! produced, matches keywords on identifier boundaries only, and reports
//! malformed directives with the 1-based line they start on.
//!
//! Pure function of the text; no filesystem access.

use crate::core::reference::{RefKind, Reference};
use crate::resolver::errors::ScanError;

/// Scan source text for file references, in source order.
pub fn scan(text: &str) -> Result<Vec<Reference>, ScanError> {
    let mut cursor = Cursor::new(text);
    let mut refs = Vec::new();

    while let Some(b) = cursor.peek() {
        match b {
            b'/' if cursor.peek_at(1) == Some(b'/') => cursor.skip_line_comment(),
            // An unterminated block comment swallows the rest of the file;
            // that is not a directive error.
            b'/' if cursor.peek_at(1) == Some(b'*') => cursor.skip_block_comment(),
            // Top-level string: anything inside is not a directive.
            b'"' => cursor.skip_string_lenient(),
            b if is_ident_start(b) => {
                let start = cursor.pos;
                let line = cursor.line;
                let word = cursor.take_ident(text);
                match word {
                    "include" => {
                        scan_path_directive(&mut cursor, text, RefKind::Include, start, line, &mut refs)?
                    }
                    "use" => {
                        scan_path_directive(&mut cursor, text, RefKind::Use, start, line, &mut refs)?
                    }
                    "import" => scan_import(&mut cursor, text, start, line, &mut refs)?,
                    _ => {}
                }
            }
            // Consume a whole number-ish token so `2include` is not a keyword.
            b if b.is_ascii_digit() => {
                while cursor.peek().is_some_and(is_ident_char) {
                    cursor.bump();
                }
            }
            _ => {
                cursor.bump();
            }
        }
    }

    Ok(refs)
}

/// `include <path>` / `use <path>`, plus the quoted `include "path"` form.
///
/// A keyword not followed by either path form is not a directive and is
/// skipped silently. A path opened but not closed before end of line is a
/// scan error.
fn scan_path_directive(
    cursor: &mut Cursor<'_>,
    text: &str,
    kind: RefKind,
    start: usize,
    line: u32,
    refs: &mut Vec<Reference>,
) -> Result<(), ScanError> {
    cursor.skip_whitespace();

    let close = match cursor.peek() {
        Some(b'<') => b'>',
        Some(b'"') => b'"',
        // Not a directive (e.g. an identifier named `use` in an
        // expression); rescan from here.
        _ => return Ok(()),
    };
    cursor.bump();

    let path_start = cursor.pos;
    loop {
        match cursor.peek() {
            None | Some(b'\n') | Some(b'\r') => {
                return Err(ScanError::UnterminatedPath { kind, line });
            }
            Some(b'\\') if close == b'"' => {
                // Escaped character in the quoted form
                cursor.bump();
                cursor.bump();
            }
            Some(b) if b == close => {
                let path = &text[path_start..cursor.pos];
                cursor.bump();
                let directive = &text[start..cursor.pos];
                refs.push(Reference::literal(kind, path, line, directive));
                return Ok(());
            }
            Some(_) => {
                cursor.bump();
            }
        }
    }
}

/// `import("path")`, `import(file = "path", ...)`, or a runtime-computed
/// argument expression.
fn scan_import<'a>(
    cursor: &mut Cursor<'a>,
    text: &'a str,
    start: usize,
    line: u32,
    refs: &mut Vec<Reference>,
) -> Result<(), ScanError> {
    cursor.skip_whitespace();

    if cursor.peek() != Some(b'(') {
        // `import` without a call is not a directive
        return Ok(());
    }
    cursor.bump();
    cursor.skip_whitespace();

    let arg_start = cursor.pos;

    // Optional `file =` prefix before the path argument. Probe on a copy:
    // `import(file)` is a plain expression, not the named form.
    if cursor.peek().is_some_and(is_ident_start) {
        let mut probe = *cursor;
        let word = probe.take_ident(text);
        if word == "file" {
            probe.skip_whitespace();
            if probe.peek() == Some(b'=') {
                probe.bump();
                probe.skip_whitespace();
                *cursor = probe;
            }
        }
    }

    if cursor.peek() == Some(b'"') {
        let string_line = cursor.line;
        cursor.bump();
        let path_start = cursor.pos;
        let path_end = loop {
            match cursor.peek() {
                None => return Err(ScanError::UnterminatedString { line: string_line }),
                Some(b'\\') => {
                    cursor.bump();
                    cursor.bump();
                }
                Some(b'"') => {
                    let end = cursor.pos;
                    cursor.bump();
                    break end;
                }
                Some(_) => {
                    cursor.bump();
                }
            }
        };

        cursor.skip_whitespace();
        match cursor.peek() {
            // A lone string (followed by `,` or `)`) is a literal target
            Some(b',') | Some(b')') => {
                let path = &text[path_start..path_end];
                let end = consume_call_tail(cursor, line)?;
                let directive = &text[start..end];
                refs.push(Reference::literal(RefKind::Import, path, line, directive));
                return Ok(());
            }
            // String followed by an operator (`"a" + ext`): the whole
            // argument is a runtime expression
            _ => {}
        }
    }

    let end = consume_call_tail(cursor, line)?;
    let expr = text[arg_start..end - 1].trim();
    let directive = &text[start..end];
    refs.push(Reference::dynamic(RefKind::Import, expr, line, directive));
    Ok(())
}

/// Consume the remainder of a call up to and including the `)` matching the
/// already-consumed `(`, tracking nested parens, strings, and comments.
/// Returns the position just past the closing paren.
fn consume_call_tail(cursor: &mut Cursor<'_>, line: u32) -> Result<usize, ScanError> {
    let mut depth = 1usize;
    loop {
        match cursor.peek() {
            None => return Err(ScanError::UnterminatedImport { line }),
            Some(b'(') => {
                depth += 1;
                cursor.bump();
            }
            Some(b')') => {
                depth -= 1;
                cursor.bump();
                if depth == 0 {
                    return Ok(cursor.pos);
                }
            }
            Some(b'"') => {
                let string_line = cursor.line;
                cursor.bump();
                loop {
                    match cursor.peek() {
                        None => {
                            return Err(ScanError::UnterminatedString { line: string_line })
                        }
                        Some(b'\\') => {
                            cursor.bump();
                            cursor.bump();
                        }
                        Some(b'"') => {
                            cursor.bump();
                            break;
                        }
                        Some(_) => {
                            cursor.bump();
                        }
                    }
                }
            }
            Some(b'/') if cursor.peek_at(1) == Some(b'/') => cursor.skip_line_comment(),
            Some(b'/') if cursor.peek_at(1) == Some(b'*') => cursor.skip_block_comment(),
            Some(_) => {
                cursor.bump();
            }
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Byte cursor with 1-based line tracking. All consumption goes through
/// `bump` so line counts stay right. Scanning is per byte; UTF-8
/// continuation bytes fall through the default arms untouched.
#[derive(Clone, Copy)]
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.bump() {
            if b == b'\n' {
                return;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.bump();
        self.bump();
        while let Some(b) = self.bump() {
            if b == b'*' && self.peek() == Some(b'/') {
                self.bump();
                return;
            }
        }
    }

    /// Skip a top-level string; EOF before the closing quote just ends the
    /// scan.
    fn skip_string_lenient(&mut self) {
        self.bump();
        while let Some(b) = self.bump() {
            match b {
                b'\\' => {
                    self.bump();
                }
                b'"' => return,
                _ => {}
            }
        }
    }

    fn take_ident(&mut self, text: &'a str) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        &text[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::TargetSpec;
    use std::path::Path;

    fn literal_paths(refs: &[Reference]) -> Vec<&Path> {
        refs.iter().filter_map(|r| r.literal_path()).collect()
    }

    #[test]
    fn test_include_and_use_angle_form() {
        let refs = scan(
            "include <gears/involute.scad>\n\
             use <MCAD/bearing.scad>\n",
        )
        .unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind(), RefKind::Include);
        assert_eq!(refs[0].literal_path(), Some(Path::new("gears/involute.scad")));
        assert_eq!(refs[0].line(), 1);
        assert_eq!(refs[1].kind(), RefKind::Use);
        assert_eq!(refs[1].literal_path(), Some(Path::new("MCAD/bearing.scad")));
        assert_eq!(refs[1].line(), 2);
    }

    #[test]
    fn test_quoted_include_form() {
        let refs = scan("include \"local/part.scad\";\n").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].literal_path(), Some(Path::new("local/part.scad")));
    }

    #[test]
    fn test_no_space_before_angle() {
        let refs = scan("use<lib.scad>").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind(), RefKind::Use);
    }

    #[test]
    fn test_import_literal_string() {
        let refs = scan("import(\"motor_mount.stl\");\n").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind(), RefKind::Import);
        assert!(!refs[0].is_dynamic());
        assert_eq!(refs[0].literal_path(), Some(Path::new("motor_mount.stl")));
    }

    #[test]
    fn test_import_named_file_argument() {
        let refs = scan("import(file = \"logo.svg\", convexity = 3);").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].literal_path(), Some(Path::new("logo.svg")));
        assert_eq!(refs[0].directive(), "import(file = \"logo.svg\", convexity = 3)");
    }

    #[test]
    fn test_import_variable_is_dynamic() {
        let refs = scan("import(part_file);").unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_dynamic());
        match refs[0].target() {
            TargetSpec::Dynamic(expr) => assert_eq!(expr, "part_file"),
            other => panic!("expected dynamic, got {:?}", other),
        }
    }

    #[test]
    fn test_import_call_expression_is_dynamic() {
        let refs = scan("import(str(\"part_\", i, \".stl\"));").unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_dynamic());
    }

    #[test]
    fn test_import_string_concat_is_dynamic() {
        let refs = scan("import(\"part_\" + suffix);").unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_dynamic());
    }

    #[test]
    fn test_directives_in_comments_ignored() {
        let refs = scan(
            "// include <commented.scad>\n\
             /* use <also_commented.scad>\n\
                import(\"nope.stl\") */\n\
             include <real.scad>\n",
        )
        .unwrap();

        assert_eq!(literal_paths(&refs), vec![Path::new("real.scad")]);
        assert_eq!(refs[0].line(), 4);
    }

    #[test]
    fn test_directives_in_strings_ignored() {
        let refs = scan("echo(\"include <fake.scad>\");\nuse <real.scad>\n").unwrap();
        assert_eq!(literal_paths(&refs), vec![Path::new("real.scad")]);
    }

    #[test]
    fn test_keyword_needs_identifier_boundary() {
        let refs = scan("myinclude <not_a_ref.scad>\nreuse <nor_this.scad>\n").unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_keyword_without_path_is_not_a_directive() {
        // `use` as a plain word; scanning continues fine past it
        let refs = scan("also use this phrase\ninclude <yes.scad>\n").unwrap();
        assert_eq!(literal_paths(&refs), vec![Path::new("yes.scad")]);
    }

    #[test]
    fn test_unterminated_include_path() {
        let err = scan("cube(1);\ninclude <broken.scad\ncube(2);\n").unwrap_err();
        assert_eq!(
            err,
            ScanError::UnterminatedPath {
                kind: RefKind::Include,
                line: 2
            }
        );
    }

    #[test]
    fn test_unterminated_import_call() {
        let err = scan("import(\"x.stl\"").unwrap_err();
        assert_eq!(err, ScanError::UnterminatedImport { line: 1 });
    }

    #[test]
    fn test_unterminated_string_in_import() {
        let err = scan("import(\"x.stl);\n").unwrap_err();
        assert_eq!(err, ScanError::UnterminatedString { line: 1 });
    }

    #[test]
    fn test_unterminated_block_comment_is_permissive() {
        let refs = scan("use <kept.scad>\n/* include <gone.scad>\n").unwrap();
        assert_eq!(literal_paths(&refs), vec![Path::new("kept.scad")]);
    }

    #[test]
    fn test_multiline_import_keeps_directive_line() {
        let refs = scan("cube(1);\nimport(\n  \"spread.stl\"\n);\n").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].line(), 2);
        assert_eq!(refs[0].literal_path(), Some(Path::new("spread.stl")));
    }

    #[test]
    fn test_empty_input() {
        assert!(scan("").unwrap().is_empty());
    }

    #[test]
    fn test_reference_order_is_source_order() {
        let refs = scan(
            "use <a.scad>\n\
             import(\"b.stl\");\n\
             include <c.scad>\n",
        )
        .unwrap();
        let kinds: Vec<_> = refs.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec![RefKind::Use, RefKind::Import, RefKind::Include]);
    }

    #[test]
    fn test_unicode_in_comments_and_strings() {
        let refs = scan(
            "// schräge Fase — see docs\n\
             echo(\"größe\");\n\
             include <teil.scad>\n",
        )
        .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].line(), 3);
    }

    #[test]
    fn test_nested_parens_in_dynamic_import() {
        let refs = scan("import(pick(idx, (a + b)));").unwrap();
        assert_eq!(refs.len(), 1);
        match refs[0].target() {
            TargetSpec::Dynamic(expr) => assert_eq!(expr, "pick(idx, (a + b))"),
            other => panic!("expected dynamic, got {:?}", other),
        }
    }
}
