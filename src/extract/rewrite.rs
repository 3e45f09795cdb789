use std::sync::LazyLock;

use regex::Regex;

static VAR_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*var\s+[A-Za-z0-9_]+\s*=\s*").unwrap());
static TRAILER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\};.*").unwrap());
static SLOPPY_KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9]):([0-9])").unwrap());

/// Coerce a JavaScript object-literal source toward a YAML/JSON document.
///
/// This is syntax-noise removal, not a semantic transform: comments go,
/// the `var name =` wrapper goes, trailing script statements after the
/// closing `};` go, and tab indentation becomes spaces so a line-oriented
/// parser can cope. Idempotent on already-clean JSON.
///
/// Known limitation: the `:digit` respacing also fires inside string values
/// (e.g. `"host:5349"`), matching the published report format.
pub fn rewrite(source: &str) -> String {
    let text = strip_comments(source);
    let text = VAR_DECL.replace_all(&text, "");
    let text = text.replace('\t', "    ");
    let text = TRAILER.replace(&text, "}");
    SLOPPY_KEY_VALUE
        .replace_all(&text, "${1}: ${2}")
        .into_owned()
}

/// Remove `//` and `/* */` comments that occur outside string literals.
///
/// A character scanner rather than regexes: `//` inside a quoted URL is
/// data, not a comment. Trailing whitespace left in front of a removed
/// comment is dropped with it.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
                trim_trailing_blanks(&mut out);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                trim_trailing_blanks(&mut out);
            }
            _ => out.push(c),
        }
    }
    out
}

fn trim_trailing_blanks(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_var_declaration_and_trailer() {
        let source = "var config = {\n    a: 1,\n};\nconfig.b = 2;\n";
        assert_eq!(rewrite(source), "{\n    a: 1,\n}");
    }

    #[test]
    fn expands_tabs_and_respaces_sloppy_pairs() {
        let source = "{\n\tport:5349,\n}";
        assert_eq!(rewrite(source), "{\n    port: 5349,\n}");
    }

    #[test]
    fn removes_line_and_block_comments_outside_strings() {
        let source = concat!(
            "// leading comment\n",
            "var config = {\n",
            "    /* block */ a: 1, // trailing\n",
            "    /* multi\n",
            "       line */\n",
            "    b: 2,\n",
            "};\n",
        );
        let cleaned = rewrite(source);
        assert!(!cleaned.contains("//"));
        assert!(!cleaned.contains("/*"));
        assert!(cleaned.contains("a: 1,"));
        assert!(cleaned.contains("b: 2,"));
    }

    #[test]
    fn double_slash_inside_string_is_preserved() {
        let source = "var config = {\n    url: 'https://meet.example.org/path' // note\n};";
        let cleaned = rewrite(source);
        assert!(cleaned.contains("'https://meet.example.org/path'"));
        assert!(!cleaned.contains("note"));
    }

    #[test]
    fn idempotent_on_clean_json() {
        let clean = "{\n    \"hosts\": {\n        \"domain\": \"meet.example.org\"\n    }\n}";
        let once = rewrite(clean);
        assert_eq!(once, clean);
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn rewriting_is_a_fixed_point_after_one_pass() {
        let source = "var config = {\n\ta:1, // x\n};";
        let once = rewrite(source);
        assert_eq!(rewrite(&once), once);
    }
}
