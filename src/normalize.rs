//! Filename normalization.
//!
//! Turns an arbitrary filename into a filesystem-safe one: Cyrillic letters are
//! transliterated to Latin, and every digit, space or shell-hostile symbol in
//! the base name becomes `_`. The extension is carried over verbatim so the
//! file keeps its type and the casing the user gave it.
//!
//! # Examples
//!
//! ```
//! use desksort::normalize::normalize;
//!
//! assert_eq!(normalize("Привіт.TXT"), "Privit.TXT");
//! assert_eq!(normalize("my file (2).pdf"), "my_file____.pdf");
//! ```

/// Lowercase Cyrillic letters and their Latin substitutes.
const CYRILLIC_TO_LATIN: [(char, &str); 37] = [
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "e"),
    ('ж', "j"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
    ('є', "je"),
    ('і', "i"),
    ('ї', "ji"),
    ('ґ', "g"),
];

/// Symbols that are never kept in a base name.
const INVALID_SYMBOLS: &str = " !@#$%^*()&+-=";

/// Looks up the Latin substitute for a single character.
///
/// Returns the substitute and whether the source letter was uppercase.
fn latin_for(ch: char) -> Option<(&'static str, bool)> {
    if let Some((_, latin)) = CYRILLIC_TO_LATIN.iter().find(|(c, _)| *c == ch) {
        return Some((latin, false));
    }

    let mut lower = ch.to_lowercase();
    let lower_ch = lower.next()?;
    if lower.next().is_some() || lower_ch == ch {
        return None;
    }

    CYRILLIC_TO_LATIN
        .iter()
        .find(|(c, _)| *c == lower_ch)
        .map(|(_, latin)| (*latin, true))
}

/// Transliterates Cyrillic letters to Latin, keeping everything else as is.
///
/// Uppercase letters produce a capitalized substitute, so `"Щука"` becomes
/// `"Schuka"` and `"Я"` becomes `"Ya"`. Soft and hard signs are dropped.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars() {
        match latin_for(ch) {
            Some((latin, false)) => out.push_str(latin),
            Some((latin, true)) => {
                let mut letters = latin.chars();
                if let Some(first) = letters.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(letters.as_str());
                }
            }
            None => out.push(ch),
        }
    }

    out
}

/// Splits a name into base and extension.
///
/// Only a name with exactly one dot has an extension. Names with several
/// dots (`"a.b.txt"`) or none are treated as a bare base name, as is a name
/// whose single dot is the last character (`"file."`).
///
/// ```
/// use desksort::normalize::split_extension;
///
/// assert_eq!(split_extension("photo.jpg"), ("photo", Some("jpg")));
/// assert_eq!(split_extension(".env"), ("", Some("env")));
/// assert_eq!(split_extension("a.b.txt"), ("a.b.txt", None));
/// assert_eq!(split_extension("file."), ("file", None));
/// ```
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let mut parts = name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(ext), None) if ext.is_empty() => (base, None),
        (Some(base), Some(ext), None) => (base, Some(ext)),
        _ => (name, None),
    }
}

/// Returns the text after the last dot, or `""` when there is no dot.
///
/// This is the extension used for classification; unlike
/// [`split_extension`] it ignores how many dots the name contains.
pub fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

fn is_invalid(ch: char) -> bool {
    ch.is_numeric() || is_cyrillic(ch) || INVALID_SYMBOLS.contains(ch)
}

fn is_cyrillic(ch: char) -> bool {
    matches!(ch, '\u{0400}'..='\u{04FF}')
}

/// Normalizes a filename to a safe character set.
///
/// The whole name is transliterated first, then split with
/// [`split_extension`]. Every digit, remaining Cyrillic character, space or
/// one of `!@#$%^*()&+-=` in the base name is replaced by `_`. The extension
/// is appended untouched.
///
/// `normalize` is idempotent: feeding its output back in returns the same
/// string.
pub fn normalize(filename: &str) -> String {
    let transliterated = transliterate(filename);
    let (base, extension) = split_extension(&transliterated);

    let mut normalized: String = base
        .chars()
        .map(|ch| if is_invalid(ch) { '_' } else { ch })
        .collect();

    if let Some(ext) = extension {
        normalized.push('.');
        normalized.push_str(ext);
    }

    normalized
}
