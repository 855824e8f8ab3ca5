//! Cell comparison.
//!
//! Two cells that both parse as numbers compare numerically. Anything else compares
//! with a Norwegian-flavoured collation key. Numbers sort before blanks, blanks
//! before text, so mixed columns still get a total order.

use std::cmp::Ordering;

/// Parses a cell as a number.
///
/// Accepts an optional sign, decimals and an exponent. ASCII spaces, NBSP and
/// narrow NBSP are taken as digit group separators, and a single `,` is read as
/// the decimal separator when no `.` is present. Blank text is not a number.
pub fn parse_number(text: &str) -> Option<f64> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if compact.is_empty() {
        return None;
    }

    let normalized = if !compact.contains('.') && compact.matches(',').count() == 1 {
        compact.replace(',', ".")
    } else {
        compact
    };

    // f64::from_str also takes "inf"/"nan", which are not numbers in a table cell.
    let well_formed = normalized.chars().any(|c| c.is_ascii_digit())
        && normalized
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !well_formed {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

const CLASS_SPACE: u32 = 0;
const CLASS_PUNCT: u32 = 1;
const CLASS_DIGIT: u32 = 2;
const CLASS_LETTER: u32 = 3;
const CLASS_OTHER: u32 = 4;

fn weight(class: u32, value: u32) -> u32 {
    (class << 24) | value
}

/// Base letters (lowercase) a character sorts as, and whether it carried an accent.
fn fold_letter(c: char) -> Option<(&'static str, bool)> {
    let folded = match c {
        'a'..='z' | 'A'..='Z' => return None,
        'æ' | 'Æ' | 'ä' | 'Ä' => ("æ", c == 'ä' || c == 'Ä'),
        'ø' | 'Ø' | 'ö' | 'Ö' => ("ø", c == 'ö' || c == 'Ö'),
        'å' | 'Å' => ("å", false),
        'à' | 'á' | 'â' | 'ã' | 'À' | 'Á' | 'Â' | 'Ã' => ("a", true),
        'ç' | 'Ç' => ("c", true),
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => ("e", true),
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => ("i", true),
        'ñ' | 'Ñ' => ("n", true),
        'ò' | 'ó' | 'ô' | 'õ' | 'Ò' | 'Ó' | 'Ô' | 'Õ' => ("o", true),
        'ù' | 'ú' | 'û' | 'Ù' | 'Ú' | 'Û' => ("u", true),
        'ü' | 'Ü' => ("y", true),
        'ý' | 'ÿ' | 'Ý' => ("y", true),
        'ß' => ("ss", false),
        _ => return None,
    };
    Some(folded)
}

fn letter_weight(base: char) -> u32 {
    match base {
        'a'..='z' => weight(CLASS_LETTER, base as u32 - 'a' as u32),
        'æ' => weight(CLASS_LETTER, 26),
        'ø' => weight(CLASS_LETTER, 27),
        'å' => weight(CLASS_LETTER, 28),
        _ => weight(CLASS_OTHER, base as u32),
    }
}

/// Sort key for text cells. Compared level by level: base letters, then accents,
/// then case (lowercase first), then the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollationKey {
    primary: Vec<u32>,
    secondary: Vec<u8>,
    tertiary: Vec<u8>,
    raw: String,
}

impl CollationKey {
    pub fn new(text: &str) -> Self {
        let mut primary = Vec::with_capacity(text.len());
        let mut secondary = Vec::with_capacity(text.len());
        let mut tertiary = Vec::with_capacity(text.len());

        for c in text.chars() {
            let upper = u8::from(c.is_uppercase());
            if c.is_ascii_alphabetic() {
                primary.push(letter_weight(c.to_ascii_lowercase()));
                secondary.push(0);
                tertiary.push(upper);
            } else if let Some((base, accented)) = fold_letter(c) {
                for b in base.chars() {
                    primary.push(letter_weight(b));
                    secondary.push(u8::from(accented));
                    tertiary.push(upper);
                }
            } else if let Some(d) = c.to_digit(10) {
                primary.push(weight(CLASS_DIGIT, d));
                secondary.push(0);
                tertiary.push(0);
            } else if c.is_whitespace() {
                primary.push(weight(CLASS_SPACE, c as u32));
                secondary.push(0);
                tertiary.push(0);
            } else if c.is_ascii_punctuation() || c.is_ascii_graphic() {
                primary.push(weight(CLASS_PUNCT, c as u32));
                secondary.push(0);
                tertiary.push(0);
            } else {
                let lower = c.to_lowercase().next().unwrap_or(c);
                primary.push(weight(CLASS_OTHER, lower as u32));
                secondary.push(0);
                tertiary.push(upper);
            }
        }

        Self {
            primary,
            secondary,
            tertiary,
            raw: text.to_string(),
        }
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then_with(|| self.secondary.cmp(&other.secondary))
            .then_with(|| self.tertiary.cmp(&other.tertiary))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two text cells by collation.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

/// Per-cell sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum CellKey {
    /// `None` is a blank cell; it sorts after every number and before any text.
    Number(Option<f64>),
    Text(CollationKey),
}

impl CellKey {
    pub fn new(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            return CellKey::Number(None);
        }
        parse_number(cell).map_or_else(
            || CellKey::Text(CollationKey::new(cell)),
            |n| CellKey::Number(Some(n)),
        )
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Number(a), CellKey::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            (CellKey::Text(a), CellKey::Text(b)) => a.cmp(b),
            (CellKey::Number(_), CellKey::Text(_)) => Ordering::Less,
            (CellKey::Text(_), CellKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Compares two cell texts.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    CellKey::new(a).compare(&CellKey::new(b))
}

/// Builds the sort keys of one column.
pub fn column_keys(cells: &[&str]) -> Vec<CellKey> {
    cells.iter().map(|cell| CellKey::new(cell)).collect()
}
