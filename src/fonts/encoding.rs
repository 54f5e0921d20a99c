//! Text folding for the built-in PDF fonts, which only encode Windows-1252.

use std::borrow::Cow;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters of the 0x80-0x9F block that Windows-1252 assigns.
const WIN1252_EXTRAS: &[char] = &[
    '€', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', 'Ž', '‘', '’', '“', '”', '•', '–',
    '—', '˜', '™', 'š', '›', 'œ', 'ž', 'Ÿ',
];

/// Whether `ch` can be drawn with a built-in font.
pub fn is_win1252(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | ' '..='~' | '\u{A0}'..='\u{FF}') || WIN1252_EXTRAS.contains(&ch)
}

fn substitute(ch: char) -> Option<&'static str> {
    Some(match ch {
        '→' => "->",
        '←' => "<-",
        '✓' | '✔' => "v",
        '≈' => "~",
        _ => return None,
    })
}

/// Replaces characters the built-in fonts cannot encode.
///
/// Accented letters lose their accent (`ș` becomes `s`), a few symbols get ASCII stand-ins and
/// anything else becomes `?`. Text that is already encodable is borrowed unchanged.
pub fn fold_to_win1252(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_win1252) {
        return Cow::Borrowed(text);
    }

    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_win1252(ch) {
            folded.push(ch);
            continue;
        }
        if let Some(replacement) = substitute(ch) {
            folded.push_str(replacement);
            continue;
        }

        let base: String = std::iter::once(ch)
            .nfd()
            .filter(|c| !is_combining_mark(*c) && is_win1252(*c))
            .collect();
        if base.is_empty() {
            folded.push('?');
        } else {
            folded.push_str(&base);
        }
    }
    Cow::Owned(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_text_is_borrowed() {
        let text = "Îmbunătățiri";
        assert!(matches!(fold_to_win1252("Café — 5 min"), Cow::Borrowed(_)));
        assert!(matches!(fold_to_win1252(text), Cow::Owned(_)));
    }

    #[test]
    fn romanian_diacritics_lose_their_marks() {
        assert_eq!(fold_to_win1252("ÎMBUNĂTĂȚIRI CRITICE"), "ÎMBUNATATIRI CRITICE");
        assert_eq!(fold_to_win1252("bebelușului"), "bebelusului");
        assert_eq!(fold_to_win1252("Şi ţara"), "Si tara");
    }

    #[test]
    fn symbols_get_stand_ins() {
        assert_eq!(fold_to_win1252("✓ gata"), "v gata");
        assert_eq!(fold_to_win1252("a → b"), "a -> b");
        assert_eq!(fold_to_win1252("日"), "?");
        assert_eq!(fold_to_win1252("• item"), "• item");
    }
}
