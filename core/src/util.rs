use std::borrow::Cow;

/// Removes all code points that are not allowed in XML 1.0 documents
/// (<https://www.w3.org/TR/REC-xml/#NT-Char>).
///
/// Dirty exports from biological databases sometimes contain stray
/// control characters which would make the generated XGMML unparsable,
/// so every header and data field is passed through this filter before
/// it is used. Tab, line feed and carriage return are kept.
pub fn remove_invalid_xml_chars(s: &str) -> Cow<str> {
    if s.chars().all(is_valid_xml_char) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| is_valid_xml_char(*c)).collect())
}

fn is_valid_xml_char(c: char) -> bool {
    // Rust chars are Unicode scalar values, so the surrogate range of
    // the XML Char production cannot occur here.
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
