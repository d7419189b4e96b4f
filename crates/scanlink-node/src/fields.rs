//! Recipient fields pulled out of a shipping label's recognized text.

/// Phone placeholder when no number is found.
pub const PHONE_NOT_FOUND: &str = "no phone found";

/// Name placeholder when no CJK character is found.
pub const NAME_NOT_FOUND: &str = "unknown";

/// Marker appended to the single name character kept (labels mask the rest).
const NAME_MASK: char = '*';

/// Separator between a landline-style number and its extension ("转").
const EXTENSION_MARK: char = '转';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    pub name: String,
    pub phone: String,
}

/// Extract recipient name and phone from label text.
///
/// Phone: the first `NNNNNNNNNNN转NNNN` virtual number with extension, or the
/// first mainland mobile number (`1[3-9]` followed by nine digits), whichever
/// starts first. Name: the first CJK ideograph after the phone (or anywhere,
/// without one), kept with a mask marker.
pub fn extract_fields(text: &str) -> Fields {
    let phone = find_phone(text);

    let search_from = phone.map(|(_, end)| end).unwrap_or(0);
    let name = text[search_from..]
        .chars()
        .find(|c| is_cjk_ideograph(*c))
        .map(|c| format!("{c}{NAME_MASK}"))
        .unwrap_or_else(|| NAME_NOT_FOUND.to_string());

    let phone = phone
        .map(|(start, end)| text[start..end].to_string())
        .unwrap_or_else(|| PHONE_NOT_FOUND.to_string());

    Fields { name, phone }
}

/// Byte range of the first phone match.
fn find_phone(text: &str) -> Option<(usize, usize)> {
    text.char_indices().find_map(|(start, _)| {
        let rest = &text[start..];
        match_extension_number(rest)
            .or_else(|| match_mobile_number(rest))
            .map(|len| (start, start + len))
    })
}

fn match_extension_number(s: &str) -> Option<usize> {
    let mut len = leading_digits(s, 11)?;
    let rest = &s[len..];
    if !rest.starts_with(EXTENSION_MARK) {
        return None;
    }
    len += EXTENSION_MARK.len_utf8();
    len += leading_digits(&s[len..], 4)?;
    Some(len)
}

fn match_mobile_number(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 11 || bytes[0] != b'1' || !(b'3'..=b'9').contains(&bytes[1]) {
        return None;
    }
    leading_digits(&s[2..], 9).map(|n| n + 2)
}

/// Length in bytes of exactly `count` leading ASCII digits, if present.
fn leading_digits(s: &str, count: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() >= count && bytes[..count].iter().all(u8::is_ascii_digit) {
        Some(count)
    } else {
        None
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_number_then_name() {
        let fields = extract_fields("收件人\n13812345678\n张三\n北京市海淀区");
        assert_eq!(fields.phone, "13812345678");
        assert_eq!(fields.name, "张*");
    }

    #[test]
    fn extension_number_wins_when_it_starts_first() {
        let fields = extract_fields("18400001111转5678 李四 上海");
        assert_eq!(fields.phone, "18400001111转5678");
        assert_eq!(fields.name, "李*");
    }

    #[test]
    fn name_search_falls_back_to_whole_text() {
        let fields = extract_fields("王五 no number here");
        assert_eq!(fields.phone, PHONE_NOT_FOUND);
        assert_eq!(fields.name, "王*");
    }

    #[test]
    fn placeholders_when_nothing_matches() {
        let fields = extract_fields("SHIP TO: 221B BAKER ST");
        assert_eq!(fields.phone, PHONE_NOT_FOUND);
        assert_eq!(fields.name, NAME_NOT_FOUND);
    }

    #[test]
    fn rejects_numbers_with_wrong_prefix() {
        // 12... is not a mobile prefix; the match starts inside the run.
        let fields = extract_fields("121380000111122");
        assert_eq!(fields.phone, "13800001111");
    }

    #[test]
    fn name_must_follow_phone() {
        let fields = extract_fields("赵 13912345678 钱");
        assert_eq!(fields.name, "钱*");
    }

    #[test]
    fn empty_text() {
        let fields = extract_fields("");
        assert_eq!(fields.phone, PHONE_NOT_FOUND);
        assert_eq!(fields.name, NAME_NOT_FOUND);
    }
}
