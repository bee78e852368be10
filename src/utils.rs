use encoding_rs::UTF_16BE;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::types::MediaBox;

/// Decode a PDF text string (names, document strings): UTF-16BE when it
/// carries a byte order mark, Latin-1 otherwise.
pub(crate) fn pdf_to_utf8(s: &[u8]) -> String {
    if s.len() > 2 && s[0] == 0xfe && s[1] == 0xff {
        UTF_16BE
            .decode_without_bom_handling(&s[2..])
            .0
            .into_owned()
    } else {
        s.iter().map(|&b| b as char).collect()
    }
}

pub(crate) fn maybe_deref<'a>(doc: &'a Document, o: &'a Object) -> Option<&'a Object> {
    match o {
        &Object::Reference(r) => doc.get_object(r).ok(),
        _ => Some(o),
    }
}

pub(crate) fn maybe_get_obj<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| maybe_deref(doc, o))
}

pub(crate) fn maybe_get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    maybe_get_obj(doc, dict, key).and_then(|o| o.as_dict().ok())
}

pub(crate) fn maybe_get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    maybe_get_obj(doc, dict, key).and_then(|o| o.as_array().ok())
}

pub(crate) fn maybe_get_name<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a [u8]> {
    maybe_get_obj(doc, dict, key).and_then(|o| o.as_name().ok())
}

pub(crate) fn maybe_get_num(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    maybe_get_obj(doc, dict, key).and_then(as_num)
}

pub(crate) fn as_num(o: &Object) -> Option<f32> {
    match o {
        &Object::Integer(i) => Some(i as f32),
        &Object::Real(f) => Some(f as f32),
        _ => None,
    }
}

/// Read the numeric operands of an operator, or `None` if there are fewer
/// than `N` or any of them is not a number.
pub(crate) fn operands<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut out = [0.; N];
    for (slot, o) in out.iter_mut().zip(operands.get(..N)?) {
        *slot = as_num(o)?;
    }
    Some(out)
}

pub(crate) fn get_contents(contents: &Stream) -> Vec<u8> {
    if contents.filters().is_ok() {
        contents
            .decompressed_content()
            .unwrap_or_else(|_| contents.content.clone())
    } else {
        contents.content.clone()
    }
}

/// Look up a page attribute, walking up the page tree for inherited keys.
pub(crate) fn get_inherited<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    if let Some(o) = maybe_get_obj(doc, dict, key) {
        return Some(o);
    }
    let parent = dict
        .get(b"Parent")
        .and_then(|parent| parent.as_reference())
        .and_then(|id| doc.get_dictionary(id))
        .ok()?;
    get_inherited(doc, parent, key)
}

pub(crate) fn page_media_box(doc: &Document, page: &Dictionary) -> MediaBox {
    let rect = get_inherited(doc, page, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .and_then(|a| operands::<4>(a));

    match rect {
        Some([llx, lly, urx, ury]) => MediaBox { llx, lly, urx, ury },
        None => MediaBox::default(),
    }
}

/// Clockwise display rotation of a page in degrees: 0, 90, 180 or 270.
/// Values that are not a multiple of 90 are invalid and read as 0.
pub(crate) fn page_rotation(doc: &Document, page: &Dictionary) -> u16 {
    let rotate = get_inherited(doc, page, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);
    if rotate % 90 == 0 { rotate as u16 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn reads_numeric_operands() {
        let ops = vec![Object::Integer(2), Object::Real(1.5), Object::Integer(7)];
        assert_eq!(operands::<2>(&ops), Some([2.0, 1.5]));
        assert_eq!(operands::<4>(&ops), None);

        let ops = vec![Object::Integer(2), Object::Name(b"F1".to_vec())];
        assert_eq!(operands::<2>(&ops), None);
    }

    #[test]
    fn decodes_pdf_strings() {
        assert_eq!(pdf_to_utf8(b"Helvetica"), "Helvetica");
        assert_eq!(pdf_to_utf8(&[0xfe, 0xff, 0x01, 0x5a]), "Ś");
    }

    #[test]
    fn rotation_is_inherited_and_normalized() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Pages",
            "Rotate" => -90,
        });
        let page = lopdf::dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        assert_eq!(page_rotation(&doc, &page), 270);

        let page = lopdf::dictionary! { "Rotate" => 450 };
        assert_eq!(page_rotation(&doc, &page), 90);

        let page = lopdf::dictionary! { "Rotate" => 45 };
        assert_eq!(page_rotation(&doc, &page), 0);
    }
}
