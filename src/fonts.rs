use std::collections::HashMap;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::utils::*;

pub(crate) type CharCode = u32;

// Glyph space widths are in thousandths of text space.
const DEFAULT_SIMPLE_WIDTH: f32 = 500.;
const DEFAULT_CID_WIDTH: f32 = 1000.;

// Largest code a simple (one-byte) and a composite (two-byte) font can show.
const MAX_SIMPLE_CODE: CharCode = 0xff;
const MAX_CID_CODE: CharCode = 0xffff;

/// What the text extractor needs from a font: how to split a string into
/// character codes, how to map them to Unicode and how far each one advances
/// the pen. Embedded font programs are never parsed.
#[derive(Debug, Clone)]
pub(crate) struct PdfFont {
    base_name: String,
    composite: bool,
    to_unicode: Option<HashMap<CharCode, String>>,
    widths: HashMap<CharCode, f32>,
    default_width: f32,
}

impl PdfFont {
    pub(crate) fn new(doc: &Document, font: &Dictionary) -> PdfFont {
        let base_name = maybe_get_name(doc, font, b"BaseFont")
            .map(pdf_to_utf8)
            .unwrap_or_default();
        let composite = maybe_get_name(doc, font, b"Subtype") == Some(b"Type0".as_slice());
        let to_unicode = get_unicode_map(doc, font);

        let (widths, default_width) = if composite {
            cid_widths(doc, font)
        } else {
            simple_widths(doc, font)
        };

        debug!(
            "font {} composite={} to_unicode={} widths={}",
            base_name,
            composite,
            to_unicode.is_some(),
            widths.len()
        );

        PdfFont {
            base_name,
            composite,
            to_unicode,
            widths,
            default_width,
        }
    }

    pub(crate) fn get_font_name(&self) -> &str {
        &self.base_name
    }

    /// Split a string operand into character codes. Composite fonts are
    /// assumed to use two-byte codes (`Identity-H` and friends).
    pub(crate) fn char_codes(&self, s: &[u8]) -> Vec<CharCode> {
        if self.composite {
            s.chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => ((*hi as u32) << 8) | *lo as u32,
                    [b] => *b as u32,
                    _ => 0,
                })
                .collect()
        } else {
            s.iter().map(|&b| b as CharCode).collect()
        }
    }

    pub(crate) fn get_width(&self, code: CharCode) -> f32 {
        self.widths
            .get(&code)
            .copied()
            .unwrap_or(self.default_width)
    }

    pub(crate) fn decode(&self, s: &[u8]) -> String {
        let text = match &self.to_unicode {
            Some(map) => self
                .char_codes(s)
                .into_iter()
                .map(|c| match map.get(&c) {
                    Some(s) => s.clone(),
                    None => self.decode_unmapped(c),
                })
                .collect::<String>(),
            None if self.composite => UTF_16BE.decode_without_bom_handling(s).0.into_owned(),
            None => WINDOWS_1252.decode_without_bom_handling(s).0.into_owned(),
        };
        text.nfc().collect()
    }

    fn decode_unmapped(&self, code: CharCode) -> String {
        if self.composite {
            char::from_u32(code).map(String::from).unwrap_or_default()
        } else {
            let byte = [code as u8];
            WINDOWS_1252.decode_without_bom_handling(&byte).0.into_owned()
        }
    }
}

fn get_unicode_map(doc: &Document, font: &Dictionary) -> Option<HashMap<CharCode, String>> {
    let stream = match maybe_get_obj(doc, font, b"ToUnicode")? {
        Object::Stream(stream) => stream,
        other => {
            debug!("ignoring ToUnicode {:?}", other);
            return None;
        }
    };

    let contents = get_contents(stream);
    let cmap = match adobe_cmap_parser::get_unicode_map(&contents) {
        Ok(cmap) => cmap,
        Err(_) => {
            warn!("unreadable ToUnicode cmap, falling back to byte decoding");
            return None;
        }
    };

    let mut unicode = HashMap::new();
    for (&code, bytes) in cmap.iter() {
        let be: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => ((*hi as u16) << 8) | *lo as u16,
                [b] => *b as u16,
                _ => 0,
            })
            .collect();
        // Lone surrogates cannot be represented.
        if let Ok(s) = String::from_utf16(&be) {
            unicode.insert(code, s);
        }
    }
    Some(unicode)
}

fn simple_widths(doc: &Document, font: &Dictionary) -> (HashMap<CharCode, f32>, f32) {
    let mut widths = HashMap::new();
    let first_char = maybe_get_num(doc, font, b"FirstChar").unwrap_or(0.) as CharCode;
    if let Some(array) = maybe_get_array(doc, font, b"Widths") {
        for (i, w) in array.iter().enumerate() {
            let Some(code) = CharCode::try_from(i)
                .ok()
                .and_then(|i| first_char.checked_add(i))
                .filter(|&c| c <= MAX_SIMPLE_CODE)
            else {
                break;
            };
            if let Some(w) = maybe_deref(doc, w).and_then(as_num) {
                widths.insert(code, w);
            }
        }
    }

    let missing = maybe_get_dict(doc, font, b"FontDescriptor")
        .and_then(|desc| maybe_get_num(doc, desc, b"MissingWidth"))
        .filter(|w| *w > 0.)
        .unwrap_or(DEFAULT_SIMPLE_WIDTH);

    (widths, missing)
}

/// Parse the `W` array of the descendant font: runs of
/// `c [w1 w2 ...]` and `c_first c_last w`.
fn cid_widths(doc: &Document, font: &Dictionary) -> (HashMap<CharCode, f32>, f32) {
    let mut widths = HashMap::new();
    let Some(descendant) = maybe_get_array(doc, font, b"DescendantFonts")
        .and_then(|d| d.first())
        .and_then(|d| maybe_deref(doc, d))
        .and_then(|d| d.as_dict().ok())
    else {
        return (widths, DEFAULT_CID_WIDTH);
    };

    let default_width = maybe_get_num(doc, descendant, b"DW").unwrap_or(DEFAULT_CID_WIDTH);
    let Some(w) = maybe_get_array(doc, descendant, b"W") else {
        return (widths, default_width);
    };

    let mut i = 0;
    while i < w.len() {
        let Some(first) = as_num(&w[i]) else {
            break;
        };
        let first = first as CharCode;
        match w.get(i + 1).and_then(|o| maybe_deref(doc, o)) {
            Some(Object::Array(run)) => {
                for (j, width) in run.iter().enumerate() {
                    let Some(code) = CharCode::try_from(j)
                        .ok()
                        .and_then(|j| first.checked_add(j))
                        .filter(|&c| c <= MAX_CID_CODE)
                    else {
                        break;
                    };
                    if let Some(width) = as_num(width) {
                        widths.insert(code, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(width)) = (as_num(last), w.get(i + 2).and_then(as_num))
                else {
                    break;
                };
                for code in first..=(last as CharCode).min(MAX_CID_CODE) {
                    widths.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }

    (widths, default_width)
}
