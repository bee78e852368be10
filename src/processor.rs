use std::collections::HashMap;
use std::rc::Rc;

use euclid::Transform2D;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, trace, warn};

use crate::error::PlanError;
use crate::fonts::PdfFont;
use crate::types::{Fragment, MediaBox, Transform};
use crate::utils::*;

// A TJ adjustment wider than this (in thousandths of an em) reads as a word
// gap.
const TJ_SPACE_THRESHOLD: f32 = 250.;

// Form XObjects nested deeper than this are skipped. Guards against forms
// that draw themselves.
const MAX_FORM_DEPTH: usize = 16;

#[derive(Clone)]
pub(crate) struct TextState {
    pub(crate) font: Option<Rc<PdfFont>>,
    pub(crate) font_size: f32,
    pub(crate) character_spacing: f32,
    pub(crate) word_spacing: f32,
    pub(crate) horizontal_scaling: f32,
    pub(crate) leading: f32,
    pub(crate) rise: f32,
    pub(crate) tm: Transform,
}

#[derive(Clone)]
pub(crate) struct GraphicsState {
    pub(crate) ctm: Transform,
    pub(crate) ts: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            ctm: Transform2D::identity(),
            ts: TextState {
                font: None,
                font_size: f32::NAN,
                character_spacing: 0.,
                word_spacing: 0.,
                horizontal_scaling: 1.,
                leading: 0.,
                rise: 0.,
                tm: Transform2D::identity(),
            },
        }
    }
}

/// Collects one fragment per text-showing operator, converted from PDF user
/// space to layout units measured from the top-left corner of the page as a
/// viewer displays it, page rotation included.
pub(crate) struct FragmentSink {
    units_per_point: f64,
    media_box: MediaBox,
    rotation: u16,
    page: u32,
    fragments: Vec<Fragment>,
}

impl FragmentSink {
    pub(crate) fn new(units_per_point: f64) -> FragmentSink {
        FragmentSink {
            units_per_point,
            media_box: MediaBox::default(),
            rotation: 0,
            page: 0,
            fragments: Vec::new(),
        }
    }

    pub(crate) fn begin_page(&mut self, page: u32, media_box: MediaBox, rotation: u16) {
        debug!(
            "page {} is {}x{} pt, rotated {}",
            page,
            media_box.urx - media_box.llx,
            media_box.ury - media_box.lly,
            rotation
        );
        self.page = page;
        self.media_box = media_box;
        self.rotation = rotation;
    }

    /// Map a user space point to the displayed page, origin top-left.
    fn display_point(&self, x: f32, y: f32) -> (f32, f32) {
        let mb = &self.media_box;
        let (u, v) = (x - mb.llx, y - mb.lly);
        let (w, h) = (mb.urx - mb.llx, mb.ury - mb.lly);
        match self.rotation {
            90 => (v, u),
            180 => (w - u, v),
            270 => (h - v, w - u),
            _ => (u, h - v),
        }
    }

    fn push(&mut self, text: &str, x: f32, y: f32) {
        let (x, y) = self.display_point(x, y);
        let fragment = Fragment {
            text: text.trim().to_string(),
            x: x as f64 * self.units_per_point,
            y: y as f64 * self.units_per_point,
            page: self.page,
        };
        trace!("{}", fragment);
        self.fragments.push(fragment);
    }

    pub(crate) fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }
}

/// Text origin in user space: Trm = Tsm × Tm × CTM applied to (0, 0).
fn text_origin(gs: &GraphicsState) -> (f32, f32) {
    let ts = &gs.ts;
    let tsm: Transform = Transform2D::new(ts.horizontal_scaling, 0., 0., 1., 0., ts.rise);
    let trm = tsm.then(&ts.tm).then(&gs.ctm);
    (trm.m31, trm.m32)
}

/// Move the text matrix past a shown string.
fn advance(ts: &mut TextState, font: &PdfFont, s: &[u8]) {
    let codes = font.char_codes(s);
    // Word spacing only applies to the single-byte code 32.
    let single_byte = codes.len() == s.len();
    let mut tx = 0.;
    for code in codes {
        let w0 = font.get_width(code) / 1000.;
        let mut spacing = ts.character_spacing;
        if code == 32 && single_byte {
            spacing += ts.word_spacing;
        }
        tx += (w0 * ts.font_size + spacing) * ts.horizontal_scaling;
    }
    ts.tm = Transform2D::translation(tx, 0.).then(&ts.tm);
}

fn adjust(ts: &mut TextState, tj: f32) {
    let tx = -tj / 1000. * ts.font_size * ts.horizontal_scaling;
    ts.tm = Transform2D::translation(tx, 0.).then(&ts.tm);
}

fn next_line(gs: &mut GraphicsState, tlm: &mut Transform, tx: f32, ty: f32) {
    *tlm = Transform2D::translation(tx, ty).then(&*tlm);
    gs.ts.tm = *tlm;
}

fn show_text(gs: &mut GraphicsState, s: &[u8], sink: &mut FragmentSink) {
    let Some(font) = gs.ts.font.clone() else {
        warn!("text shown without a font, skipping {} bytes", s.len());
        return;
    };
    let (x, y) = text_origin(gs);
    let text = font.decode(s);
    debug!("{:?} in {} at ({}, {})", text, font.get_font_name(), x, y);
    sink.push(&text, x, y);
    advance(&mut gs.ts, &font, s);
}

/// A TJ array is one fragment: strings are concatenated and numeric
/// adjustments move the pen, with wide gaps read as spaces.
fn show_text_array(gs: &mut GraphicsState, array: &[Object], sink: &mut FragmentSink) {
    let Some(font) = gs.ts.font.clone() else {
        warn!("text array shown without a font, skipping");
        return;
    };
    let (x, y) = text_origin(gs);
    let mut text = String::new();

    for e in array {
        match e {
            Object::String(s, _) => {
                text.push_str(&font.decode(s));
                advance(&mut gs.ts, &font, s);
            }
            Object::Integer(_) | Object::Real(_) => {
                let tj = as_num(e).unwrap_or(0.);
                if tj < -TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                adjust(&mut gs.ts, tj);
            }
            _ => {
                debug!("kind of {:?}", e);
            }
        }
    }

    debug!("{:?} in {} at ({}, {})", text, font.get_font_name(), x, y);
    sink.push(&text, x, y);
}

#[derive(Debug, Default)]
pub(crate) struct Processor {
    fonts: HashMap<Vec<u8>, Rc<PdfFont>>,
}

impl Processor {
    pub(crate) fn new() -> Processor {
        Processor::default()
    }

    fn font(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        name: &[u8],
    ) -> Option<Rc<PdfFont>> {
        if let Some(font) = self.fonts.get(name) {
            return Some(font.clone());
        }
        let dict = maybe_get_dict(doc, resources, b"Font")
            .and_then(|fonts| maybe_get_dict(doc, fonts, name))?;
        let font = Rc::new(PdfFont::new(doc, dict));
        self.fonts.insert(name.to_vec(), font.clone());
        Some(font)
    }

    pub(crate) fn process_stream(
        &mut self,
        doc: &Document,
        content: &[u8],
        resources: &Dictionary,
        sink: &mut FragmentSink,
    ) -> Result<(), PlanError> {
        self.process_content(doc, content, resources, GraphicsState::default(), sink, 0)
    }

    /// Interpret a content stream starting from the graphics state `gs`. Forms
    /// are interpreted with the state in effect at their `Do`, their
    /// `/Matrix` applied on top.
    fn process_content(
        &mut self,
        doc: &Document,
        content: &[u8],
        resources: &Dictionary,
        mut gs: GraphicsState,
        sink: &mut FragmentSink,
        depth: usize,
    ) -> Result<(), PlanError> {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to decode content stream for page {}: {}. Skipping this content.",
                    sink.page, e
                );
                return Ok(());
            }
        };

        let mut gs_stack = Vec::new();
        let mut tlm: Transform = Transform2D::identity();

        for operation in &content.operations {
            let ops = &operation.operands;
            match operation.operator.as_str() {
                "BT" | "ET" => {
                    tlm = Transform2D::identity();
                    gs.ts.tm = tlm;
                }
                "cm" => {
                    if let Some([a, b, c, d, e, f]) = operands::<6>(ops) {
                        gs.ctm = Transform2D::new(a, b, c, d, e, f).then(&gs.ctm);
                    }
                }
                "q" => gs_stack.push(gs.clone()),
                "Q" => match gs_stack.pop() {
                    Some(s) => gs = s,
                    None => warn!("No state to pop"),
                },
                "Tc" => {
                    if let Some([v]) = operands::<1>(ops) {
                        gs.ts.character_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some([v]) = operands::<1>(ops) {
                        gs.ts.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some([v]) = operands::<1>(ops) {
                        gs.ts.horizontal_scaling = v / 100.;
                    }
                }
                "TL" => {
                    if let Some([v]) = operands::<1>(ops) {
                        gs.ts.leading = v;
                    }
                }
                "Ts" => {
                    if let Some([v]) = operands::<1>(ops) {
                        gs.ts.rise = v;
                    }
                }
                "Tf" => {
                    let name = ops.first().and_then(|o| o.as_name().ok());
                    gs.ts.font = name.and_then(|name| self.font(doc, resources, name));
                    if gs.ts.font.is_none() {
                        warn!("unknown font {:?}", name.map(pdf_to_utf8));
                    }
                    gs.ts.font_size = ops.get(1).and_then(as_num).unwrap_or(gs.ts.font_size);
                }
                "Tm" => {
                    if let Some([a, b, c, d, e, f]) = operands::<6>(ops) {
                        tlm = Transform2D::new(a, b, c, d, e, f);
                        gs.ts.tm = tlm;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = operands::<2>(ops) {
                        next_line(&mut gs, &mut tlm, tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = operands::<2>(ops) {
                        gs.ts.leading = -ty;
                        next_line(&mut gs, &mut tlm, tx, ty);
                    }
                }
                "T*" => {
                    let leading = gs.ts.leading;
                    next_line(&mut gs, &mut tlm, 0., -leading);
                }
                "Tj" => {
                    if let Some(Object::String(s, _)) = ops.first() {
                        show_text(&mut gs, s, sink);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(array)) = ops.first() {
                        show_text_array(&mut gs, array, sink);
                    }
                }
                "'" => {
                    let leading = gs.ts.leading;
                    next_line(&mut gs, &mut tlm, 0., -leading);
                    if let Some(Object::String(s, _)) = ops.first() {
                        show_text(&mut gs, s, sink);
                    }
                }
                "\"" => {
                    if let Some([aw, ac]) = operands::<2>(ops) {
                        gs.ts.word_spacing = aw;
                        gs.ts.character_spacing = ac;
                    }
                    let leading = gs.ts.leading;
                    next_line(&mut gs, &mut tlm, 0., -leading);
                    if let Some(Object::String(s, _)) = ops.get(2) {
                        show_text(&mut gs, s, sink);
                    }
                }
                "Do" => {
                    let Some(name) = ops.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    let Some(xf) = maybe_get_dict(doc, resources, b"XObject")
                        .and_then(|x| maybe_get_obj(doc, x, name))
                        .and_then(|o| o.as_stream().ok())
                    else {
                        continue;
                    };
                    if maybe_get_name(doc, &xf.dict, b"Subtype") != Some(b"Form".as_slice()) {
                        continue;
                    }
                    if depth >= MAX_FORM_DEPTH {
                        warn!(
                            "form {:?} nested {} deep, skipping",
                            pdf_to_utf8(name),
                            depth + 1
                        );
                        continue;
                    }

                    let mut form_gs = gs.clone();
                    if let Some([a, b, c, d, e, f]) =
                        maybe_get_array(doc, &xf.dict, b"Matrix").and_then(|m| operands::<6>(m))
                    {
                        form_gs.ctm = Transform2D::new(a, b, c, d, e, f).then(&gs.ctm);
                    }
                    let resources = maybe_get_dict(doc, &xf.dict, b"Resources").unwrap_or(resources);
                    let contents = get_contents(xf);
                    // The form's fonts may reuse resource names of the page.
                    let mut form = Processor::new();
                    form.process_content(doc, &contents, resources, form_gs, sink, depth + 1)?;
                }
                _ => {
                    trace!("unhandled operation {:?}", operation.operator);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(rotation: u16) -> FragmentSink {
        let mut sink = FragmentSink::new(1.);
        let media_box = MediaBox {
            llx: 10.,
            lly: 20.,
            urx: 110.,
            ury: 220.,
        };
        sink.begin_page(1, media_box, rotation);
        sink
    }

    #[test]
    fn display_point_follows_rotation() {
        // 100 wide, 200 tall; the point sits 5 right of and 30 above the
        // lower-left corner.
        assert_eq!(sink(0).display_point(15., 50.), (5., 170.));
        assert_eq!(sink(90).display_point(15., 50.), (30., 5.));
        assert_eq!(sink(180).display_point(15., 50.), (95., 30.));
        assert_eq!(sink(270).display_point(15., 50.), (170., 95.));
    }

    #[test]
    fn fragments_are_scaled_and_trimmed() {
        let mut sink = FragmentSink::new(1. / 16.);
        sink.begin_page(2, MediaBox::default(), 0);
        sink.push("  Kowalski ", 384., 792. - 160.);
        let fragments = sink.into_fragments();
        assert_eq!(fragments, vec![Fragment {
            text: "Kowalski".to_string(),
            x: 24.,
            y: 10.,
            page: 2,
        }]);
    }
}
