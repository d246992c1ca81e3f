//! XML document construction

use std::borrow::Cow;
use std::fmt::{self, Display, Write as _};
use std::io;
use std::path::Path;

use glam::Mat4;
use xmlwriter::{Indent, Options, XmlWriter};

/// Finished COLLADA document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument(String);

impl XmlDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Write the document to a `.dae` file
    pub fn save(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.0.as_bytes())
    }
}

impl Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thin layer over [`XmlWriter`] with the COLLADA building blocks
/// (sources, accessors, matrices) shared by every library.
pub(crate) struct ColladaWriter {
    xml: XmlWriter,
}

impl ColladaWriter {
    pub fn new() -> Self {
        let mut xml = XmlWriter::new(Options {
            use_single_quote: false,
            indent: Indent::Spaces(2),
            attributes_indent: Indent::None,
        });
        xml.write_declaration();
        Self { xml }
    }

    pub fn start(&mut self, name: &str) {
        self.xml.start_element(name);
    }

    pub fn end(&mut self) {
        self.xml.end_element();
    }

    /// Attribute whose value is generated (ids, numbers, urls)
    pub fn attr<V: Display + ?Sized>(&mut self, name: &str, value: &V) {
        self.xml.write_attribute(name, value);
    }

    /// Attribute carrying user data such as a bone name
    pub fn attr_text(&mut self, name: &str, value: &str) {
        self.xml.write_attribute(name, escape(value).as_ref());
    }

    pub fn text(&mut self, value: &str) {
        self.xml.write_text(escape(value).as_ref());
    }

    /// `<name>text</name>`
    pub fn leaf(&mut self, name: &str, value: &str) {
        self.start(name);
        self.text(value);
        self.end();
    }

    /// `<name>v0 v1 ...</name>`
    pub fn list<T: Display>(&mut self, name: &str, values: impl IntoIterator<Item = T>) {
        self.start(name);
        self.xml.write_text(&join(values));
        self.end();
    }

    /// `<matrix sid="...">` in COLLADA's row-major order
    pub fn matrix(&mut self, sid: &str, matrix: &Mat4) {
        self.start("matrix");
        self.attr("sid", sid);
        self.xml.write_text(&join(row_major(matrix)));
        self.end();
    }

    /// `<source>` holding a `float_array` and its accessor
    pub fn float_source(
        &mut self,
        id: &str,
        values: &[f32],
        stride: usize,
        params: &[(&str, &str)],
    ) {
        let array_id = format!("{}-array", id);
        self.start("source");
        self.attr("id", id);

        self.start("float_array");
        self.attr("id", &array_id);
        self.attr("count", &values.len());
        self.xml.write_text(&join(values));
        self.end();

        self.accessor(&array_id, values.len() / stride.max(1), stride, params);
        self.end();
    }

    /// `<source>` holding a `Name_array` and its accessor.
    ///
    /// Names must already be whitespace free.
    pub fn name_source(&mut self, id: &str, names: &[&str], param: (&str, &str)) {
        let array_id = format!("{}-array", id);
        self.start("source");
        self.attr("id", id);

        self.start("Name_array");
        self.attr("id", &array_id);
        self.attr("count", &names.len());
        self.text(&names.join(" "));
        self.end();

        self.accessor(&array_id, names.len(), 1, &[param]);
        self.end();
    }

    /// `<input semantic source [offset]/>`
    pub fn input(&mut self, semantic: &str, source: &str, offset: Option<usize>) {
        self.start("input");
        self.attr("semantic", semantic);
        self.attr("source", &format!("#{}", source));
        if let Some(offset) = offset {
            self.attr("offset", &offset);
        }
        self.end();
    }

    fn accessor(&mut self, array_id: &str, count: usize, stride: usize, params: &[(&str, &str)]) {
        self.start("technique_common");
        self.start("accessor");
        self.attr("source", &format!("#{}", array_id));
        self.attr("count", &count);
        self.attr("stride", &stride);
        for (name, ty) in params {
            self.start("param");
            self.attr("name", name);
            self.attr("type", ty);
            self.end();
        }
        self.end();
        self.end();
    }

    pub fn finish(self) -> XmlDocument {
        XmlDocument(self.xml.end_document())
    }
}

/// Matrix elements in row-major order (COLLADA's layout)
pub(crate) fn row_major(matrix: &Mat4) -> [f32; 16] {
    matrix.transpose().to_cols_array()
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    let mut out = String::new();
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}", v);
    }
    out
}

/// Escape markup and drop characters XML 1.0 cannot carry.
///
/// `xmlwriter` only escapes quotes in attributes and `<` in text.
fn escape(value: &str) -> Cow<'_, str> {
    let needs_work = value
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>') || is_forbidden(c));
    if !needs_work {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if is_forbidden(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_forbidden(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("Bip01 Head"), "Bip01 Head");
        assert_eq!(escape("a&b<c>"), "a&amp;b&lt;c&gt;");
        assert_eq!(escape("x\u{1}y"), "xy");
    }

    #[test]
    fn test_row_major_puts_translation_last_in_rows() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let rows = row_major(&m);
        assert_eq!(rows[3], 1.0);
        assert_eq!(rows[7], 2.0);
        assert_eq!(rows[11], 3.0);
        assert_eq!(rows[15], 1.0);
    }

    #[test]
    fn test_float_source_layout() {
        let mut w = ColladaWriter::new();
        w.float_source("times", &[0.0, 0.5], 1, &[("TIME", "float")]);
        let doc = w.finish();
        let xml = doc.as_str();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<float_array id="times-array" count="2">0 0.5</float_array>"#));
        assert!(xml.contains(r##"<accessor source="#times-array" count="2" stride="1">"##));
        assert!(xml.contains(r#"<param name="TIME" type="float"/>"#));
    }

    #[test]
    fn test_attribute_escaping() {
        let mut w = ColladaWriter::new();
        w.start("node");
        w.attr_text("name", "R&D \"arm\"");
        w.end();
        let xml = w.finish().into_string();
        assert!(xml.contains(r#"name="R&amp;D &quot;arm&quot;""#));
    }
}
