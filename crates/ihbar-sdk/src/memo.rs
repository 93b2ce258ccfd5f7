use crate::error::{Result, SdkError};
use crate::fields::{FieldSpec, ValidatedFields};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Memo layout with `{query_key}` placeholders, e.g. `"Suclu: {suclu} | Ihbar: {ihbar}"`.
///
/// Values are inserted verbatim in a single pass, so a value containing a separator or
/// a `{placeholder}` of its own is never expanded again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MemoTemplate {
    /// Parse a template; every placeholder must name one of `fields`.
    pub fn parse(template: &str, fields: &[FieldSpec]) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let close = rest[open..]
                .find('}')
                .map(|offset| open + offset)
                .ok_or_else(|| {
                    SdkError::Template(format!("unclosed placeholder in {:?}", template))
                })?;

            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }

            let name = &rest[open + 1..close];
            if !fields.iter().any(|f| f.query_key == name) {
                return Err(SdkError::Template(format!(
                    "placeholder {{{}}} does not name a field",
                    name
                )));
            }
            segments.push(Segment::Field(name.to_string()));
            rest = &rest[close + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn render(&self, values: &ValidatedFields) -> String {
        let mut memo = String::with_capacity(self.source.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => memo.push_str(text),
                Segment::Field(key) => memo.push_str(values.get(key).unwrap_or_default()),
            }
        }
        memo
    }
}
