use std::{io::Write as _, path::Path};

use anchored_logstore::{RecordStore, WireRevision};

use crate::codec::LINE_TERMINATOR;
use crate::error::FacilityError;
use crate::message::{MessageTypeInfo, XmlShape};
use crate::request::WorkerRequest;
use super::{TargetCore, TargetFileName, clip, date_and_time};


/// The root element wrapped around the exported fragments when the cap flag is set. Without the
/// cap, the destination holds the bare fragment sequence, suitable for embedding elsewhere.
const ROOT_ELEMENT: &str = "LOG";

/// The structured-XML target kind: one XML fragment record per message.
///
/// Ordinary message types become flat `<LOG_MESSAGE>` elements. Status-report types become
/// opening, item, and closing fragments, so one begin/items/end group of messages reconstructs
/// a single well-formed `<STATUS_REPORT>` block across multiple records.
#[derive(Debug)]
pub(crate) struct XmlLogTarget<S> {
    core: TargetCore<S>,
}

impl<S: RecordStore> XmlLogTarget<S> {
    /// Set up the target and put the `<LOG_OPENED/>` and `<LOG_VERSION/>` fragments on record.
    pub(crate) fn init(
        store:           S,
        facility:        &str,
        directory:       &Path,
        overwrite:       bool,
        max_record_size: Option<usize>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let name = TargetFileName::Xml { facility };

        let mut core = TargetCore::init(
            store,
            name.stream_name(),
            name.file_path(directory),
            overwrite,
            max_record_size,
        )?;

        let (date, time) = date_and_time();
        core.append(&format!("<LOG_OPENED Date=\"{date}\" Time=\"{time}\"/>"))?;

        let version = match core.revision() {
            WireRevision::Legacy  => 1,
            WireRevision::Current => 2,
        };
        core.append(&format!("<LOG_VERSION Revision=\"{version}\"/>"))?;

        Ok(Self { core })
    }

    #[must_use]
    pub(crate) fn destination(&self) -> &Path {
        self.core.destination()
    }

    /// Append one XML fragment record for the message, shaped by its type's taxonomy entry.
    /// No-op once closed, and for empty messages.
    pub(crate) fn log_message(
        &mut self,
        request: &WorkerRequest,
        info:    &MessageTypeInfo,
    ) -> Result<(), FacilityError<S::Error>> {
        if self.core.is_closed() || request.message.is_empty() {
            return Ok(());
        }

        let max = self.core.max_record_size();
        let message = clip(&request.message, max);
        let description = request.description
            .as_deref()
            .filter(|description| !description.is_empty())
            .map(|description| clip(description, max));

        let fragment = match info.shape {
            XmlShape::Message => {
                let (date, time) = date_and_time();
                let mut fragment = format!(
                    "<LOG_MESSAGE Date=\"{date}\" Time=\"{time}\" Severity=\"{}\">",
                    info.severity.as_str(),
                );
                fragment.push_str(&format!("<MESSAGE>{}</MESSAGE>", cdata(message)));
                if let Some(description) = description {
                    fragment.push_str(&format!(
                        "<DESCRIPTION>{}</DESCRIPTION>",
                        cdata(description),
                    ));
                }
                fragment.push_str("</LOG_MESSAGE>");
                fragment
            }
            XmlShape::ReportBegin => {
                let (date, time) = date_and_time();
                format!(
                    "<STATUS_REPORT Date=\"{date}\" Time=\"{time}\" Name=\"{}\">",
                    escape_attribute(message),
                )
            }
            XmlShape::ReportItem => {
                let mut fragment = format!("<STATUS_ITEM><MESSAGE>{}</MESSAGE>", cdata(message));
                if let Some(description) = description {
                    fragment.push_str(&format!(
                        "<DESCRIPTION>{}</DESCRIPTION>",
                        cdata(description),
                    ));
                }
                fragment.push_str("</STATUS_ITEM>");
                fragment
            }
            XmlShape::ReportEnd => "</STATUS_REPORT>".to_owned(),
        };

        self.core.append(&fragment)
    }

    /// Put the `<LOG_CLOSED/>` fragment on record, then transform every stream record into one
    /// destination line, wrapping the whole output in a root element pair when `cap` is set.
    /// No-op if the target is already closed.
    pub(crate) fn close(&mut self, cap: bool) -> Result<(), FacilityError<S::Error>> {
        if self.core.is_closed() {
            return Ok(());
        }

        self.core.guard_destination()?;

        let (date, time) = date_and_time();
        self.core
            .append_close_record(&format!("<LOG_CLOSED Date=\"{date}\" Time=\"{time}\"/>"))?;

        let mut out = self.core.create_destination()?;

        if cap {
            out.write_all(format!("<{ROOT_ELEMENT}>{LINE_TERMINATOR}").as_bytes())
                .map_err(FacilityError::FileWrite)?;
        }

        self.core.export_into(&mut out)?;

        if cap {
            out.write_all(format!("</{ROOT_ELEMENT}>{LINE_TERMINATOR}").as_bytes())
                .map_err(FacilityError::FileWrite)?;
        }

        out.flush().map_err(FacilityError::FileWrite)?;

        self.core.mark_closed();
        Ok(())
    }
}

/// Wrap arbitrary text in a CDATA section. An embedded `]]>` would end the section early, so it
/// is split across two adjacent sections.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Escape text for use inside a double-quoted XML attribute value.
fn escape_attribute(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&'  => escaped.push_str("&amp;"),
            '<'  => escaped.push_str("&lt;"),
            '>'  => escaped.push_str("&gt;"),
            '"'  => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _    => escaped.push(c),
        }
    }
    escaped
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn cdata_wraps_plain_text() {
        assert_eq!(cdata("plain text"), "<![CDATA[plain text]]>");
    }

    #[test]
    fn cdata_splits_embedded_terminators() {
        let wrapped = cdata("a]]>b");
        assert_eq!(wrapped, "<![CDATA[a]]]]><![CDATA[>b]]>");
        // The payload never contains a live `]]>` outside a section boundary.
        assert!(!wrapped.replace("]]]]><![CDATA[>", "").contains("]]>b"));
    }

    #[test]
    fn attributes_escape_xml_metacharacters() {
        assert_eq!(
            escape_attribute(r#"a & "b" <c>'d'"#),
            "a &amp; &quot;b&quot; &lt;c&gt;&apos;d&apos;",
        );
    }
}
